//! Client-side engine of a personal notes app: a gateway-confirmed note
//! cache, a view-state machine, search over the cache and share links, behind
//! an explicit session.

pub mod auth;
pub mod config;
mod errors;
pub mod gateway;
pub mod logging;
pub mod notes;
pub mod session;

pub use config::config;
pub use errors::{Error, Result};
