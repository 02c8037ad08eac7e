//! The remote notes service, as seen from the client.

mod errors;
mod http;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

use crate::{
    notes::{Note, NoteFields, NoteId},
    Result,
};

pub use errors::{Error, ErrorResponse};
pub use http::{share_id_from_link, HttpGateway, PublicNotes};
pub(crate) use http::error_for_status;

/// CRUD and share operations of the notes service. Every call is one round
/// trip; implementations never touch client-side state.
#[async_trait]
pub trait NotesGateway: Clone + Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<Note>>;

    async fn create(&self, fields: &NoteFields) -> Result<Note>;

    async fn update(&self, id: NoteId, fields: &NoteFields) -> Result<Note>;

    async fn delete(&self, id: NoteId) -> Result<()>;

    /// Publishes the note and returns its share link. The service may hand
    /// out a different link on every call.
    async fn share(&self, id: NoteId) -> Result<String>;
}
