mod app;
mod cache;
mod model;
mod search;
mod share;
mod view;

pub use app::{Applied, Completion, DeleteConfirmation, NotesApp, Pending};
pub use cache::NoteCache;
pub use model::*;
pub use search::search;
pub use view::{Ticket, ViewEvent, ViewMachine, ViewState};
