use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::NotesGateway;
use crate::{
    notes::{Note, NoteFields, NoteId},
    Error, Result,
};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Network,
    NotFound,
    Unauthorized,
}

impl Failure {
    fn into_error(self) -> Error {
        match self {
            Failure::Network => Error::Fetch {
                status: None,
                message: "connection refused".into(),
            },
            Failure::NotFound => Error::NotFound("Note not found".into()),
            Failure::Unauthorized => Error::Unauthorized,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    notes: Vec<Note>,
    next_id: NoteId,
    links_issued: u32,
    fail_next: Option<Failure>,
    calls: Vec<String>,
}

/// In-memory notes service. Behaves like the real one: newest first, ids and
/// timestamps assigned on create, a fresh link on every share.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<State>>,
}

impl MockGateway {
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let next_id = notes.iter().map(|n| n.id).max().unwrap_or(0);
        Self {
            state: Arc::new(Mutex::new(State {
                notes,
                next_id,
                ..Default::default()
            })),
        }
    }

    pub fn fail_next(&self, failure: Failure) {
        self.state.lock().unwrap().fail_next = Some(failure);
    }

    pub fn server_notes(&self) -> Vec<Note> {
        self.state.lock().unwrap().notes.clone()
    }

    /// Removes a note behind the client's back.
    pub fn forget(&self, id: NoteId) {
        self.state.lock().unwrap().notes.retain(|n| n.id != id);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn begin(&self, call: String) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl NotesGateway for MockGateway {
    async fn list(&self) -> Result<Vec<Note>> {
        let state = self.begin("list".into())?;
        Ok(state.notes.clone())
    }

    async fn create(&self, fields: &NoteFields) -> Result<Note> {
        let mut state = self.begin("create".into())?;
        state.next_id += 1;
        let now = Utc::now();
        let note = Note {
            id: state.next_id,
            title: fields.title.clone(),
            content: fields.content.clone(),
            created_at: Some(now),
            updated_at: Some(now),
            share_link: None,
        };
        state.notes.insert(0, note.clone());
        Ok(note)
    }

    async fn update(&self, id: NoteId, fields: &NoteFields) -> Result<Note> {
        let mut state = self.begin(format!("update {id}"))?;
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound("Note not found".into()))?;
        note.title = fields.title.clone();
        note.content = fields.content.clone();
        note.updated_at = Some(Utc::now());
        Ok(note.clone())
    }

    async fn delete(&self, id: NoteId) -> Result<()> {
        let mut state = self.begin(format!("delete {id}"))?;
        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        if state.notes.len() == before {
            return Err(Error::NotFound("Note not found".into()));
        }
        Ok(())
    }

    async fn share(&self, id: NoteId) -> Result<String> {
        let mut state = self.begin(format!("share {id}"))?;
        state.links_issued += 1;
        let link = format!("http://notes.test/share/{id}-{}", state.links_issued);
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound("Note not found".into()))?;
        note.share_link = Some(link.clone());
        Ok(link)
    }
}
