use super::{Note, NoteId};

/// Gateway-confirmed mirror of the user's notes, newest first.
///
/// Nothing here talks to the network. Callers mutate the cache only after the
/// gateway acknowledged the corresponding operation.
#[derive(Debug, Default, Clone)]
pub struct NoteCache {
    notes: Vec<Note>,
}

impl NoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything with a freshly listed set, keeping gateway order.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    pub fn insert(&mut self, note: Note) {
        self.notes.insert(0, note);
    }

    /// Swaps the entry in place. Returns `false` when the id is unknown.
    pub fn replace(&mut self, id: NoteId, note: Note) -> bool {
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                *entry = note;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        let index = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(index))
    }

    pub fn set_share_link(&mut self, id: NoteId, link: impl Into<String>) -> Option<&Note> {
        let entry = self.notes.iter_mut().find(|n| n.id == id)?;
        entry.share_link = Some(link.into());
        Some(&*entry)
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
