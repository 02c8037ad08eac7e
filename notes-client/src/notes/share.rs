use super::{
    app::{Change, Pending},
    Applied, NoteId, NotesApp, ViewEvent,
};
use crate::{gateway::NotesGateway, Error, Result};

impl<G: NotesGateway> NotesApp<G> {
    /// Issues a share call for a cached note.
    pub fn share(&mut self, id: NoteId) -> Result<Pending<G>> {
        if !self.cache.contains(id) {
            return Err(Error::NotFound(format!("Note {id} is not in the list")));
        }
        self.issue_share(id)
    }

    pub fn share_selected(&mut self) -> Result<Pending<G>> {
        let id = self
            .view
            .state()
            .selected_id()
            .ok_or_else(|| Error::InvalidTransition("no note is selected".into()))?;
        self.share(id)
    }

    /// Attaches a freshly issued link to the cached note and, when that note
    /// is on screen, to the displayed copy.
    pub(super) fn apply_shared(&mut self, id: NoteId, result: Result<String>) -> Result<Applied> {
        let link = match result {
            Ok(link) if !link.trim().is_empty() => link,
            Ok(_) => {
                let error = Error::Fetch {
                    status: None,
                    message: "gateway returned an empty share link".into(),
                };
                return Err(self.surface("share note", error));
            }
            Err(error) => return Err(self.fail_for(id, "share note", error)),
        };

        self.record(Change::Shared(id, link.clone()));
        match self.cache.set_share_link(id, link.clone()).cloned() {
            Some(note) => self.view.transition(ViewEvent::Refresh(note))?,
            None => tracing::debug!(id, "shared note is no longer cached"),
        }

        Ok(Applied::Shared { id, link })
    }
}
