use std::collections::HashSet;

use super::{search, Draft, Note, NoteCache, NoteFields, NoteId, Ticket, ViewEvent, ViewMachine, ViewState};
use crate::{gateway::NotesGateway, Error, Result};

#[derive(Debug)]
enum Request {
    Load,
    Create(NoteFields),
    Update(NoteId, NoteFields),
    Delete(NoteId),
    Share(NoteId),
}

impl Request {
    fn describe(&self) -> String {
        match self {
            Request::Load => "load notes".into(),
            Request::Create(_) => "create note".into(),
            Request::Update(id, _) => format!("update note {id}"),
            Request::Delete(id) => format!("delete note {id}"),
            Request::Share(id) => format!("share note {id}"),
        }
    }
}

/// One logical operation. At most one call per key is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InFlight {
    Load,
    Save(Ticket),
    Delete(NoteId),
    Share(NoteId),
}

/// A gateway call that has been issued but not yet sent. It owns its own
/// gateway handle, so it can run while the app keeps handling input.
#[derive(Debug)]
pub struct Pending<G> {
    gateway: G,
    key: InFlight,
    ticket: Option<Ticket>,
    request: Request,
}

impl<G: NotesGateway> Pending<G> {
    pub fn describe(&self) -> String {
        self.request.describe()
    }

    /// Performs the round trip. Nothing is applied until the completion is
    /// handed to [`NotesApp::apply`].
    pub async fn run(self) -> Completion {
        let Self {
            gateway,
            key,
            ticket,
            request,
        } = self;

        let outcome = match request {
            Request::Load => Outcome::Loaded(gateway.list().await),
            Request::Create(fields) => Outcome::Created(gateway.create(&fields).await),
            Request::Update(id, fields) => Outcome::Updated(id, gateway.update(id, &fields).await),
            Request::Delete(id) => Outcome::Deleted(id, gateway.delete(id).await),
            Request::Share(id) => Outcome::Shared(id, gateway.share(id).await),
        };

        Completion { key, ticket, outcome }
    }
}

#[derive(Debug)]
pub(super) enum Outcome {
    Loaded(Result<Vec<Note>>),
    Created(Result<Note>),
    Updated(NoteId, Result<Note>),
    Deleted(NoteId, Result<()>),
    Shared(NoteId, Result<String>),
}

/// Result of a [`Pending`] call together with the form it was issued from.
#[derive(Debug)]
pub struct Completion {
    key: InFlight,
    ticket: Option<Ticket>,
    pub(super) outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Loaded(usize),
    Created(NoteId),
    Updated(NoteId),
    Deleted(NoteId),
    Shared { id: NoteId, link: String },
}

/// A confirmed cache mutation, kept while a reload is in flight so the
/// reload's snapshot cannot undo it.
#[derive(Debug, Clone)]
pub(super) enum Change {
    Created(Note),
    Updated(Note),
    Removed(NoteId),
    Shared(NoteId, String),
}

/// Proof that the user agreed to delete a note. Only [`NotesApp::request_delete`]
/// hands these out; dropping one cancels the deletion.
#[derive(Debug)]
#[must_use]
pub struct DeleteConfirmation {
    id: NoteId,
    title: String,
}

impl DeleteConfirmation {
    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn prompt(&self) -> String {
        format!("Are you sure you want to delete \"{}\"?", self.title)
    }
}

/// The note management engine: cache, view state, search query and the last
/// user-visible error, driven through one gateway.
pub struct NotesApp<G> {
    pub(super) gateway: G,
    pub(super) cache: NoteCache,
    pub(super) view: ViewMachine,
    query: String,
    error: Option<String>,
    loaded: bool,
    in_flight: HashSet<InFlight>,
    journal: Vec<Change>,
}

impl<G: NotesGateway> NotesApp<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            cache: NoteCache::new(),
            view: ViewMachine::new(),
            query: String::new(),
            error: None,
            loaded: false,
            in_flight: HashSet::new(),
            journal: Vec::new(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        self.cache.list()
    }

    pub fn view(&self) -> &ViewState {
        self.view.state()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.contains(&InFlight::Load)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// The cached notes matching the current query.
    pub fn visible(&self) -> Vec<&Note> {
        search(self.cache.list(), &self.query)
    }

    pub fn load(&mut self) -> Result<Pending<G>> {
        self.issue(InFlight::Load, None, Request::Load)
    }

    /// Shows a cached note, discarding any open form.
    pub fn select(&mut self, id: NoteId) -> Result<()> {
        let note = self
            .cache
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Note {id} is not in the list")))?;
        self.view.transition(ViewEvent::Select(note))
    }

    pub fn start_creating(&mut self) -> Result<()> {
        self.view.transition(ViewEvent::StartCreating)
    }

    pub fn start_editing(&mut self) -> Result<()> {
        self.view.transition(ViewEvent::StartEditing)
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.view.transition(ViewEvent::Cancel)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        self.draft_mut()?.title = title.into();
        Ok(())
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> Result<()> {
        self.draft_mut()?.content = content.into();
        Ok(())
    }

    fn draft_mut(&mut self) -> Result<&mut Draft> {
        let state = self.view.state().name();
        self.view
            .draft_mut()
            .ok_or_else(|| Error::InvalidTransition(format!("no form is open while {state}")))
    }

    /// Validates the open form and issues the create or update call. Invalid
    /// input never leaves the client and the form stays open.
    pub fn save(&mut self) -> Result<Pending<G>> {
        let (ticket, request) = match self.view.state() {
            ViewState::Creating { draft, ticket } => (*ticket, draft.validate().map(Request::Create)),
            ViewState::Editing { note, draft, ticket } => {
                (*ticket, draft.validate().map(|fields| Request::Update(note.id, fields)))
            }
            state => {
                return Err(Error::InvalidTransition(format!("cannot save while {}", state.name())));
            }
        };

        match request {
            Ok(request) => self.issue(InFlight::Save(ticket), Some(ticket), request),
            Err(error) => Err(self.surface("save note", error)),
        }
    }

    pub fn request_delete(&self, id: NoteId) -> Result<DeleteConfirmation> {
        let note = self
            .cache
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("Note {id} is not in the list")))?;
        Ok(DeleteConfirmation {
            id,
            title: note.title.clone(),
        })
    }

    pub fn confirm_delete(&mut self, confirmation: DeleteConfirmation) -> Result<Pending<G>> {
        let id = confirmation.id;
        self.issue(InFlight::Delete(id), None, Request::Delete(id))
    }

    pub(super) fn issue_share(&mut self, id: NoteId) -> Result<Pending<G>> {
        self.issue(InFlight::Share(id), None, Request::Share(id))
    }

    /// Hands out a call for `key` unless one is already on its way.
    fn issue(&mut self, key: InFlight, ticket: Option<Ticket>, request: Request) -> Result<Pending<G>> {
        if !self.in_flight.insert(key) {
            return Err(Error::InvalidTransition(format!(
                "{} is already in progress",
                request.describe()
            )));
        }
        Ok(Pending {
            gateway: self.gateway.clone(),
            key,
            ticket,
            request,
        })
    }

    /// Runs a pending call to completion and applies it.
    pub async fn run(&mut self, pending: Pending<G>) -> Result<Applied> {
        let completion = pending.run().await;
        self.apply(completion)
    }

    /// Applies a finished gateway call. The cache always follows the gateway;
    /// the view only follows when the result still belongs to what the user
    /// is looking at.
    pub fn apply(&mut self, completion: Completion) -> Result<Applied> {
        let Completion { key, ticket, outcome } = completion;
        self.in_flight.remove(&key);

        match outcome {
            Outcome::Loaded(Ok(notes)) => {
                self.cache.replace_all(notes);
                self.replay_journal();
                let count = self.cache.len();
                self.loaded = true;
                self.error = None;
                self.reconcile_selection()?;
                tracing::debug!(count, "notes loaded");
                Ok(Applied::Loaded(count))
            }
            Outcome::Loaded(Err(error)) => {
                self.journal.clear();
                Err(self.surface("load notes", error))
            }

            Outcome::Created(Ok(note)) => {
                let id = note.id;
                // a reload may already have listed it
                if !self.cache.replace(id, note.clone()) {
                    self.cache.insert(note.clone());
                }
                self.record(Change::Created(note.clone()));
                if self.is_open_form(ticket, |s| matches!(s, ViewState::Creating { .. })) {
                    self.view.transition(ViewEvent::Saved(note))?;
                } else {
                    tracing::debug!(id, "created note arrived after its form closed");
                }
                Ok(Applied::Created(id))
            }
            Outcome::Created(Err(error)) => Err(self.surface("create note", error)),

            Outcome::Updated(id, Ok(note)) => {
                if !self.cache.replace(id, note.clone()) {
                    tracing::debug!(id, "updated note is no longer cached");
                }
                self.record(Change::Updated(note.clone()));
                if self.is_open_form(ticket, |s| matches!(s, ViewState::Editing { note, .. } if note.id == id)) {
                    self.view.transition(ViewEvent::Saved(note))?;
                } else {
                    self.view.transition(ViewEvent::Refresh(note))?;
                }
                Ok(Applied::Updated(id))
            }
            Outcome::Updated(id, Err(error)) => Err(self.fail_for(id, "update note", error)),

            Outcome::Deleted(id, Ok(())) => {
                self.cache.remove(id);
                self.record(Change::Removed(id));
                self.view.transition(ViewEvent::Deleted(id))?;
                Ok(Applied::Deleted(id))
            }
            Outcome::Deleted(id, Err(error)) => Err(self.fail_for(id, "delete note", error)),

            Outcome::Shared(id, result) => self.apply_shared(id, result),
        }
    }

    /// Remembers a confirmed mutation while a reload is in flight.
    pub(super) fn record(&mut self, change: Change) {
        if self.is_loading() {
            self.journal.push(change);
        }
    }

    /// Re-applies mutations confirmed after the reload was issued on top of
    /// its snapshot.
    fn replay_journal(&mut self) {
        for change in std::mem::take(&mut self.journal) {
            match change {
                Change::Created(note) => {
                    if !self.cache.contains(note.id) {
                        self.cache.insert(note);
                    }
                }
                Change::Updated(note) => {
                    self.cache.replace(note.id, note);
                }
                Change::Removed(id) => {
                    self.cache.remove(id);
                }
                Change::Shared(id, link) => {
                    self.cache.set_share_link(id, link);
                }
            }
        }
    }

    /// Whether the form a result was issued from is still the one on screen.
    fn is_open_form(&self, ticket: Option<Ticket>, form: impl Fn(&ViewState) -> bool) -> bool {
        let state = self.view.state();
        ticket.is_some() && state.ticket() == ticket && form(state)
    }

    /// After a reload, a viewed note either gets the fresh copy or, if the
    /// gateway no longer lists it, is dropped. Open forms are left alone; a
    /// save against a vanished note comes back not-found.
    fn reconcile_selection(&mut self) -> Result<()> {
        let ViewState::Viewing(selected) = self.view.state() else {
            return Ok(());
        };
        let id = selected.id;
        match self.cache.get(id).cloned() {
            Some(fresh) => self.view.transition(ViewEvent::Refresh(fresh)),
            None => self.view.transition(ViewEvent::Deleted(id)),
        }
    }

    /// Surfaces a failed call on `id`. A not-found answer is authoritative:
    /// the note is dropped from the cache and from the view.
    pub(super) fn fail_for(&mut self, id: NoteId, action: &str, error: Error) -> Error {
        if error.is_not_found() {
            self.cache.remove(id);
            self.record(Change::Removed(id));
            if let Err(err) = self.view.transition(ViewEvent::Deleted(id)) {
                tracing::warn!(id, "{err}");
            }
        }
        self.surface(action, error)
    }

    /// Records a user-visible message for `error` and hands it back.
    pub(super) fn surface(&mut self, action: &str, error: Error) -> Error {
        tracing::warn!(action, "{error}");
        let message = match &error {
            Error::Validation(message) | Error::NotFound(message) => message.clone(),
            Error::Unauthorized => "Your session has expired. Please log in again.".into(),
            _ => format!("Failed to {action}"),
        };
        self.error = Some(message);
        error
    }
}
