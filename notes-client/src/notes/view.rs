use super::{Draft, Note, NoteId};
use crate::{Error, Result};

/// Identifies one composing or editing session, so that a late gateway reply
/// can tell whether the form it was issued from is still open.
pub type Ticket = u64;

/// What the user currently sees. Each variant carries only the data that is
/// valid in that mode.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Viewing(Note),
    Creating {
        draft: Draft,
        ticket: Ticket,
    },
    Editing {
        note: Note,
        draft: Draft,
        ticket: Ticket,
    },
}

#[derive(Debug, Clone)]
pub enum ViewEvent {
    Select(Note),
    StartCreating,
    StartEditing,
    Cancel,
    /// The gateway confirmed the open form's save.
    Saved(Note),
    /// The gateway confirmed a deletion.
    Deleted(NoteId),
    /// A newer copy of a note arrived, e.g. with a share link attached.
    Refresh(Note),
}

impl ViewEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Select(_) => "select",
            Self::StartCreating => "create",
            Self::StartEditing => "edit",
            Self::Cancel => "cancel",
            Self::Saved(_) => "saved",
            Self::Deleted(_) => "deleted",
            Self::Refresh(_) => "refresh",
        }
    }
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Viewing(_) => "viewing",
            Self::Creating { .. } => "creating",
            Self::Editing { .. } => "editing",
        }
    }

    /// The note shown or being edited.
    pub fn selected(&self) -> Option<&Note> {
        match self {
            Self::Viewing(note) | Self::Editing { note, .. } => Some(note),
            Self::Idle | Self::Creating { .. } => None,
        }
    }

    pub fn selected_id(&self) -> Option<NoteId> {
        self.selected().map(|n| n.id)
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            Self::Creating { draft, .. } | Self::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Self::Creating { ticket, .. } | Self::Editing { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Default)]
pub struct ViewMachine {
    state: ViewState,
    next_ticket: Ticket,
}

impl ViewMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        match &mut self.state {
            ViewState::Creating { draft, .. } | ViewState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Applies `event`. An event that makes no sense in the current state is
    /// rejected and the state is left as it was.
    pub fn transition(&mut self, event: ViewEvent) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let from = state.name();
        let event_name = event.name();

        match self.next(state, event) {
            Ok(next) => {
                tracing::trace!(from, to = next.name(), event = event_name, "view transition");
                self.state = next;
                Ok(())
            }
            Err(unchanged) => {
                self.state = unchanged;
                Err(Error::InvalidTransition(format!("cannot {event_name} while {from}")))
            }
        }
    }

    fn next(&mut self, state: ViewState, event: ViewEvent) -> std::result::Result<ViewState, ViewState> {
        use ViewEvent as E;
        use ViewState as S;

        let next = match (state, event) {
            (_, E::Select(note)) => S::Viewing(note),

            (S::Idle | S::Viewing(_), E::StartCreating) => S::Creating {
                draft: Draft::default(),
                ticket: self.issue_ticket(),
            },
            (S::Viewing(note), E::StartEditing) => S::Editing {
                draft: Draft::from_note(&note),
                ticket: self.issue_ticket(),
                note,
            },

            (S::Creating { .. }, E::Cancel) => S::Idle,
            (S::Editing { note, .. }, E::Cancel) => S::Viewing(note),

            (S::Creating { .. }, E::Saved(saved)) => S::Viewing(saved),
            (S::Editing { note, .. }, E::Saved(saved)) if note.id == saved.id => S::Viewing(saved),

            (state, E::Deleted(id)) if state.selected_id() == Some(id) => S::Idle,
            (state, E::Deleted(_)) => state,

            (S::Viewing(note), E::Refresh(fresh)) if note.id == fresh.id => S::Viewing(fresh),
            (S::Editing { note, draft, ticket }, E::Refresh(fresh)) if note.id == fresh.id => S::Editing {
                note: fresh,
                draft,
                ticket,
            },
            (state, E::Refresh(_)) => state,

            (state, _) => return Err(state),
        };

        Ok(next)
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        self.next_ticket
    }
}
