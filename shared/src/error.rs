use thiserror::Error;

use crate::{TicketId, TicketState};

/// Lifecycle errors. Operations are all-or-nothing: on error the ticket is
/// left untouched and the caller decides retry policy and messaging.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("ticket {id} is {state}, expected {expected}")]
    InvalidState {
        id: TicketId,
        state: TicketState,
        expected: TicketState,
    },

    #[error("ticket {id} is not claimed by {actor}")]
    NotOwner { id: TicketId, actor: String },

    #[error("unknown ticket {0}")]
    UnknownTicket(TicketId),

    #[error("duplicate ticket {0}")]
    DuplicateTicket(TicketId),

    #[error("backend call failed: {0}")]
    Backend(String),
}
