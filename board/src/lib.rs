use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared::{
    points_awarded, Claimant, ComparisonResult, Error, Ticket, TicketId, TicketState, User, UserId,
};

pub mod types;
pub mod views;


pub use types::CompletionReceipt;

/// In-memory snapshot of tickets and volunteer point tallies, with the
/// lifecycle rules enforced on every mutation.
///
/// The board assumes at most one concurrent mutation attempt per ticket;
/// the caller serializes actions. Every operation is all-or-nothing: on
/// error the ticket is untouched.
#[derive(Debug, Default)]
pub struct TicketBoard {
    tickets: HashMap<TicketId, Ticket>,
    users: HashMap<UserId, User>,
}

impl TicketBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a board from a backend snapshot.
    pub fn load(
        tickets: impl IntoIterator<Item = Ticket>,
        users: impl IntoIterator<Item = User>,
    ) -> Self {
        Self {
            tickets: tickets
                .into_iter()
                .map(|ticket| (ticket.id.clone(), ticket))
                .collect(),
            users: users.into_iter().map(|user| (user.id.clone(), user)).collect(),
        }
    }

    /// Registers a freshly reported ticket.
    pub fn report(&mut self, ticket: Ticket) -> Result<(), Error> {
        if self.tickets.contains_key(&ticket.id) {
            return Err(Error::DuplicateTicket(ticket.id));
        }
        self.tickets.insert(ticket.id.clone(), ticket);
        Ok(())
    }

    /// OPEN -> CLAIMED. Records the claimant and the claim timestamp.
    pub fn claim(
        &mut self,
        ticket_id: &str,
        claimant: Claimant,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let ticket = self.ticket_mut(ticket_id)?;
        if ticket.state != TicketState::Open {
            return Err(Error::InvalidState {
                id: ticket.id.clone(),
                state: ticket.state,
                expected: TicketState::Open,
            });
        }

        ticket.state = TicketState::Claimed;
        ticket.claimed_by = Some(claimant);
        ticket.claimed_at = Some(now);
        Ok(())
    }

    /// CLAIMED -> OPEN, owner only. Clears the claimant, claim timestamp
    /// and squad.
    pub fn unclaim(&mut self, ticket_id: &str, claimant: &Claimant) -> Result<(), Error> {
        let ticket = self.claimed_ticket_mut(ticket_id, claimant)?;
        ticket.state = TicketState::Open;
        ticket.claimed_by = None;
        ticket.claimed_at = None;
        Ok(())
    }

    /// CLAIMED -> CLAIMED self-loop, owner only: the claimant keeps the
    /// ticket to retry after a failed completion.
    pub fn reclaim(&mut self, ticket_id: &str, claimant: &Claimant) -> Result<(), Error> {
        self.claimed_ticket_mut(ticket_id, claimant)?;
        Ok(())
    }

    /// CLAIMED -> COMPLETED on a successful comparison, CLAIMED -> CLAIMED
    /// with the failed attempt recorded otherwise. Owner only.
    ///
    /// The award is a pure function of (priority, prior failure, outcome);
    /// it is credited to the individual, or to every member of a squad.
    pub fn complete(
        &mut self,
        ticket_id: &str,
        claimant: &Claimant,
        after_image_url: impl Into<String>,
        comparison: ComparisonResult,
        now: DateTime<Utc>,
    ) -> Result<CompletionReceipt, Error> {
        let ticket = self.claimed_ticket_mut(ticket_id, claimant)?;

        let success = comparison.is_success();
        let points = points_awarded(ticket.priority, ticket.had_failed_attempt, success);
        let priority = ticket.priority;

        if success {
            ticket.state = TicketState::Completed;
            ticket.after_image_url = Some(after_image_url.into());
            ticket.completed_at = Some(now);
        } else {
            ticket.had_failed_attempt = true;
        }

        if points > 0 {
            for member in claimant.members() {
                self.credit(&member, points);
            }
        }

        Ok(CompletionReceipt {
            ticket_id: ticket_id.to_string(),
            completed: success,
            points_awarded: points,
            priority,
        })
    }

    /// Read-only precondition check for a claim, for callers that must
    /// persist the mutation remotely before applying it locally.
    pub fn ensure_claimable(&self, ticket_id: &str) -> Result<(), Error> {
        let ticket = self.ticket_ref(ticket_id)?;
        if ticket.state != TicketState::Open {
            return Err(Error::InvalidState {
                id: ticket.id.clone(),
                state: ticket.state,
                expected: TicketState::Open,
            });
        }
        Ok(())
    }

    /// Read-only ownership check for unclaim/reclaim/complete.
    pub fn ensure_owned(&self, ticket_id: &str, claimant: &Claimant) -> Result<(), Error> {
        let ticket = self.ticket_ref(ticket_id)?;
        if ticket.state != TicketState::Claimed {
            return Err(Error::InvalidState {
                id: ticket.id.clone(),
                state: ticket.state,
                expected: TicketState::Claimed,
            });
        }
        if !ticket.is_claimed_by(claimant) {
            return Err(Error::NotOwner {
                id: ticket.id.clone(),
                actor: claimant.display_name().to_string(),
            });
        }
        Ok(())
    }

    /// Copies failed-attempt marks recorded on a prior board onto this
    /// one. Backend snapshots may not carry the flag yet, and the
    /// half-points cap must hold for the lifetime of the process.
    pub fn carry_failure_marks(&mut self, prior: &TicketBoard) {
        for id in prior
            .tickets
            .values()
            .filter(|ticket| ticket.had_failed_attempt)
            .map(|ticket| &ticket.id)
        {
            if let Some(ticket) = self.tickets.get_mut(id) {
                ticket.had_failed_attempt = true;
            }
        }
    }

    pub fn ticket(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.get(ticket_id)
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.values()
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }
}

impl TicketBoard {
    fn ticket_ref(&self, ticket_id: &str) -> Result<&Ticket, Error> {
        self.tickets
            .get(ticket_id)
            .ok_or_else(|| Error::UnknownTicket(ticket_id.to_string()))
    }

    fn ticket_mut(&mut self, ticket_id: &str) -> Result<&mut Ticket, Error> {
        self.tickets
            .get_mut(ticket_id)
            .ok_or_else(|| Error::UnknownTicket(ticket_id.to_string()))
    }

    fn claimed_ticket_mut(
        &mut self,
        ticket_id: &str,
        claimant: &Claimant,
    ) -> Result<&mut Ticket, Error> {
        let ticket = self.ticket_mut(ticket_id)?;
        if ticket.state != TicketState::Claimed {
            return Err(Error::InvalidState {
                id: ticket.id.clone(),
                state: ticket.state,
                expected: TicketState::Claimed,
            });
        }
        if !ticket.is_claimed_by(claimant) {
            return Err(Error::NotOwner {
                id: ticket.id.clone(),
                actor: claimant.display_name().to_string(),
            });
        }
        Ok(ticket)
    }

    fn credit(&mut self, user_id: &str, amount: u32) {
        let mut user = self
            .users
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| User::with_id(user_id));
        user.add_points(amount);
        self.users.insert(user.id.clone(), user);
    }
}
