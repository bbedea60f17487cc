use shared::{
    filter_and_sort, rank_users, LeaderboardEntry, SortDirection, Ticket, TicketFilter,
    TicketPriority, TicketState,
};

use crate::types::{BoardStats, PaginatedResponse};
use crate::TicketBoard;

impl TicketBoard {
    /// Tickets ordered by report time, newest first. Snapshot storage is
    /// unordered, so views sort before paging.
    fn tickets_by_created(&self) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self.tickets().cloned().collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tickets
    }

    pub fn open_tickets(&self, page: u64, limit: u64) -> Vec<Ticket> {
        self.tickets_by_created()
            .into_iter()
            .filter(|ticket| ticket.state == TicketState::Open)
            .skip((page * limit) as usize)
            .take(limit as usize)
            .collect()
    }

    /// Filtered, priority-sorted ticket list for display.
    pub fn tickets_page(
        &self,
        filter: &TicketFilter,
        direction: SortDirection,
        page: u64,
        limit: u64,
    ) -> PaginatedResponse<Ticket> {
        let matching = filter_and_sort(&self.tickets_by_created(), filter, direction);
        let total = matching.len() as u64;
        let records = matching
            .into_iter()
            .skip((page * limit) as usize)
            .take(limit as usize)
            .collect();
        PaginatedResponse::new(records, page, limit, total)
    }

    pub fn leaderboard(&self, page: u64, limit: u64) -> PaginatedResponse<LeaderboardEntry> {
        let mut users: Vec<_> = self.users().collect();
        // Ties broken by id so pagination is deterministic across refreshes.
        users.sort_by(|a, b| a.id.cmp(&b.id));
        let ranked = rank_users(users);
        let total = ranked.len() as u64;
        let records = ranked
            .into_iter()
            .skip((page * limit) as usize)
            .take(limit as usize)
            .collect();
        PaginatedResponse::new(records, page, limit, total)
    }

    pub fn stats(&self) -> BoardStats {
        let mut stats = BoardStats::default();
        for ticket in self.tickets() {
            stats.total += 1;
            match ticket.state {
                TicketState::Open => {
                    stats.open += 1;
                    if ticket.priority == TicketPriority::High {
                        stats.high_priority_open += 1;
                    }
                }
                TicketState::Claimed => stats.claimed += 1,
                TicketState::Completed => stats.completed += 1,
            }
        }
        stats
    }
}
