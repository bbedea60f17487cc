use serde::{Deserialize, Serialize};
use shared::{TicketId, TicketPriority};

/// Outcome of a completion attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionReceipt {
    pub ticket_id: TicketId,
    /// Whether the ticket moved to COMPLETED. A failed comparison leaves it
    /// CLAIMED for a retry.
    pub completed: bool,
    pub points_awarded: u32,
    pub priority: TicketPriority,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PaginatedResponse<T: Serialize> {
    pub records: Vec<T>,
    pub page: u64,
    pub total_pages: u64,
    pub limit: u64,
    pub total_records: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(records: Vec<T>, page: u64, limit: u64, total_records: u64) -> Self {
        // Zero page size would divide by zero below.
        let limit = limit.max(1);
        let extra_page = if total_records % limit == 0 { 0 } else { 1 };
        let total_pages = (total_records / limit) + extra_page;
        Self {
            records,
            page,
            total_pages,
            limit,
            total_records,
        }
    }
}

/// Counts shown on the dashboard stat cards.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardStats {
    pub total: u64,
    pub open: u64,
    pub claimed: u64,
    pub completed: u64,
    pub high_priority_open: u64,
}
