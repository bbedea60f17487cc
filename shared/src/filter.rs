use super::*;

/// Ticket-list filter. Empty sets accept everything; the state and
/// priority predicates are combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TicketFilter {
    pub states: Vec<TicketState>,
    pub priorities: Vec<TicketPriority>,
}

impl TicketFilter {
    pub fn accepts(&self, ticket: &Ticket) -> bool {
        (self.states.is_empty() || self.states.contains(&ticket.state))
            && (self.priorities.is_empty() || self.priorities.contains(&ticket.priority))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Descending,
    Ascending,
}

/// Filters and sorts a ticket snapshot for list display. The sort is total
/// only on priority rank; tickets of equal priority keep their input
/// relative order.
pub fn filter_and_sort(
    tickets: &[Ticket],
    filter: &TicketFilter,
    direction: SortDirection,
) -> Vec<Ticket> {
    let mut out: Vec<Ticket> = tickets
        .iter()
        .filter(|ticket| filter.accepts(ticket))
        .cloned()
        .collect();
    match direction {
        SortDirection::Ascending => out.sort_by_key(|ticket| ticket.priority.rank()),
        SortDirection::Descending => {
            out.sort_by_key(|ticket| std::cmp::Reverse(ticket.priority.rank()))
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn ticket(id: &str, severity: f64) -> Ticket {
        Ticket::new(id, "test litter", severity, 0.0, 0.0, "/before.jpg", Utc::now())
    }

    #[test]
    fn empty_filter_accepts_everything_in_order() {
        let tickets = vec![ticket("a", 8.0), ticket("b", 5.0), ticket("c", 2.0)];
        let out = filter_and_sort(&tickets, &TicketFilter::default(), SortDirection::Descending);
        assert_eq!(out.len(), 3);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn priority_sort_is_stable() {
        // [LOW, HIGH, MEDIUM, HIGH] sorted high-to-low keeps the two HIGH
        // tickets in their original relative order.
        let tickets = vec![
            ticket("low", 1.0),
            ticket("high-1", 9.0),
            ticket("medium", 5.0),
            ticket("high-2", 8.0),
        ];
        let out = filter_and_sort(&tickets, &TicketFilter::default(), SortDirection::Descending);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["high-1", "high-2", "medium", "low"]);

        let out = filter_and_sort(&tickets, &TicketFilter::default(), SortDirection::Ascending);
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["low", "medium", "high-1", "high-2"]);
    }

    #[test]
    fn state_and_priority_predicates_combine_with_and() {
        let mut claimed_high = ticket("claimed-high", 9.0);
        claimed_high.state = TicketState::Claimed;
        let open_high = ticket("open-high", 8.0);
        let mut claimed_low = ticket("claimed-low", 1.0);
        claimed_low.state = TicketState::Claimed;

        let tickets = vec![claimed_high, open_high, claimed_low];
        let filter = TicketFilter {
            states: vec![TicketState::Claimed],
            priorities: vec![TicketPriority::High],
        };
        let out = filter_and_sort(&tickets, &filter, SortDirection::Descending);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "claimed-high");
    }

    #[test]
    fn priority_only_filter() {
        let tickets = vec![ticket("a", 8.0), ticket("b", 5.0)];
        let filter = TicketFilter {
            states: vec![],
            priorities: vec![TicketPriority::Medium],
        };
        let out = filter_and_sort(&tickets, &filter, SortDirection::Descending);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");
    }
}
