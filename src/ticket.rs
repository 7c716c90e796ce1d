//! In-memory support ticket store.
//!
//! Holds tickets for the lifetime of a session and mocks the hand-off to
//! an external issue tracker. Durable storage and real delivery are out of
//! scope; the store's interface (`create`, `get`, `list`) is all the core
//! depends on.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::escalation::TicketRequest;

/// A support ticket tracked for the current session.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: String,
    pub user_name: String,
    pub email: String,
    pub summary: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

/// Session-scoped ticket collection.
#[derive(Debug, Default)]
pub struct TicketStore {
    tickets: Vec<Ticket>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ticket from a request and record it.
    ///
    /// Tickets open with status `"Open"` and a short id (the first eight
    /// hex digits of a UUIDv4).
    pub fn create(&mut self, request: &TicketRequest) -> Ticket {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);

        let ticket = Ticket {
            id,
            user_name: request.requester_name.clone(),
            email: request.requester_email.clone(),
            summary: request.summary.clone(),
            description: request.description.clone(),
            created_at: Utc::now(),
            status: "Open".to_string(),
        };

        info!(ticket_id = %ticket.id, summary = %ticket.summary, "support ticket created");
        send_to_external_tracker(&ticket);

        self.tickets.push(ticket.clone());
        ticket
    }

    /// Retrieve a ticket by id.
    pub fn get(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    /// All tickets, oldest first.
    pub fn list(&self) -> &[Ticket] {
        &self.tickets
    }
}

/// Mock hand-off to an external issue tracker.
fn send_to_external_tracker(ticket: &Ticket) {
    info!(
        ticket_id = %ticket.id,
        "ticket would be forwarded to the external issue tracker (mocked)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::{escalate, Requester};

    fn sample_request() -> TicketRequest {
        let requester = Requester {
            name: "Alex".to_string(),
            email: "alex@example.com".to_string(),
        };
        escalate(
            "Does it support X?",
            "I'm not sure about that feature",
            &requester,
        )
    }

    #[test]
    fn test_create_opens_ticket() {
        let mut store = TicketStore::new();
        let ticket = store.create(&sample_request());

        assert!(!ticket.id.is_empty());
        assert_eq!(ticket.id.len(), 8);
        assert_eq!(ticket.status, "Open");
        assert_eq!(ticket.summary, "Does it support X?");
        assert!(ticket.description.contains("I'm not sure about that feature"));
    }

    #[test]
    fn test_get_finds_created_ticket() {
        let mut store = TicketStore::new();
        let ticket = store.create(&sample_request());

        let found = store.get(&ticket.id).expect("ticket should exist");
        assert_eq!(found.summary, ticket.summary);
        assert!(store.get("00000000").is_none());
    }

    #[test]
    fn test_uncertain_answer_escalates_end_to_end() {
        let answer = "I'm not sure about that feature";
        assert!(crate::uncertainty::is_uncertain(answer));

        let requester = Requester {
            name: "Alex".to_string(),
            email: "alex@example.com".to_string(),
        };
        let request = escalate("Does it support X?", answer, &requester);
        assert_eq!(request.summary, "Does it support X?");
        assert!(request.description.contains(answer));

        let mut store = TicketStore::new();
        let ticket = store.create(&request);
        assert!(!ticket.id.is_empty());
        assert_eq!(ticket.status, "Open");
    }

    #[test]
    fn test_list_preserves_creation_order() {
        let mut store = TicketStore::new();
        let first = store.create(&sample_request());
        let second = store.create(&sample_request());

        let ids: Vec<&str> = store.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
    }
}
