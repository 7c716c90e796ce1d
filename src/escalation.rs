//! Escalation of uncertain answers into ticket requests.
//!
//! A pure data transformation: given the question, the bot's hedged answer,
//! and the requester identity, produce the [`TicketRequest`] handed to the
//! ticketing collaborator. Delivery and lifecycle are not this module's
//! concern.

use crate::config::RequesterConfig;

/// Who is asking for help.
#[derive(Debug, Clone)]
pub struct Requester {
    pub name: String,
    pub email: String,
}

impl From<&RequesterConfig> for Requester {
    fn from(config: &RequesterConfig) -> Self {
        Self {
            name: config.name.clone(),
            email: config.email.clone(),
        }
    }
}

/// Value object forwarded to the ticketing collaborator's `create`.
#[derive(Debug, Clone)]
pub struct TicketRequest {
    pub requester_name: String,
    pub requester_email: String,
    /// The unanswered question.
    pub summary: String,
    /// The bot's answer, preserved so a support agent sees what was said.
    pub description: String,
}

/// Turn an uncertain Q&A pair into a ticket request.
pub fn escalate(question: &str, answer_text: &str, requester: &Requester) -> TicketRequest {
    TicketRequest {
        requester_name: requester.name.clone(),
        requester_email: requester.email.clone(),
        summary: question.to_string(),
        description: format!("Bot response: {}", answer_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate_builds_request() {
        let requester = Requester {
            name: "Alex".to_string(),
            email: "alex@example.com".to_string(),
        };
        let request = escalate(
            "Does it support X?",
            "I'm not sure about that feature",
            &requester,
        );

        assert_eq!(request.summary, "Does it support X?");
        assert!(request
            .description
            .contains("I'm not sure about that feature"));
        assert_eq!(request.requester_name, "Alex");
        assert_eq!(request.requester_email, "alex@example.com");
    }
}
