//! Query router: turns a free-text request into a text reply.
//!
//! Requests are classified by [`RuleSet`] and dispatched to the ticket
//! store or the knowledge base. Ticket fields are pulled out of the text
//! with plain substring checks; there is no language understanding here.

pub mod rules;

pub use rules::{Intent, RoutingRule, RuleSet};

use std::sync::Arc;

use tracing::info;

use crate::error::RouterError;
use crate::knowledge::KnowledgeBase;
use crate::ticket::{DEFAULT_PRIORITY, Ticket, TicketStore};

/// Reply when a listing finds nothing.
pub const NO_OPEN_TICKETS: &str = "There are no open tickets at the moment.";

/// Header line above a ticket listing.
pub const OPEN_TICKETS_HEADER: &str = "Open tickets:";

/// Service recorded when the request names none.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Services recognized in free text, checked in order.
const KNOWN_SERVICES: &[&str] = &["payments"];

/// Ticket fields extracted from a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
    pub service: String,
    pub priority: String,
    pub summary: String,
}

impl TicketRequest {
    /// Extract ticket fields from the raw request.
    ///
    /// Priority becomes `P1` whenever "p1" appears anywhere in the text,
    /// including inside other words.
    pub fn from_text(input: &str) -> Self {
        let text = input.to_lowercase();

        let service = KNOWN_SERVICES
            .iter()
            .find(|s| text.contains(*s))
            .copied()
            .unwrap_or(UNKNOWN_SERVICE)
            .to_string();
        let priority = if text.contains("p1") {
            "P1"
        } else {
            DEFAULT_PRIORITY
        }
        .to_string();
        let summary = format!("Incident on {} service. User said: {}", service, input);

        Self {
            service,
            priority,
            summary,
        }
    }
}

/// One listing line for a ticket.
pub fn format_ticket_line(ticket: &Ticket) -> String {
    format!(
        "{} | service={} | priority={} | status={} | summary={}",
        ticket.id, ticket.service, ticket.priority, ticket.status, ticket.summary
    )
}

/// Routes requests to the ticket store or the knowledge base.
pub struct Router {
    store: Arc<TicketStore>,
    knowledge: Arc<dyn KnowledgeBase>,
    rules: RuleSet,
}

impl Router {
    pub fn new(store: Arc<TicketStore>, knowledge: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            store,
            knowledge,
            rules: RuleSet::default_rules(),
        }
    }

    /// Replace the routing rules.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn store(&self) -> &Arc<TicketStore> {
        &self.store
    }

    pub fn classify(&self, input: &str) -> Intent {
        self.rules.classify(input)
    }

    /// Handle one request and produce the reply text.
    ///
    /// Knowledge base answers are returned verbatim; their failures, and
    /// ticket log write failures, propagate.
    pub async fn route(&self, input: &str) -> Result<String, RouterError> {
        let intent = self.classify(input);
        info!(intent = ?intent, "Routing request");

        match intent {
            Intent::ListTickets => Ok(self.list_open_tickets().await),
            Intent::CreateTicket => self.create_ticket(input).await,
            Intent::Knowledge => Ok(self.knowledge.answer(input).await?),
        }
    }

    async fn list_open_tickets(&self) -> String {
        let tickets = self.store.list_open().await;
        if tickets.is_empty() {
            return NO_OPEN_TICKETS.to_string();
        }

        let lines: Vec<String> = tickets.iter().map(format_ticket_line).collect();
        format!("{}\n{}", OPEN_TICKETS_HEADER, lines.join("\n"))
    }

    async fn create_ticket(&self, input: &str) -> Result<String, RouterError> {
        let request = TicketRequest::from_text(input);
        let ticket = self
            .store
            .create(&request.service, &request.summary, Some(&request.priority))
            .await?;

        Ok(format!(
            "I've opened a {} ticket for the {} service with ID {}.",
            ticket.priority, ticket.service, ticket.id
        ))
    }
}
