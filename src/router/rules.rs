//! Keyword rules for intent classification.
//!
//! Each rule lists keywords that must all appear (as substrings) in the
//! lower-cased request. Rules are checked in order and the first match
//! wins; a request matching no rule falls through to the knowledge base.

use tracing::debug;

/// What the router should do with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Show open tickets.
    ListTickets,
    /// Open a new ticket from the request text.
    CreateTicket,
    /// Answer from the runbook knowledge base.
    Knowledge,
}

/// A single routing rule.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    /// Human-readable rule name, used in logs.
    pub name: String,
    /// Lower-case substrings that must all be present.
    pub keywords: Vec<String>,
    pub intent: Intent,
}

impl RoutingRule {
    pub fn new(name: &str, keywords: &[&str], intent: Intent) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            intent,
        }
    }

    /// `text` must already be lower-cased.
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().all(|k| text.contains(k.as_str()))
    }
}

/// Ordered rule list.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<RoutingRule>,
}

impl RuleSet {
    /// Listing is checked before creation, so "create a ticket list"
    /// lists tickets.
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                RoutingRule::new("list-tickets", &["list", "ticket"], Intent::ListTickets),
                RoutingRule::new("create-ticket", &["create", "ticket"], Intent::CreateTicket),
            ],
        }
    }

    /// Create an empty rule set (everything goes to the knowledge base).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule at the lowest precedence.
    pub fn add_rule(&mut self, rule: RoutingRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// First rule matching the lower-cased `text`, if any.
    pub fn evaluate(&self, text: &str) -> Option<&RoutingRule> {
        let rule = self.rules.iter().find(|r| r.matches(text))?;
        debug!(rule = %rule.name, intent = ?rule.intent, "Request matched routing rule");
        Some(rule)
    }

    /// Classify a raw request.
    pub fn classify(&self, input: &str) -> Intent {
        let text = input.to_lowercase();
        self.evaluate(&text)
            .map(|r| r.intent)
            .unwrap_or(Intent::Knowledge)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::default_rules()
    }
}
