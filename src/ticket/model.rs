//! Ticket data model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TicketError;

/// Prefix shared by every ticket id.
pub const ID_PREFIX: &str = "T-";

/// Priority assigned when the caller does not supply one.
pub const DEFAULT_PRIORITY: &str = "P2";

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = TicketError;

    /// Case-insensitive; anything but `OPEN`/`CLOSED` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(TicketError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// An incident ticket. Field order matches the on-disk record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Sequential id, `T-0001`, `T-0002`, ...
    pub id: String,
    /// Free-text service label.
    pub service: String,
    /// Free-text description of the incident.
    pub summary: String,
    /// Caller-supplied priority (`P1`, `P2`, ...). Not validated.
    pub priority: String,
    /// Creation time in UTC.
    pub created_at: DateTime<Utc>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: TicketStatus,
}

impl Ticket {
    /// Create a new open ticket with the given sequence number.
    pub fn new(
        number: u64,
        service: impl Into<String>,
        summary: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            id: format_id(number),
            service: service.into(),
            summary: summary.into(),
            priority: priority.into(),
            created_at: Utc::now(),
            status: TicketStatus::Open,
        }
    }

    /// Numeric part of the id, if it has the `T-<digits>` shape.
    pub fn number(&self) -> Option<u64> {
        parse_id(&self.id)
    }
}

/// Render a sequence number as a ticket id. Widens past four digits.
pub fn format_id(number: u64) -> String {
    format!("{}{:04}", ID_PREFIX, number)
}

/// Extract the sequence number from a ticket id.
pub fn parse_id(id: &str) -> Option<u64> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}
