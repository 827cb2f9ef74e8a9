//! Built-in tools for tickets and runbook search.

pub mod knowledge;
pub mod ticket;

pub use knowledge::KbSearchTool;
pub use ticket::{CreateTicketTool, ListTicketsTool};
