//! Incident tickets: data model and the file-backed store.

pub mod model;
pub mod store;

pub use model::{DEFAULT_PRIORITY, Ticket, TicketStatus};
pub use store::{LoadOutcome, TicketStore};
