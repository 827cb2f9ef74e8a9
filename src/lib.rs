//! Ops Copilot: incident tickets and runbook answers behind a keyword router.

pub mod agent;
pub mod channels;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod router;
pub mod ticket;
pub mod tools;
