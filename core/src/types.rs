//! Shared primitive types used across the triage pipeline.

/// An extracted ticket reference number (service request or incident).
pub type TicketId = u64;
