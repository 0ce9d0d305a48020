//! Linkage counts — how many case rows reference the same ticket.
//!
//! A referenced ticket may legitimately appear on multiple case rows; the
//! pipeline derives a per-member group size rather than collapsing rows.

use crate::classify::{Classification, TicketKind};
use crate::types::TicketId;
use std::collections::HashMap;

/// Group size over the (identifier, type) pair for every row carrying both;
/// rows with no reference get None, never zero.
pub fn linkage_counts(classifications: &[Classification]) -> Vec<Option<usize>> {
    let mut groups: HashMap<(TicketId, TicketKind), usize> = HashMap::new();
    for class in classifications {
        if let (Some(ticket), Some(kind)) = (class.ticket, class.kind) {
            *groups.entry((ticket, kind)).or_insert(0) += 1;
        }
    }

    classifications
        .iter()
        .map(|class| match (class.ticket, class.kind) {
            (Some(ticket), Some(kind)) => groups.get(&(ticket, kind)).copied(),
            _ => None,
        })
        .collect()
}
