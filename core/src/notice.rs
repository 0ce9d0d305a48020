//! User-visible notices for degraded computations.
//!
//! A missing column or misconfigured classifier never aborts a run; the
//! affected computation degrades and the reason is surfaced here for the
//! display layer to show.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Record a notice and mirror it to the log.
    pub fn push(notices: &mut Vec<Notice>, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        notices.push(Notice::new(message));
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
