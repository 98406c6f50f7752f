use rentra_shared::Money;
use serde::{Deserialize, Serialize};

/// One breakdown line: a label, a signed amount and a human-readable
/// reason for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub label: String,
    pub amount: Money,
    pub reason: String,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: Money, reason: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            amount,
            reason: reason.into(),
        }
    }
}

/// An itemized price. Once attached to a booking the quote is locked and
/// never recomputed, so later pricing-rule changes cannot reprice an
/// existing booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub lines: Vec<LineItem>,
    pub total: Money,
}

impl Quote {
    /// Assemble a quote from its lines; the total is always the sum of
    /// the line amounts.
    pub fn from_lines(lines: Vec<LineItem>) -> Self {
        let total = lines.iter().map(|line| line.amount).sum();
        Self { lines, total }
    }
}
