use chrono::Utc;
use rentra_pricing::{LineItem, Quote};
use uuid::Uuid;

use crate::models::{Fine, Invoice};

/// Assembles the final bill: the locked quote's lines plus one line per
/// fine recorded before generation. Fines assessed afterwards never
/// retroactively change the invoice.
#[derive(Debug, Default)]
pub struct InvoiceBuilder {
    lines: Vec<LineItem>,
}

impl InvoiceBuilder {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn with_quote(mut self, quote: &Quote) -> Self {
        self.lines.extend(quote.lines.iter().cloned());
        self
    }

    pub fn with_fines(mut self, fines: &[Fine]) -> Self {
        for fine in fines {
            let reason = match &fine.notes {
                Some(notes) => format!("Fine: {} ({notes})", fine.fine_type),
                None => format!("Fine: {}", fine.fine_type),
            };
            self.lines
                .push(LineItem::new(fine.fine_type.to_string(), fine.amount, reason));
        }
        self
    }

    pub fn build(self) -> Invoice {
        let total = self.lines.iter().map(|line| line.amount).sum();
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            lines: self.lines,
            total,
            paid_at: None,
            method: None,
            payment_ref: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FineType;
    use rentra_shared::Money;

    #[test]
    fn test_invoice_totals_quote_plus_fines() {
        let quote = Quote::from_lines(vec![LineItem::new(
            "base",
            Money::from_major(150),
            "Base rate 50.00 x 3 night(s)",
        )]);
        let fines = vec![Fine::new(FineType::Damage, Money::from_major(75), None)];

        let invoice = InvoiceBuilder::new()
            .with_quote(&quote)
            .with_fines(&fines)
            .build();

        assert_eq!(invoice.total, Money::from_major(225));
        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.lines[0].label, "base");
        assert_eq!(invoice.lines[1].label, "damage");
        assert!(invoice.paid_at.is_none());
    }

    #[test]
    fn test_invoice_without_fines_matches_quote() {
        let quote = Quote::from_lines(vec![
            LineItem::new("base", Money::from_major(350), "Base rate"),
            LineItem::new("duration_discount", Money::from_major(-35), "10% off"),
        ]);
        let invoice = InvoiceBuilder::new().with_quote(&quote).build();
        assert_eq!(invoice.total, quote.total);
        assert_eq!(invoice.lines, quote.lines);
    }
}
