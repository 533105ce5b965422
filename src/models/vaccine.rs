//! Monthly vaccine accountability (stock ledger) reports.

use super::{period_label, ReportStatus};
use crate::error::ReportError;
use crate::rows::{Row, RowReader};
use serde::Deserialize;

/// What a ledger row tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LedgerItemKind {
    #[default]
    Antigen,
    Diluent,
    Device,
}

impl From<&str> for LedgerItemKind {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "diluent" | "diluents" => LedgerItemKind::Diluent,
            "device" | "devices" | "syringe" | "safety box" => LedgerItemKind::Device,
            _ => LedgerItemKind::Antigen,
        }
    }
}

/// Doses discarded during the month, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscardReasons {
    pub expired: u32,
    pub broken_vial: u32,
    /// Vaccine vial monitor reached its discard point.
    pub vvm_change: u32,
    pub frozen: u32,
    pub label_missing: u32,
    pub other: u32,
}

impl DiscardReasons {
    pub fn total(&self) -> u64 {
        [
            self.expired,
            self.broken_vial,
            self.vvm_change,
            self.frozen,
            self.label_missing,
            self.other,
        ]
        .iter()
        .map(|&n| u64::from(n))
        .sum()
    }

    /// Reads `<prefix><reason>` counts, e.g. `expired` or `discarded_expired`.
    fn from_row(reader: &RowReader<'_>, prefix: &str) -> Self {
        let field = |reason: &str| reader.count(&format!("{}{}", prefix, reason));
        Self {
            expired: field("expired"),
            broken_vial: field("broken_vial"),
            vvm_change: field("vvm_change"),
            frozen: field("frozen"),
            label_missing: field("label_missing"),
            other: field("other"),
        }
    }
}

/// One item's stock movement for the month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Row")]
pub struct StockLedgerRow {
    /// Antigen, diluent or device name, e.g. "BCG".
    pub item: String,
    pub kind: LedgerItemKind,
    pub opening_balance: u32,
    pub received: u32,
    pub doses_opened: u32,
    /// Doses sent back to the ward or LGA store.
    pub returned: u32,
    pub stock_out: bool,
    pub discarded: DiscardReasons,
}

impl StockLedgerRow {
    pub fn antigen(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            kind: LedgerItemKind::Antigen,
            ..Self::default()
        }
    }

    /// Opening balance plus doses received.
    pub fn available(&self) -> u64 {
        u64::from(self.opening_balance) + u64::from(self.received)
    }

    /// Stock remaining at month end, never below zero.
    pub fn closing_balance(&self) -> u64 {
        self.available()
            .saturating_sub(u64::from(self.doses_opened))
            .saturating_sub(u64::from(self.returned))
            .saturating_sub(self.discarded.total())
    }

    pub fn is_antigen(&self) -> bool {
        self.kind == LedgerItemKind::Antigen
    }
}

impl From<Row> for StockLedgerRow {
    fn from(row: Row) -> Self {
        let reader = RowReader::new(&row);

        // Discards come either nested under "discarded" or as flat discarded_* columns.
        let discarded = match reader.object("discarded") {
            Some(nested) => DiscardReasons::from_row(&RowReader::new(nested), ""),
            None => DiscardReasons::from_row(&reader, "discarded_"),
        };

        Self {
            item: reader.text("item").unwrap_or_default(),
            kind: reader
                .text("kind")
                .map(|k| LedgerItemKind::from(k.as_str()))
                .unwrap_or_default(),
            opening_balance: reader.count("opening_balance"),
            received: reader.count("received"),
            doses_opened: reader.count("doses_opened"),
            returned: reader.count("returned"),
            stock_out: reader.flag("stock_out"),
            discarded,
        }
    }
}

/// One facility's vaccine stock ledger for one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Row")]
pub struct VaccineAccountabilityReport {
    pub phc_id: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub status: ReportStatus,
    pub rows: Vec<StockLedgerRow>,
}

impl VaccineAccountabilityReport {
    pub fn period(&self) -> String {
        period_label(self.year, self.month)
    }

    pub fn antigens(&self) -> impl Iterator<Item = &StockLedgerRow> {
        self.rows.iter().filter(|r| r.is_antigen())
    }

    /// Marks the report final. Submitted reports cannot be submitted again.
    pub fn submit(mut self) -> Result<Self, ReportError> {
        if self.status.is_submitted() {
            return Err(ReportError::AlreadySubmitted {
                kind: "Vaccine accountability",
                period: self.period(),
            });
        }
        self.status = ReportStatus::Submitted;
        Ok(self)
    }
}

impl From<Row> for VaccineAccountabilityReport {
    fn from(row: Row) -> Self {
        let reader = RowReader::new(&row);

        Self {
            phc_id: reader.text("phc_id"),
            year: reader.number("year").and_then(|y| i32::try_from(y).ok()),
            month: reader.number("month").filter(|m| (1..=12).contains(m)),
            status: ReportStatus::from_row(&reader),
            rows: reader
                .objects("rows")
                .map(|r| StockLedgerRow::from(r.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_with_defaults() {
        let report: VaccineAccountabilityReport = serde_json::from_value(json!({
            "phc_id": "phc-1",
            "year": 2024,
            "month": 6,
            "status": "submitted",
            "rows": [
                {"item": "BCG", "opening_balance": 40, "received": 20, "discarded": {"expired": 2}},
                {"item": "Diluent BCG", "kind": "diluent", "stock_out": true},
            ],
        }))
        .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].kind, LedgerItemKind::Antigen);
        assert_eq!(report.rows[0].discarded.total(), 2);
        assert_eq!(report.rows[1].kind, LedgerItemKind::Diluent);
        assert_eq!(report.antigens().count(), 1);
        assert!(report.status.is_submitted());
    }

    #[test]
    fn test_decode_is_lenient() {
        let report: VaccineAccountabilityReport = serde_json::from_value(json!({
            "phc_id": "phc-1",
            "year": "2024",
            "month": 6,
            "status": "Submitted",
            "rows": [
                {"item": "BCG", "opening_balance": "40", "received": null, "doses_opened": "x"},
                {
                    "item": "Penta",
                    "kind": "Antigen",
                    "opening_balance": 30,
                    "stock_out": "Yes",
                    "discarded_broken_vial": "2",
                },
                "not a row",
            ],
        }))
        .unwrap();

        assert!(report.status.is_submitted());
        assert_eq!(report.year, Some(2024));
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].opening_balance, 40);
        assert_eq!(report.rows[0].received, 0);
        assert_eq!(report.rows[0].doses_opened, 0);
        assert!(report.rows[1].stock_out);
        assert_eq!(report.rows[1].discarded.broken_vial, 2);
        assert_eq!(report.antigens().count(), 2);
    }

    #[test]
    fn test_closing_balance_saturates() {
        let mut row = StockLedgerRow::antigen("OPV");
        row.opening_balance = 10;
        row.received = 5;
        row.doses_opened = 12;
        row.discarded.broken_vial = 1;
        assert_eq!(row.closing_balance(), 2);

        row.doses_opened = 30;
        assert_eq!(row.closing_balance(), 0);
    }

    #[test]
    fn test_submit_rejects_resubmission() {
        let report = VaccineAccountabilityReport {
            status: ReportStatus::Submitted,
            year: Some(2024),
            month: Some(2),
            ..Default::default()
        };
        assert!(report.submit().is_err());
    }
}
