//! Vaccine stock accountability: doses used, wastage and stock-outs.

use super::percentage;
use crate::models::{StockLedgerRow, VaccineAccountabilityReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wastage metrics over antigen rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineWastage {
    pub total_doses_used: u64,
    /// Discarded doses over doses available (opening balance plus received).
    pub vaccine_wastage_rate: u32,
    pub stock_out_count: usize,
    /// Antigen doses left at month end across all rows.
    pub closing_stock: u64,
    /// Wastage rate per antigen.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub wastage_by_antigen: BTreeMap<String, u32>,
}

#[derive(Debug, Default)]
struct LedgerTally {
    opened: u64,
    discarded: u64,
    available: u64,
    closing: u64,
    stock_outs: usize,
    by_antigen: BTreeMap<String, (u64, u64)>,
}

impl LedgerTally {
    fn observe(&mut self, row: &StockLedgerRow) {
        let discarded = row.discarded.total();
        self.opened += u64::from(row.doses_opened);
        self.discarded += discarded;
        self.available += row.available();
        self.closing += row.closing_balance();
        if row.stock_out {
            self.stock_outs += 1;
        }
        let entry = self.by_antigen.entry(row.item.clone()).or_default();
        entry.0 += discarded;
        entry.1 += row.available();
    }

    fn finish(self) -> VaccineWastage {
        VaccineWastage {
            total_doses_used: self.opened,
            vaccine_wastage_rate: percentage(self.discarded, self.available),
            stock_out_count: self.stock_outs,
            closing_stock: self.closing,
            wastage_by_antigen: self
                .by_antigen
                .into_iter()
                .map(|(item, (discarded, available))| (item, percentage(discarded, available)))
                .collect(),
        }
    }
}

/// Wastage metrics for a single monthly report.
pub fn compute_vaccine_wastage(report: &VaccineAccountabilityReport) -> VaccineWastage {
    let mut tally = LedgerTally::default();
    for row in report.antigens() {
        tally.observe(row);
    }
    tally.finish()
}

/// Wastage metrics pooled across monthly reports. Drafts are skipped unless `include_drafts`.
pub fn rollup_vaccine_wastage<'a, I>(reports: I, include_drafts: bool) -> VaccineWastage
where
    I: IntoIterator<Item = &'a VaccineAccountabilityReport>,
{
    let mut tally = LedgerTally::default();
    for report in reports
        .into_iter()
        .filter(|r| include_drafts || r.status.is_submitted())
    {
        for row in report.antigens() {
            tally.observe(row);
        }
    }
    tally.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiscardReasons, LedgerItemKind, ReportStatus};

    fn row(item: &str, opening: u32, received: u32, opened: u32, discarded: u32) -> StockLedgerRow {
        StockLedgerRow {
            opening_balance: opening,
            received,
            doses_opened: opened,
            discarded: DiscardReasons {
                expired: discarded,
                ..DiscardReasons::default()
            },
            ..StockLedgerRow::antigen(item)
        }
    }

    #[test]
    fn test_wastage_rate() {
        let mut bcg = row("BCG", 100, 50, 80, 0);
        bcg.discarded = DiscardReasons {
            expired: 5,
            broken_vial: 4,
            vvm_change: 3,
            frozen: 2,
            label_missing: 1,
            other: 0,
        };
        let report = VaccineAccountabilityReport {
            rows: vec![bcg],
            ..Default::default()
        };

        let wastage = compute_vaccine_wastage(&report);

        assert_eq!(wastage.total_doses_used, 80);
        assert_eq!(wastage.vaccine_wastage_rate, 10);
        assert_eq!(wastage.wastage_by_antigen["BCG"], 10);
    }

    #[test]
    fn test_closing_stock_subtracts_returns() {
        let mut penta = row("Penta", 60, 20, 30, 5);
        penta.returned = 10;
        let mut diluent = row("Diluent", 40, 0, 0, 0);
        diluent.kind = LedgerItemKind::Diluent;
        let report = VaccineAccountabilityReport {
            rows: vec![penta, diluent, row("OPV", 5, 0, 9, 0)],
            ..Default::default()
        };

        assert_eq!(compute_vaccine_wastage(&report).closing_stock, 35);
    }

    #[test]
    fn test_zero_stock_gives_zero_rate() {
        let report = VaccineAccountabilityReport {
            rows: vec![row("OPV", 0, 0, 0, 3)],
            ..Default::default()
        };
        assert_eq!(compute_vaccine_wastage(&report).vaccine_wastage_rate, 0);
        assert_eq!(
            compute_vaccine_wastage(&VaccineAccountabilityReport::default()),
            VaccineWastage::default()
        );
    }

    #[test]
    fn test_stock_outs_count_antigens_only() {
        let mut measles = row("Measles", 10, 0, 10, 0);
        measles.stock_out = true;
        let mut syringes = row("AD syringes", 0, 0, 0, 0);
        syringes.kind = LedgerItemKind::Device;
        syringes.stock_out = true;
        syringes.doses_opened = 99;

        let report = VaccineAccountabilityReport {
            rows: vec![measles, syringes, row("BCG", 20, 0, 5, 0)],
            ..Default::default()
        };
        let wastage = compute_vaccine_wastage(&report);

        assert_eq!(wastage.stock_out_count, 1);
        assert_eq!(wastage.total_doses_used, 15);
    }

    #[test]
    fn test_rollup_pools_denominators() {
        let january = VaccineAccountabilityReport {
            status: ReportStatus::Submitted,
            rows: vec![row("BCG", 100, 0, 50, 10)],
            ..Default::default()
        };
        let february = VaccineAccountabilityReport {
            status: ReportStatus::Submitted,
            rows: vec![row("BCG", 50, 50, 60, 0)],
            ..Default::default()
        };
        let draft = VaccineAccountabilityReport {
            rows: vec![row("BCG", 10, 0, 0, 10)],
            ..Default::default()
        };
        let reports = [january, february, draft];

        let wastage = rollup_vaccine_wastage(&reports, false);

        assert_eq!(wastage.total_doses_used, 110);
        assert_eq!(wastage.vaccine_wastage_rate, 5);
        assert_eq!(rollup_vaccine_wastage(&reports, true).vaccine_wastage_rate, 10);
    }
}
