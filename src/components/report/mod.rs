//! Reconciling toll charges against work days and presenting the result.

mod export;

pub use export::{render_table, write_xlsx, HEADERS};

use crate::components::toll_portal::TollRecord;
use crate::components::workdays::WorkdaySet;
use rust_decimal::Decimal;

/// Label of the synthetic trailing row
pub const TOTAL_LABEL: &str = "Total";

/// Charges made on work days, plus their total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledReport {
    pub records: Vec<TollRecord>,
    pub total: Decimal,
}

/// One output row, the trailing total included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub date: String,
    pub location: String,
    pub amount: Decimal,
}

impl ReconciledReport {
    /// Rows as written and printed, ending with the total row
    pub fn rows(&self) -> Vec<ReportRow> {
        self.records
            .iter()
            .map(|record| ReportRow {
                date: record.date_key(),
                location: record.location.clone(),
                amount: record.amount,
            })
            .chain(std::iter::once(ReportRow {
                date: String::new(),
                location: TOTAL_LABEL.to_string(),
                amount: self.total,
            }))
            .collect()
    }
}

/// Keep the charges dated on a work day, in their existing order
pub fn reconcile(records: Vec<TollRecord>, workdays: &WorkdaySet) -> ReconciledReport {
    let records: Vec<TollRecord> = records
        .into_iter()
        .filter(|record| workdays.contains(&record.date_key()))
        .collect();
    let total = records.iter().map(|record| record.amount).sum();

    ReconciledReport { records, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(day: u32, location: &str, amount: Decimal) -> TollRecord {
        TollRecord {
            date: NaiveDate::from_ymd_opt(2023, 3, day).unwrap(),
            location: location.to_string(),
            amount,
        }
    }

    fn workdays(days: &[&str]) -> WorkdaySet {
        days.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_reconcile_scenario() {
        let records = vec![
            record(1, "Bedford", dec!(1.00)),
            record(2, "Bedford", dec!(2.50)),
            record(9, "Hooksett", dec!(0.75)),
        ];

        let report = reconcile(records, &workdays(&["2023-03-02", "2023-03-09"]));

        assert_eq!(
            report.rows(),
            vec![
                ReportRow {
                    date: "2023-03-02".to_string(),
                    location: "Bedford".to_string(),
                    amount: dec!(2.50),
                },
                ReportRow {
                    date: "2023-03-09".to_string(),
                    location: "Hooksett".to_string(),
                    amount: dec!(0.75),
                },
                ReportRow {
                    date: String::new(),
                    location: TOTAL_LABEL.to_string(),
                    amount: dec!(3.25),
                },
            ]
        );
    }

    #[test]
    fn test_reconcile_keeps_order_and_duplicates() {
        let records = vec![
            record(2, "Bedford", dec!(2.50)),
            record(2, "Hooksett", dec!(1.00)),
            record(3, "Merrimack", dec!(0.50)),
            record(4, "Bedford", dec!(2.50)),
        ];

        let report = reconcile(records, &workdays(&["2023-03-02", "2023-03-04"]));
        let locations: Vec<_> = report.records.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["Bedford", "Hooksett", "Bedford"]);
        assert_eq!(report.total, dec!(6.00));
    }

    #[test]
    fn test_total_is_exact() {
        // Ten dimes sum to exactly one dollar
        let records: Vec<_> = (1..=10).map(|d| record(d, "Plaza", dec!(0.10))).collect();
        let all_days: Vec<String> = (1..=10).map(|d| format!("2023-03-{:02}", d)).collect();
        let days: Vec<&str> = all_days.iter().map(String::as_str).collect();

        let report = reconcile(records, &workdays(&days));
        assert_eq!(report.total, dec!(1.00));
    }

    #[test]
    fn test_no_matches_still_has_total_row() {
        let report = reconcile(vec![record(1, "Bedford", dec!(1.00))], &workdays(&["2023-03-02"]));
        assert!(report.records.is_empty());
        assert_eq!(report.total, Decimal::ZERO);
        assert_eq!(report.rows().len(), 1);
    }
}
