use super::{ReconciledReport, ReportRow};
use crate::error::TollResult;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::info;

/// Column titles of the spreadsheet and console table
pub const HEADERS: [&str; 3] = ["Date", "Location", "Amount"];

const SHEET_NAME: &str = "Tolls";

#[derive(Tabled)]
struct DisplayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

impl From<ReportRow> for DisplayRow {
    fn from(row: ReportRow) -> Self {
        Self {
            date: row.date,
            location: row.location,
            amount: format!("{:.2}", row.amount),
        }
    }
}

/// Render the report as a console table
pub fn render_table(report: &ReconciledReport) -> String {
    let rows: Vec<DisplayRow> = report.rows().into_iter().map(DisplayRow::from).collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string()
}

/// Write the report as a one-sheet workbook, replacing any existing file
pub fn write_xlsx(report: &ReconciledReport, path: &Path) -> TollResult<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let money = Format::new().set_num_format("0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (idx, row) in report.rows().iter().enumerate() {
        let line = idx as u32 + 1;
        worksheet.write_string(line, 0, &row.date)?;
        worksheet.write_string(line, 1, &row.location)?;
        worksheet.write_number_with_format(
            line,
            2,
            row.amount.to_f64().unwrap_or_default(),
            &money,
        )?;
    }

    worksheet.set_column_width(0, 12)?;
    worksheet.set_column_width(1, 32)?;

    workbook.save(path)?;
    info!("Wrote {} rows to {}", report.records.len() + 1, path.display());
    Ok(())
}
