//! One reconciliation run: work days, statement, report.

use crate::components::report::{reconcile, render_table, write_xlsx, ReconciledReport};
use crate::components::toll_portal::{normalize_statement, PortalScraper, SavedStatement};
use crate::components::workdays::{extract_workdays, WorkdaySet};
use crate::components::{EventSource, StatementSource};
use crate::config::Config;
use crate::error::TollResult;
use crate::utils::time::Period;
use std::path::Path;
use tracing::info;

/// Statement source picked by configuration: a saved file or the live portal
pub fn statement_source(config: &Config) -> TollResult<Box<dyn StatementSource>> {
    match &config.statement_html {
        Some(path) => Ok(Box::new(SavedStatement::new(path.clone()))),
        None => Ok(Box::new(PortalScraper::from_config(config)?)),
    }
}

/// Work days of the period according to the calendar
pub async fn collect_workdays(
    events: &dyn EventSource,
    config: &Config,
    period: Period,
) -> TollResult<WorkdaySet> {
    println!("Getting a list of worked days from Google Calendar...");

    let (start, end) = period.utc_bounds();
    let events = events.list_events(&config.calendar_id, start, end).await?;
    info!(count = events.len(), "Fetched calendar events");

    let workdays = extract_workdays(&events, &config.workday_keyword)?;
    println!("Success! {} work days were found.", workdays.len());
    Ok(workdays)
}

/// Fetch the statement markup, keeping a copy when asked to
pub async fn fetch_statement(
    source: &dyn StatementSource,
    save_to: Option<&Path>,
) -> TollResult<String> {
    let html = source.fetch_statement_table_html().await?;

    if let Some(path) = save_to {
        tokio::fs::write(path, &html).await?;
        info!("Saved statement markup to {}", path.display());
    }

    Ok(html)
}

/// Run the whole reconciliation and write the report
pub async fn run(
    config: &Config,
    period: Period,
    events: &dyn EventSource,
    statement: &dyn StatementSource,
) -> TollResult<ReconciledReport> {
    let workdays = collect_workdays(events, config, period).await?;

    println!();
    for day in &workdays {
        println!("{}", day);
    }
    println!();

    let html = fetch_statement(statement, config.save_statement_html.as_deref()).await?;
    let records = normalize_statement(&html, period, &config.prefix_rules())?;
    info!(count = records.len(), "Normalized statement rows");

    let report = reconcile(records, &workdays);
    write_xlsx(&report, &config.output_path)?;
    println!("{}", render_table(&report));

    Ok(report)
}
