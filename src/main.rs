use toll_reconciler::components::google_calendar::GoogleCalendarClient;
use toll_reconciler::pipeline;
use toll_reconciler::startup;
use toll_reconciler::utils::time::Period;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    // Load configuration
    let config = startup::load_config()?;

    let month = startup::prompt_month()?;
    let period = Period::new(config.year, month)?;
    info!(year = period.year(), month = period.month(), "Reconciling tolls");

    let calendar = GoogleCalendarClient::new(&config);
    let statement = pipeline::statement_source(&config)?;

    pipeline::run(&config, period, &calendar, statement.as_ref()).await?;
    Ok(())
}
