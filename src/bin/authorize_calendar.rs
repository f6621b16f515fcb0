use toll_reconciler::components::google_calendar::TokenManager;
use toll_reconciler::startup;

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;

    // Load configuration
    let config = startup::load_config()?;

    // Always run the browser flow, replacing whatever is cached
    let token_manager = TokenManager::new(&config);
    token_manager.authorize().await?;

    println!("Token successfully saved to {}!", config.token_path.display());

    Ok(())
}
