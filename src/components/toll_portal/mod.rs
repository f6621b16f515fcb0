//! Toll portal statement: scraping the table and normalizing its rows.

pub mod scrape;
pub mod statement;

pub use self::scrape::{PortalScraper, SavedStatement};
pub use self::statement::{normalize_statement, PrefixRules, TollRecord};
