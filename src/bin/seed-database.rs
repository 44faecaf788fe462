//! Replaces the portfolio content (projects, experience, expertise) with the
//! fixed seed set. Contact messages are left untouched.

use mockable::DefaultClock;
use portfolio_api::db::{DbConfig, DocumentStore, PgDocumentStore, StoreError};
use portfolio_api::logging::{self, LogConfig};
use portfolio_api::seed::{seed_database, SeedReport};

async fn seed() -> Result<SeedReport, StoreError> {
    let store = PgDocumentStore::connect_lazy(&DbConfig::default())?;
    let result = seed_database(&store, &DefaultClock).await;
    store.close().await;
    result
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let log_guards = match logging::init(&LogConfig::from_env()) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            std::process::exit(1);
        }
    };

    match seed().await {
        Ok(report) => {
            println!("Projects            : {}", report.verified.projects);
            println!("Experiences         : {}", report.verified.experiences);
            println!("Technical expertise : {}", report.verified.technical_expertise);
        }
        Err(e) => {
            tracing::error!(error = %e, "Error seeding database");
            eprintln!("Error seeding database: {}", e);
            // process::exit skips destructors; flush the log writers first.
            drop(log_guards);
            std::process::exit(1);
        }
    }
}
