//! Portfolio API - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = portfolio_api::run().await {
        eprintln!("portfolio-api failed: {e}");
        tracing::error!(error = %e, "Server terminated with error");
        std::process::exit(1);
    }
}
