use std::path::PathBuf;

/// Logging settings resolved from `ENVIRONMENT`, `LOG_LEVEL` and `LOG_DIR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub environment: String,
    pub level: String,
    pub directory: PathBuf,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());
        let level = lookup("LOG_LEVEL").unwrap_or_else(|| {
            if environment == "production" {
                "info".to_string()
            } else {
                "debug".to_string()
            }
        });
        let directory = lookup("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("logs"));

        Self {
            environment,
            level,
            directory,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Fallback directive used when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> String {
        format!(
            "portfolio_api={},tower_http=debug,axum=debug,sqlx=warn",
            self.level
        )
    }
}
