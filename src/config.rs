//! Server configuration from environment variables.

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Fixed RNG seed for reproducible games, unset means random
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("SUSWORD_BIND_ADDR")
            .ok()
            .and_then(|addr| {
                let trimmed = addr.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| "0.0.0.0:4616".to_string());

        let seed = std::env::var("SUSWORD_SEED")
            .ok()
            .and_then(|s| s.trim().parse().ok());

        Self { bind_addr, seed }
    }
}
