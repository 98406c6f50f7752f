use rentra_pricing::PricingConfig;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Suggested deposit, percentage of the locked quote total.
    #[serde(default = "default_deposit_rate")]
    pub deposit_rate_pct: i64,

    /// Named payment provider; only the mock exists today.
    #[serde(default)]
    pub payment_provider: Option<String>,

    /// Seed a demo fleet when the car store starts empty.
    #[serde(default)]
    pub seed_demo_fleet: bool,
}

fn default_deposit_rate() -> i64 {
    30
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific overrides, both optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `RENTRA_SERVER__PORT=9000` overrides server.port
            .add_source(config::Environment::with_prefix("RENTRA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
