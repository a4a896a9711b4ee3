use clap::Parser;

pub const DEFAULT_RUN_ADDRESS: &str = "localhost:8888";
pub const DEFAULT_DATABASE_URI: &str = "sqlite://data/gophermart.db";
pub const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8080";

/// Runtime configuration: three knobs, each a flag with an environment-variable override.
#[derive(Debug, Clone, Parser)]
#[command(name = "gophermart", about = "Loyalty points accrual service", version)]
pub struct ServerConfig {
    /// Address and port the HTTP server listens on.
    #[arg(short = 'a', long = "address", env = "RUN_ADDRESS", default_value = DEFAULT_RUN_ADDRESS)]
    pub run_address: String,

    /// Database data source name.
    #[arg(short = 'd', long = "database", env = "DATABASE_URI", default_value = DEFAULT_DATABASE_URI)]
    pub database_uri: String,

    /// Base URL of the external accrual service.
    #[arg(short = 'r', long = "accrual", env = "ACCRUAL_SYSTEM_ADDRESS", default_value = DEFAULT_ACCRUAL_ADDRESS)]
    pub accrual_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            run_address: DEFAULT_RUN_ADDRESS.to_string(),
            database_uri: DEFAULT_DATABASE_URI.to_string(),
            accrual_address: DEFAULT_ACCRUAL_ADDRESS.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::parse_from([
            "gophermart",
            "-a",
            "0.0.0.0:9999",
            "-d",
            "sqlite://elsewhere.db",
            "-r",
            "http://accrual:8080",
        ]);
        assert_eq!(config.run_address, "0.0.0.0:9999");
        assert_eq!(config.database_uri, "sqlite://elsewhere.db");
        assert_eq!(config.accrual_address, "http://accrual:8080");
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let config = ServerConfig::parse_from(["gophermart"]);
        assert_eq!(config.run_address, DEFAULT_RUN_ADDRESS);
        assert_eq!(config.database_uri, DEFAULT_DATABASE_URI);
        assert_eq!(config.accrual_address, DEFAULT_ACCRUAL_ADDRESS);
    }
}
