//! Server configuration
//!
//! Values come from command-line flags, falling back to environment
//! variables (a `.env` file in the working directory is loaded first).

use clap::Parser;

/// Runs the MovR web server
#[derive(Debug, Clone, Parser)]
#[command(name = "movr-api", version, about)]
pub struct Config {
    /// Port where the server listens for requests
    #[arg(long, env = "PORT", default_value_t = 36257)]
    pub port: u16,

    /// CockroachDB / PostgreSQL connection string
    #[arg(long = "url", env = "DB_URI")]
    pub database_url: String,

    /// Maximum number of records to query when no limit is specified
    #[arg(
        long,
        env = "MAX_RECORDS",
        default_value_t = 20,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub max_records: i64,

    /// Size of the database connection pool
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Apply the bundled schema migrations before serving
    #[arg(long)]
    pub init_schema: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config =
            Config::try_parse_from(["movr-api", "--url", "postgres://root@localhost:26257/movr"])
                .unwrap();

        assert_eq!(config.port, 36257);
        assert_eq!(config.max_records, 20);
        assert_eq!(config.max_connections, 5);
        assert!(!config.init_schema);
        assert_eq!(config.database_url, "postgres://root@localhost:26257/movr");
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "movr-api",
            "--url",
            "postgres://localhost/movr",
            "--port",
            "8080",
            "--max-records",
            "5",
            "--init-schema",
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.max_records, 5);
        assert!(config.init_schema);
    }

    #[test]
    fn max_records_must_be_positive() {
        let result = Config::try_parse_from([
            "movr-api",
            "--url",
            "postgres://localhost/movr",
            "--max-records",
            "0",
        ]);

        assert!(result.is_err());
    }
}
