use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LODGE_ENV";
const CONFIG_DIR_ENV: &str = "LODGE_CONFIG_DIR";
const ENV_PREFIX: &str = "LODGE";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub bookings: BookingSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay
    /// and `LODGE__SECTION__KEY` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment: Environment = std::env::var(ENV_VAR_NAME)
            .unwrap_or_else(|_| DEFAULT_ENV.to_string())
            .parse()?;

        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, environment)
    }

    /// Load configuration from an explicit directory and environment.
    pub fn load_from(config_dir: &Path, environment: Environment) -> anyhow::Result<Self> {
        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment.as_str()));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // The selected environment wins over anything written in the files.
        settings.environment = environment;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is unset
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            filter: Self::default_filter(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings for the bookings module.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingSettings {
    /// Hold a service-wide gate across capacity check and write.
    #[serde(default = "BookingSettings::default_serialize_writes")]
    pub serialize_writes: bool,
    /// Records loaded into the in-memory stores at startup.
    #[serde(default)]
    pub seed: SeedSettings,
}

impl BookingSettings {
    fn default_serialize_writes() -> bool {
        true
    }
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            serialize_writes: Self::default_serialize_writes(),
            seed: SeedSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SeedSettings {
    #[serde(default)]
    pub rooms: Vec<RoomSeed>,
    #[serde(default)]
    pub ticket_types: Vec<TicketTypeSeed>,
    #[serde(default)]
    pub tickets: Vec<TicketSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomSeed {
    pub id: i64,
    pub hotel_id: i64,
    pub name: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketTypeSeed {
    pub id: i64,
    pub name: String,
    /// Price in cents
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub is_remote: bool,
    #[serde(default)]
    pub includes_hotel: bool,
}

/// An enrolled user holding a ticket. `status` is `RESERVED` or `PAID`.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketSeed {
    pub user_id: i64,
    pub ticket_type_id: i64,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn bookings_serialize_writes_by_default() {
        let settings = Settings::default();
        assert!(settings.bookings.serialize_writes);
        assert!(settings.bookings.seed.rooms.is_empty());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = "qa".parse::<Environment>().unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }

    #[test]
    fn missing_config_dir_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("lodge-settings-does-not-exist");
        let settings = Settings::load_from(&dir, Environment::Staging).unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn seed_section_deserializes_from_toml() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [bookings]
                serialize_writes = false

                [[bookings.seed.rooms]]
                id = 1
                hotel_id = 10
                name = "101"
                capacity = 2

                [[bookings.seed.ticket_types]]
                id = 1
                name = "Presencial + Hotel"
                price = 60000
                includes_hotel = true

                [[bookings.seed.tickets]]
                user_id = 7
                ticket_type_id = 1
                status = "PAID"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let settings: Settings = cfg.try_deserialize().unwrap();

        assert!(!settings.bookings.serialize_writes);
        assert_eq!(settings.bookings.seed.rooms[0].capacity, 2);
        assert!(settings.bookings.seed.ticket_types[0].includes_hotel);
        assert!(!settings.bookings.seed.ticket_types[0].is_remote);
        assert_eq!(settings.bookings.seed.tickets[0].status, "PAID");
    }
}
