//! Mail relay configuration.
//!
//! The daily report is delivered through an external SMTP relay; the
//! relay settings come from the process environment:
//!
//! | Variable         | Meaning                        | Default          |
//! |------------------|--------------------------------|------------------|
//! | `EMAIL_ADDRESS`  | from/to address for the report | required         |
//! | `EMAIL_PASSWORD` | relay credential               | required         |
//! | `SMTP_SERVER`    | relay host                     | `smtp.gmail.com` |
//! | `SMTP_PORT`      | relay port (STARTTLS)          | `587`            |

use crate::error::ConfigError;

/// Default relay host when `SMTP_SERVER` is unset.
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";

/// Default relay port (STARTTLS) when `SMTP_PORT` is unset.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Mail relay settings for the daily report.
///
/// The report is addressed from and to the same operator address.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Operator address used as both sender and recipient.
    pub address: String,

    /// Credential presented to the relay.
    pub password: String,

    /// Relay host.
    pub smtp_server: String,

    /// Relay port; the transport upgrades the connection via STARTTLS.
    pub smtp_port: u16,
}

impl MailConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// The seam exists so tests can exercise the parsing without mutating
    /// process-wide environment state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = require(&lookup, "EMAIL_ADDRESS")?;
        let password = require(&lookup, "EMAIL_PASSWORD")?;
        let smtp_server =
            lookup("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string());
        let smtp_port = match lookup("SMTP_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "SMTP_PORT",
                value: raw,
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            address,
            password,
            smtp_server,
            smtp_port,
        })
    }
}

fn require<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar { name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn from_map(map: &HashMap<String, String>) -> Result<MailConfig, ConfigError> {
        MailConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn full_configuration_is_parsed() {
        let map = env(&[
            ("EMAIL_ADDRESS", "ops@example.com"),
            ("EMAIL_PASSWORD", "hunter2"),
            ("SMTP_SERVER", "relay.example.com"),
            ("SMTP_PORT", "2525"),
        ]);

        let config = from_map(&map).unwrap();
        assert_eq!(config.address, "ops@example.com");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.smtp_server, "relay.example.com");
        assert_eq!(config.smtp_port, 2525);
    }

    #[test]
    fn relay_defaults_apply() {
        let map = env(&[
            ("EMAIL_ADDRESS", "ops@example.com"),
            ("EMAIL_PASSWORD", "hunter2"),
        ]);

        let config = from_map(&map).unwrap();
        assert_eq!(config.smtp_server, DEFAULT_SMTP_SERVER);
        assert_eq!(config.smtp_port, DEFAULT_SMTP_PORT);
    }

    #[test]
    fn missing_address_is_an_error() {
        let map = env(&[("EMAIL_PASSWORD", "hunter2")]);

        let err = from_map(&map).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar {
                name: "EMAIL_ADDRESS"
            }
        ));
    }

    #[test]
    fn empty_password_counts_as_missing() {
        let map = env(&[
            ("EMAIL_ADDRESS", "ops@example.com"),
            ("EMAIL_PASSWORD", ""),
        ]);

        let err = from_map(&map).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar {
                name: "EMAIL_PASSWORD"
            }
        ));
    }

    #[test]
    fn unparseable_port_is_an_error() {
        let map = env(&[
            ("EMAIL_ADDRESS", "ops@example.com"),
            ("EMAIL_PASSWORD", "hunter2"),
            ("SMTP_PORT", "not-a-port"),
        ]);

        let err = from_map(&map).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "SMTP_PORT", .. }));
        assert!(err.to_string().contains("not-a-port"));
    }
}
