//! Configuration loading and representation.
//!
//! Everything comes from environment variables:
//!
//! | variable                 | default        | notes                                  |
//! |--------------------------|----------------|----------------------------------------|
//! | `BIND_ADDR`              | `0.0.0.0:8080` | HTTP listen address                    |
//! | `USE_PERSISTENT_STORES`  | `false`        | `true` reads from Postgres             |
//! | `DATABASE_URL`           |                | required when persistent               |
//! | `DB_MAX_CONNECTIONS`     | `10`           | pool size                              |
//! | `REPORT_CURRENCY`        | `USD`          | three-letter code attached to reports  |
//! | `COMMISSION_ATTRIBUTION` | `product_registrant` | or `invoice_salesperson`         |

use std::net::SocketAddr;

use thiserror::Error;

use tallyerp_core::CurrencyCode;
use tallyerp_reporting::AttributionPolicy;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is required when USE_PERSISTENT_STORES=true")]
    Missing { var: &'static str },

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Where ledger rows are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// Empty in-memory ledger (development and tests).
    InMemory,
    Postgres { database_url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub persistence: Persistence,
    pub currency: CurrencyCode,
    pub attribution: AttributionPolicy,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let persistent = match get("USE_PERSISTENT_STORES") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                var: "USE_PERSISTENT_STORES",
                reason: format!("expected true/false, got {v:?}"),
            })?,
        };

        let persistence = if persistent {
            let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing { var: "DATABASE_URL" })?;
            let max_connections = match get("DB_MAX_CONNECTIONS") {
                None => DEFAULT_MAX_CONNECTIONS,
                Some(v) => v
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConfigError::Invalid {
                        var: "DB_MAX_CONNECTIONS",
                        reason: format!("expected a positive integer, got {v:?}"),
                    })?,
            };
            Persistence::Postgres {
                database_url,
                max_connections,
            }
        } else {
            Persistence::InMemory
        };

        let currency = match get("REPORT_CURRENCY") {
            None => CurrencyCode::default(),
            Some(v) => v.parse().map_err(|e: tallyerp_core::DomainError| ConfigError::Invalid {
                var: "REPORT_CURRENCY",
                reason: e.to_string(),
            })?,
        };

        let attribution = match get("COMMISSION_ATTRIBUTION") {
            None => AttributionPolicy::default(),
            Some(v) => v.parse().map_err(|e: tallyerp_core::DomainError| ConfigError::Invalid {
                var: "COMMISSION_ATTRIBUTION",
                reason: e.to_string(),
            })?,
        };

        Ok(Self {
            bind_addr,
            persistence,
            currency,
            attribution,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_in_memory_usd() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.persistence, Persistence::InMemory);
        assert_eq!(cfg.currency.as_str(), "USD");
        assert_eq!(cfg.attribution, AttributionPolicy::ProductRegistrant);
    }

    #[test]
    fn persistent_stores_need_a_database_url() {
        assert_eq!(
            config(&[("USE_PERSISTENT_STORES", "true")]),
            Err(ConfigError::Missing { var: "DATABASE_URL" })
        );

        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "TRUE"),
            ("DATABASE_URL", "postgres://localhost/tally"),
            ("DB_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(
            cfg.persistence,
            Persistence::Postgres {
                database_url: "postgres://localhost/tally".to_string(),
                max_connections: 4,
            }
        );
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("REPORT_CURRENCY", "euro")]),
            Err(ConfigError::Invalid { var: "REPORT_CURRENCY", .. })
        ));
        assert!(matches!(
            config(&[
                ("USE_PERSISTENT_STORES", "true"),
                ("DATABASE_URL", "postgres://x"),
                ("DB_MAX_CONNECTIONS", "0"),
            ]),
            Err(ConfigError::Invalid { var: "DB_MAX_CONNECTIONS", .. })
        ));
    }

    #[test]
    fn lowercase_currency_is_normalized() {
        assert_eq!(config(&[("REPORT_CURRENCY", "eur")]).unwrap().currency.as_str(), "EUR");
    }
}
