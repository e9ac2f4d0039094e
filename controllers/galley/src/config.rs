//! Controller configuration
//!
//! Read from environment variables:
//!
//! | Variable             | Default                  |
//! |----------------------|--------------------------|
//! | `WATCH_NAMESPACE`    | all namespaces           |
//! | `RESYNC_PERIOD_SECS` | `0` (no periodic resync) |
//! | `RESOURCE_GROUP`     | `galley.microscaler.io`  |
//! | `RESOURCE_VERSION`   | `v1alpha1`               |
//! | `RESOURCE_KIND`      | `ProducerService`        |
//! | `RESOURCE_PLURAL`    | `producerservices`       |
//! | `RESOURCE_NAMESPACED`| `true`                   |
//! | `LOG_FORMAT`         | `text` (or `json`)       |

use crate::error::ControllerError;
use resource::ResourceSpec;
use std::env;
use std::time::Duration;

/// Longest accepted `RESYNC_PERIOD_SECS` (30 days)
pub const MAX_RESYNC_SECS: u64 = 30 * 24 * 60 * 60;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Controller configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace to watch; `None` watches all namespaces
    pub namespace: Option<String>,
    /// Periodic re-announcement of known objects; zero disables it
    pub resync: Duration,
    /// Resource kind to watch
    pub resource: ResourceSpec,
    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let resync = match var("RESYNC_PERIOD_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ControllerError::InvalidConfig(format!(
                        "RESYNC_PERIOD_SECS must be a whole number of seconds, got {:?}",
                        raw
                    ))
                })?;
                if secs > MAX_RESYNC_SECS {
                    return Err(ControllerError::InvalidConfig(format!(
                        "RESYNC_PERIOD_SECS must be at most {}, got {}",
                        MAX_RESYNC_SECS, secs
                    )));
                }
                Duration::from_secs(secs)
            }
            None => Duration::ZERO,
        };

        let namespaced = match var("RESOURCE_NAMESPACED").as_deref() {
            None | Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(ControllerError::InvalidConfig(format!(
                    "RESOURCE_NAMESPACED must be true or false, got {:?}",
                    other
                )));
            }
        };

        let default = ResourceSpec::producer_service();
        let resource = ResourceSpec::new(
            &var("RESOURCE_GROUP").unwrap_or(default.group),
            &var("RESOURCE_VERSION").unwrap_or(default.version),
            &var("RESOURCE_KIND").unwrap_or_else(|| default.kind.to_string()),
            &var("RESOURCE_PLURAL").unwrap_or(default.plural),
            namespaced,
        );

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ControllerError::InvalidConfig(format!(
                    "LOG_FORMAT must be text or json, got {:?}",
                    other
                )));
            }
        };

        Ok(Self {
            namespace: var("WATCH_NAMESPACE"),
            resync,
            resource,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ControllerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.namespace, None);
        assert_eq!(config.resync, Duration::ZERO);
        assert_eq!(config.resource, ResourceSpec::producer_service());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("WATCH_NAMESPACE", "mesh"),
            ("RESYNC_PERIOD_SECS", "300"),
            ("RESOURCE_GROUP", "example.io"),
            ("RESOURCE_VERSION", "v1"),
            ("RESOURCE_KIND", "Widget"),
            ("RESOURCE_PLURAL", "widgets"),
            ("RESOURCE_NAMESPACED", "false"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.namespace.as_deref(), Some("mesh"));
        assert_eq!(config.resync, Duration::from_secs(300));
        assert_eq!(
            config.resource,
            ResourceSpec::new("example.io", "v1", "Widget", "widgets", false)
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_namespace_means_all() {
        let config = load(&[("WATCH_NAMESPACE", "  ")]).unwrap();
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn test_invalid_values() {
        for vars in [
            [("RESYNC_PERIOD_SECS", "soon")],
            [("RESYNC_PERIOD_SECS", "-5")],
            [("RESYNC_PERIOD_SECS", "18446744073709551615")],
            [("RESOURCE_NAMESPACED", "maybe")],
            [("LOG_FORMAT", "xml")],
        ] {
            assert!(matches!(load(&vars), Err(ControllerError::InvalidConfig(_))), "{vars:?}");
        }
    }

    #[test]
    fn test_resync_upper_bound() {
        let max = MAX_RESYNC_SECS.to_string();
        let config = load(&[("RESYNC_PERIOD_SECS", max.as_str())]).unwrap();
        assert_eq!(config.resync, Duration::from_secs(MAX_RESYNC_SECS));

        let over = (MAX_RESYNC_SECS + 1).to_string();
        assert!(matches!(
            load(&[("RESYNC_PERIOD_SECS", over.as_str())]),
            Err(ControllerError::InvalidConfig(_))
        ));
    }
}
