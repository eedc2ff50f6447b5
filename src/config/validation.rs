//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (access config references a known upstream)
//! - Validate value ranges (timeouts > 0, addresses parseable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "upstreams[0].base_url").
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".into(),
            message: format!("not a valid socket address: {}", config.listener.bind_address),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for (i, upstream) in config.upstreams.iter().enumerate() {
        if upstream.name.is_empty() {
            errors.push(ValidationError {
                field: format!("upstreams[{i}].name"),
                message: "upstream name must not be empty".into(),
            });
        } else if !seen.insert(upstream.name.clone()) {
            errors.push(ValidationError {
                field: format!("upstreams[{i}].name"),
                message: format!("duplicate upstream name: {}", upstream.name),
            });
        }
        if Url::parse(&upstream.base_url).is_err() {
            errors.push(ValidationError {
                field: format!("upstreams[{i}].base_url"),
                message: format!("not a valid URL: {}", upstream.base_url),
            });
        }
    }

    if !config.upstreams.is_empty() && config.upstream(&config.access.service).is_none() {
        errors.push(ValidationError {
            field: "access.service".into(),
            message: format!("references unknown upstream: {}", config.access.service),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs".into(),
            message: "request timeout must be greater than zero".into(),
        });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.connect_secs".into(),
            message: "connect timeout must be greater than zero".into(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address".into(),
            message: format!(
                "not a valid socket address: {}",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UpstreamConfig;

    fn base_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.upstreams.push(UpstreamConfig {
            name: "platform".into(),
            base_url: "http://127.0.0.1:9000".into(),
        });
        config.upstreams.push(UpstreamConfig {
            name: "access".into(),
            base_url: "http://127.0.0.1:9001".into(),
        });
        config
    }

    #[test]
    fn default_with_upstreams_is_valid() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn rejects_bad_base_url() {
        let mut config = base_config();
        config.upstreams[0].base_url = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "upstreams[0].base_url"));
    }

    #[test]
    fn rejects_duplicate_upstream_names() {
        let mut config = base_config();
        config.upstreams[1].name = "platform".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
        // "access" upstream no longer exists, so the reference check fires too.
        assert!(errors.iter().any(|e| e.field == "access.service"));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let mut config = base_config();
        config.timeouts.request_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = base_config();
        config.listener.bind_address = "nope".into();
        config.timeouts.connect_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
