//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every template so bad routes fail at load, not at first request
//! - Check referential integrity (alias callbacks name registered aliases)
//! - Detect duplicate route templates
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::{Callback, CompileError, RouteEntry};

/// A single semantic problem in a config.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("router.max_segments must be greater than zero")]
    ZeroSegmentLimit,

    #[error("router.{0} callback is empty")]
    EmptySpecialCallback(&'static str),

    #[error("route #{index} has an empty callback")]
    EmptyCallback { index: usize },

    #[error("route #{index} ('{path}'): {source}")]
    Template {
        index: usize,
        path: String,
        #[source]
        source: CompileError,
    },

    #[error("route #{index} duplicates template '{template}'")]
    DuplicateRoute { index: usize, template: String },

    #[error("callback '@{alias}' refers to an unknown alias")]
    UnknownAlias { alias: String },

    #[error("alias '{0}' must point at a function or Class::method, not another alias")]
    NestedAlias(String),
}

/// Check a config for semantic errors.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.router.max_segments == 0 {
        errors.push(ValidationError::ZeroSegmentLimit);
    }

    let mut callbacks = Vec::new();
    for (slot, text) in [("home", &config.router.home), ("error", &config.router.error)] {
        if text.trim().is_empty() {
            errors.push(ValidationError::EmptySpecialCallback(slot));
        } else {
            callbacks.push(Callback::parse(text));
        }
    }

    let compiler = config.router.compiler();
    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.callback.trim().is_empty() {
            errors.push(ValidationError::EmptyCallback { index });
        } else {
            callbacks.push(Callback::parse(&route.callback));
        }

        if !route.path.is_empty() && route.path.trim_matches('/').is_empty() {
            continue;
        }
        if config.router.max_segments == 0 {
            continue;
        }
        match RouteEntry::compile(&route.path, Callback::parse(&route.callback), &compiler) {
            Ok(entry) => {
                let template = entry.template().to_ascii_lowercase();
                if !seen.insert(template.clone()) {
                    errors.push(ValidationError::DuplicateRoute { index, template });
                }
            }
            Err(source) => errors.push(ValidationError::Template {
                index,
                path: route.path.clone(),
                source,
            }),
        }
    }

    for (name, target) in &config.aliases {
        if Callback::parse(target).is_alias() {
            errors.push(ValidationError::NestedAlias(name.clone()));
        }
    }

    for callback in callbacks {
        if let Callback::Alias(alias) = callback {
            if !config.aliases.contains_key(&alias) {
                errors.push(ValidationError::UnknownAlias { alias });
            }
        }
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
    use crate::config::schema::RouteConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RouterConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.router.error = " ".into();
        config.routes.push(RouteConfig::new("user/$id:uuid", "echo"));
        config.routes.push(RouteConfig::new("blog/$slug", ""));
        config.routes.push(RouteConfig::new("/Blog/$slug/", "@post"));
        config.aliases.insert("loop".into(), "@post".into());

        let errors = validate_config(&config).unwrap_err();
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();

        assert_eq!(errors.len(), 7, "{:#?}", messages);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidAddress { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::EmptySpecialCallback("error"))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Template { index: 0, .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::EmptyCallback { index: 1 })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateRoute { index: 2, .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::NestedAlias(n) if n == "loop")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnknownAlias { alias } if alias == "post")));
    }

    #[test]
    fn test_home_template_is_not_compiled() {
        let mut config = RouterConfig::default();
        config.routes.push(RouteConfig::new("/", "Pages::home"));
        assert!(validate_config(&config).is_ok());
    }
}
