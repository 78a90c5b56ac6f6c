//! Configuration validation.
//!
//! Serde handles the syntactic layer; this module checks semantics:
//! routes must reference declared origins, TTL bounds must be ordered,
//! prefixes and methods must be well-formed. All errors are collected
//! and reported together rather than failing on the first.

use std::collections::HashSet;

use axum::http::Method;
use thiserror::Error;
use url::Url;

use crate::config::schema::{CachePolicyConfig, GatewayConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate origin name: {0}")]
    DuplicateOrigin(String),

    #[error("origin {name}: invalid base_url {url}")]
    InvalidOriginUrl { name: String, url: String },

    #[error("origin {0}: timeout_secs must be greater than zero")]
    ZeroOriginTimeout(String),

    #[error("route {route}: unknown origin {origin}")]
    UnknownOrigin { route: String, origin: String },

    #[error("route {0}: path_prefix must start with '/'")]
    BadPathPrefix(String),

    #[error("route {route}: invalid method {method}")]
    BadMethod { route: String, method: String },

    #[error("{scope}: TTL bounds must satisfy min <= default <= max")]
    BadTtlBounds { scope: String },

    #[error("no routes configured")]
    NoRoutes,
}

/// Validate a loaded configuration. Returns every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut origin_names: HashSet<&str> = HashSet::new();
    for origin in &config.origins {
        if !origin_names.insert(origin.name.as_str()) {
            errors.push(ValidationError::DuplicateOrigin(origin.name.clone()));
        }
        if Url::parse(&origin.base_url).is_err() {
            errors.push(ValidationError::InvalidOriginUrl {
                name: origin.name.clone(),
                url: origin.base_url.clone(),
            });
        }
        if origin.timeout_secs == 0 {
            errors.push(ValidationError::ZeroOriginTimeout(origin.name.clone()));
        }
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::BadPathPrefix(route.name.clone()));
        }
        for method in &route.methods {
            if method.parse::<Method>().is_err() {
                errors.push(ValidationError::BadMethod {
                    route: route.name.clone(),
                    method: method.clone(),
                });
            }
        }
        if !origin_names.contains(route.primary.as_str()) {
            errors.push(ValidationError::UnknownOrigin {
                route: route.name.clone(),
                origin: route.primary.clone(),
            });
        }
        if let Some(fallback) = &route.fallback {
            if !origin_names.contains(fallback.as_str()) {
                errors.push(ValidationError::UnknownOrigin {
                    route: route.name.clone(),
                    origin: fallback.clone(),
                });
            }
        }
        if let Some(cache) = &route.cache {
            check_ttl_bounds(cache, &format!("route {}", route.name), &mut errors);
        }
    }

    check_ttl_bounds(&config.cache, "gateway cache policy", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_ttl_bounds(cache: &CachePolicyConfig, scope: &str, errors: &mut Vec<ValidationError>) {
    let ordered = cache.min_ttl_secs <= cache.default_ttl_secs
        && cache.default_ttl_secs <= cache.max_ttl_secs;
    if !ordered {
        errors.push(ValidationError::BadTtlBounds {
            scope: scope.to_string(),
        });
    }
}
