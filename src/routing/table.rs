//! Route table: path-prefix lookup and method admission.
//!
//! # Responsibilities
//! - Resolve method + path to a route, longest prefix first
//! - Bind each route to its origin pair and resolved policies
//! - Return explicit NotFound / MethodNotAllowed
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan over routes sorted by prefix length
//! - The longest matching prefix decides method admission; a 405 does
//!   not fall through to shorter prefixes
//! - Per-route policy overrides are resolved once here, not per request

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::cache::CachePolicy;
use crate::config::GatewayConfig;
use crate::headers::HeaderRules;
use crate::origin::Origin;

/// Routing failure, surfaced directly as a client status.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no matching route")]
    NotFound,

    #[error("method not allowed on this route")]
    MethodNotAllowed,
}

/// A compiled route: match condition plus everything needed to serve it.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub path_prefix: String,
    /// None = all methods allowed.
    methods: Option<HashSet<Method>>,
    pub primary: Arc<Origin>,
    pub fallback: Option<Arc<Origin>>,
    pub failover_statuses: HashSet<StatusCode>,
    pub cache: Arc<CachePolicy>,
    pub headers: Arc<HeaderRules>,
}

impl Route {
    fn allows(&self, method: &Method) -> bool {
        match &self.methods {
            Some(allowed) => allowed.contains(method),
            None => true,
        }
    }
}

/// Immutable routing table, compiled once from configuration.
#[derive(Debug)]
pub struct RoutingTable {
    /// Sorted by prefix length, longest first; config order breaks ties.
    routes: Vec<Arc<Route>>,
}

impl RoutingTable {
    /// Compile the table from validated configuration.
    ///
    /// Entries that fail to compile (unknown origin, bad URL) are
    /// skipped with a warning; `validate_config` reports them upfront.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let origins: Vec<Arc<Origin>> = config
            .origins
            .iter()
            .filter_map(|c| match Url::parse(&c.base_url) {
                Ok(base_url) => Some(Arc::new(Origin {
                    name: c.name.clone(),
                    base_url,
                    timeout: Duration::from_secs(c.timeout_secs),
                })),
                Err(e) => {
                    tracing::warn!(origin = %c.name, error = %e, "Skipping origin with invalid base_url");
                    None
                }
            })
            .collect();

        let find_origin = |name: &str| origins.iter().find(|o| o.name == name).cloned();

        let default_cache = Arc::new(CachePolicy::from_config(&config.cache));
        let default_headers = Arc::new(HeaderRules::from_config(&config.headers));

        let mut routes = Vec::with_capacity(config.routes.len());
        for rc in &config.routes {
            let Some(primary) = find_origin(&rc.primary) else {
                tracing::warn!(route = %rc.name, origin = %rc.primary, "Skipping route with unknown primary origin");
                continue;
            };
            let fallback = match &rc.fallback {
                Some(name) => match find_origin(name) {
                    Some(origin) => Some(origin),
                    None => {
                        tracing::warn!(route = %rc.name, origin = %name, "Skipping route with unknown fallback origin");
                        continue;
                    }
                },
                None => None,
            };

            let methods = if rc.methods.is_empty() {
                None
            } else {
                Some(
                    rc.methods
                        .iter()
                        .filter_map(|m| m.parse::<Method>().ok())
                        .collect(),
                )
            };

            let failover_statuses = rc
                .failover_statuses
                .iter()
                .filter_map(|s| StatusCode::from_u16(*s).ok())
                .collect();

            routes.push(Arc::new(Route {
                name: rc.name.clone(),
                path_prefix: rc.path_prefix.clone(),
                methods,
                primary,
                fallback,
                failover_statuses,
                cache: rc
                    .cache
                    .as_ref()
                    .map(|c| Arc::new(CachePolicy::from_config(c)))
                    .unwrap_or_else(|| default_cache.clone()),
                headers: rc
                    .headers
                    .as_ref()
                    .map(|h| Arc::new(HeaderRules::from_config(h)))
                    .unwrap_or_else(|| default_headers.clone()),
            }));
        }

        routes.sort_by_key(|r| std::cmp::Reverse(r.path_prefix.len()));

        tracing::info!(route_count = routes.len(), "Routing table compiled");
        Self { routes }
    }

    /// Resolve a request to a route, longest prefix first.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<Arc<Route>, RouteError> {
        let route = self
            .routes
            .iter()
            .find(|r| path.starts_with(&r.path_prefix))
            .ok_or(RouteError::NotFound)?;

        if route.allows(method) {
            Ok(route.clone())
        } else {
            Err(RouteError::MethodNotAllowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OriginConfig, RouteConfig};

    fn config(routes: Vec<RouteConfig>) -> GatewayConfig {
        GatewayConfig {
            origins: vec![
                OriginConfig {
                    name: "a".into(),
                    base_url: "http://127.0.0.1:3001".into(),
                    timeout_secs: 5,
                },
                OriginConfig {
                    name: "b".into(),
                    base_url: "http://127.0.0.1:3002".into(),
                    timeout_secs: 5,
                },
            ],
            routes,
            ..Default::default()
        }
    }

    fn route(name: &str, prefix: &str, methods: &[&str]) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            path_prefix: prefix.into(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            primary: "a".into(),
            fallback: Some("b".into()),
            failover_statuses: vec![503],
            cache: None,
            headers: None,
        }
    }

    #[test]
    fn longest_prefix_wins() {
        let table = RoutingTable::from_config(&config(vec![
            route("root", "/", &[]),
            route("widgets", "/widgets", &[]),
            route("widget-detail", "/widgets/special", &[]),
        ]));

        assert_eq!(
            table.resolve(&Method::GET, "/widgets/special/1").unwrap().name,
            "widget-detail"
        );
        assert_eq!(
            table.resolve(&Method::GET, "/widgets/1").unwrap().name,
            "widgets"
        );
        assert_eq!(table.resolve(&Method::GET, "/other").unwrap().name, "root");
    }

    #[test]
    fn unmatched_path_is_not_found() {
        let table = RoutingTable::from_config(&config(vec![route("api", "/api", &[])]));
        assert_eq!(
            table.resolve(&Method::GET, "/nope").unwrap_err(),
            RouteError::NotFound
        );
    }

    #[test]
    fn disallowed_method_is_rejected_without_fallthrough() {
        let table = RoutingTable::from_config(&config(vec![
            route("root", "/", &[]),
            route("read-only", "/api", &["GET", "HEAD"]),
        ]));

        assert_eq!(
            table.resolve(&Method::POST, "/api/things").unwrap_err(),
            RouteError::MethodNotAllowed
        );
        assert!(table.resolve(&Method::GET, "/api/things").is_ok());
    }

    #[test]
    fn empty_method_list_allows_all() {
        let table = RoutingTable::from_config(&config(vec![route("any", "/", &[])]));
        assert!(table.resolve(&Method::DELETE, "/x").is_ok());
    }

    #[test]
    fn failover_statuses_are_compiled() {
        let table = RoutingTable::from_config(&config(vec![route("r", "/", &[])]));
        let route = table.resolve(&Method::GET, "/").unwrap();
        assert!(route.failover_statuses.contains(&StatusCode::SERVICE_UNAVAILABLE));
        assert!(!route.failover_statuses.contains(&StatusCode::OK));
    }
}
