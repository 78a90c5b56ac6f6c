//! CORS rules: preflight answers and response header injection.
//!
//! # Design Decisions
//! - Preflights are answered from configuration alone, no origin fetch
//! - A request origin outside the allow list omits the allow-origin
//!   header rather than failing the request
//! - `*` with credentials is never emitted; the request origin is
//!   echoed instead

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;

use crate::cache::GatewayResponse;
use crate::config::CorsConfig;

/// Compiled CORS behavior for one route.
#[derive(Debug)]
pub struct CorsRules {
    allow_origins: Vec<String>,
    any_origin: bool,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    expose_headers: Option<HeaderValue>,
    allow_credentials: bool,
    max_age: HeaderValue,
    origin_override: bool,
}

impl CorsRules {
    pub fn from_config(config: &CorsConfig) -> Self {
        let any_origin = config.allow_origins.iter().any(|o| o == "*");
        Self {
            allow_origins: config.allow_origins.clone(),
            any_origin,
            allow_methods: join_list(&config.allow_methods),
            allow_headers: join_list(&config.allow_headers),
            expose_headers: if config.expose_headers.is_empty() {
                None
            } else {
                Some(join_list(&config.expose_headers))
            },
            allow_credentials: config.allow_credentials,
            max_age: HeaderValue::from_str(&config.max_age_secs.to_string())
                .unwrap_or(HeaderValue::from_static("600")),
            origin_override: config.origin_override,
        }
    }

    /// A preflight probe: OPTIONS carrying an Origin and a requested method.
    pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
        method == Method::OPTIONS
            && headers.contains_key(header::ORIGIN)
            && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
    }

    /// The allow-origin value for this request, if the origin is allowed.
    fn allowed_origin(&self, request_origin: Option<&str>) -> Option<HeaderValue> {
        if self.any_origin && !self.allow_credentials {
            return Some(HeaderValue::from_static("*"));
        }
        let origin = request_origin?;
        if self.any_origin || self.allow_origins.iter().any(|o| o == origin) {
            HeaderValue::from_str(origin).ok()
        } else {
            None
        }
    }

    /// Answer a preflight probe without touching routing or the cache.
    pub fn preflight_response(&self, request_origin: Option<&str>) -> GatewayResponse {
        let mut headers = HeaderMap::new();

        if let Some(origin) = self.allowed_origin(request_origin) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                self.allow_methods.clone(),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                self.allow_headers.clone(),
            );
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
            if self.allow_credentials {
                headers.insert(
                    header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                    HeaderValue::from_static("true"),
                );
            }
        } else {
            tracing::debug!(origin = ?request_origin, "Preflight from disallowed origin");
        }
        headers.insert(header::VARY, HeaderValue::from_static("origin"));

        GatewayResponse {
            status: StatusCode::NO_CONTENT,
            headers,
            body: Bytes::new(),
        }
    }

    /// Inject CORS headers into an outgoing response.
    ///
    /// `origin_override` decides whether the configured allow-origin
    /// replaces one the origin server already set.
    pub fn apply(&self, request_origin: Option<&str>, headers: &mut HeaderMap) {
        let Some(origin) = self.allowed_origin(request_origin) else {
            return;
        };

        if self.origin_override || !headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        if self.allow_credentials
            && !headers.contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
        {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        if let Some(expose) = &self.expose_headers {
            if self.origin_override || !headers.contains_key(header::ACCESS_CONTROL_EXPOSE_HEADERS)
            {
                headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, expose.clone());
            }
        }
        headers.append(header::VARY, HeaderValue::from_static("origin"));
    }
}

fn join_list(values: &[String]) -> HeaderValue {
    HeaderValue::from_str(&values.join(", ")).unwrap_or(HeaderValue::from_static("*"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(config: CorsConfig) -> CorsRules {
        CorsRules::from_config(&config)
    }

    #[test]
    fn detects_preflight() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static("http://a.test"));
        headers.insert(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("GET"),
        );
        assert!(CorsRules::is_preflight(&Method::OPTIONS, &headers));
        assert!(!CorsRules::is_preflight(&Method::GET, &headers));

        // Plain OPTIONS without CORS headers is not a preflight.
        assert!(!CorsRules::is_preflight(&Method::OPTIONS, &HeaderMap::new()));
    }

    #[test]
    fn wildcard_without_credentials_emits_star() {
        let r = rules(CorsConfig::default());
        let resp = r.preflight_response(Some("http://a.test"));
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert_eq!(resp.headers.get(header::ACCESS_CONTROL_MAX_AGE).unwrap(), "600");
    }

    #[test]
    fn credentials_echo_the_request_origin() {
        let r = rules(CorsConfig {
            allow_credentials: true,
            ..Default::default()
        });
        let resp = r.preflight_response(Some("http://a.test"));
        assert_eq!(
            resp.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://a.test"
        );
        assert_eq!(
            resp.headers
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[test]
    fn disallowed_origin_omits_allow_origin() {
        let r = rules(CorsConfig {
            allow_origins: vec!["http://allowed.test".into()],
            ..Default::default()
        });

        let resp = r.preflight_response(Some("http://evil.test"));
        assert!(resp.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

        let mut headers = HeaderMap::new();
        r.apply(Some("http://evil.test"), &mut headers);
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn origin_override_replaces_upstream_value() {
        let r = rules(CorsConfig {
            origin_override: true,
            ..Default::default()
        });
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("http://upstream.test"),
        );
        r.apply(Some("http://a.test"), &mut headers);
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    }

    #[test]
    fn without_override_upstream_value_is_preserved() {
        let r = rules(CorsConfig {
            origin_override: false,
            ..Default::default()
        });
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("http://upstream.test"),
        );
        r.apply(Some("http://a.test"), &mut headers);
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://upstream.test"
        );
    }
}
