//! Response header rules: security headers and custom header injection.
//!
//! # Design Decisions
//! - Security and custom headers share one mechanism: a precompiled
//!   (name, value, override) list applied in order
//! - `override=true` replaces whatever the origin returned;
//!   `override=false` only sets the header when absent
//! - Invalid configured names/values are skipped at compile time with
//!   a warning, never at request time

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::{HeaderPolicyConfig, SecurityHeaderValue};
use crate::headers::cors::CorsRules;

/// Compiled header policy for one route.
#[derive(Debug, Default)]
pub struct HeaderRules {
    cors: Option<CorsRules>,
    /// Security headers first, then custom headers, in config order.
    static_headers: Vec<(HeaderName, HeaderValue, bool)>,
}

impl HeaderRules {
    pub fn from_config(config: &HeaderPolicyConfig) -> Self {
        let mut static_headers = Vec::new();

        let security = [
            ("strict-transport-security", &config.security.strict_transport_security),
            ("x-content-type-options", &config.security.content_type_options),
            ("x-frame-options", &config.security.frame_options),
            ("referrer-policy", &config.security.referrer_policy),
            ("content-security-policy", &config.security.content_security_policy),
            ("x-xss-protection", &config.security.xss_protection),
        ];
        for (name, entry) in security {
            if let Some(SecurityHeaderValue {
                value,
                override_existing,
            }) = entry
            {
                push_header(&mut static_headers, name, value, *override_existing);
            }
        }

        for custom in &config.custom {
            push_header(
                &mut static_headers,
                &custom.header,
                &custom.value,
                custom.override_existing,
            );
        }

        Self {
            cors: config.cors.as_ref().map(CorsRules::from_config),
            static_headers,
        }
    }

    /// CORS rules for this route, when configured.
    pub fn cors(&self) -> Option<&CorsRules> {
        self.cors.as_ref()
    }

    /// Apply the full policy to an outgoing response's headers.
    pub fn apply(&self, request_origin: Option<&str>, headers: &mut HeaderMap) {
        for (name, value, override_existing) in &self.static_headers {
            if *override_existing || !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }

        if let Some(cors) = &self.cors {
            cors.apply(request_origin, headers);
        }
    }
}

fn push_header(
    out: &mut Vec<(HeaderName, HeaderValue, bool)>,
    name: &str,
    value: &str,
    override_existing: bool,
) {
    match (name.parse::<HeaderName>(), HeaderValue::from_str(value)) {
        (Ok(name), Ok(value)) => out.push((name, value, override_existing)),
        _ => tracing::warn!(header = %name, "Skipping unparseable configured header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CustomHeaderConfig, SecurityHeadersConfig};

    fn rules(custom: Vec<CustomHeaderConfig>) -> HeaderRules {
        HeaderRules::from_config(&HeaderPolicyConfig {
            cors: None,
            security: SecurityHeadersConfig::default(),
            custom,
        })
    }

    fn header(name: &str, value: &str, override_existing: bool) -> CustomHeaderConfig {
        CustomHeaderConfig {
            header: name.into(),
            value: value.into(),
            override_existing,
        }
    }

    #[test]
    fn override_true_replaces_origin_value() {
        let rules = rules(vec![header("custom-h1", "configured", true)]);
        let mut headers = HeaderMap::new();
        headers.insert("custom-h1", HeaderValue::from_static("from-origin"));

        rules.apply(None, &mut headers);
        assert_eq!(headers.get("custom-h1").unwrap(), "configured");
    }

    #[test]
    fn override_false_preserves_origin_value() {
        let rules = rules(vec![header("custom-h1", "configured", false)]);
        let mut headers = HeaderMap::new();
        headers.insert("custom-h1", HeaderValue::from_static("from-origin"));

        rules.apply(None, &mut headers);
        assert_eq!(headers.get("custom-h1").unwrap(), "from-origin");
    }

    #[test]
    fn override_false_fills_missing_header() {
        let rules = rules(vec![header("custom-h1", "configured", false)]);
        let mut headers = HeaderMap::new();

        rules.apply(None, &mut headers);
        assert_eq!(headers.get("custom-h1").unwrap(), "configured");
    }

    #[test]
    fn security_headers_follow_override_semantics() {
        let rules = HeaderRules::from_config(&HeaderPolicyConfig {
            cors: None,
            security: SecurityHeadersConfig {
                content_type_options: Some(SecurityHeaderValue {
                    value: "nosniff".into(),
                    override_existing: true,
                }),
                frame_options: Some(SecurityHeaderValue {
                    value: "DENY".into(),
                    override_existing: false,
                }),
                ..Default::default()
            },
            custom: vec![],
        });

        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));
        rules.apply(None, &mut headers);

        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
    }

    #[test]
    fn unparseable_configured_header_is_skipped() {
        let rules = rules(vec![
            header("bad name", "v", true),
            header("good-name", "v", true),
        ]);
        let mut headers = HeaderMap::new();
        rules.apply(None, &mut headers);

        assert!(headers.get("good-name").is_some());
        assert_eq!(headers.len(), 1);
    }
}
