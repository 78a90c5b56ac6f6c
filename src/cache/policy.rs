//! Runtime cache policy.
//!
//! Built once from configuration: allow-lists are sorted and
//! deduplicated so key composition walks them in canonical order.
//! Header names are lowercased (header matching is case-insensitive);
//! query and cookie names keep their configured case and match exactly.

use std::time::Duration;

use crate::config::CachePolicyConfig;

/// TTL bounds, cache-key allow-lists and encoding flags for one route.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub min_ttl: Duration,
    pub default_ttl: Duration,
    pub max_ttl: Duration,

    /// Lowercased, sorted, deduplicated.
    pub header_allow_list: Vec<String>,
    /// Sorted, deduplicated; case preserved.
    pub query_allow_list: Vec<String>,
    /// Sorted, deduplicated; case preserved.
    pub cookie_allow_list: Vec<String>,

    pub gzip_enabled: bool,
    pub brotli_enabled: bool,
}

impl CachePolicy {
    pub fn from_config(config: &CachePolicyConfig) -> Self {
        Self {
            min_ttl: Duration::from_secs(config.min_ttl_secs),
            default_ttl: Duration::from_secs(config.default_ttl_secs),
            max_ttl: Duration::from_secs(config.max_ttl_secs),
            header_allow_list: canonicalize_headers(&config.header_allow_list),
            query_allow_list: canonicalize(&config.query_allow_list),
            cookie_allow_list: canonicalize(&config.cookie_allow_list),
            gzip_enabled: config.gzip_enabled,
            brotli_enabled: config.brotli_enabled,
        }
    }

    /// Effective TTL for a stored entry: the origin hint when present,
    /// the policy default otherwise, clamped to `[min_ttl, max_ttl]`.
    pub fn effective_ttl(&self, origin_hint: Option<Duration>) -> Duration {
        origin_hint
            .unwrap_or(self.default_ttl)
            .clamp(self.min_ttl, self.max_ttl)
    }
}

fn canonicalize_headers(names: &[String]) -> Vec<String> {
    let lowered: Vec<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
    canonicalize(&lowered)
}

fn canonicalize(names: &[String]) -> Vec<String> {
    let mut out = names.to_vec();
    out.sort();
    out.dedup();
    out
}

/// Response encoding negotiated between the policy and the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Identity,
    Gzip,
    Brotli,
}

impl Encoding {
    /// Pick the encoding for this request: brotli wins over gzip when
    /// both are enabled and accepted, identity otherwise.
    pub fn negotiate(policy: &CachePolicy, accept_encoding: Option<&str>) -> Self {
        let Some(accepted) = accept_encoding else {
            return Encoding::Identity;
        };
        let accepts = |token: &str| {
            accepted
                .split(',')
                .map(|part| part.split(';').next().unwrap_or("").trim())
                .any(|t| t.eq_ignore_ascii_case(token))
        };

        if policy.brotli_enabled && accepts("br") {
            Encoding::Brotli
        } else if policy.gzip_enabled && accepts("gzip") {
            Encoding::Gzip
        } else {
            Encoding::Identity
        }
    }

    /// Wire name, also used as the cache-key encoding dimension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Identity => "identity",
            Encoding::Gzip => "gzip",
            Encoding::Brotli => "br",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(min: u64, default: u64, max: u64) -> CachePolicy {
        CachePolicy::from_config(&CachePolicyConfig {
            min_ttl_secs: min,
            default_ttl_secs: default,
            max_ttl_secs: max,
            ..Default::default()
        })
    }

    #[test]
    fn default_ttl_used_without_hint() {
        let p = policy(10, 30, 31_536_000);
        assert_eq!(p.effective_ttl(None), Duration::from_secs(30));
    }

    #[test]
    fn hint_is_clamped_to_bounds() {
        let p = policy(10, 30, 300);
        assert_eq!(
            p.effective_ttl(Some(Duration::from_secs(2))),
            Duration::from_secs(10)
        );
        assert_eq!(
            p.effective_ttl(Some(Duration::from_secs(900))),
            Duration::from_secs(300)
        );
        assert_eq!(
            p.effective_ttl(Some(Duration::from_secs(60))),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn allow_lists_are_canonicalized() {
        let p = CachePolicy::from_config(&CachePolicyConfig {
            header_allow_list: vec!["X-Cache-Test2".into(), "x-cache-test1".into(), "X-CACHE-TEST2".into()],
            ..Default::default()
        });
        assert_eq!(p.header_allow_list, vec!["x-cache-test1", "x-cache-test2"]);
    }

    #[test]
    fn query_allow_list_preserves_case() {
        let p = CachePolicy::from_config(&CachePolicyConfig {
            query_allow_list: vec!["param1".into(), "Param1".into(), "param1".into()],
            ..Default::default()
        });
        assert_eq!(p.query_allow_list, vec!["Param1", "param1"]);
    }

    #[test]
    fn brotli_preferred_over_gzip() {
        let p = policy(0, 10, 100);
        assert_eq!(
            Encoding::negotiate(&p, Some("gzip, br")),
            Encoding::Brotli
        );
        assert_eq!(Encoding::negotiate(&p, Some("gzip;q=0.8")), Encoding::Gzip);
        assert_eq!(Encoding::negotiate(&p, Some("deflate")), Encoding::Identity);
        assert_eq!(Encoding::negotiate(&p, None), Encoding::Identity);
    }

    #[test]
    fn disabled_encodings_are_skipped() {
        let mut p = policy(0, 10, 100);
        p.brotli_enabled = false;
        assert_eq!(Encoding::negotiate(&p, Some("br, gzip")), Encoding::Gzip);
        p.gzip_enabled = false;
        assert_eq!(Encoding::negotiate(&p, Some("br, gzip")), Encoding::Identity);
    }
}
