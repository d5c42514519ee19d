//! Fixed routing table for the short public paths
//!
//! The table is compiled in and cannot change at runtime. Only the two
//! internal base paths come from configuration, and they are validated once
//! when the table is built.

use crate::config::ForwardConfig;
use crate::error::{GatewayError, Result};
use crate::http::request::Method;

pub const BASE_PATH_OIDC: &str = "/oidc";
pub const BASE_PATH_LOGIN: &str = "/login";

/// Which configured base path a rule forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetBase {
    /// The account service path, used as-is
    AccountService,
    /// The token service base path, with the public suffix appended
    TokenService,
}

/// One entry of the routing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardRule {
    pub public_path: &'static str,
    pub methods: &'static [Method],
    pub base: TargetBase,
}

impl ForwardRule {
    /// The part of the public path appended to the target base.
    ///
    /// Empty for rules that forward to a fixed path.
    pub fn suffix(&self) -> &'static str {
        match self.base {
            TargetBase::AccountService => "",
            TargetBase::TokenService => self
                .public_path
                .strip_prefix(BASE_PATH_OIDC)
                .map(|s| s.trim_start_matches('/'))
                .unwrap_or(""),
        }
    }

    pub fn allows(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }
}

const GET: &[Method] = &[Method::GET];
const POST: &[Method] = &[Method::POST];

pub const RULES: &[ForwardRule] = &[
    ForwardRule { public_path: BASE_PATH_LOGIN, methods: GET, base: TargetBase::AccountService },
    ForwardRule { public_path: "/oidc/certs", methods: GET, base: TargetBase::TokenService },
    ForwardRule { public_path: "/oidc/login-status-iframe.html", methods: GET, base: TargetBase::TokenService },
    ForwardRule { public_path: "/oidc/logout", methods: GET, base: TargetBase::TokenService },
    ForwardRule { public_path: "/oidc/auth", methods: POST, base: TargetBase::TokenService },
    ForwardRule { public_path: "/oidc/token", methods: POST, base: TargetBase::TokenService },
    ForwardRule { public_path: "/oidc/token/introspect", methods: POST, base: TargetBase::TokenService },
    ForwardRule { public_path: "/oidc/userinfo", methods: POST, base: TargetBase::TokenService },
];

/// Routing table with its resolved internal base paths.
///
/// A base that is unset stays `None`; forwards that need it fail per request.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    account_service: Option<String>,
    token_service: Option<String>,
}

impl RoutingTable {
    /// Builds the table, logging (not failing on) missing base paths.
    ///
    /// The token service base gets a trailing `/` so that suffixes can be
    /// appended directly.
    pub fn new(cfg: &ForwardConfig) -> Self {
        let account_service = non_blank(&cfg.account_service);
        if account_service.is_none() {
            tracing::error!("Account service forward path not configured!");
        }

        let token_service = non_blank(&cfg.token_service).map(|mut base| {
            if !base.ends_with('/') {
                base.push('/');
            }
            base
        });
        if token_service.is_none() {
            tracing::error!("Token service forward path not configured!");
        }

        Self {
            account_service,
            token_service,
        }
    }

    pub fn rules(&self) -> &'static [ForwardRule] {
        RULES
    }

    /// Finds the rule for `path` (query string already removed).
    ///
    /// Unknown paths, including unknown `/oidc/*` suffixes, are `RouteNotFound`;
    /// a known path with the wrong method is `MethodNotAllowed`.
    ///
    /// Matching is exact and case-sensitive: `/oidc/certs/` and `/LOGIN` are
    /// not in the table and get `RouteNotFound`.
    pub fn resolve(&self, method: Method, path: &str) -> Result<&'static ForwardRule> {
        let rule = RULES
            .iter()
            .find(|r| r.public_path == path)
            .ok_or_else(|| GatewayError::RouteNotFound {
                path: path.to_string(),
            })?;

        if !rule.allows(method) {
            return Err(GatewayError::MethodNotAllowed {
                method,
                path: path.to_string(),
            });
        }

        Ok(rule)
    }

    /// Internal target path for `rule`, without query string.
    pub fn target_path(&self, rule: &ForwardRule) -> Result<String> {
        match rule.base {
            TargetBase::AccountService => self.account_service.clone().ok_or_else(|| {
                GatewayError::Configuration("account service forward path not configured".into())
            }),
            TargetBase::TokenService => self
                .token_service
                .as_ref()
                .map(|base| format!("{}{}", base, rule.suffix()))
                .ok_or_else(|| {
                    GatewayError::Configuration("token service forward path not configured".into())
                }),
        }
    }

    /// Full internal target: target path plus the inbound query string.
    pub fn target_uri(&self, rule: &ForwardRule, query: Option<&str>) -> Result<String> {
        let mut target = self.target_path(rule)?;
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }
        Ok(target)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RoutingTable {
        RoutingTable::new(&ForwardConfig {
            account_service: "/auth/realms/demo/account".into(),
            token_service: "/auth/realms/demo/protocol/openid-connect".into(),
        })
    }

    #[test]
    fn token_base_gets_trailing_separator() {
        let rule = table().resolve(Method::GET, "/oidc/certs").unwrap();
        assert_eq!(
            table().target_path(rule).unwrap(),
            "/auth/realms/demo/protocol/openid-connect/certs"
        );
    }

    #[test]
    fn nested_suffix_is_kept() {
        let rule = table().resolve(Method::POST, "/oidc/token/introspect").unwrap();
        assert_eq!(rule.suffix(), "token/introspect");
    }

    #[test]
    fn login_has_no_suffix() {
        let rule = table().resolve(Method::GET, "/login").unwrap();
        assert_eq!(rule.suffix(), "");
        assert_eq!(table().target_path(rule).unwrap(), "/auth/realms/demo/account");
    }

    #[test]
    fn empty_query_is_not_appended() {
        let rule = table().resolve(Method::GET, "/oidc/logout").unwrap();
        let uri = table().target_uri(rule, Some("")).unwrap();
        assert!(!uri.ends_with('?'));
    }

    #[test]
    fn blank_base_fails_per_request() {
        let table = RoutingTable::new(&ForwardConfig {
            account_service: "  ".into(),
            token_service: String::new(),
        });
        let rule = table.resolve(Method::GET, "/oidc/certs").unwrap();
        assert!(matches!(
            table.target_path(rule),
            Err(GatewayError::Configuration(_))
        ));
    }
}
