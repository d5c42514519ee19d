//! Context-path override for the hosting runtime
//!
//! The identity server reads its context path and a handful of init
//! parameters from the host context. `ContextPathOverride` wraps that context,
//! answers those lookups itself and delegates everything else.

use std::collections::HashMap;

/// Init parameter that tells the identity server it runs embedded.
pub const EMBEDDED_INIT_PARAM: &str = "keycloak.embedded";

/// The subset of the host context the identity server consults.
pub trait HostContext: Send + Sync {
    fn context_path(&self) -> String;

    fn init_parameter(&self, name: &str) -> Option<String>;

    fn attribute(&self, name: &str) -> Option<String>;
}

/// Host context backed by fixed values.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    pub context_path: String,
    pub init_parameters: HashMap<String, String>,
    pub attributes: HashMap<String, String>,
}

impl StaticContext {
    pub fn new(context_path: impl Into<String>) -> Self {
        Self {
            context_path: context_path.into(),
            ..Self::default()
        }
    }
}

impl HostContext for StaticContext {
    fn context_path(&self) -> String {
        self.context_path.clone()
    }

    fn init_parameter(&self, name: &str) -> Option<String> {
        self.init_parameters.get(name).cloned()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}

/// Decorator that replaces the context path and marks the server as embedded.
pub struct ContextPathOverride<C> {
    inner: C,
    context_path: String,
}

impl<C: HostContext> ContextPathOverride<C> {
    pub fn new(inner: C, context_path: impl Into<String>) -> Self {
        Self {
            inner,
            context_path: context_path.into(),
        }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: HostContext> HostContext for ContextPathOverride<C> {
    fn context_path(&self) -> String {
        self.context_path.clone()
    }

    fn init_parameter(&self, name: &str) -> Option<String> {
        if name == EMBEDDED_INIT_PARAM {
            return Some("true".to_string());
        }
        tracing::trace!(name, "Delegating init parameter lookup");
        self.inner.init_parameter(name)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.inner.attribute(name)
    }
}
