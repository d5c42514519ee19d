//! Integration points with the hosting identity server
//!
//! Each piece is a small adapter over an interface the identity server owns:
//! its runtime context, its user store, its hash provider settings and its
//! theme lookup. `admin_client` drives the user store and the theme lookup
//! through the identity server's admin API at startup.

pub mod admin_client;
pub mod bootstrap;
pub mod context;
pub mod password;
pub mod theme;

pub use admin_client::{provision, AdminClient, Provisioning, RealmThemeNames};
pub use bootstrap::{ensure_admin_user, AdminOutcome, AdminStore};
pub use context::{ContextPathOverride, HostContext, StaticContext};
pub use password::HashProviderSettings;
pub use theme::{RealmThemes, ThemeArea, ThemeSelector};
