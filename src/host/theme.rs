//! Theme selection per UI area

use crate::config::ThemeConfig;

/// Client attribute holding a client-specific login theme.
pub const LOGIN_THEME_ATTRIBUTE: &str = "login_theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArea {
    Welcome,
    Login,
    Account,
    Email,
    Admin,
}

impl ThemeArea {
    pub const ALL: [ThemeArea; 5] = [
        ThemeArea::Welcome,
        ThemeArea::Login,
        ThemeArea::Account,
        ThemeArea::Email,
        ThemeArea::Admin,
    ];
}

/// Theme names the identity server knows for the current request.
pub trait RealmThemes {
    /// Attribute of the client being served, if any.
    fn client_attribute(&self, name: &str) -> Option<String>;

    fn login_theme(&self) -> Option<String>;
    fn account_theme(&self) -> Option<String>;
    fn email_theme(&self) -> Option<String>;
    fn admin_theme(&self) -> Option<String>;
}

pub struct ThemeSelector {
    config: ThemeConfig,
}

impl ThemeSelector {
    pub fn new(config: ThemeConfig) -> Self {
        Self { config }
    }

    /// Picks the theme for `area`.
    ///
    /// A configured name for the area wins. Otherwise welcome has nothing to
    /// fall back on, login tries the client attribute and then the realm, and
    /// the other areas use the realm. Whatever is still blank gets the
    /// configured default.
    pub fn theme_name<R: RealmThemes + ?Sized>(&self, area: ThemeArea, realm: &R) -> String {
        let configured = match area {
            ThemeArea::Welcome => &self.config.welcome,
            ThemeArea::Login => &self.config.login,
            ThemeArea::Account => &self.config.account,
            ThemeArea::Email => &self.config.email,
            ThemeArea::Admin => &self.config.admin,
        };

        let name = non_blank(Some(configured.clone())).or_else(|| match area {
            ThemeArea::Welcome => None,
            ThemeArea::Login => non_blank(realm.client_attribute(LOGIN_THEME_ATTRIBUTE))
                .or_else(|| non_blank(realm.login_theme())),
            ThemeArea::Account => non_blank(realm.account_theme()),
            ThemeArea::Email => non_blank(realm.email_theme()),
            ThemeArea::Admin => non_blank(realm.admin_theme()),
        });

        name.unwrap_or_else(|| self.config.default.clone())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
