//! Admin REST client for the identity server
//!
//! Authenticates with the warm-up client's credentials and backs the admin
//! bootstrap and the realm theme lookup at startup.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::host::bootstrap::{ensure_admin_user, AdminOutcome, AdminStore};
use crate::host::theme::{RealmThemes, ThemeArea, ThemeSelector};
use crate::warmup::{BearerToken, Prober, WarmupSettings};

pub const MASTER_REALM: &str = "master";

/// Theme names stored on a realm.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmThemeNames {
    pub login_theme: Option<String>,
    pub account_theme: Option<String>,
    pub email_theme: Option<String>,
    pub admin_theme: Option<String>,
}

impl RealmThemes for RealmThemeNames {
    fn client_attribute(&self, _name: &str) -> Option<String> {
        None
    }

    fn login_theme(&self) -> Option<String> {
        self.login_theme.clone()
    }

    fn account_theme(&self) -> Option<String> {
        self.account_theme.clone()
    }

    fn email_theme(&self) -> Option<String> {
        self.email_theme.clone()
    }

    fn admin_theme(&self) -> Option<String> {
        self.admin_theme.clone()
    }
}

#[derive(Serialize)]
struct NewUser<'a> {
    username: &'a str,
    enabled: bool,
}

#[derive(Serialize)]
struct PasswordCredential<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
    temporary: bool,
}

pub struct AdminClient {
    client: reqwest::Client,
    /// e.g. "http://localhost:8081/auth/admin/realms"
    realms_url: String,
    token: BearerToken,
    /// Location of a user created by the open transaction
    created: Option<String>,
}

impl AdminClient {
    /// Obtains an admin token through the client-credentials grant.
    pub async fn connect(
        settings: WarmupSettings,
        base_url: &str,
        context_path: &str,
    ) -> Result<Self> {
        let (token, _) = Prober::new(settings, base_url).fetch_token().await?;

        let base = base_url.trim_end_matches('/');
        let realms_url = match context_path.trim_matches('/') {
            "" => format!("{}/admin/realms", base),
            context => format!("{}/{}/admin/realms", base, context),
        };

        Ok(Self {
            client: reqwest::Client::new(),
            realms_url,
            token,
            created: None,
        })
    }

    fn users_url(&self) -> String {
        format!("{}/{}/users", self.realms_url, MASTER_REALM)
    }

    pub async fn realm_themes(&self, realm: &str) -> anyhow::Result<RealmThemeNames> {
        let response = self
            .client
            .get(format!("{}/{}", self.realms_url, realm))
            .bearer_auth(self.token.as_str())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AdminStore for AdminClient {
    async fn begin(&mut self) -> anyhow::Result<()> {
        self.created = None;
        Ok(())
    }

    async fn commit(&mut self) -> anyhow::Result<()> {
        self.created = None;
        Ok(())
    }

    async fn rollback(&mut self) {
        let Some(location) = self.created.take() else {
            return;
        };

        let result = self
            .client
            .delete(&location)
            .bearer_auth(self.token.as_str())
            .send()
            .await
            .and_then(|r| r.error_for_status());
        if let Err(e) = result {
            tracing::warn!(user = %location, error = %e, "Could not remove partially created admin user");
        }
    }

    async fn has_master_user(&mut self) -> anyhow::Result<bool> {
        let users: Vec<serde_json::Value> = self
            .client
            .get(self.users_url())
            .query(&[("max", "1"), ("briefRepresentation", "true")])
            .bearer_auth(self.token.as_str())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(!users.is_empty())
    }

    async fn create_master_user(&mut self, username: &str, password: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(self.users_url())
            .bearer_auth(self.token.as_str())
            .json(&NewUser {
                username,
                enabled: true,
            })
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            anyhow::bail!("user creation answered HTTP status {}", response.status().as_u16());
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .context("user creation returned no Location")?
            .to_string();
        self.created = Some(location.clone());

        self.client
            .put(format!("{}/reset-password", location))
            .bearer_auth(self.token.as_str())
            .json(&PasswordCredential {
                kind: "password",
                value: password,
                temporary: false,
            })
            .send()
            .await?
            .error_for_status()
            .context("setting the admin password failed")?;

        Ok(())
    }
}

/// What startup provisioning did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioning {
    pub admin: AdminOutcome,
    /// Resolved theme per area; empty when the realm could not be read
    pub themes: Vec<(ThemeArea, String)>,
}

/// Creates the admin user if needed and resolves the master realm's themes.
///
/// Returns `None` when the client credentials are unusable or rejected.
pub async fn provision(config: &Config) -> Option<Provisioning> {
    let settings = match WarmupSettings::from_config(&config.warmup) {
        Ok(settings) => settings,
        Err(reason) => {
            tracing::info!(reason = %reason, "Skipping admin provisioning");
            return None;
        }
    };

    let mut client = match AdminClient::connect(
        settings,
        &config.server.upstream_url,
        &config.server.context_path,
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Could not authenticate against the admin API");
            return None;
        }
    };

    let admin = ensure_admin_user(&mut client, &config.admin_user).await;

    let selector = ThemeSelector::new(config.themes.clone());
    let themes = match client.realm_themes(MASTER_REALM).await {
        Ok(realm) => ThemeArea::ALL
            .iter()
            .map(|&area| (area, selector.theme_name(area, &realm)))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read master realm themes");
            Vec::new()
        }
    };
    for (area, theme) in &themes {
        tracing::info!(area = ?area, theme = %theme, "Theme resolved");
    }

    Some(Provisioning { admin, themes })
}
