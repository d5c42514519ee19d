//! Admin user provisioning at startup

use async_trait::async_trait;

use crate::config::AdminUserConfig;

/// Transactional view of the identity server's user store.
#[async_trait]
pub trait AdminStore: Send {
    async fn begin(&mut self) -> anyhow::Result<()>;
    async fn commit(&mut self) -> anyhow::Result<()>;
    /// Undoes whatever the open transaction changed. Must not fail.
    async fn rollback(&mut self);

    /// True when the master realm already has an admin user.
    async fn has_master_user(&mut self) -> anyhow::Result<bool>;

    async fn create_master_user(&mut self, username: &str, password: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOutcome {
    Created,
    AlreadyPresent,
    /// No credentials configured
    Skipped,
    /// The transaction was rolled back
    Failed,
}

/// Creates the configured admin user unless one already exists.
///
/// Errors are logged and rolled back; startup carries on either way.
pub async fn ensure_admin_user<S: AdminStore + ?Sized>(
    store: &mut S,
    admin: &AdminUserConfig,
) -> AdminOutcome {
    if admin.username.trim().is_empty() || admin.password.is_empty() {
        tracing::warn!("No admin credentials configured, not creating an admin user");
        return AdminOutcome::Skipped;
    }

    match try_create(store, admin).await {
        Ok(true) => {
            tracing::info!(username = %admin.username.trim(), "Admin user created");
            AdminOutcome::Created
        }
        Ok(false) => {
            tracing::info!("Admin user already present");
            AdminOutcome::AlreadyPresent
        }
        Err(e) => {
            tracing::error!(error = %e, "Couldn't create master admin user");
            store.rollback().await;
            AdminOutcome::Failed
        }
    }
}

async fn try_create<S: AdminStore + ?Sized>(
    store: &mut S,
    admin: &AdminUserConfig,
) -> anyhow::Result<bool> {
    store.begin().await?;
    let created = if store.has_master_user().await? {
        false
    } else {
        store
            .create_master_user(admin.username.trim(), &admin.password)
            .await?;
        true
    };
    store.commit().await?;
    Ok(created)
}
