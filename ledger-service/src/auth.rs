//! Authentication collaborator. The ledger components never check roles
//! themselves; callers authenticate first and gate admin-only operations
//! with [`Identity::require_admin`].

use ledger_client::{db::UserDirectory, domain::Role, LedgerError};

use crate::config::UserConfig;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("user '{username}' requires the {required} role")]
    Forbidden { username: String, required: Role },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                username: self.username.clone(),
                required: Role::Admin,
            })
        }
    }
}

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError>;
}

/// Unsalted blake3 hex digest.
pub fn hash_password(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

/// Checks credentials against a [`UserDirectory`].
pub struct DirectoryAuthenticator<'a, D: ?Sized> {
    directory: &'a D,
}

impl<'a, D> DirectoryAuthenticator<'a, D>
where
    D: UserDirectory + ?Sized,
{
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }
}

#[async_trait::async_trait]
impl<'a, D> Authenticator for DirectoryAuthenticator<'a, D>
where
    D: UserDirectory + ?Sized,
{
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        let Some(user) = self.directory.user(username).await? else {
            tracing::warn!(username, "login rejected: unknown user");
            return Err(AuthError::InvalidCredentials);
        };
        if !user.password_hash.eq_ignore_ascii_case(&hash_password(password)) {
            tracing::warn!(username, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Identity {
            user_id: user.id,
            username: user.username,
            role: user.role,
        })
    }
}

/// Upsert the configured users, resetting their password and role.
pub async fn seed_users<D>(directory: &D, users: &[UserConfig]) -> Result<usize, LedgerError>
where
    D: UserDirectory + ?Sized,
{
    for user in users {
        directory
            .upsert_user(&user.username, &hash_password(&user.password), user.role)
            .await?;
    }
    tracing::debug!(users = users.len(), "users seeded");
    Ok(users.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_client::db::MemoryLedgerStore;

    fn users() -> Vec<UserConfig> {
        vec![
            UserConfig {
                username: "Administrator".to_string(),
                password: "SuperSecret".to_string(),
                role: Role::Admin,
            },
            UserConfig {
                username: "Manager".to_string(),
                password: "ManagerPassword".to_string(),
                role: Role::Manager,
            },
        ]
    }

    #[test]
    fn hash_is_stable_hex() {
        let h = hash_password("admin123");
        assert_eq!(h, hash_password("admin123"));
        assert_eq!(h.len(), 64);
        assert_ne!(h, hash_password("admin124"));
    }

    #[tokio::test]
    async fn seeded_users_can_log_in_with_their_role() {
        let store = MemoryLedgerStore::new();
        assert_eq!(seed_users(&store, &users()).await.unwrap(), 2);

        let auth = DirectoryAuthenticator::new(&store);
        let admin = auth.authenticate("Administrator", "SuperSecret").await.unwrap();
        let manager = auth.authenticate("Manager", "ManagerPassword").await.unwrap();

        assert!(admin.require_admin().is_ok());
        assert!(matches!(manager.require_admin(), Err(AuthError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_rejected() {
        let store = MemoryLedgerStore::new();
        seed_users(&store, &users()).await.unwrap();
        let auth = DirectoryAuthenticator::new(&store);

        assert!(matches!(
            auth.authenticate("Manager", "nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("ghost", "ManagerPassword").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn reseeding_resets_password() {
        let store = MemoryLedgerStore::new();
        seed_users(&store, &users()).await.unwrap();

        let mut changed = users();
        changed[1].password = "rotated".to_string();
        seed_users(&store, &changed).await.unwrap();

        let auth = DirectoryAuthenticator::new(&store);
        assert!(auth.authenticate("Manager", "ManagerPassword").await.is_err());
        assert!(auth.authenticate("Manager", "rotated").await.is_ok());
    }
}
