use std::sync::Arc;

use marquee_core::storage::{get_json, set_json, KeyValueStore, StorageError};
use marquee_shared::UserAccount;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::keys;

#[derive(Debug, thiserror::Error)]
pub enum UserRepoError {
    #[error("Username {0} is already registered")]
    UsernameTaken(String),

    #[error("Email {0} is already registered")]
    EmailTaken(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Customer accounts keyed by id, with case-insensitive username and email
/// indexes pointing at the id.
pub struct UserRepository {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Store a new account. Fails when the username or email is taken; a
    /// failed write removes whatever keys it already wrote.
    pub async fn create(&self, account: &UserAccount) -> Result<(), UserRepoError> {
        let _guard = self.write_lock.lock().await;
        let username_key = keys::account_by_username(&account.username);
        let email_key = keys::account_by_email(&account.email);

        if self.store.get(&username_key).await?.is_some() {
            return Err(UserRepoError::UsernameTaken(account.username.clone()));
        }
        if self.store.get(&email_key).await?.is_some() {
            return Err(UserRepoError::EmailTaken(account.email.clone()));
        }

        let account_key = keys::account(&account.id);
        let written = async {
            set_json(self.store.as_ref(), &account_key, account).await?;
            self.store.set(&username_key, &account.id).await?;
            self.store.set(&email_key, &account.id).await
        }
        .await;

        if let Err(e) = written {
            for key in [&account_key, &username_key, &email_key] {
                if let Err(remove_err) = self.store.remove(key).await {
                    warn!(key = %key, "Failed to remove partial account record: {}", remove_err);
                }
            }
            return Err(e.into());
        }

        info!(user_id = %account.id, username = %account.username, "Account created");
        Ok(())
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserAccount>, UserRepoError> {
        Ok(get_json(self.store.as_ref(), &keys::account(user_id)).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, UserRepoError> {
        match self.store.get(&keys::account_by_username(username)).await? {
            Some(user_id) => self.get(&user_id).await,
            None => Ok(None),
        }
    }
}
