use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{Account, NewAccount, StoredRefreshToken};
use super::errors::AuthError;

/// Persistence for accounts and the refresh tokens issued to them.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Any account with this email, active or not.
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;
    async fn get_by_email_and_active(&self, email: &str, active: bool) -> Result<Option<Account>, AuthError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError>;
    /// Fails with [`AuthError::DuplicateEmail`] when the email is taken.
    async fn create(&self, account: NewAccount) -> Result<Account, AuthError>;

    async fn create_refresh_token(
        &self,
        account_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<StoredRefreshToken, AuthError>;
    /// Row with exactly this token string whose expiry is still in the future.
    async fn get_valid_refresh_token(&self, token: &str) -> Result<Option<StoredRefreshToken>, AuthError>;
    async fn delete_refresh_token_by_id(&self, id: Uuid) -> Result<(), AuthError>;
    /// Returns the number of rows removed; zero is not an error.
    async fn delete_refresh_token(&self, token: &str) -> Result<u64, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    pub struct MockAccountStore {
        accounts: Mutex<HashMap<Uuid, Account>>,          // key: account id
        tokens: Mutex<HashMap<Uuid, StoredRefreshToken>>, // key: row id
        fail_token_writes: AtomicBool,
        fail_token_deletes: AtomicBool,
    }

    fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, AuthError> {
        m.lock().map_err(|_| AuthError::Repository("mock store poisoned".into()))
    }

    impl MockAccountStore {
        /// Make `create_refresh_token` fail from now on.
        pub fn fail_refresh_token_writes(&self, fail: bool) {
            self.fail_token_writes.store(fail, Ordering::SeqCst);
        }

        /// Make `delete_refresh_token_by_id` fail from now on.
        pub fn fail_refresh_token_deletes(&self, fail: bool) {
            self.fail_token_deletes.store(fail, Ordering::SeqCst);
        }

        pub fn account_count(&self) -> usize {
            self.accounts.lock().map(|a| a.len()).unwrap_or_default()
        }

        pub fn refresh_token_count(&self) -> usize {
            self.tokens.lock().map(|t| t.len()).unwrap_or_default()
        }

        pub fn has_refresh_token(&self, token: &str) -> bool {
            self.tokens
                .lock()
                .map(|t| t.values().any(|r| r.token == token))
                .unwrap_or_default()
        }

        /// Backdate the stored expiry of `token`; the signed token itself is untouched.
        pub fn expire_refresh_token(&self, token: &str) {
            if let Ok(mut tokens) = self.tokens.lock() {
                for row in tokens.values_mut().filter(|r| r.token == token) {
                    row.expires_at = Utc::now() - chrono::Duration::seconds(1);
                }
            }
        }

        pub fn set_active(&self, email: &str, active: bool) {
            if let Ok(mut accounts) = self.accounts.lock() {
                for acc in accounts.values_mut().filter(|a| a.email == email) {
                    acc.is_active = active;
                }
            }
        }

        pub fn remove_account(&self, id: Uuid) {
            if let Ok(mut accounts) = self.accounts.lock() {
                accounts.remove(&id);
            }
        }
    }

    #[async_trait]
    impl AccountStore for MockAccountStore {
        async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
            let accounts = lock(&self.accounts)?;
            Ok(accounts.values().find(|a| a.email == email).cloned())
        }

        async fn get_by_email_and_active(&self, email: &str, active: bool) -> Result<Option<Account>, AuthError> {
            let accounts = lock(&self.accounts)?;
            Ok(accounts.values().find(|a| a.email == email && a.is_active == active).cloned())
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
            let accounts = lock(&self.accounts)?;
            Ok(accounts.get(&id).cloned())
        }

        async fn create(&self, new: NewAccount) -> Result<Account, AuthError> {
            let mut accounts = lock(&self.accounts)?;
            if accounts.values().any(|a| a.email == new.email) {
                return Err(AuthError::DuplicateEmail);
            }
            let now = Utc::now();
            let account = Account {
                id: Uuid::new_v4(),
                email: new.email,
                password_hash: new.password_hash,
                first_name: new.first_name,
                last_name: new.last_name,
                phone: new.phone,
                role: new.role,
                is_active: new.is_active,
                created_at: now,
                updated_at: now,
            };
            accounts.insert(account.id, account.clone());
            Ok(account)
        }

        async fn create_refresh_token(
            &self,
            account_id: Uuid,
            token: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<StoredRefreshToken, AuthError> {
            if self.fail_token_writes.load(Ordering::SeqCst) {
                return Err(AuthError::Repository("refresh token write failed".into()));
            }
            let mut tokens = lock(&self.tokens)?;
            if tokens.values().any(|r| r.token == token) {
                return Err(AuthError::Repository("duplicate refresh token".into()));
            }
            let row = StoredRefreshToken {
                id: Uuid::new_v4(),
                account_id,
                token: token.to_string(),
                expires_at,
                created_at: Utc::now(),
            };
            tokens.insert(row.id, row.clone());
            Ok(row)
        }

        async fn get_valid_refresh_token(&self, token: &str) -> Result<Option<StoredRefreshToken>, AuthError> {
            let tokens = lock(&self.tokens)?;
            let now = Utc::now();
            Ok(tokens.values().find(|r| r.token == token && r.expires_at > now).cloned())
        }

        async fn delete_refresh_token_by_id(&self, id: Uuid) -> Result<(), AuthError> {
            if self.fail_token_deletes.load(Ordering::SeqCst) {
                return Err(AuthError::Repository("refresh token delete failed".into()));
            }
            let mut tokens = lock(&self.tokens)?;
            tokens.remove(&id);
            Ok(())
        }

        async fn delete_refresh_token(&self, token: &str) -> Result<u64, AuthError> {
            let mut tokens = lock(&self.tokens)?;
            let before = tokens.len();
            tokens.retain(|_, r| r.token != token);
            Ok((before - tokens.len()) as u64)
        }
    }
}
