use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use models::errors::ModelError;
use models::{account, cart, refresh_token};

use crate::auth::cart::CartProvisioner;
use crate::auth::domain::{Account, NewAccount, Role, StoredRefreshToken};
use crate::auth::errors::AuthError;
use crate::auth::repository::AccountStore;

pub struct SeaOrmAccountStore {
    pub db: DatabaseConnection,
}

fn to_account(m: account::Model) -> Result<Account, AuthError> {
    let role: Role = m.role.parse().map_err(AuthError::Repository)?;
    Ok(Account {
        id: m.id,
        email: m.email,
        password_hash: m.password_hash,
        first_name: m.first_name,
        last_name: m.last_name,
        phone: m.phone,
        role,
        is_active: m.is_active,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

fn to_refresh_token(m: refresh_token::Model) -> StoredRefreshToken {
    StoredRefreshToken {
        id: m.id,
        account_id: m.account_id,
        token: m.token,
        expires_at: m.expires_at.with_timezone(&Utc),
        created_at: m.created_at.with_timezone(&Utc),
    }
}

#[async_trait]
impl AccountStore for SeaOrmAccountStore {
    async fn get_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        account::find_by_email(&self.db, email).await?.map(to_account).transpose()
    }

    async fn get_by_email_and_active(&self, email: &str, active: bool) -> Result<Option<Account>, AuthError> {
        account::find_by_email_and_active(&self.db, email, active)
            .await?
            .map(to_account)
            .transpose()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
        account::find_by_id(&self.db, id).await?.map(to_account).transpose()
    }

    async fn create(&self, new: NewAccount) -> Result<Account, AuthError> {
        let created = account::create(
            &self.db,
            account::NewAccount {
                email: new.email,
                password_hash: new.password_hash,
                first_name: new.first_name,
                last_name: new.last_name,
                phone: new.phone,
                role: new.role.as_str().to_string(),
                is_active: new.is_active,
            },
        )
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent registration of the same email
            ModelError::Conflict(_) => AuthError::DuplicateEmail,
            other => other.into(),
        })?;
        to_account(created)
    }

    async fn create_refresh_token(
        &self,
        account_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<StoredRefreshToken, AuthError> {
        let row = refresh_token::create(&self.db, account_id, token, expires_at).await?;
        Ok(to_refresh_token(row))
    }

    async fn get_valid_refresh_token(&self, token: &str) -> Result<Option<StoredRefreshToken>, AuthError> {
        Ok(refresh_token::find_valid(&self.db, token).await?.map(to_refresh_token))
    }

    async fn delete_refresh_token_by_id(&self, id: Uuid) -> Result<(), AuthError> {
        refresh_token::delete_by_id(&self.db, id).await?;
        Ok(())
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<u64, AuthError> {
        Ok(refresh_token::delete_by_token(&self.db, token).await?)
    }
}

pub struct SeaOrmCartProvisioner {
    pub db: DatabaseConnection,
}

#[async_trait]
impl CartProvisioner for SeaOrmCartProvisioner {
    async fn create_cart(&self, account_id: Uuid) -> Result<(), AuthError> {
        cart::create(&self.db, account_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db_tests_enabled, get_db};
    use chrono::Duration;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            password_hash: crate::auth::password::hash_password("Secret123").unwrap(),
            first_name: "Store".into(),
            last_name: "Test".into(),
            phone: String::new(),
            role: Role::Customer,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn account_store_round_trip() -> Result<(), anyhow::Error> {
        if !db_tests_enabled() { return Ok(()); }
        let db = get_db().await?;
        let store = SeaOrmAccountStore { db: db.clone() };

        let email = format!("store_{}@example.com", Uuid::new_v4());
        let created = store.create(new_account(&email)).await?;
        assert_eq!(created.role, Role::Customer);
        assert_eq!(store.get_by_email(&email).await?.map(|a| a.id), Some(created.id));
        assert_eq!(store.get_by_id(created.id).await?.map(|a| a.email), Some(email.clone()));
        assert!(store.get_by_email_and_active(&email, true).await?.is_some());

        assert_eq!(store.create(new_account(&email)).await.unwrap_err(), AuthError::DuplicateEmail);

        SeaOrmCartProvisioner { db: db.clone() }.create_cart(created.id).await?;
        assert!(cart::find_by_account(&db, created.id).await?.is_some());

        account::hard_delete(&db, created.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn refresh_token_rows() -> Result<(), anyhow::Error> {
        if !db_tests_enabled() { return Ok(()); }
        let db = get_db().await?;
        let store = SeaOrmAccountStore { db: db.clone() };
        let acc = store.create(new_account(&format!("rows_{}@example.com", Uuid::new_v4()))).await?;

        let token = format!("tok-{}", Uuid::new_v4());
        let row = store.create_refresh_token(acc.id, &token, Utc::now() + Duration::hours(1)).await?;
        assert_eq!(store.get_valid_refresh_token(&token).await?.map(|r| r.id), Some(row.id));

        store.delete_refresh_token_by_id(row.id).await?;
        assert!(store.get_valid_refresh_token(&token).await?.is_none());
        assert_eq!(store.delete_refresh_token(&token).await?, 0);

        account::hard_delete(&db, acc.id).await?;
        Ok(())
    }
}
