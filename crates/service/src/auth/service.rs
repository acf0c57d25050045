use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::cart::CartProvisioner;
use super::domain::{Account, AccountView, AuthSession, LoginInput, NewAccount, RegisterInput, Role};
use super::errors::AuthError;
use super::events::{EventPublisher, USER_LOGIN};
use super::password::{hash_password, verify_password};
use super::repository::AccountStore;
use super::token::{TokenClaims, TokenCodec, TokenKind};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl From<&configs::JwtConfig> for AuthConfig {
    fn from(cfg: &configs::JwtConfig) -> Self {
        Self {
            jwt_secret: cfg.secret.clone(),
            access_token_ttl: Duration::from_secs(cfg.access_token_ttl_secs),
            refresh_token_ttl: Duration::from_secs(cfg.refresh_token_ttl_secs),
        }
    }
}

/// Auth business service independent of web framework.
///
/// Holds no state of its own beyond configuration; every instance sharing a
/// store sees the same sessions.
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    carts: Arc<dyn CartProvisioner>,
    events: Arc<dyn EventPublisher>,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        carts: Arc<dyn CartProvisioner>,
        events: Arc<dyn EventPublisher>,
        cfg: AuthConfig,
    ) -> Self {
        let codec = TokenCodec::new(&cfg.jwt_secret, cfg.access_token_ttl, cfg.refresh_token_ttl);
        Self { accounts, carts, events, codec }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Register a new customer account and open its first session.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use service::auth::{AuthConfig, AuthService};
    /// use service::auth::cart::mock::MockCartProvisioner;
    /// use service::auth::domain::{RegisterInput, Role};
    /// use service::auth::events::mock::RecordingEventPublisher;
    /// use service::auth::repository::mock::MockAccountStore;
    ///
    /// let svc = AuthService::new(
    ///     Arc::new(MockAccountStore::default()),
    ///     Arc::new(MockCartProvisioner::default()),
    ///     Arc::new(RecordingEventPublisher::default()),
    ///     AuthConfig { jwt_secret: "secret".into(), access_token_ttl: Duration::from_secs(900), refresh_token_ttl: Duration::from_secs(86400) },
    /// );
    /// let input = RegisterInput { email: "user@example.com".into(), password: "Secret123".into(), first_name: "Test".into(), last_name: "User".into(), phone: String::new() };
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.user.email, "user@example.com");
    /// assert_eq!(session.user.role, Role::Customer);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        validate_registration(&input)?;

        if let Some(existing) = self.accounts.get_by_email(&input.email).await? {
            debug!(account_id = %existing.id, active = existing.is_active, "email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(&input.password)?;
        let account = self
            .accounts
            .create(NewAccount {
                email: input.email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                phone: input.phone,
                role: Role::Customer,
                is_active: true,
            })
            .await?;
        info!(account_id = %account.id, "account_registered");

        // best effort: the account exists whether or not its cart does
        if let Err(e) = self.carts.create_cart(account.id).await {
            warn!(account_id = %account.id, error = %e, "cart provisioning failed");
        }

        self.issue_session(account).await
    }

    /// Verify credentials and open a session.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use service::auth::{AuthConfig, AuthError, AuthService};
    /// use service::auth::cart::mock::MockCartProvisioner;
    /// use service::auth::domain::{LoginInput, RegisterInput};
    /// use service::auth::events::mock::RecordingEventPublisher;
    /// use service::auth::repository::mock::MockAccountStore;
    ///
    /// let svc = AuthService::new(
    ///     Arc::new(MockAccountStore::default()),
    ///     Arc::new(MockCartProvisioner::default()),
    ///     Arc::new(RecordingEventPublisher::default()),
    ///     AuthConfig { jwt_secret: "secret".into(), access_token_ttl: Duration::from_secs(900), refresh_token_ttl: Duration::from_secs(86400) },
    /// );
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), password: "Passw0rd".into(), first_name: "N".into(), last_name: "M".into(), phone: String::new() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert!(!session.access_token.is_empty());
    /// let err = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "nope".into() })).unwrap_err();
    /// assert_eq!(err, AuthError::InvalidCredentials);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let account = self
            .accounts
            .get_by_email_and_active(&input.email, true)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&input.password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(account).await
    }

    /// Exchange a refresh token for a new pair. The presented token is
    /// consumed: a second exchange of the same string fails.
    #[instrument(skip_all)]
    pub async fn refresh_token(&self, presented: &str) -> Result<AuthSession, AuthError> {
        let claims = self
            .codec
            .validate_kind(presented, TokenKind::Refresh)
            .map_err(|e| {
                debug!(error = %e, "refresh token rejected by codec");
                AuthError::InvalidToken
            })?;

        // The stored row, not the signature, decides whether the token is still live.
        let stored = self
            .accounts
            .get_valid_refresh_token(presented)
            .await?
            .ok_or(AuthError::TokenNotFoundOrExpired)?;

        let account = self
            .accounts
            .get_by_id(claims.sub)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        // Lookup and delete are separate round-trips, so two concurrent
        // refreshes of one token can both get here.
        if let Err(e) = self.accounts.delete_refresh_token_by_id(stored.id).await {
            warn!(account_id = %account.id, token_id = %stored.id, error = %e, "failed to delete rotated refresh token");
        }

        self.issue_session(account).await
    }

    /// Revoke a refresh token. Unknown or already revoked tokens are not an error.
    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let removed = self.accounts.delete_refresh_token(refresh_token).await?;
        debug!(removed, "logout");
        Ok(())
    }

    /// Claims of a valid access token; anything else is `InvalidToken`.
    pub fn authenticate(&self, access_token: &str) -> Result<TokenClaims, AuthError> {
        self.codec
            .validate_kind(access_token, TokenKind::Access)
            .map_err(|e| {
                debug!(error = %e, "access token rejected");
                AuthError::InvalidToken
            })
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, account_id: Uuid) -> Result<AccountView, AuthError> {
        self.accounts
            .get_by_id(account_id)
            .await?
            .map(|a| a.view())
            .ok_or(AuthError::AccountNotFound)
    }

    /// Shared tail of register, login and refresh.
    async fn issue_session(&self, account: Account) -> Result<AuthSession, AuthError> {
        let pair = self
            .codec
            .issue_pair(account.id, &account.email, account.role)
            .map_err(|e| AuthError::TokenIssuanceFailed(e.to_string()))?;

        if let Err(e) = self
            .accounts
            .create_refresh_token(account.id, &pair.refresh_token, pair.refresh_expires_at)
            .await
        {
            warn!(account_id = %account.id, error = %e, "refresh token not persisted; session issued anyway");
        }

        // Unlike the write above, a publish failure is fatal: no session is
        // handed out without its USER_LOGIN event.
        let payload = serde_json::to_value(&account).map_err(|e| AuthError::EventPublishFailed(e.to_string()))?;
        if let Err(e) = self.events.publish(USER_LOGIN, payload, HashMap::new()).await {
            error!(account_id = %account.id, error = %e, "login event not published; session withheld");
            return Err(AuthError::EventPublishFailed(e.to_string()));
        }

        info!(account_id = %account.id, role = %account.role, "session_issued");
        Ok(AuthSession {
            user: account.view(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }
}

fn validate_registration(input: &RegisterInput) -> Result<(), AuthError> {
    models::account::validate_email(&input.email)?;
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}
