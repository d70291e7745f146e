use std::sync::Arc;

use async_trait::async_trait;
use auth::Clock;

use crate::domain::authentication::errors::AuthError;
use crate::domain::authentication::errors::IdentityField;
use crate::domain::authentication::models::AuthSettings;
use crate::domain::authentication::models::ConfirmEmailCommand;
use crate::domain::authentication::models::RefreshPolicy;
use crate::domain::authentication::models::ResetPasswordCommand;
use crate::domain::authentication::models::SignInCommand;
use crate::domain::authentication::models::SignUpCommand;
use crate::domain::authentication::ports::AuthServicePort;
use crate::domain::authentication::ports::Notifier;
use crate::domain::authentication::ports::PasswordHasher;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenKind;
use crate::domain::token::models::TokenPair;
use crate::domain::token::ports::TokenRepository;
use crate::domain::token::service::TokenEngine;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::user::ports::UserRepository;

const DECOY_PASSWORD: &str = "decoy-password-for-absent-accounts";

/// Authentication flow controller.
///
/// Drives sign-up, sign-in, refresh, password reset and email verification
/// over the user store and the token engine.
pub struct AuthService<UR, TR, N>
where
    UR: UserRepository,
    TR: TokenRepository,
    N: Notifier,
{
    users: Arc<UR>,
    tokens: Arc<TokenEngine<TR>>,
    notifier: Arc<N>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
    /// Digest verified against when no account matches, so a rejected
    /// sign-in costs the same whether or not the account exists.
    decoy_hash: Option<String>,
}

impl<UR, TR, N> AuthService<UR, TR, N>
where
    UR: UserRepository,
    TR: TokenRepository,
    N: Notifier,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `tokens` - Token issuance engine
    /// * `notifier` - Delivery of confirmation codes
    /// * `hasher` - Password digest implementation
    /// * `clock` - Time source for expiry checks and login timestamps
    /// * `settings` - Expiry and code tunables
    pub fn new(
        users: Arc<UR>,
        tokens: Arc<TokenEngine<TR>>,
        notifier: Arc<N>,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Self {
        let decoy_hash = hasher
            .hash(DECOY_PASSWORD)
            .map_err(|e| tracing::warn!(error = %e, "Failed to prepare decoy password digest"))
            .ok();

        Self {
            users,
            tokens,
            notifier,
            hasher,
            clock,
            settings,
            decoy_hash,
        }
    }

    async fn authenticate(
        &self,
        command: SignInCommand,
        required_role: Option<Role>,
    ) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .find_by_username_or_email(&command.login)
            .await?
            .filter(|user| required_role.map_or(true, |role| user.role == role));

        let Some(user) = user else {
            if let Some(decoy) = &self.decoy_hash {
                let _ = self.hasher.verify(&command.password, decoy);
            }
            tracing::info!("Sign-in rejected: no matching account");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(&command.password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Sign-in rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.login(user).await
    }

    /// Issue a session for `user` and record the login time.
    async fn login(&self, mut user: User) -> Result<TokenPair, AuthError> {
        let pair = self
            .tokens
            .issue_session(
                &user,
                self.settings.access_expiry_hours,
                self.settings.refresh_expiry_hours,
            )
            .await
            .map_err(|e| match e {
                TokenError::DuplicateValue => {
                    AuthError::Signing("refresh token collided with a live token".to_string())
                }
                other => AuthError::from(other),
            })?;

        let now = self.clock.now();
        user.last_logged_in_at = Some(now);
        user.updated_at = now;
        let user = self.users.save(user).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User signed in");

        Ok(pair)
    }

    /// Replace any live code of `kind` for the account behind `email` and deliver a new one.
    async fn send_code(&self, email: &EmailAddress, kind: TokenKind) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NoExistingEmail)?;

        self.tokens.revoke(&user.id, kind).await?;

        let token = self
            .tokens
            .issue_code(
                kind,
                &user.id,
                self.settings.code_length,
                self.settings.code_expiry_hours,
            )
            .await?;

        let (subject, body) = code_message(kind, &token.value);
        self.notifier
            .send(&self.settings.mail_from, user.email.as_str(), subject, &body)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, kind = %kind, error = %e, "Failed to deliver code");
                AuthError::NotificationFailure(e.to_string())
            })?;

        tracing::info!(user_id = %user.id, kind = %kind, "Confirmation code sent");

        Ok(())
    }

    /// Resolve a presented confirmation code to its token and owner.
    async fn redeem_code(
        &self,
        kind: TokenKind,
        email: Option<&EmailAddress>,
        code: &str,
    ) -> Result<(Token, User), AuthError> {
        let token = self.tokens.lookup_by_value(code).await?;

        if token.kind != kind {
            return Err(AuthError::InvalidCode);
        }

        if token.is_expired(self.clock.now()) {
            return Err(AuthError::ExpiredCode);
        }

        let user = self
            .users
            .find_by_id(&token.user_id)
            .await?
            .ok_or(AuthError::InvalidCode)?;

        if email.is_some_and(|email| *email != user.email) {
            return Err(AuthError::InvalidCode);
        }

        Ok((token, user))
    }
}

fn code_message(kind: TokenKind, code: &str) -> (&'static str, String) {
    match kind {
        TokenKind::ResetPassword => ("Password reset code", format!("your reset code is {code}")),
        _ => ("Verify account", format!("your verification code is {code}")),
    }
}

fn require_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        Err(AuthError::Validation("Password must not be empty".to_string()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl<UR, TR, N> AuthServicePort for AuthService<UR, TR, N>
where
    UR: UserRepository,
    TR: TokenRepository,
    N: Notifier,
{
    async fn sign_up(&self, command: SignUpCommand) -> Result<User, AuthError> {
        require_password(&command.password)?;

        if self.users.find_by_username(&command.username).await?.is_some() {
            return Err(AuthError::DuplicateIdentity(IdentityField::Username));
        }

        if self.users.find_by_email(&command.email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity(IdentityField::Email));
        }

        let password_hash = self.hasher.hash(&command.password)?;
        let user = User::register(
            command.username,
            command.email,
            password_hash,
            Role::User,
            self.clock.now(),
        );

        let created_user = self.users.create(user).await?;
        tracing::info!(user_id = %created_user.id, "User signed up");

        Ok(created_user)
    }

    async fn sign_in(&self, command: SignInCommand) -> Result<TokenPair, AuthError> {
        self.authenticate(command, None).await
    }

    async fn sign_in_admin(&self, command: SignInCommand) -> Result<TokenPair, AuthError> {
        self.authenticate(command, Some(Role::Admin)).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let token = match self.tokens.lookup_by_value(refresh_token).await {
            Ok(token) => token,
            Err(TokenError::NotFound) => return Err(AuthError::InvalidRefreshToken),
            Err(e) => return Err(e.into()),
        };

        if token.kind != TokenKind::Refresh {
            return Err(AuthError::InvalidRefreshToken);
        }

        let claims = self
            .tokens
            .verify_refresh(&token.value)
            .map_err(|e| {
                tracing::info!(token_id = %token.id, error = %e, "Refresh token rejected");
                AuthError::InvalidRefreshToken
            })?;

        if claims.id != token.user_id.to_string() || token.is_expired(self.clock.now()) {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .users
            .find_by_id(&token.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if self.settings.refresh_policy == RefreshPolicy::Rotate
            && !self.tokens.take(&token.id).await?
        {
            tracing::info!(token_id = %token.id, "Refresh token already rotated");
            return Err(AuthError::InvalidRefreshToken);
        }

        self.login(user).await
    }

    async fn forgot_password(&self, email: &EmailAddress) -> Result<(), AuthError> {
        self.send_code(email, TokenKind::ResetPassword).await
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AuthError> {
        require_password(&command.new_password)?;

        let (token, mut user) = self
            .redeem_code(
                TokenKind::ResetPassword,
                command.email.as_ref(),
                &command.code,
            )
            .await?;

        user.password_hash = self.hasher.hash(&command.new_password)?;
        user.updated_at = self.clock.now();
        let user = self.users.save(user).await?;

        self.tokens.consume(&token.id).await?;
        tracing::info!(user_id = %user.id, "Password reset");

        Ok(())
    }

    async fn resend_verify_email(&self, email: &EmailAddress) -> Result<(), AuthError> {
        self.send_code(email, TokenKind::VerifyEmail).await
    }

    async fn confirm_email(&self, command: ConfirmEmailCommand) -> Result<User, AuthError> {
        let (token, mut user) = self
            .redeem_code(TokenKind::VerifyEmail, command.email.as_ref(), &command.code)
            .await?;

        user.is_email_verified = true;
        user.updated_at = self.clock.now();
        let user = self.users.save(user).await?;

        self.tokens.consume(&token.id).await?;
        tracing::info!(user_id = %user.id, "Email verified");

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use auth::ConfirmationCodeGenerator;
    use auth::ManualClock;
    use auth::PasswordError;
    use auth::TokenCodec;
    use chrono::DateTime;
    use chrono::Duration;
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::authentication::errors::NotifierError;
    use crate::domain::token::models::NewToken;
    use crate::domain::token::models::TokenId;
    use crate::domain::user::models::UserId;
    use crate::domain::user::models::Username;
    use crate::user::errors::UserError;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;
            async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>, UserError>;
            async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, UserError>;
            async fn save(&self, user: User) -> Result<User, UserError>;
            async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>) -> Result<(), UserError>;
        }
    }

    mock! {
        pub TestTokenRepository {}

        #[async_trait]
        impl TokenRepository for TestTokenRepository {
            async fn create(&self, token: NewToken) -> Result<Token, TokenError>;
            async fn find_by_value(&self, value: &str) -> Result<Option<Token>, TokenError>;
            async fn delete_by_id(&self, id: &TokenId) -> Result<bool, TokenError>;
            async fn delete_by_user_and_kind(&self, user_id: &UserId, kind: TokenKind) -> Result<u64, TokenError>;
            async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, TokenError>;
        }
    }

    mock! {
        pub TestNotifier {}

        #[async_trait]
        impl Notifier for TestNotifier {
            async fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<(), NotifierError>;
        }
    }

    /// Reversible stand-in so tests do not pay for Argon2. Counts verifications.
    #[derive(Default)]
    struct PlainHasher {
        verified: AtomicUsize,
    }

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String, PasswordError> {
            Ok(format!("plain:{password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
            self.verified.fetch_add(1, Ordering::SeqCst);
            Ok(hash == format!("plain:{password}"))
        }
    }

    const ACCESS_SECRET: &[u8] = b"access_secret_at_least_32_bytes_long!";
    const REFRESH_SECRET: &[u8] = b"refresh_secret_at_least_32_bytes_long";

    type TestService = AuthService<MockTestUserRepository, MockTestTokenRepository, MockTestNotifier>;

    struct Harness {
        users: MockTestUserRepository,
        tokens: MockTestTokenRepository,
        notifier: MockTestNotifier,
        hasher: Arc<PlainHasher>,
        clock: Arc<ManualClock>,
        settings: AuthSettings,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                users: MockTestUserRepository::new(),
                tokens: MockTestTokenRepository::new(),
                notifier: MockTestNotifier::new(),
                hasher: Arc::new(PlainHasher::default()),
                clock: Arc::new(ManualClock::default()),
                settings: AuthSettings::default(),
            }
        }

        fn codec(&self) -> TokenCodec {
            TokenCodec::new(ACCESS_SECRET, REFRESH_SECRET, self.clock.clone())
        }

        fn build(self) -> TestService {
            let codec = Arc::new(self.codec());
            let engine = TokenEngine::new(
                Arc::new(self.tokens),
                codec,
                ConfirmationCodeGenerator::seeded(11),
                self.clock.clone(),
            );

            AuthService::new(
                Arc::new(self.users),
                Arc::new(engine),
                Arc::new(self.notifier),
                self.hasher,
                self.clock,
                self.settings,
            )
        }
    }

    fn user_with(role: Role, password: &str) -> User {
        User::register(
            Username::new("alice".to_string()).unwrap(),
            EmailAddress::new("a@x.com".to_string()).unwrap(),
            format!("plain:{password}"),
            role,
            Utc::now(),
        )
    }

    fn code_token(user_id: UserId, kind: TokenKind, expires_at: DateTime<Utc>) -> Token {
        Token {
            id: TokenId(42),
            user_id,
            kind,
            value: "ABC123".to_string(),
            expires_at,
            created_at: expires_at - Duration::hours(1),
        }
    }

    fn sign_in(login: &str, password: &str) -> SignInCommand {
        SignInCommand {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_success() {
        let mut harness = Harness::new();
        harness.users.expect_find_by_username().returning(|_| Ok(None));
        harness.users.expect_find_by_email().returning(|_| Ok(None));
        harness
            .users
            .expect_create()
            .withf(|user| user.role == Role::User && user.password_hash == "plain:p1")
            .times(1)
            .returning(Ok);

        let user = harness
            .build()
            .sign_up(SignUpCommand::new(
                Username::new("alice".to_string()).unwrap(),
                EmailAddress::new("a@x.com".to_string()).unwrap(),
                "p1".to_string(),
            ))
            .await
            .expect("Sign-up failed");

        assert_eq!(user.username.as_str(), "alice");
        assert!(!user.is_email_verified);
    }

    #[tokio::test]
    async fn test_sign_up_reports_username_before_email() {
        let mut harness = Harness::new();
        harness
            .users
            .expect_find_by_username()
            .returning(|_| Ok(Some(user_with(Role::User, "p1"))));
        harness.users.expect_find_by_email().times(0);
        harness.users.expect_create().times(0);

        let result = harness
            .build()
            .sign_up(SignUpCommand::new(
                Username::new("alice".to_string()).unwrap(),
                EmailAddress::new("a@x.com".to_string()).unwrap(),
                "p1".to_string(),
            ))
            .await;

        assert!(matches!(
            result,
            Err(AuthError::DuplicateIdentity(IdentityField::Username))
        ));
    }

    #[tokio::test]
    async fn test_sign_up_store_race_maps_to_duplicate() {
        let mut harness = Harness::new();
        harness.users.expect_find_by_username().returning(|_| Ok(None));
        harness.users.expect_find_by_email().returning(|_| Ok(None));
        harness
            .users
            .expect_create()
            .returning(|user| Err(UserError::EmailAlreadyExists(user.email.to_string())));

        let result = harness
            .build()
            .sign_up(SignUpCommand::new(
                Username::new("alice".to_string()).unwrap(),
                EmailAddress::new("a@x.com".to_string()).unwrap(),
                "p1".to_string(),
            ))
            .await;

        assert!(matches!(
            result,
            Err(AuthError::DuplicateIdentity(IdentityField::Email))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_indistinguishable() {
        let mut harness = Harness::new();
        harness
            .users
            .expect_find_by_username_or_email()
            .returning(|login| {
                if login == "alice" {
                    Ok(Some(user_with(Role::User, "right")))
                } else {
                    Ok(None)
                }
            });
        harness.tokens.expect_create().times(0);
        let service = harness.build();

        let absent = service.sign_in(sign_in("bob", "right")).await.unwrap_err();
        let wrong = service.sign_in(sign_in("alice", "wrong")).await.unwrap_err();

        assert!(matches!(absent, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(absent.to_string(), wrong.to_string());
        assert_eq!(absent.to_string(), "Invalid details");
    }

    #[tokio::test]
    async fn test_sign_in_rejections_all_verify_a_password() {
        let mut harness = Harness::new();
        harness
            .users
            .expect_find_by_username_or_email()
            .returning(|login| {
                if login == "alice" {
                    Ok(Some(user_with(Role::User, "right")))
                } else {
                    Ok(None)
                }
            });
        harness.tokens.expect_create().times(0);
        let hasher = harness.hasher.clone();
        let service = harness.build();

        service.sign_in(sign_in("bob", "right")).await.unwrap_err();
        assert_eq!(hasher.verified.load(Ordering::SeqCst), 1);

        service.sign_in_admin(sign_in("alice", "right")).await.unwrap_err();
        assert_eq!(hasher.verified.load(Ordering::SeqCst), 2);

        service.sign_in(sign_in("alice", "wrong")).await.unwrap_err();
        assert_eq!(hasher.verified.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sign_in_admin_rejects_user_role() {
        let mut harness = Harness::new();
        harness
            .users
            .expect_find_by_username_or_email()
            .returning(|_| Ok(Some(user_with(Role::User, "right"))));

        let result = harness.build().sign_in_admin(sign_in("alice", "right")).await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_issues_pair_and_records_login() {
        let mut harness = Harness::new();
        let user = user_with(Role::Admin, "right");
        let user_id = user.id;
        let now = harness.clock.now();
        let codec = harness.codec();

        harness
            .users
            .expect_find_by_username_or_email()
            .withf(|login| login == "a@x.com")
            .returning(move |_| Ok(Some(user.clone())));
        harness
            .tokens
            .expect_create()
            .withf(move |token| token.kind == TokenKind::Refresh && token.user_id == user_id)
            .times(1)
            .returning(|token| Ok(token.into_token(TokenId(1))));
        harness
            .users
            .expect_save()
            .withf(move |user| user.last_logged_in_at == Some(now))
            .times(1)
            .returning(Ok);

        let pair = harness
            .build()
            .sign_in_admin(sign_in("a@x.com", "right"))
            .await
            .expect("Sign-in failed");

        let claims = codec
            .verify_access(&pair.access_token)
            .expect("Access token did not verify");
        assert_eq!(claims.id, user_id.to_string());
        assert_eq!(claims.role, "admin");
    }

    #[tokio::test]
    async fn test_refresh_rotation_rejects_second_use() {
        let mut harness = Harness::new();
        let user = user_with(Role::User, "right");
        let user_id = user.id;
        let refresh = harness
            .codec()
            .issue_refresh(user_id, 24)
            .expect("Signing failed");
        let stored = Token {
            id: TokenId(5),
            user_id,
            kind: TokenKind::Refresh,
            value: refresh.value.clone(),
            expires_at: refresh.expires_at,
            created_at: harness.clock.now(),
        };

        harness
            .tokens
            .expect_find_by_value()
            .returning(move |_| Ok(Some(stored.clone())));
        harness.users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        harness
            .tokens
            .expect_delete_by_id()
            .with(eq(TokenId(5)))
            .times(2)
            .returning({
                let mut first = true;
                move |_| {
                    let removed = first;
                    first = false;
                    Ok(removed)
                }
            });
        harness
            .tokens
            .expect_create()
            .times(1)
            .returning(|token| Ok(token.into_token(TokenId(6))));
        harness.users.expect_save().times(1).returning(Ok);
        let service = harness.build();

        assert!(service.refresh_token(&refresh.value).await.is_ok());
        assert!(matches!(
            service.refresh_token(&refresh.value).await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_refresh_reuse_keeps_stored_token() {
        let mut harness = Harness::new();
        harness.settings.refresh_policy = RefreshPolicy::Reuse;
        let user = user_with(Role::User, "right");
        let user_id = user.id;
        let refresh = harness
            .codec()
            .issue_refresh(user_id, 24)
            .expect("Signing failed");
        let stored = Token {
            id: TokenId(5),
            user_id,
            kind: TokenKind::Refresh,
            value: refresh.value.clone(),
            expires_at: refresh.expires_at,
            created_at: harness.clock.now(),
        };

        harness
            .tokens
            .expect_find_by_value()
            .returning(move |_| Ok(Some(stored.clone())));
        harness.users.expect_find_by_id().returning(move |_| Ok(Some(user.clone())));
        harness.tokens.expect_delete_by_id().times(0);
        harness
            .tokens
            .expect_create()
            .times(2)
            .returning(|token| Ok(token.into_token(TokenId(6))));
        harness.users.expect_save().times(2).returning(Ok);
        let service = harness.build();

        assert!(service.refresh_token(&refresh.value).await.is_ok());
        assert!(service.refresh_token(&refresh.value).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_and_unknown() {
        let mut harness = Harness::new();
        let user_id = UserId::new();
        let refresh = harness
            .codec()
            .issue_refresh(user_id, 1)
            .expect("Signing failed");
        let stored = Token {
            id: TokenId(5),
            user_id,
            kind: TokenKind::Refresh,
            value: refresh.value.clone(),
            expires_at: refresh.expires_at,
            created_at: harness.clock.now(),
        };
        harness.clock.advance(Duration::hours(2));

        harness.tokens.expect_find_by_value().returning(move |value| {
            if value == stored.value {
                Ok(Some(stored.clone()))
            } else {
                Ok(None)
            }
        });
        harness.tokens.expect_delete_by_id().times(0);
        let service = harness.build();

        assert!(matches!(
            service.refresh_token(&refresh.value).await,
            Err(AuthError::InvalidRefreshToken)
        ));
        assert!(matches!(
            service.refresh_token("not-a-token").await,
            Err(AuthError::InvalidRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let mut harness = Harness::new();
        harness.users.expect_find_by_email().returning(|_| Ok(None));
        harness.tokens.expect_create().times(0);

        let result = harness
            .build()
            .forgot_password(&EmailAddress::new("nobody@x.com".to_string()).unwrap())
            .await;

        assert!(matches!(result, Err(AuthError::NoExistingEmail)));
    }

    #[tokio::test]
    async fn test_forgot_password_sends_code() {
        let mut harness = Harness::new();
        let user = user_with(Role::User, "p1");
        let user_id = user.id;

        harness
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        harness
            .tokens
            .expect_delete_by_user_and_kind()
            .with(eq(user_id), eq(TokenKind::ResetPassword))
            .times(1)
            .returning(|_, _| Ok(1));
        harness
            .tokens
            .expect_create()
            .withf(|token| token.kind == TokenKind::ResetPassword && token.value.len() == 6)
            .times(1)
            .returning(|token| Ok(token.into_token(TokenId(3))));
        harness
            .notifier
            .expect_send()
            .withf(|_, to, subject, body| {
                to == "a@x.com"
                    && subject == "Password reset code"
                    && body.starts_with("your reset code is ")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        assert!(harness
            .build()
            .forgot_password(&EmailAddress::new("a@x.com".to_string()).unwrap())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_code() {
        let mut harness = Harness::new();
        let user = user_with(Role::User, "p1");

        harness
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        harness
            .tokens
            .expect_delete_by_user_and_kind()
            .returning(|_, _| Ok(0));
        harness
            .tokens
            .expect_create()
            .times(1)
            .returning(|token| Ok(token.into_token(TokenId(3))));
        harness.tokens.expect_delete_by_id().times(0);
        harness
            .notifier
            .expect_send()
            .returning(|_, _, _, _| Err(NotifierError::DeliveryFailed("550".to_string())));

        let err = harness
            .build()
            .resend_verify_email(&EmailAddress::new("a@x.com".to_string()).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::NotificationFailure(_)));
        assert_eq!(err.to_string(), "cannot send emails at the moment");
    }

    #[tokio::test]
    async fn test_reset_password_saves_then_consumes() {
        let mut harness = Harness::new();
        let user = user_with(Role::User, "old");
        let token = code_token(
            user.id,
            TokenKind::ResetPassword,
            harness.clock.now() + Duration::hours(1),
        );
        let mut sequence = mockall::Sequence::new();

        harness
            .tokens
            .expect_find_by_value()
            .withf(|value| value == "ABC123")
            .returning(move |_| Ok(Some(token.clone())));
        harness
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        harness
            .users
            .expect_save()
            .withf(|user| user.password_hash == "plain:p2")
            .times(1)
            .in_sequence(&mut sequence)
            .returning(Ok);
        harness
            .tokens
            .expect_delete_by_id()
            .with(eq(TokenId(42)))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(true));

        let result = harness
            .build()
            .reset_password(ResetPasswordCommand {
                email: Some(EmailAddress::new("a@x.com".to_string()).unwrap()),
                code: "ABC123".to_string(),
                new_password: "p2".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_keeps_code_when_save_fails() {
        let mut harness = Harness::new();
        let user = user_with(Role::User, "old");
        let token = code_token(
            user.id,
            TokenKind::ResetPassword,
            harness.clock.now() + Duration::hours(1),
        );

        harness
            .tokens
            .expect_find_by_value()
            .returning(move |_| Ok(Some(token.clone())));
        harness
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        harness
            .users
            .expect_save()
            .returning(|_| Err(UserError::StoreUnavailable("timeout".to_string())));
        harness.tokens.expect_delete_by_id().times(0);

        let result = harness
            .build()
            .reset_password(ResetPasswordCommand {
                email: None,
                code: "ABC123".to_string(),
                new_password: "p2".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let mut harness = Harness::new();
        let token = code_token(
            UserId::new(),
            TokenKind::ResetPassword,
            harness.clock.now() - Duration::seconds(1),
        );

        harness
            .tokens
            .expect_find_by_value()
            .returning(move |_| Ok(Some(token.clone())));
        harness.users.expect_save().times(0);

        let result = harness
            .build()
            .reset_password(ResetPasswordCommand {
                email: None,
                code: "ABC123".to_string(),
                new_password: "p2".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::ExpiredCode)));
    }

    #[tokio::test]
    async fn test_code_of_other_kind_or_owner_rejected() {
        let mut harness = Harness::new();
        let user = user_with(Role::User, "p1");
        let user_id = user.id;
        let expires_at = harness.clock.now() + Duration::hours(1);

        harness.tokens.expect_find_by_value().returning(move |value| {
            let kind = if value == "ABC123" {
                TokenKind::ResetPassword
            } else {
                TokenKind::VerifyEmail
            };
            Ok(Some(code_token(user_id, kind, expires_at)))
        });
        harness
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        harness.users.expect_save().times(0);
        let service = harness.build();

        let wrong_kind = service
            .confirm_email(ConfirmEmailCommand {
                email: None,
                code: "ABC123".to_string(),
            })
            .await;
        let wrong_owner = service
            .confirm_email(ConfirmEmailCommand {
                email: Some(EmailAddress::new("mallory@x.com".to_string()).unwrap()),
                code: "XYZ789".to_string(),
            })
            .await;

        assert!(matches!(wrong_kind, Err(AuthError::InvalidCode)));
        assert!(matches!(wrong_owner, Err(AuthError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_confirm_email_marks_verified() {
        let mut harness = Harness::new();
        let user = user_with(Role::User, "p1");
        let token = code_token(
            user.id,
            TokenKind::VerifyEmail,
            harness.clock.now() + Duration::hours(1),
        );

        harness
            .tokens
            .expect_find_by_value()
            .returning(move |_| Ok(Some(token.clone())));
        harness
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        harness.users.expect_save().times(1).returning(Ok);
        harness
            .tokens
            .expect_delete_by_id()
            .times(1)
            .returning(|_| Ok(true));

        let user = harness
            .build()
            .confirm_email(ConfirmEmailCommand {
                email: None,
                code: "ABC123".to_string(),
            })
            .await
            .expect("Confirmation failed");

        assert!(user.is_email_verified);
    }
}
