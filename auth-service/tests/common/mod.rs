#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::ConfirmationCodeGenerator;
use auth::ManualClock;
use auth::PasswordError;
use auth::TokenCodec;
use auth_service::domain::access::gate::AccessGate;
use auth_service::domain::authentication::errors::NotifierError;
use auth_service::domain::authentication::models::AuthSettings;
use auth_service::domain::authentication::ports::Notifier;
use auth_service::domain::authentication::ports::PasswordHasher;
use auth_service::domain::authentication::service::AuthService;
use auth_service::domain::health::errors::HealthError;
use auth_service::domain::health::ports::HealthCheck;
use auth_service::domain::token::errors::TokenError;
use auth_service::domain::token::models::NewToken;
use auth_service::domain::token::models::Token;
use auth_service::domain::token::models::TokenId;
use auth_service::domain::token::models::TokenKind;
use auth_service::domain::token::ports::TokenRepository;
use auth_service::domain::token::reaper::ExpiryReaper;
use auth_service::domain::token::service::TokenEngine;
use auth_service::domain::user::errors::UserError;
use auth_service::domain::user::models::EmailAddress;
use auth_service::domain::user::models::Role;
use auth_service::domain::user::models::User;
use auth_service::domain::user::models::UserId;
use auth_service::domain::user::models::Username;
use auth_service::domain::user::ports::UserRepository;
use auth_service::domain::user::service::UserService;
use auth_service::inbound::http::router::create_router;
use chrono::DateTime;
use chrono::Utc;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-at-least-32-bytes-long";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-at-least-32-bytes-long";

/// Test application that spawns a real server over in-memory stores
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserRepository>,
    pub tokens: Arc<InMemoryTokenRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub codec: Arc<TokenCodec>,
    pub reaper: Arc<ExpiryReaper<InMemoryTokenRepository>>,
    pub health: Arc<SwitchableHealthCheck>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(AuthSettings::default()).await
    }

    pub async fn spawn_with(settings: AuthSettings) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let clock = Arc::new(ManualClock::default());
        let users = Arc::new(InMemoryUserRepository::default());
        let tokens = Arc::new(InMemoryTokenRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let codec = Arc::new(TokenCodec::new(
            ACCESS_SECRET,
            REFRESH_SECRET,
            clock.clone(),
        ));

        let engine = Arc::new(TokenEngine::new(
            tokens.clone(),
            codec.clone(),
            ConfirmationCodeGenerator::from_entropy(),
            clock.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(
            users.clone(),
            engine,
            notifier.clone(),
            Arc::new(PlainHasher),
            clock.clone(),
            settings,
        ));
        let user_service = Arc::new(UserService::new(users.clone(), clock.clone()));
        let gate = Arc::new(AccessGate::new(codec.clone()));
        let reaper = Arc::new(ExpiryReaper::new(tokens.clone(), clock.clone()));
        let health = Arc::new(SwitchableHealthCheck::default());

        let router = create_router(auth_service, user_service, gate, health.clone());

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            clock,
            users,
            tokens,
            notifier,
            codec,
            reaper,
            health,
        }
    }

    /// Insert a user directly into the store, bypassing sign-up
    pub fn seed_user(&self, username: &str, email: &str, password: &str, role: Role) -> User {
        let user = User::register(
            Username::new(username.to_string()).unwrap(),
            EmailAddress::new(email.to_string()).unwrap(),
            PlainHasher.hash(password).unwrap(),
            role,
            Utc::now(),
        );
        self.users.insert(user.clone());
        user
    }

    /// Sign in through the API and return (access_token, refresh_token)
    pub async fn sign_in(&self, login: &str, password: &str) -> (String, String) {
        let response = self
            .post("/auth/user/signin")
            .json(&serde_json::json!({ "login": login, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        (
            body["data"]["access_token"].as_str().unwrap().to_string(),
            body["data"]["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PATCH request with Bearer token
    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .patch(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }
}

/// Reversible stand-in so tests do not pay for Argon2.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        Ok(hash == format!("plain:{password}"))
    }
}

struct StoredUser {
    user: User,
    deleted_at: Option<DateTime<Utc>>,
}

/// User store holding rows in memory; uniqueness is checked under one lock.
#[derive(Default)]
pub struct InMemoryUserRepository {
    rows: Mutex<Vec<StoredUser>>,
}

impl InMemoryUserRepository {
    pub fn insert(&self, user: User) {
        self.rows.lock().unwrap().push(StoredUser {
            user,
            deleted_at: None,
        });
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.find(|user| user.id == *id)
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| &row.user)
            .find(|user| predicate(user))
            .cloned()
    }

    fn check_unique(rows: &[StoredUser], user: &User) -> Result<(), UserError> {
        for row in rows.iter().filter(|row| row.deleted_at.is_none()) {
            if row.user.id == user.id {
                continue;
            }
            if row.user.username == user.username {
                return Err(UserError::UsernameAlreadyExists(user.username.to_string()));
            }
            if row.user.email == user.email {
                return Err(UserError::EmailAlreadyExists(user.email.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut rows = self.rows.lock().unwrap();
        Self::check_unique(&rows, &user)?;
        rows.push(StoredUser {
            user: user.clone(),
            deleted_at: None,
        });
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.find(|user| user.id == *id))
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        Ok(self.find(|user| user.username == *username))
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        Ok(self.find(|user| user.email == *email))
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, UserError> {
        Ok(self.find(|user| {
            user.username.as_str() == identifier || user.email.as_str() == identifier
        }))
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, UserError> {
        let rows = self.rows.lock().unwrap();
        let mut users: Vec<User> = rows
            .iter()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.user.clone())
            .collect();
        users.sort_by_key(|user| user.created_at);

        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn save(&self, user: User) -> Result<User, UserError> {
        let mut rows = self.rows.lock().unwrap();
        Self::check_unique(&rows, &user)?;

        let row = rows
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.user.id == user.id)
            .ok_or_else(|| UserError::NotFound(user.id.to_string()))?;
        row.user = user.clone();

        Ok(user)
    }

    async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>) -> Result<(), UserError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.user.id == *id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        row.deleted_at = Some(deleted_at);

        Ok(())
    }
}

/// Token store holding rows in memory; `value` is unique.
#[derive(Default)]
pub struct InMemoryTokenRepository {
    rows: Mutex<Vec<Token>>,
    next_id: AtomicI64,
}

impl InMemoryTokenRepository {
    pub fn all(&self) -> Vec<Token> {
        self.rows.lock().unwrap().clone()
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.rows.lock().unwrap().iter().any(|token| token.value == value)
    }

    pub fn count_of(&self, kind: TokenKind) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|token| token.kind == kind)
            .count()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn create(&self, token: NewToken) -> Result<Token, TokenError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|row| row.value == token.value) {
            return Err(TokenError::DuplicateValue);
        }

        let id = TokenId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let token = token.into_token(id);
        rows.push(token.clone());

        Ok(token)
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<Token>, TokenError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|token| token.value == value)
            .cloned())
    }

    async fn delete_by_id(&self, id: &TokenId) -> Result<bool, TokenError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|token| token.id != *id);
        Ok(rows.len() < before)
    }

    async fn delete_by_user_and_kind(
        &self,
        user_id: &UserId,
        kind: TokenKind,
    ) -> Result<u64, TokenError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|token| !(token.user_id == *user_id && token.kind == kind));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<u64, TokenError> {
        let mut rows = self.rows.lock().unwrap();
        let count = rows.len();
        rows.retain(|token| token.expires_at >= before);
        Ok((count - rows.len()) as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records messages instead of delivering them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Code carried by the latest message to `to`: the last word of its body.
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|message| message.to == to)
            .and_then(|message| message.body.split_whitespace().last())
            .map(str::to_string)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifierError> {
        self.sent.lock().unwrap().push(SentMessage {
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Store probe whose outcome the test flips.
#[derive(Default)]
pub struct SwitchableHealthCheck {
    down: AtomicBool,
}

impl SwitchableHealthCheck {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthCheck for SwitchableHealthCheck {
    async fn check(&self) -> Result<(), HealthError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(HealthError::StoreUnreachable("connection refused".to_string()));
        }
        Ok(())
    }
}
