//! Test utilities: an in-process auth provider, a storage wrapper that counts and fails calls, and
//! a ready-to-use [`TestServer`] over the full router.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::auth::{AuthProvider, AuthProviderError, AuthSession, AuthUser};
use crate::chat::ChatCompletionClient;
use crate::config::{Config, DatabaseConfig};
use crate::db::errors::{DbError, Result as DbResult};
use crate::db::models::flashcards::{
    FlashcardCreateDBRequest, FlashcardDBResponse, FlashcardFilter, FlashcardUpdateDBRequest, SourceType,
};
use crate::db::store::{FlashcardStore, InMemoryFlashcardStore};
use crate::types::{FlashcardId, UserId};
use crate::{AppState, build_router};

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory,
        ..Default::default()
    }
}

#[derive(Default)]
struct MockAuthInner {
    tokens: HashMap<String, AuthUser>,
    /// email -> (password, user)
    accounts: HashMap<String, (String, AuthUser)>,
    require_confirmation: bool,
}

/// Auth provider backed by maps. Tokens are opaque strings registered up front or issued by
/// sign-up/sign-in.
#[derive(Default)]
pub struct MockAuthProvider {
    inner: Mutex<MockAuthInner>,
    get_user_calls: AtomicUsize,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as a session for a fresh user with `email`
    pub fn add_token(&self, token: &str, email: &str) -> UserId {
        let user = new_user(email);
        let id = user.id;
        self.inner.lock().tokens.insert(token.to_string(), user);
        id
    }

    /// Register an account that can sign in with `password`
    pub fn add_user(&self, email: &str, password: &str) -> UserId {
        let user = new_user(email);
        let id = user.id;
        self.inner
            .lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), user));
        id
    }

    /// Sign-ups create the account but return no session
    pub fn require_email_confirmation(&self) {
        self.inner.lock().require_confirmation = true;
    }

    pub fn get_user_calls(&self) -> usize {
        self.get_user_calls.load(Ordering::SeqCst)
    }

    fn issue_session(inner: &mut MockAuthInner, user: AuthUser) -> AuthSession {
        let access_token = format!("access-{}", Uuid::new_v4());
        inner.tokens.insert(access_token.clone(), user.clone());
        AuthSession {
            access_token,
            refresh_token: format!("refresh-{}", Uuid::new_v4()),
            user,
        }
    }
}

fn new_user(email: &str) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
        created_at: Some(Utc::now()),
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError> {
        let mut inner = self.inner.lock();
        if inner.accounts.contains_key(email) {
            return Err(AuthProviderError::Rejected {
                status: 422,
                message: Some("User already registered".to_string()),
            });
        }

        let user = new_user(email);
        inner
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        if inner.require_confirmation {
            return Err(AuthProviderError::Rejected {
                status: 200,
                message: None,
            });
        }
        Ok(Self::issue_session(&mut inner, user))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError> {
        let mut inner = self.inner.lock();
        let user = match inner.accounts.get(email) {
            Some((expected, user)) if expected == password => user.clone(),
            _ => {
                return Err(AuthProviderError::Rejected {
                    status: 400,
                    message: Some("Invalid login credentials".to_string()),
                });
            }
        };
        Ok(Self::issue_session(&mut inner, user))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthProviderError> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .lock()
            .tokens
            .get(access_token)
            .cloned()
            .ok_or(AuthProviderError::Rejected {
                status: 401,
                message: Some("invalid JWT".to_string()),
            })
    }
}

/// [`InMemoryFlashcardStore`] that counts calls made through the trait and can be told to fail
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryFlashcardStore,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingStore {
    /// The wrapped store; calls made here are neither counted nor failed
    pub fn inner(&self) -> &InMemoryFlashcardStore {
        &self.inner
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// While set, every call fails with a storage error
    pub fn fail_next_calls(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    fn record(&self) -> DbResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::Other(anyhow!("simulated storage failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl FlashcardStore for RecordingStore {
    async fn create(&self, owner: UserId, request: &FlashcardCreateDBRequest) -> DbResult<FlashcardDBResponse> {
        self.record()?;
        self.inner.create(owner, request).await
    }

    async fn get(&self, owner: UserId, id: FlashcardId) -> DbResult<Option<FlashcardDBResponse>> {
        self.record()?;
        self.inner.get(owner, id).await
    }

    async fn list(&self, owner: UserId, filter: &FlashcardFilter) -> DbResult<Vec<FlashcardDBResponse>> {
        self.record()?;
        self.inner.list(owner, filter).await
    }

    async fn update(
        &self,
        owner: UserId,
        id: FlashcardId,
        request: &FlashcardUpdateDBRequest,
    ) -> DbResult<Option<FlashcardDBResponse>> {
        self.record()?;
        self.inner.update(owner, id, request).await
    }

    async fn soft_delete(&self, owner: UserId, id: FlashcardId) -> DbResult<bool> {
        self.record()?;
        self.inner.soft_delete(owner, id).await
    }
}

/// State over an empty in-memory store with no chat client
pub fn create_test_state(auth: Arc<dyn AuthProvider>) -> AppState {
    AppState::builder()
        .config(create_test_config())
        .flashcards(Arc::new(InMemoryFlashcardStore::new()))
        .auth(auth)
        .build()
}

pub struct TestApp {
    pub server: TestServer,
    pub auth: Arc<MockAuthProvider>,
    pub store: Arc<RecordingStore>,
}

impl TestApp {
    /// Register a fresh bearer token for a new user
    pub fn sign_in(&self, email: &str) -> (UserId, String) {
        let token = format!("token-{}", Uuid::new_v4());
        let user_id = self.auth.add_token(&token, email);
        (user_id, token)
    }

    /// Insert a manual card directly, bypassing call counting
    pub async fn seed_card(&self, owner: UserId, front: &str, back: &str) -> FlashcardDBResponse {
        let request = FlashcardCreateDBRequest {
            front: front.to_string(),
            back: back.to_string(),
            source_type: SourceType::Manual,
            source_generation_card_id: None,
        };
        self.store
            .inner()
            .create(owner, &request)
            .await
            .expect("Failed to seed flashcard")
    }
}

fn build_test_app(chat: Option<ChatCompletionClient>) -> TestApp {
    let auth = Arc::new(MockAuthProvider::new());
    let store = Arc::new(RecordingStore::default());

    let state = AppState::builder()
        .config(create_test_config())
        .flashcards(store.clone())
        .auth(auth.clone())
        .maybe_chat(chat.map(Arc::new))
        .build();

    let router = build_router(state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    TestApp { server, auth, store }
}

pub fn create_test_app() -> TestApp {
    build_test_app(None)
}

pub fn create_test_app_with_chat(chat: ChatCompletionClient) -> TestApp {
    build_test_app(Some(chat))
}
