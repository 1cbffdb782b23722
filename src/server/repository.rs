//! Account storage seam
//!
//! The server only needs login, registration and ban checks; the trait keeps
//! the backing store swappable. The in-memory implementation backs tests and
//! standalone deployments.

use std::collections::HashMap;
use std::sync::Mutex;

/// Outcome of a login attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginState {
    Ok,
    UnknownAccount,
    WrongPassword,
    Banned,
}

impl LoginState {
    /// Wire value for this outcome
    pub fn as_i32(self) -> i32 {
        match self {
            LoginState::Ok => 0,
            LoginState::UnknownAccount => 1,
            LoginState::WrongPassword => 2,
            LoginState::Banned => 3,
        }
    }
}

/// Outcome of a registration attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterState {
    Ok,
    NameTaken,
    InvalidName,
}

impl RegisterState {
    /// Wire value for this outcome
    pub fn as_i32(self) -> i32 {
        match self {
            RegisterState::Ok => 0,
            RegisterState::NameTaken => 1,
            RegisterState::InvalidName => 2,
        }
    }
}

/// Stored account.
#[derive(Clone, Debug)]
pub struct ClientRecord {
    pub id: i32,
    pub username: String,
    pub password: String,
    /// Ban reason when the account is banned
    pub banned: Option<String>,
}

/// Account store used by the login and registration handlers.
pub trait ClientRepository: Send + Sync {
    /// Check credentials for an existing account
    fn login(&self, id: i32, password: &str) -> LoginState;

    /// Create a new account
    fn register(&self, username: &str, password: &str) -> RegisterState;

    /// Ban an account
    fn ban(&self, id: i32, reason: &str);

    /// Fetch an account by id
    fn lookup(&self, id: i32) -> Option<ClientRecord>;
}

struct MemoryInner {
    accounts: HashMap<i32, ClientRecord>,
    next_id: i32,
}

/// In-memory account store.
pub struct MemoryRepository {
    inner: Mutex<MemoryInner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                accounts: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRepository for MemoryRepository {
    fn login(&self, id: i32, password: &str) -> LoginState {
        let inner = self.lock();
        match inner.accounts.get(&id) {
            None => LoginState::UnknownAccount,
            Some(record) if record.banned.is_some() => LoginState::Banned,
            Some(record) if record.password != password => LoginState::WrongPassword,
            Some(_) => LoginState::Ok,
        }
    }

    fn register(&self, username: &str, password: &str) -> RegisterState {
        let username = username.trim();
        if username.is_empty() {
            return RegisterState::InvalidName;
        }
        let mut inner = self.lock();
        if inner.accounts.values().any(|r| r.username == username) {
            return RegisterState::NameTaken;
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.accounts.insert(
            id,
            ClientRecord {
                id,
                username: username.to_string(),
                password: password.to_string(),
                banned: None,
            },
        );
        RegisterState::Ok
    }

    fn ban(&self, id: i32, reason: &str) {
        let mut inner = self.lock();
        if let Some(record) = inner.accounts.get_mut(&id) {
            record.banned = Some(reason.to_string());
        }
    }

    fn lookup(&self, id: i32) -> Option<ClientRecord> {
        self.lock().accounts.get(&id).cloned()
    }
}
