//! Registration, login, and token authentication.

pub mod password;
pub mod token;

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::middleware::auth::Authenticator;
use crate::model::{Credentials, Registration, User};
use crate::store::Database;

pub use token::{Claims, TokenSigner};

/// bcrypt cost used unless configured otherwise.
pub const DEFAULT_HASH_COST: u32 = 10;

/// Cost range bcrypt accepts.
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

/// Secret material and cost parameters for [`AuthService`].
#[derive(Clone)]
pub struct AuthSettings {
    pub secret: Vec<u8>,
    pub token_ttl: Duration,
    pub hash_cost: u32,
}

impl AuthSettings {
    /// One-hour tokens, bcrypt cost 10.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: Duration::from_secs(3600),
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

pub struct AuthService {
    db: Database,
    tokens: TokenSigner,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(db: Database, settings: &AuthSettings) -> Self {
        Self {
            db,
            tokens: TokenSigner::new(&settings.secret, settings.token_ttl),
            hash_cost: settings.hash_cost,
        }
    }

    /// Creates a user unless the username or email is already taken.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        let Registration { username, email, password } = registration;
        if self.db.user_exists(&username, &email).await? {
            return Err(Error::Conflict("User already exists".to_owned()));
        }

        let hash = password::hash(password, self.hash_cost).await?;
        let user = self.db.insert_user(&username, &email, &hash).await?;
        info!(username = %user.username, "user registered");
        Ok(user)
    }

    /// Checks credentials and issues a token for the user.
    pub async fn login(&self, credentials: Credentials) -> Result<String> {
        let Credentials { username, password } = credentials;
        let user = self
            .db
            .user_by_username(&username)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;

        if !password::verify(password, user.password_hash.clone()).await? {
            warn!(username = %user.username, "login rejected: invalid password");
            return Err(Error::unauthorized("Invalid password"));
        }

        let token = self.tokens.issue(&user)?;
        info!(username = %user.username, "user logged in");
        Ok(token)
    }

    /// Verifies a token and returns the identity it asserts.
    pub fn authenticate(&self, token: &str) -> Result<Claims> {
        self.tokens.verify(token)
    }
}

impl Authenticator for AuthService {
    type Claims = Claims;

    fn authenticate(&self, token: &str) -> Result<Claims> {
        AuthService::authenticate(self, token)
    }
}
