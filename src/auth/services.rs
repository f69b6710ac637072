use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::{Claims, JwtKeys},
        password::{hash_password, verify_password, MIN_PASSWORD_LEN},
        repo::UserStore,
    },
    db::StoreError,
    error::{AppError, AppResult},
};

const EMAIL_TAKEN: &str = "Email already exists";
const USERNAME_TAKEN: &str = "Username already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Registration, login and identity lookup over a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys, bcrypt_cost: u32) -> Self {
        Self {
            users,
            keys,
            bcrypt_cost,
        }
    }

    /// Checks run in order: email free, username free, password long enough.
    #[instrument(skip(self, req), fields(email = %req.email, username = %req.username))]
    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        if self.users.find_by_email(&req.email).await?.is_some() {
            warn!("email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        if self.users.find_by_username(&req.username).await?.is_some() {
            warn!("username already registered");
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }
        // Counts chars, so astral-plane symbols weigh one each.
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            warn!("password too short");
            return Err(AppError::Conflict(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let cost = self.bcrypt_cost;
        let password = req.password;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .context("hashing task panicked")??;

        let user = self
            .users
            .create(&req.email, &req.username, &hash)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate("email") => AppError::Conflict(EMAIL_TAKEN.into()),
                StoreError::Duplicate("username") => AppError::Conflict(USERNAME_TAKEN.into()),
                other => other.into(),
            })?;

        let access_token = self.keys.sign(&user)?;
        info!(user_id = user.id, "user registered");
        Ok(AuthResponse {
            user: user.into(),
            access_token,
        })
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let Some(user) = self.users.find_by_email(&req.email).await? else {
            warn!("login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        let password = req.password;
        let stored = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .context("verify task panicked")??;
        if !ok {
            warn!(user_id = user.id, "login invalid password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let access_token = self.keys.sign(&user)?;
        info!(user_id = user.id, "user logged in");
        Ok(AuthResponse {
            user: user.into(),
            access_token,
        })
    }

    /// Bearer token guard: signature, expiry, issuer and audience must all hold.
    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        self.keys.verify(token).map_err(|e| {
            debug!(error = %e, "token rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        })
    }

    /// Resolves verified claims to the stored user.
    #[instrument(skip(self, claims), fields(user_id = claims.sub))]
    pub async fn current_user(&self, claims: &Claims) -> AppResult<PublicUser> {
        match self.users.find_by_id(claims.sub).await? {
            Some(user) => Ok(user.into()),
            None => {
                warn!("token subject no longer exists");
                Err(AppError::Unauthorized("User not found".into()))
            }
        }
    }
}
