//! Registration, login, and bearer-token authentication.
//!
//! Failures that could tell a caller whether an account exists are unified:
//! an unknown email and a wrong password yield the same `Unauthorized` message,
//! and every way a token can be bad yields the same `Unauthorized` message.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::extractors::AuthenticatedUser;
use super::password::PasswordHasher;
use super::token::TokenService;
use super::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::models::{NewUser, User, UserProfile};
use crate::store::{TaskStore, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthGateway {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
}

impl AuthGateway {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        tokens: Arc<TokenService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            tasks,
            tokens,
            hasher,
        }
    }

    /// Creates an account and returns its identity with a fresh token.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        request.validate()?;

        let existing = self
            .users
            .find_by_email(&request.email)
            .await
            .map_err(|e| AppError::from_store("Failed to register user", e))?;
        if existing.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let hasher = self.hasher.clone();
        let password = request.password;
        let password_hash = run_blocking(move || hasher.hash(&password)).await?;

        // The store re-checks uniqueness, which covers two concurrent registrations.
        let user = self
            .users
            .insert(User::new(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
            }))
            .await
            .map_err(|e| AppError::from_store("Failed to register user", e))?;

        log::info!("registered user {}", user.id);
        self.respond_with_token(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        request.validate()?;

        let user = self
            .users
            .find_by_email(&request.email)
            .await
            .map_err(|e| AppError::from_store("Failed to log in", e))?;

        let hasher = self.hasher.clone();
        let password = request.password;
        let (user, valid) = match user {
            Some(user) => {
                let hash = user.password_hash.clone();
                let valid = run_blocking(move || hasher.verify(&password, &hash)).await?;
                (Some(user), valid)
            }
            None => {
                run_blocking(move || Ok(hasher.verify_dummy(&password))).await?;
                (None, false)
            }
        };

        match user {
            Some(user) if valid => self.respond_with_token(user),
            _ => {
                log::debug!("login rejected");
                Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()))
            }
        }
    }

    /// Resolves an `Authorization` header value to the caller's identity.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<AuthenticatedUser, AppError> {
        let header = authorization
            .ok_or_else(|| AppError::Unauthorized("Authorization token not provided".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".into()))?;

        let claims = self.tokens.verify(token)?;
        Ok(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(|e| AppError::from_store("Failed to load account", e))?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Deletes the account together with every task it owns.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AppError> {
        let removed_tasks = self
            .tasks
            .delete_by_owner(user_id)
            .await
            .map_err(|e| AppError::from_store("Failed to delete account", e))?;

        let removed = self
            .users
            .delete(user_id)
            .await
            .map_err(|e| AppError::from_store("Failed to delete account", e))?;
        if !removed {
            return Err(AppError::NotFound("User not found".into()));
        }

        log::info!("deleted user {} and {} task(s)", user_id, removed_tasks);
        Ok(())
    }

    fn respond_with_token(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = self.tokens.issue(user.id, &user.email)?;
        Ok(AuthResponse {
            user_id: user.id,
            name: user.name,
            email: user.email,
            token,
        })
    }
}

/// Runs password hashing work on the blocking thread pool.
async fn run_blocking<F, T>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::internal("Password worker failed", e))?
}
