//! Implements AuthPort using grammers Client.
//!
//! The pending login step (code sent / password required) is kept in one
//! state slot so an out-of-order call fails instead of reusing a stale token.

use crate::adapters::telegram::mapper;
use crate::domain::{DomainError, SignInResult};
use crate::ports::AuthPort;
use async_trait::async_trait;
use grammers_client::client::{LoginToken, PasswordToken};
use grammers_client::{Client, InvocationError, SignInError};
use tokio::sync::Mutex;
use tracing::warn;

enum LoginStep {
    Idle,
    CodeSent(LoginToken),
    PasswordRequired(PasswordToken),
}

pub struct GrammersAuthAdapter {
    client: Client,
    step: Mutex<LoginStep>,
}

impl GrammersAuthAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            step: Mutex::new(LoginStep::Idle),
        }
    }
}

/// A throttled code request keeps its wait time; anything else is an auth failure.
fn request_error(e: InvocationError) -> DomainError {
    match mapper::invocation_error(e) {
        flood @ DomainError::FloodWait { .. } => flood,
        other => DomainError::Auth(format!("request login code: {}", other)),
    }
}

#[async_trait]
impl AuthPort for GrammersAuthAdapter {
    async fn is_authenticated(&self) -> Result<bool, DomainError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| DomainError::Connection(e.to_string()))
    }

    async fn request_login_code(&self, phone: &str, api_hash: &str) -> Result<(), DomainError> {
        let token = self
            .client
            .request_login_code(phone, api_hash)
            .await
            .map_err(request_error)?;
        *self.step.lock().await = LoginStep::CodeSent(token);
        Ok(())
    }

    async fn sign_in(&self, code: &str) -> Result<SignInResult, DomainError> {
        let mut step = self.step.lock().await;
        let LoginStep::CodeSent(token) = std::mem::replace(&mut *step, LoginStep::Idle) else {
            return Err(DomainError::Auth("no login code was requested".into()));
        };
        match self.client.sign_in(&token, code).await {
            Ok(_) => Ok(SignInResult::Success),
            Err(SignInError::PasswordRequired(pt)) => {
                let hint = pt.hint().map(String::from);
                *step = LoginStep::PasswordRequired(pt);
                Ok(SignInResult::PasswordRequired { hint })
            }
            Err(SignInError::InvalidCode) => {
                // Same token stays valid for another attempt.
                *step = LoginStep::CodeSent(token);
                Err(DomainError::Auth("invalid login code".into()))
            }
            Err(SignInError::SignUpRequired) => Err(DomainError::Auth(
                "this number has no Telegram account; sign up with an official app first".into(),
            )),
            Err(e) => {
                warn!(error = %e, "sign in failed");
                Err(DomainError::Auth(format!("sign in: {}", e)))
            }
        }
    }

    async fn check_password(&self, password: &[u8]) -> Result<(), DomainError> {
        let mut step = self.step.lock().await;
        let LoginStep::PasswordRequired(pt) = std::mem::replace(&mut *step, LoginStep::Idle) else {
            return Err(DomainError::Auth("no password was requested".into()));
        };
        self.client
            .check_password(pt, password)
            .await
            .map_err(|e| DomainError::Auth(format!("check password: {}", e)))?;
        Ok(())
    }
}
