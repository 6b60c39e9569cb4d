//! Login flow: phone -> code -> 2FA password when the account has one.
//!
//! Prompts come from the UI through `LoginPrompt`; the remote calls go through `AuthPort`.

use crate::domain::{DomainError, SignInResult};
use crate::ports::{AuthPort, LoginPrompt};
use std::sync::Arc;
use tracing::info;

pub struct AuthService {
    auth: Arc<dyn AuthPort>,
    api_hash: String,
}

impl AuthService {
    pub fn new(auth: Arc<dyn AuthPort>, api_hash: impl Into<String>) -> Self {
        Self {
            auth,
            api_hash: api_hash.into(),
        }
    }

    pub async fn is_authenticated(&self) -> Result<bool, DomainError> {
        self.auth.is_authenticated().await
    }

    /// No-op when the stored session is already authorized.
    pub async fn run_auth_flow(&self, prompt: &dyn LoginPrompt) -> Result<(), DomainError> {
        if self.auth.is_authenticated().await? {
            info!("session already authorized");
            return Ok(());
        }

        let phone = prompt.phone_number().await?;
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(DomainError::InvalidInput("phone number is required to log in".into()));
        }
        self.auth.request_login_code(phone, &self.api_hash).await?;
        info!("login code requested");

        let code = prompt.login_code().await?;
        match self.auth.sign_in(code.trim()).await? {
            SignInResult::Success => {}
            SignInResult::PasswordRequired { hint } => {
                info!("account has two-step verification");
                let password = prompt.password(hint.as_deref()).await?;
                self.auth.check_password(password.as_bytes()).await?;
            }
        }
        info!("signed in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAuth {
        authorized: bool,
        two_factor: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeAuth {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait::async_trait]
    impl AuthPort for FakeAuth {
        async fn is_authenticated(&self) -> Result<bool, DomainError> {
            Ok(self.authorized)
        }

        async fn request_login_code(&self, phone: &str, api_hash: &str) -> Result<(), DomainError> {
            self.log(format!("code:{}:{}", phone, api_hash));
            Ok(())
        }

        async fn sign_in(&self, code: &str) -> Result<SignInResult, DomainError> {
            self.log(format!("sign_in:{}", code));
            if code != "12345" {
                return Err(DomainError::Auth("Invalid login code".into()));
            }
            if self.two_factor {
                Ok(SignInResult::PasswordRequired {
                    hint: Some("pet".into()),
                })
            } else {
                Ok(SignInResult::Success)
            }
        }

        async fn check_password(&self, password: &[u8]) -> Result<(), DomainError> {
            self.log(format!("password:{}", String::from_utf8_lossy(password)));
            Ok(())
        }
    }

    struct FixedPrompt {
        code: &'static str,
        hints: Mutex<Vec<Option<String>>>,
    }

    #[async_trait::async_trait]
    impl LoginPrompt for FixedPrompt {
        async fn phone_number(&self) -> Result<String, DomainError> {
            Ok(" +85291234567 ".into())
        }

        async fn login_code(&self) -> Result<String, DomainError> {
            Ok(self.code.into())
        }

        async fn password(&self, hint: Option<&str>) -> Result<String, DomainError> {
            self.hints.lock().unwrap().push(hint.map(String::from));
            Ok("secret".into())
        }
    }

    fn prompt(code: &'static str) -> FixedPrompt {
        FixedPrompt {
            code,
            hints: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_already_authorized_skips_prompts() {
        let auth = Arc::new(FakeAuth {
            authorized: true,
            ..FakeAuth::default()
        });
        AuthService::new(auth.clone(), "hash")
            .run_auth_flow(&prompt("12345"))
            .await
            .unwrap();
        assert!(auth.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_code_login() {
        let auth = Arc::new(FakeAuth::default());
        AuthService::new(auth.clone(), "hash")
            .run_auth_flow(&prompt("12345"))
            .await
            .unwrap();
        let calls = auth.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["code:+85291234567:hash", "sign_in:12345"]);
    }

    #[tokio::test]
    async fn test_two_factor_asks_for_password_with_hint() {
        let auth = Arc::new(FakeAuth {
            two_factor: true,
            ..FakeAuth::default()
        });
        let p = prompt("12345");
        AuthService::new(auth.clone(), "hash")
            .run_auth_flow(&p)
            .await
            .unwrap();
        assert_eq!(*p.hints.lock().unwrap(), vec![Some("pet".to_string())]);
        assert_eq!(auth.calls.lock().unwrap().last().unwrap(), "password:secret");
    }

    #[tokio::test]
    async fn test_bad_code_is_auth_error() {
        let auth = Arc::new(FakeAuth::default());
        let err = AuthService::new(auth, "hash")
            .run_auth_flow(&prompt("000"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Auth(_)));
    }
}
