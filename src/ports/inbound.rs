//! Inbound ports. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: UI/CLI invokes application use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive menu until the user exits.
    async fn run(&self) -> Result<(), DomainError>;
}

/// Collects login details from the user during the auth flow.
#[async_trait::async_trait]
pub trait LoginPrompt: Send + Sync {
    async fn phone_number(&self) -> Result<String, DomainError>;

    async fn login_code(&self) -> Result<String, DomainError>;

    async fn password(&self, hint: Option<&str>) -> Result<String, DomainError>;
}
