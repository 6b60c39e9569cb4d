//! Implements ContactGateway using grammers Client.
//!
//! Raw invoke of `contacts.importContacts` / `contacts.getContacts`. FloodWait is
//! surfaced to the orchestrator instead of being slept here.

use crate::adapters::telegram::mapper;
use crate::domain::{ContactEntry, DomainError, ImportResponse};
use crate::ports::ContactGateway;
use async_trait::async_trait;
use grammers_client::tl;
use grammers_client::Client;
use tracing::{debug, info};

/// Telegram contact gateway. Shares the session with the auth adapter via a cloned Client.
pub struct GrammersContactGateway {
    client: Client,
}

impl GrammersContactGateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContactGateway for GrammersContactGateway {
    /// Bot accounts cannot add contacts by phone, so they are refused here.
    async fn connect(&self) -> Result<bool, DomainError> {
        if !self.is_authenticated().await? {
            return Ok(false);
        }
        let me = self
            .client
            .get_me()
            .await
            .map_err(|e| DomainError::Connection(e.to_string()))?;
        if me.is_bot() {
            return Err(DomainError::Auth(
                "bot sessions cannot import contacts; log in with a user account".into(),
            ));
        }
        info!(user_id = me.id().bot_api_dialog_id(), "connected to Telegram");
        Ok(true)
    }

    async fn is_authenticated(&self) -> Result<bool, DomainError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| DomainError::Connection(e.to_string()))
    }

    async fn list_contacts(&self) -> Result<Vec<String>, DomainError> {
        let raw = self
            .client
            .invoke(&tl::functions::contacts::GetContacts { hash: 0 })
            .await
            .map_err(|e| DomainError::Lookup(e.to_string()))?;
        let numbers = mapper::contacts_to_numbers(raw);
        debug!(count = numbers.len(), "fetched existing contacts");
        Ok(numbers)
    }

    async fn import_batch(&self, contacts: &[ContactEntry]) -> Result<ImportResponse, DomainError> {
        let req = tl::functions::contacts::ImportContacts {
            contacts: contacts.iter().map(mapper::contact_to_input).collect(),
        };
        let raw = self
            .client
            .invoke(&req)
            .await
            .map_err(mapper::invocation_error)?;
        let response = mapper::imported_to_response(raw);
        debug!(
            submitted = contacts.len(),
            imported = response.imported.len(),
            retry = response.rejected.len(),
            "importContacts answered"
        );
        Ok(response)
    }
}
