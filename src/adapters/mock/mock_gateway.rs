//! Mock contact gateway for dry runs and tests.
//!
//! Keeps contacts in memory, records every batch call, and can be scripted to
//! throttle or fail specific calls.

use crate::domain::entities::REASON_PRIVACY;
use crate::domain::{ContactEntry, DomainError, ImportResponse, RecordRejection};
use crate::ports::ContactGateway;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// What the next `import_batch` call does. Unscripted calls behave as `Accept`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    /// Import everything except numbers marked unknown or private.
    Accept,
    /// Import only these client ids; the rest are left out of the response.
    ImportOnly(Vec<i64>),
    FloodWait(u64),
    Transport(String),
    Connection(String),
}

/// One recorded `import_batch` call.
#[derive(Debug, Clone)]
pub struct BatchCall {
    pub at: Instant,
    pub contacts: Vec<ContactEntry>,
}

#[derive(Debug)]
struct MockState {
    authenticated: bool,
    existing: Vec<String>,
    lookup_error: Option<String>,
    script: VecDeque<ScriptedResponse>,
    unknown: HashSet<String>,
    private: HashSet<String>,
    calls: Vec<BatchCall>,
}

/// In-memory `ContactGateway`.
pub struct MockContactGateway {
    state: Mutex<MockState>,
    /// Simulated network delay per call in milliseconds.
    delay_ms: u64,
}

impl MockContactGateway {
    /// Authorized, empty contact list, no latency.
    pub fn new() -> Self {
        Self::with_delay(0)
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            state: Mutex::new(MockState {
                authenticated: true,
                existing: Vec::new(),
                lookup_error: None,
                script: VecDeque::new(),
                unknown: HashSet::new(),
                private: HashSet::new(),
                calls: Vec::new(),
            }),
            delay_ms,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.state().authenticated = authenticated;
    }

    pub fn add_existing(&self, e164: &str) {
        self.state().existing.push(e164.to_string());
    }

    pub fn fail_lookup(&self, message: &str) {
        self.state().lookup_error = Some(message.to_string());
    }

    /// Queue the behaviour of the next unscripted call.
    pub fn push_response(&self, response: ScriptedResponse) {
        self.state().script.push_back(response);
    }

    /// Number has no account on the service (silently not imported).
    pub fn mark_unknown(&self, e164: &str) {
        self.state().unknown.insert(e164.to_string());
    }

    /// Number is explicitly refused because of the user's privacy settings.
    pub fn mark_private(&self, e164: &str) {
        self.state().private.insert(e164.to_string());
    }

    pub fn calls(&self) -> Vec<BatchCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn existing(&self) -> Vec<String> {
        self.state().existing.clone()
    }
}

impl Default for MockContactGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ContactGateway for MockContactGateway {
    async fn connect(&self) -> Result<bool, DomainError> {
        info!("[MOCK] connected");
        Ok(self.state().authenticated)
    }

    async fn is_authenticated(&self) -> Result<bool, DomainError> {
        Ok(self.state().authenticated)
    }

    async fn list_contacts(&self) -> Result<Vec<String>, DomainError> {
        let state = self.state();
        match &state.lookup_error {
            Some(msg) => Err(DomainError::Lookup(msg.clone())),
            None => Ok(state.existing.clone()),
        }
    }

    async fn import_batch(&self, contacts: &[ContactEntry]) -> Result<ImportResponse, DomainError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        let mut state = self.state();
        state.calls.push(BatchCall {
            at: Instant::now(),
            contacts: contacts.to_vec(),
        });
        if !state.authenticated {
            return Err(DomainError::Auth("session is not authorized".into()));
        }
        match state.script.pop_front().unwrap_or(ScriptedResponse::Accept) {
            ScriptedResponse::FloodWait(seconds) => Err(DomainError::FloodWait { seconds }),
            ScriptedResponse::Transport(msg) => Err(DomainError::Transport(msg)),
            ScriptedResponse::Connection(msg) => Err(DomainError::Connection(msg)),
            ScriptedResponse::ImportOnly(ids) => {
                let response = ImportResponse {
                    imported: contacts
                        .iter()
                        .map(|c| c.client_id)
                        .filter(|id| ids.contains(id))
                        .collect(),
                    rejected: Vec::new(),
                };
                for c in contacts.iter().filter(|c| ids.contains(&c.client_id)) {
                    state.existing.push(c.phone.clone());
                }
                Ok(response)
            }
            ScriptedResponse::Accept => {
                let mut response = ImportResponse::default();
                for c in contacts {
                    if state.private.contains(&c.phone) {
                        response.rejected.push(RecordRejection {
                            client_id: c.client_id,
                            reason: REASON_PRIVACY.to_string(),
                        });
                    } else if !state.unknown.contains(&c.phone) {
                        response.imported.push(c.client_id);
                        state.existing.push(c.phone.clone());
                    }
                }
                info!(
                    submitted = contacts.len(),
                    imported = response.imported.len(),
                    "[MOCK] imported contacts"
                );
                Ok(response)
            }
        }
    }
}
