//! In-memory adapters for dry runs and tests.

pub mod mock_gateway;

pub use mock_gateway::{BatchCall, MockContactGateway, ScriptedResponse};
