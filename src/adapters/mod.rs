//! Infrastructure adapters. Implement outbound ports.
//!
//! Telegram, filesystem, terminal. Map errors to DomainError.

pub mod export;
pub mod mock;
pub mod persistence;
pub mod telegram;
pub mod ui;
