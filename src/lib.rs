//! tg-contacts: bulk import of phone numbers into a Telegram contact list, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
