//! Map between domain contact types and grammers tl types.

use crate::domain::{ContactEntry, DomainError, ImportResponse, RecordRejection};
use grammers_client::tl;
use grammers_client::InvocationError;

/// Reason attached to ids the server asks to resubmit later.
pub const REASON_RETRY_LATER: &str = "import limit reached, retry later";

/// Fallback wait when a 420 carries no value.
const DEFAULT_FLOOD_WAIT_SECS: u64 = 60;

pub fn contact_to_input(entry: &ContactEntry) -> tl::enums::InputContact {
    tl::enums::InputContact::InputPhoneContact(tl::types::InputPhoneContact {
        client_id: entry.client_id,
        phone: entry.phone.clone(),
        first_name: entry.first_name.clone(),
        last_name: entry.last_name.clone(),
        note: None,
    })
}

/// `contacts.importedContacts` -> accepted client ids + retry list as rejections.
pub fn imported_to_response(raw: tl::enums::contacts::ImportedContacts) -> ImportResponse {
    let tl::enums::contacts::ImportedContacts::Contacts(c) = raw;
    ImportResponse {
        imported: c
            .imported
            .into_iter()
            .map(|tl::enums::ImportedContact::Contact(ic)| ic.client_id)
            .collect(),
        rejected: c
            .retry_contacts
            .into_iter()
            .map(|client_id| RecordRejection {
                client_id,
                reason: REASON_RETRY_LATER.to_string(),
            })
            .collect(),
    }
}

/// E.164 numbers of the users in a `contacts.contacts` answer.
pub fn contacts_to_numbers(raw: tl::enums::contacts::Contacts) -> Vec<String> {
    match raw {
        tl::enums::contacts::Contacts::Contacts(c) => c
            .users
            .iter()
            .filter_map(|u| match u {
                tl::enums::User::User(user) => user.phone.as_deref().and_then(e164_from_phone),
                tl::enums::User::Empty(_) => None,
            })
            .collect(),
        tl::enums::contacts::Contacts::NotModified => Vec::new(),
    }
}

/// Telegram returns phones as bare digits.
pub fn e164_from_phone(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then(|| format!("+{}", digits))
}

/// 420 -> FloodWait, 401 -> Auth, dropped request -> Connection, rest -> Transport.
pub fn invocation_error(e: InvocationError) -> DomainError {
    match e {
        InvocationError::Rpc(rpc) if rpc.code == 420 => DomainError::FloodWait {
            seconds: rpc.value.map(u64::from).unwrap_or(DEFAULT_FLOOD_WAIT_SECS),
        },
        InvocationError::Rpc(rpc) if rpc.code == 401 => DomainError::Auth(rpc.to_string()),
        InvocationError::Dropped => DomainError::Connection("request dropped".into()),
        other => DomainError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_e164_from_phone() {
        assert_eq!(e164_from_phone("85291234567").as_deref(), Some("+85291234567"));
        assert_eq!(e164_from_phone("+1 202").as_deref(), Some("+1202"));
        assert_eq!(e164_from_phone(""), None);
    }

    #[test]
    fn test_contact_to_input() {
        let entry = ContactEntry {
            client_id: 3,
            phone: "+85291234567".into(),
            first_name: "Contact 4567".into(),
            last_name: String::new(),
        };
        let tl::enums::InputContact::InputPhoneContact(c) = contact_to_input(&entry);
        assert_eq!(c.client_id, 3);
        assert_eq!(c.first_name, "Contact 4567");
    }
}
