use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::PersonAddress;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressBookEntry {
    pub person: PersonAddress,
    pub added_at: DateTime<Local>,
}

/// Where finished entries go. The workflow only ever calls `add_address`.
pub trait AddressBookStore {
    fn add_address(&mut self, entry: PersonAddress);

    fn entries(&self) -> &[AddressBookEntry];

    fn remove_address(&mut self, index: usize) -> Option<AddressBookEntry>;
}

/// Session-only address book.
#[derive(Debug, Default)]
pub struct InMemoryAddressBook {
    entries: Vec<AddressBookEntry>,
}

impl InMemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AddressBookStore for InMemoryAddressBook {
    fn add_address(&mut self, entry: PersonAddress) {
        info!(
            id = %entry.address.id,
            name = %entry.full_name(),
            "adding entry to address book"
        );
        self.entries.push(AddressBookEntry {
            person: entry,
            added_at: Local::now(),
        });
    }

    fn entries(&self) -> &[AddressBookEntry] {
        &self.entries
    }

    fn remove_address(&mut self, index: usize) -> Option<AddressBookEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }
}
