use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::lookup::{AddressLookup, HttpLookupClient, PendingLookup};
use crate::store::{AddressBookStore, InMemoryAddressBook};
use crate::workflow::{Workflow, WorkflowError};

pub struct AddressBookApp {
    pub workflow: Workflow,
    pub address_book: Box<dyn AddressBookStore>,

    // Lookup
    pub lookup: Arc<dyn AddressLookup>,
    pub pending: Option<PendingLookup>,
    pub lookup_url: String,
}

impl AddressBookApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: &Config) -> Self {
        let client = HttpLookupClient::new(&config.lookup_url, config.timeout());
        let lookup_url = client.endpoint();
        let mut app = Self::with_parts(Arc::new(client), Box::new(InMemoryAddressBook::new()));
        app.lookup_url = lookup_url;
        app
    }

    pub fn with_parts(
        lookup: Arc<dyn AddressLookup>,
        address_book: Box<dyn AddressBookStore>,
    ) -> Self {
        Self {
            workflow: Workflow::new(),
            address_book,
            lookup,
            pending: None,
            lookup_url: String::new(),
        }
    }

    /// Starts a lookup for the current postcode and house number. A lookup
    /// that is still running is cancelled; `notify` runs when the new one
    /// has a result.
    pub fn find_address<F>(&mut self, notify: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(previous) = self.pending.take() {
            debug!(seq = previous.seq(), "cancelling superseded lookup");
            previous.cancel();
        }
        let request = self.workflow.begin_lookup();
        self.pending = Some(PendingLookup::spawn(
            Arc::clone(&self.lookup),
            request,
            notify,
        ));
    }

    /// Applies the pending lookup's result once it has arrived.
    pub fn poll_lookup(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        if let Some(result) = pending.poll() {
            let seq = pending.seq();
            self.pending = None;
            self.workflow.complete_lookup(seq, result);
        }
    }

    pub fn add_to_address_book(&mut self) -> Result<(), WorkflowError> {
        self.workflow.submit_person(self.address_book.as_mut())
    }

    pub fn clear_all(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.workflow.clear_all();
    }

    pub fn remove_entry(&mut self, index: usize) {
        self.address_book.remove_address(index);
    }
}
