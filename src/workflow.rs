//! Lookup and selection workflow.
//!
//! `Workflow` owns all form, result, selection and error state. The UI reads it
//! and mutates it only through the operations below.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::form::{FIRST_NAME, FormFields, HOUSE_NUMBER, LAST_NAME, POST_CODE, SELECTED_ADDRESS};
use crate::lookup::{LookupError, LookupRequest};
use crate::store::AddressBookStore;
use crate::types::{Address, PersonAddress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Results,
    Failed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("{0}")]
    LookupFailed(String),
    #[error("No address selected, try to select an address or find one if you haven't")]
    SelectionMissing,
    #[error("Selected address not found")]
    SelectionInvalid,
    #[error("First name and last name fields mandatory!")]
    NameMissing,
}

#[derive(Debug, Default)]
pub struct Workflow {
    fields: FormFields,
    addresses: Vec<Address>,
    state: FetchState,
    error: Option<WorkflowError>,
    latest_seq: u64,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn on_change(&mut self, name: &str, value: impl Into<String>) {
        self.fields.on_change(name, value);
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn selected_address_id(&self) -> Option<&str> {
        Some(self.fields.get(SELECTED_ADDRESS)).filter(|id| !id.is_empty())
    }

    pub fn selected_address(&self) -> Option<&Address> {
        let id = self.selected_address_id()?;
        self.addresses.iter().find(|address| address.id == id)
    }

    pub fn select_address(&mut self, id: &str) {
        self.fields.on_change(SELECTED_ADDRESS, id);
    }

    /// Enters `Loading` and clears results and error. The returned request
    /// carries the sequence number its result must be completed with.
    pub fn begin_lookup(&mut self) -> LookupRequest {
        self.latest_seq += 1;
        self.state = FetchState::Loading;
        self.error = None;
        self.addresses.clear();

        let request = LookupRequest {
            seq: self.latest_seq,
            postcode: self.fields.get(POST_CODE).to_string(),
            house_number: self.fields.get(HOUSE_NUMBER).to_string(),
        };
        debug!(seq = request.seq, "lookup started");
        request
    }

    /// Applies the outcome of lookup `seq`. Outcomes of superseded lookups are
    /// discarded; returns whether this one was applied.
    pub fn complete_lookup(
        &mut self,
        seq: u64,
        result: Result<Vec<Address>, LookupError>,
    ) -> bool {
        if seq != self.latest_seq || self.state != FetchState::Loading {
            debug!(seq, latest = self.latest_seq, "discarding stale lookup result");
            return false;
        }
        match result {
            Ok(addresses) => self.apply_results(addresses),
            Err(e) => self.apply_error(&e),
        }
        true
    }

    fn apply_results(&mut self, addresses: Vec<Address>) {
        info!(count = addresses.len(), "lookup results applied");
        self.addresses = addresses;
        self.state = FetchState::Results;
    }

    fn apply_error(&mut self, error: &LookupError) {
        warn!(error = %error, "lookup failed");
        self.addresses.clear();
        self.error = Some(WorkflowError::LookupFailed(error.user_message()));
        self.state = FetchState::Failed;
    }

    /// Appends the selected candidate with the current name fields to `store`.
    /// Does not clear the form.
    pub fn submit_person(&mut self, store: &mut dyn AddressBookStore) -> Result<(), WorkflowError> {
        let result = self.person_address();
        match result {
            Ok(entry) => {
                self.error = None;
                store.add_address(entry);
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn person_address(&self) -> Result<PersonAddress, WorkflowError> {
        let id = match self.selected_address_id() {
            Some(id) if !self.addresses.is_empty() => id,
            _ => return Err(WorkflowError::SelectionMissing),
        };
        let address = self
            .addresses
            .iter()
            .find(|address| address.id == id)
            .ok_or(WorkflowError::SelectionInvalid)?;

        let first_name = self.fields.get(FIRST_NAME);
        let last_name = self.fields.get(LAST_NAME);
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(WorkflowError::NameMissing);
        }

        Ok(PersonAddress {
            address: address.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Back to `Idle` with initial field values. A lookup still in flight is
    /// superseded and its result will be discarded.
    pub fn clear_all(&mut self) {
        self.latest_seq += 1;
        self.error = None;
        self.addresses.clear();
        self.fields.reset();
        self.state = FetchState::Idle;
    }
}
