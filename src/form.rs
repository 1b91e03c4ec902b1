use std::collections::BTreeMap;

use tracing::warn;

pub const POST_CODE: &str = "post_code";
pub const HOUSE_NUMBER: &str = "house_number";
pub const FIRST_NAME: &str = "first_name";
pub const LAST_NAME: &str = "last_name";
pub const SELECTED_ADDRESS: &str = "selected_address";

/// Controlled form state: a fixed set of named string fields.
///
/// The key set is decided at construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    initial: BTreeMap<&'static str, String>,
    values: BTreeMap<&'static str, String>,
}

impl FormFields {
    pub fn new<I, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<String>,
    {
        let initial: BTreeMap<_, _> = fields
            .into_iter()
            .map(|(name, value)| (name, value.into()))
            .collect();
        Self {
            values: initial.clone(),
            initial,
        }
    }

    /// Current value of `name`, or `""` for a field that was never registered.
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Replaces the value of exactly one field. Returns `false` when `name` is
    /// not one of the registered fields, in which case nothing changes.
    pub fn on_change(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => {
                warn!(field = name, "ignoring change for unknown form field");
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.values = self.initial.clone();
    }
}

impl Default for FormFields {
    fn default() -> Self {
        Self::new([
            (POST_CODE, ""),
            (HOUSE_NUMBER, ""),
            (FIRST_NAME, ""),
            (LAST_NAME, ""),
            (SELECTED_ADDRESS, ""),
        ])
    }
}
