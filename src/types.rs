use serde::{Deserialize, Deserializer, Serialize};

/// One record as the lookup service returns it inside `details`. Fields the
/// app has no use for (coordinates, municipality) are skipped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddressRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub street: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub postcode: String,
    #[serde(
        default,
        alias = "streetnumber",
        alias = "number",
        deserialize_with = "string_or_number"
    )]
    pub house_number: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// Some services send house numbers as JSON numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Value {
        Text(String),
        Number(serde_json::Number),
        Null,
    }

    Ok(match Value::deserialize(deserializer)? {
        Value::Text(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: String,
    pub postcode: String,
    pub house_number: String,
    pub street: String,
    pub city: String,
    pub label: String,
}

impl Address {
    pub fn new(
        id: String,
        postcode: String,
        house_number: String,
        street: String,
        city: String,
    ) -> Self {
        let label = display_label(&street, &house_number, &postcode, &city);
        Self {
            id,
            postcode,
            house_number,
            street,
            city,
            label,
        }
    }
}

/// An address the user has attached a name to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonAddress {
    #[serde(flatten)]
    pub address: Address,
    pub first_name: String,
    pub last_name: String,
}

impl PersonAddress {
    pub fn full_name(&self) -> String {
        join_non_empty(&[self.first_name.trim(), self.last_name.trim()], " ")
    }
}

/// Normalizes a raw lookup record. `index` is the record's position in the
/// response and keeps ids unique when the service returns duplicates.
pub fn transform_address(index: usize, raw: &RawAddressRecord) -> Address {
    let id = format!(
        "{}-{}-{}-{}",
        index,
        slug(&raw.postcode),
        slug(&raw.house_number),
        slug(&raw.street)
    );

    Address::new(
        id,
        raw.postcode.trim().to_string(),
        raw.house_number.trim().to_string(),
        raw.street.trim().to_string(),
        raw.city.trim().to_string(),
    )
}

fn display_label(street: &str, house_number: &str, postcode: &str, city: &str) -> String {
    let first_line = join_non_empty(&[street.trim(), house_number.trim()], " ");
    let second_line = join_non_empty(&[postcode.trim(), city.trim()], " ");
    join_non_empty(&[first_line.as_str(), second_line.as_str()], ", ")
}

fn join_non_empty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}

fn slug(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
