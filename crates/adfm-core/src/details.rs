//! Attribute bag for directory user properties.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Delimiter used when a multi-valued attribute is flattened into one string.
pub const MULTI_VALUE_DELIMITER: &str = "; ";

/// Name to value mapping describing a subset of a directory user's properties.
///
/// Keys are unique; adding an existing key replaces its value. Iteration order is by attribute
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserDetails {
    details: BTreeMap<String, String>,
}

impl UserDetails {
    /// Creates an empty attribute bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the attribute or replaces its current value.
    pub fn add_detail(
        &mut self,
        property_name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.details.insert(property_name.into(), value.into());
        self
    }

    /// Adds a multi-valued attribute, flattening the values with [`MULTI_VALUE_DELIMITER`].
    pub fn add_multi_valued<I, S>(
        &mut self,
        property_name: impl Into<String>,
        values: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|value| value.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(MULTI_VALUE_DELIMITER);
        self.add_detail(property_name, joined)
    }

    /// Returns the attribute value, or an empty string when the attribute is absent.
    #[must_use]
    pub fn get_detail(&self, property_name: &str) -> &str {
        self.details.get(property_name).map_or("", String::as_str)
    }

    /// Removes the attribute if present.
    pub fn delete_detail(&mut self, property_name: &str) -> &mut Self {
        self.details.remove(property_name);
        self
    }

    /// Returns true if the attribute is present.
    #[must_use]
    pub fn contains(&self, property_name: &str) -> bool {
        self.details.contains_key(property_name)
    }

    /// Number of attributes in the bag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.details.len()
    }

    /// Returns true if the bag holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.details
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for UserDetails
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            details: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl IntoIterator for UserDetails {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.details.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_replaces_existing_value() {
        let mut details = UserDetails::new();
        details
            .add_detail("telephoneNumber", "+1-555-0100")
            .add_detail("telephoneNumber", "+1-555-0199");

        assert_eq!(details.len(), 1);
        assert_eq!(details.get_detail("telephoneNumber"), "+1-555-0199");
    }

    #[test]
    fn missing_detail_reads_as_empty() {
        let details = UserDetails::new();
        assert_eq!(details.get_detail("mail"), "");
        assert!(!details.contains("mail"));
    }

    #[test]
    fn delete_is_a_no_op_for_absent_keys() {
        let mut details: UserDetails = [("mail", "jdoe@corp.example.com")].into_iter().collect();
        details.delete_detail("title").delete_detail("mail");
        assert!(details.is_empty());
    }

    #[test]
    fn multi_valued_attributes_are_joined() {
        let mut details = UserDetails::new();
        details.add_multi_valued("memberOf", ["A", "B", "C"]);
        assert_eq!(details.get_detail("memberOf"), "A; B; C");
    }

    #[test]
    fn serializes_as_plain_map() {
        let details: UserDetails = [("sn", "Doe"), ("givenName", "John")].into_iter().collect();
        let json = serde_json::to_string(&details).unwrap();
        assert_eq!(json, r#"{"givenName":"John","sn":"Doe"}"#);

        let parsed: UserDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, details);
    }
}
