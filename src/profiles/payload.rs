//! Opaque, insertion-ordered settings payload for one service profile
//!
//! Mirrors the host's settings object: string keys mapped to strings,
//! integers, booleans or nested payloads. Key order is preserved so that a
//! payload written back to disk looks exactly like the one that was read.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::keys;

/// A single value stored in a [`SettingPayload`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    String(String),
    Payload(SettingPayload),
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<SettingPayload> for SettingValue {
    fn from(value: SettingPayload) -> Self {
        Self::Payload(value)
    }
}

/// Ordered key-value bag describing one profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingPayload(IndexMap<String, SettingValue>);

impl SettingPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.0.get(key)
    }

    /// String value for `key`, or `None` if absent or not a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(SettingValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(SettingValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(SettingValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_payload(&self, key: &str) -> Option<&SettingPayload> {
        match self.0.get(key) {
            Some(SettingValue::Payload(p)) => Some(p),
            _ => None,
        }
    }

    /// Insert or overwrite `key`. An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<SettingValue> {
        self.0.shift_remove(key)
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The profile `name` field (empty if missing)
    pub fn name(&self) -> &str {
        self.get_str(keys::NAME).unwrap_or_default()
    }

    /// The persisted `type` field (empty if missing)
    pub fn service_type(&self) -> &str {
        self.get_str(keys::TYPE).unwrap_or_default()
    }

    /// The nested `hotkey-data` blob, if present
    pub fn hotkey_data(&self) -> Option<&SettingPayload> {
        self.get_payload(keys::HOTKEY_DATA)
    }
}

impl<K: Into<String>, V: Into<SettingValue>> FromIterator<(K, V)> for SettingPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
