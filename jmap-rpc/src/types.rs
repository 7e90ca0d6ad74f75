// jmap-rpc/src/types.rs
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

const MAX_ID_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid ID: too short")]
    Empty,
    #[error("invalid ID: too long ({0} octets)")]
    TooLong(usize),
    #[error("invalid ID: invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Server-assigned identifier: 1-255 octets of `[A-Za-z0-9_-]`.
///
/// Any string is accepted when decoding, but serializing an invalid ID fails
/// so that it is never sent to the server. The default ID is empty and so
/// invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = Self(id.into());
        id.validate()?;
        Ok(id)
    }

    pub fn validate(&self) -> Result<(), IdError> {
        if self.0.is_empty() {
            return Err(IdError::Empty);
        }
        if self.0.len() > MAX_ID_LEN {
            return Err(IdError::TooLong(self.0.len()));
        }
        match self
            .0
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            Some(c) => Err(IdError::InvalidCharacter(c)),
            None => Ok(()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.validate().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability identifier, eg `urn:ietf:params:jmap:core`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Uri {
    fn from(uri: &str) -> Self {
        Self(uri.to_string())
    }
}

impl From<String> for Uri {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

impl Borrow<str> for Uri {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// RFC 3339 timestamp without fractional seconds, keeping its UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(pub DateTime<FixedOffset>);

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(Date)
            .map_err(de::Error::custom)
    }
}

/// RFC 3339 timestamp that is always in UTC, eg `2014-10-30T06:12:00Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDate(pub DateTime<Utc>);

impl UtcDate {
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl From<Date> for UtcDate {
    fn from(date: Date) -> Self {
        Self(date.0.with_timezone(&Utc))
    }
}

impl Serialize for UtcDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl<'de> Deserialize<'de> for UtcDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|date| UtcDate(date.with_timezone(&Utc)))
            .map_err(de::Error::custom)
    }
}

/// Map of JSON pointer (without the leading slash) to the new value, as sent
/// in `/set` updates. A `null` value resets the property.
pub type PatchObject = serde_json::Map<String, serde_json::Value>;

pub mod collation {
    /// RFC 4790 numeric collation on unsigned decimal integers.
    pub const ASCII_NUMERIC: &str = "i;ascii-numeric";
    /// RFC 4790 collation, case-insensitive for US-ASCII letters only.
    pub const ASCII_CASEMAP: &str = "i;ascii-casemap";
    /// RFC 5051 case-insensitive Unicode collation.
    pub const UNICODE_CASEMAP: &str = "i;unicode-casemap";
}

/// Sort criterion for `/query` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparator {
    pub property: String,
    #[serde(default = "default_is_ascending")]
    pub is_ascending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

fn default_is_ascending() -> bool {
    true
}

impl Comparator {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            is_ascending: true,
            collation: None,
        }
    }

    pub fn descending(mut self) -> Self {
        self.is_ascending = false;
        self
    }

    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }
}

/// An id added to query results, with its index in the new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedItem {
    pub id: Id,
    pub index: u64,
}
