//! # Domain Tags — Hash Domain Separation
//!
//! A domain tag is mixed into every entry hash so identical payloads from
//! different contexts can never collide. Tags follow a strict grammar —
//! at least three colon-separated segments, each lowercase alphanumeric
//! with hyphens/underscores — and the grammar is enforced at every hash
//! site: a bad tag is a hard error, never silently skipped.
//!
//! ## Security Invariant
//!
//! `DomainTag` is a validated newtype with a private inner string; the
//! only constructors are [`DomainTag::parse()`] and
//! [`build_domain_tag()`], both of which enforce the grammar. Holding a
//! `DomainTag` is proof the grammar was checked.

use serde::{Deserialize, Serialize};

use crate::hash::ChainHashError;

/// A validated hash domain tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DomainTag(String);

impl DomainTag {
    /// Parse and validate a domain tag.
    ///
    /// # Errors
    ///
    /// Returns [`ChainHashError::InvalidDomainTag`] when the tag is
    /// empty, has fewer than three segments, has an empty segment, or a
    /// segment outside `[a-z0-9][a-z0-9_-]*`.
    pub fn parse(tag: &str) -> Result<Self, ChainHashError> {
        if tag.is_empty() {
            return Err(ChainHashError::InvalidDomainTag(
                "domain tag must not be empty".into(),
            ));
        }
        let segments: Vec<&str> = tag.split(':').collect();
        if segments.len() < 3 {
            return Err(ChainHashError::InvalidDomainTag(format!(
                "domain tag must have at least 3 colon-separated segments, got {}",
                segments.len()
            )));
        }
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(ChainHashError::InvalidDomainTag(format!(
                    "segment {i} is empty"
                )));
            }
            if !valid_segment(segment) {
                return Err(ChainHashError::InvalidDomainTag(format!(
                    "segment {i} ({segment:?}) must be lowercase alphanumeric with hyphens/underscores"
                )));
            }
        }
        Ok(Self(tag.to_owned()))
    }

    /// The tag string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DomainTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DomainTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DomainTag::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// `[a-z0-9][a-z0-9_-]*`
fn valid_segment(segment: &str) -> bool {
    let mut bytes = segment.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    let head_ok = first.is_ascii_lowercase() || first.is_ascii_digit();
    head_ok
        && bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

/// Build the audit domain tag for a schema + contract version:
/// `covenant:audit:<sanitized_schema>:<sanitized_version>`.
///
/// Sanitization is lossy by design (case folding, dots to hyphens, colon
/// stripping); schema ids are controlled identifiers and collisions are
/// detectable at schema registration time. Inputs must satisfy their
/// grammars — schema ids start with a letter and use
/// `[a-zA-Z0-9._:-]`, versions start with a digit and use semver-like
/// characters.
///
/// # Errors
///
/// Returns [`ChainHashError::InvalidDomainTag`] when either input fails
/// its grammar.
pub fn build_domain_tag(schema_id: &str, contract_version: &str) -> Result<DomainTag, ChainHashError> {
    if !valid_schema_id(schema_id) {
        return Err(ChainHashError::InvalidDomainTag(format!(
            "schema id {schema_id:?} must start with a letter and use only [a-zA-Z0-9._:-]"
        )));
    }
    if !valid_contract_version(contract_version) {
        return Err(ChainHashError::InvalidDomainTag(format!(
            "contract version {contract_version:?} must start with a digit and use only [a-zA-Z0-9._+-]"
        )));
    }
    let tag = format!(
        "covenant:audit:{}:{}",
        sanitize_segment(schema_id),
        sanitize_segment(contract_version)
    );
    DomainTag::parse(&tag)
}

fn valid_schema_id(schema_id: &str) -> bool {
    let mut bytes = schema_id.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b':' | b'-'))
}

fn valid_contract_version(version: &str) -> bool {
    let mut bytes = version.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    first.is_ascii_digit()
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'+' | b'-'))
}

/// Lowercase, strip colons, map dots to hyphens, drop anything left
/// outside the segment alphabet. The input grammars are ASCII-only, so
/// lowercasing is locale-independent.
fn sanitize_segment(segment: &str) -> String {
    segment
        .to_ascii_lowercase()
        .chars()
        .filter_map(|c| match c {
            ':' => None,
            '.' => Some('-'),
            c if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}
