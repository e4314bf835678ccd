//! Core shared types for Scout.
//!
//! This crate is intentionally small and dependency-light.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A workspace-relative build label, e.g. `//java/com/app:app_bin`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Label {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// Identifies a build target within one workspace snapshot.
///
/// Keys compare by value, not identity: two keys carrying the same label refer
/// to the same target. A key is only meaningful relative to the snapshot it
/// was taken from; labels can be reassigned across syncs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetKey {
    label: Label,
}

impl TargetKey {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
        }
    }

    #[inline]
    pub fn label(&self) -> &Label {
        &self.label
    }
}

impl From<Label> for TargetKey {
    fn from(label: Label) -> Self {
        Self { label }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.label.fmt(f)
    }
}
