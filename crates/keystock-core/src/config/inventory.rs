//! Inventory configuration: program and duration vocabularies, owners, and
//! the mirror directory.
//!
//! The vocabularies are deployment-time data. Every program/duration that
//! enters the core passes through [`InventoryConfig::pool`] or
//! [`InventoryConfig::program`], so values outside the configured sets never
//! reach the store.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::types::id::PrincipalId;
use crate::types::pool::PoolKey;

/// Inventory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Product programs keys can belong to.
    #[serde(default = "default_programs", deserialize_with = "comma_list")]
    pub programs: Vec<String>,
    /// Subscription durations keys can belong to.
    #[serde(default = "default_durations", deserialize_with = "comma_list")]
    pub durations: Vec<String>,
    /// Principals with implicit access to every program.
    #[serde(default, deserialize_with = "comma_list")]
    pub owners: Vec<i64>,
    /// Directory holding one mirror file per pool.
    #[serde(default = "default_mirror_dir")]
    pub mirror_dir: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            programs: default_programs(),
            durations: default_durations(),
            owners: Vec::new(),
            mirror_dir: default_mirror_dir(),
        }
    }
}

impl InventoryConfig {
    /// Validate the vocabularies.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_vocabulary("inventory.programs", &self.programs)?;
        validate_vocabulary("inventory.durations", &self.durations)?;
        if self.mirror_dir.trim().is_empty() {
            return Err(AppError::configuration(
                "inventory.mirror_dir must not be empty",
            ));
        }
        Ok(())
    }

    /// Whether the principal is a configured owner.
    pub fn is_owner(&self, principal: PrincipalId) -> bool {
        self.owners.contains(&principal.0)
    }

    /// Resolve a program name against the vocabulary.
    ///
    /// Matching ignores surrounding whitespace and case; the canonical
    /// configured spelling is returned.
    pub fn program(&self, program: &str) -> Result<String, AppError> {
        lookup(&self.programs, program).ok_or_else(|| {
            AppError::validation(format!(
                "Unknown program '{}'. Expected one of: {}",
                program.trim(),
                self.programs.join(", ")
            ))
        })
    }

    /// Resolve a duration name against the vocabulary.
    pub fn duration(&self, duration: &str) -> Result<String, AppError> {
        lookup(&self.durations, duration).ok_or_else(|| {
            AppError::validation(format!(
                "Unknown duration '{}'. Expected one of: {}",
                duration.trim(),
                self.durations.join(", ")
            ))
        })
    }

    /// Resolve a (program, duration) pair into a validated pool key.
    pub fn pool(&self, program: &str, duration: &str) -> Result<PoolKey, AppError> {
        Ok(PoolKey::new(self.program(program)?, self.duration(duration)?))
    }

    /// Every configured pool, programs outer, durations inner.
    pub fn all_pools(&self) -> Vec<PoolKey> {
        self.programs
            .iter()
            .flat_map(|p| {
                self.durations
                    .iter()
                    .map(move |d| PoolKey::new(p.clone(), d.clone()))
            })
            .collect()
    }
}

/// One raw list entry as it arrives from a file or an environment variable.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Int(i64),
    Text(String),
}

impl RawEntry {
    fn into_text(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList {
    Many(Vec<RawEntry>),
    One(RawEntry),
}

/// Accept a sequence, a single scalar, or a comma-separated string.
///
/// Environment overrides arrive as scalars when they hold one item
/// (`KEYSTOCK__INVENTORY__OWNERS=33`) and as sequences otherwise. Empty
/// items are dropped.
fn comma_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let entries = match RawList::deserialize(deserializer)? {
        RawList::Many(entries) => entries,
        RawList::One(entry) => vec![entry],
    };

    let mut items = Vec::new();
    for entry in entries {
        for item in entry.into_text().split(',').map(str::trim) {
            if item.is_empty() {
                continue;
            }
            let parsed = item.parse().map_err(|e| {
                <D::Error as serde::de::Error>::custom(format!("invalid list item '{item}': {e}"))
            })?;
            items.push(parsed);
        }
    }
    Ok(items)
}

fn lookup(vocabulary: &[String], value: &str) -> Option<String> {
    let wanted = value.trim().to_lowercase();
    vocabulary.iter().find(|v| **v == wanted).cloned()
}

fn validate_vocabulary(field: &str, values: &[String]) -> Result<(), AppError> {
    if values.is_empty() {
        return Err(AppError::configuration(format!("{field} must not be empty")));
    }
    for (i, value) in values.iter().enumerate() {
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(AppError::configuration(format!(
                "{field} entry '{value}' must match [a-z0-9-]+"
            )));
        }
        if values[..i].contains(value) {
            return Err(AppError::configuration(format!(
                "{field} entry '{value}' is listed twice"
            )));
        }
    }
    Ok(())
}

fn default_programs() -> Vec<String> {
    vec!["temp".into(), "perm".into(), "private".into()]
}

fn default_durations() -> Vec<String> {
    vec![
        "day".into(),
        "week".into(),
        "month".into(),
        "lifetime".into(),
    ]
}

fn default_mirror_dir() -> String {
    "data/stock".to_string()
}
