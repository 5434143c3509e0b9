//! Flat key/value step attributes (the legacy repository shape).
//!
//! Each step owns one [`AttributeRecord`]. Keys are plain strings such as
//! `source_configuration_name` or `file_name`; repeated attributes (one per
//! output field) are addressed by an index `nr`. The last write per
//! `(key, nr)` wins.

use crate::error::AttributeError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Repository object identifier (transformation or step).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attributes stored for one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRecord {
    values: BTreeMap<(String, usize), String>,
}

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str, nr: usize) -> Option<&str> {
        self.values
            .get(&(key.to_string(), nr))
            .map(String::as_str)
    }

    /// Writing `None` clears the key.
    pub fn set(&mut self, key: &str, nr: usize, value: Option<&str>) {
        let slot = (key.to_string(), nr);
        match value {
            Some(v) => {
                self.values.insert(slot, v.to_string());
            }
            None => {
                self.values.remove(&slot);
            }
        }
    }

    /// Number of indexed entries stored under `key`.
    pub fn count(&self, key: &str) -> usize {
        self.values.keys().filter(|(k, _)| k == key).count()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read/write access to step attributes in a repository.
///
/// Only the string accessors are required; typed accessors parse the stored
/// text.
pub trait StepAttributeStore {
    fn step_attribute_string_at(
        &self,
        id_step: &ObjectId,
        nr: usize,
        key: &str,
    ) -> Result<Option<String>, AttributeError>;

    fn save_step_attribute_at(
        &mut self,
        id_transformation: &ObjectId,
        id_step: &ObjectId,
        nr: usize,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), AttributeError>;

    fn count_step_attributes(&self, id_step: &ObjectId, key: &str)
        -> Result<usize, AttributeError>;

    /// Drop every attribute of the step, e.g. before it is saved again.
    fn clear_step_attributes(&mut self, id_step: &ObjectId) -> Result<(), AttributeError>;

    fn step_attribute_string(
        &self,
        id_step: &ObjectId,
        key: &str,
    ) -> Result<Option<String>, AttributeError> {
        self.step_attribute_string_at(id_step, 0, key)
    }

    fn save_step_attribute(
        &mut self,
        id_transformation: &ObjectId,
        id_step: &ObjectId,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), AttributeError> {
        self.save_step_attribute_at(id_transformation, id_step, 0, key, value)
    }

    fn step_attribute_bool(&self, id_step: &ObjectId, key: &str) -> Result<bool, AttributeError> {
        Ok(match self.step_attribute_string(id_step, key)? {
            Some(v) => v.eq_ignore_ascii_case("y") || v.eq_ignore_ascii_case("true"),
            None => false,
        })
    }

    fn step_attribute_int_at(
        &self,
        id_step: &ObjectId,
        nr: usize,
        key: &str,
    ) -> Result<Option<i64>, AttributeError> {
        match self.step_attribute_string_at(id_step, nr, key)? {
            None => Ok(None),
            Some(v) if v.trim().is_empty() => Ok(None),
            Some(v) => v
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| AttributeError::InvalidValue {
                    key: key.to_string(),
                    value: v,
                }),
        }
    }
}

/// In-process attribute store, one record per step.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttributeStore {
    records: HashMap<ObjectId, AttributeRecord>,
    owners: HashMap<ObjectId, ObjectId>,
}

impl InMemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id_step: &ObjectId) -> Option<&AttributeRecord> {
        self.records.get(id_step)
    }

    /// Transformation the step was last saved under.
    pub fn owner(&self, id_step: &ObjectId) -> Option<&ObjectId> {
        self.owners.get(id_step)
    }

    /// Seed a single attribute, e.g. to simulate a record written by an
    /// older release.
    pub fn insert(&mut self, id_step: &ObjectId, key: &str, value: &str) {
        self.records
            .entry(id_step.clone())
            .or_default()
            .set(key, 0, Some(value));
    }
}

impl StepAttributeStore for InMemoryAttributeStore {
    fn step_attribute_string_at(
        &self,
        id_step: &ObjectId,
        nr: usize,
        key: &str,
    ) -> Result<Option<String>, AttributeError> {
        Ok(self
            .records
            .get(id_step)
            .and_then(|r| r.get(key, nr))
            .map(str::to_string))
    }

    fn save_step_attribute_at(
        &mut self,
        id_transformation: &ObjectId,
        id_step: &ObjectId,
        nr: usize,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), AttributeError> {
        self.owners
            .insert(id_step.clone(), id_transformation.clone());
        self.records
            .entry(id_step.clone())
            .or_default()
            .set(key, nr, value);
        Ok(())
    }

    fn count_step_attributes(
        &self,
        id_step: &ObjectId,
        key: &str,
    ) -> Result<usize, AttributeError> {
        Ok(self.records.get(id_step).map_or(0, |r| r.count(key)))
    }

    fn clear_step_attributes(&mut self, id_step: &ObjectId) -> Result<(), AttributeError> {
        self.records.remove(id_step);
        Ok(())
    }
}
