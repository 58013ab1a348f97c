// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bundles: the neutral, self-describing serialized form of any savable
//! object.

use crate::context::{LoadContext, SaveContext};
use crate::error::PersistError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a field's value was recorded when the bundle was built.
///
/// Mirrors the bundle wire format's `types` map: most fields are plain
/// deep-copied values, but a field may instead be a reference to a named
/// step function on the owning process, or a recursively-saved nested
/// bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEncoding {
    Value,
    Method,
    Savable,
}

/// Reserved metadata every bundle carries, recorded under the `!!meta` key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BundleMeta {
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_loader: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, FieldEncoding>,
}

/// The in-memory neutral representation of a checkpoint: an ordered
/// key/value tree plus type tags.
///
/// Values are one of: a plain JSON scalar/array/object, a nested [`Bundle`],
/// a list of nested bundles, or (encoded as a plain string value, tagged
/// [`FieldEncoding::Method`] in `meta.types`) the name of a step function
/// bound to the owning process.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "!!meta")]
    pub meta: BundleMeta,
    #[serde(flatten)]
    fields: BTreeMap<String, BundleField>,
}

/// A single entry in a bundle's field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BundleField {
    Value(serde_json::Value),
    Nested(Box<Bundle>),
    List(Vec<Bundle>),
}

impl Bundle {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            meta: BundleMeta { class_name: class_name.into(), ..Default::default() },
            fields: BTreeMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.meta.class_name
    }

    /// Record a plain value field, deep-copied via serialization.
    pub fn set_value(&mut self, field: &str, value: impl Serialize) -> Result<(), PersistError> {
        let json = serde_json::to_value(value).map_err(|e| PersistError::Other(e.to_string()))?;
        self.meta.types.insert(field.to_string(), FieldEncoding::Value);
        self.fields.insert(field.to_string(), BundleField::Value(json));
        Ok(())
    }

    /// Record a reference to a named step function on the owning process.
    /// Refuses (at the type-system level, by taking an owned `String`
    /// already resolved to a *local* member name) anything that is not a
    /// member of the object being saved — callers must not pass through a
    /// name sourced from another object.
    pub fn set_step_ref(&mut self, field: &str, step_name: impl Into<String>) {
        self.meta.types.insert(field.to_string(), FieldEncoding::Method);
        self.fields.insert(field.to_string(), BundleField::Value(step_name.into().into()));
    }

    pub fn set_nested(&mut self, field: &str, nested: Bundle) {
        self.meta.types.insert(field.to_string(), FieldEncoding::Savable);
        self.fields.insert(field.to_string(), BundleField::Nested(Box::new(nested)));
    }

    pub fn set_nested_list(&mut self, field: &str, nested: Vec<Bundle>) {
        self.meta.types.insert(field.to_string(), FieldEncoding::Savable);
        self.fields.insert(field.to_string(), BundleField::List(nested));
    }

    pub fn get_value<T: for<'de> Deserialize<'de>>(
        &self,
        field: &str,
    ) -> Result<T, PersistError> {
        match self.fields.get(field) {
            Some(BundleField::Value(v)) => {
                serde_json::from_value(v.clone()).map_err(|e| PersistError::Other(e.to_string()))
            }
            Some(_) => Err(PersistError::WrongShape { field: field.into(), expected: "value" }),
            None => Err(PersistError::MissingField { field: field.into() }),
        }
    }

    pub fn get_optional_value<T: for<'de> Deserialize<'de>>(
        &self,
        field: &str,
    ) -> Result<Option<T>, PersistError> {
        match self.fields.get(field) {
            Some(BundleField::Value(serde_json::Value::Null)) | None => Ok(None),
            Some(BundleField::Value(v)) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| PersistError::Other(e.to_string())),
            Some(_) => Err(PersistError::WrongShape { field: field.into(), expected: "value" }),
        }
    }

    pub fn get_step_ref(&self, field: &str) -> Result<String, PersistError> {
        self.get_value(field)
    }

    pub fn get_optional_step_ref(&self, field: &str) -> Result<Option<String>, PersistError> {
        self.get_optional_value(field)
    }

    pub fn get_nested(&self, field: &str) -> Result<&Bundle, PersistError> {
        match self.fields.get(field) {
            Some(BundleField::Nested(b)) => Ok(b),
            Some(_) => Err(PersistError::WrongShape { field: field.into(), expected: "nested" }),
            None => Err(PersistError::MissingField { field: field.into() }),
        }
    }

    pub fn get_nested_list(&self, field: &str) -> Result<&[Bundle], PersistError> {
        match self.fields.get(field) {
            Some(BundleField::List(v)) => Ok(v),
            Some(_) => {
                Err(PersistError::WrongShape { field: field.into(), expected: "nested list" })
            }
            None => Err(PersistError::MissingField { field: field.into() }),
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// An object whose state can be deep-copied into a [`Bundle`] and rebuilt
/// from one. Implemented directly by the process state machine, outline
/// steppers, and the process object itself.
pub trait Savable: Sized {
    /// Stable identifier recorded as `meta.class_name`; also the key the
    /// object loader registry uses to find this type's constructor.
    const CLASS_NAME: &'static str;

    fn save(&self, ctx: &SaveContext) -> Bundle;

    fn load(bundle: &Bundle, ctx: &LoadContext) -> Result<Self, PersistError>;

    /// Verify `bundle.class_name` matches [`Self::CLASS_NAME`] before
    /// attempting to decode fields; every [`Savable::load`] impl should
    /// call this first.
    fn check_class(bundle: &Bundle) -> Result<(), PersistError> {
        if bundle.class_name() != Self::CLASS_NAME {
            return Err(PersistError::ClassMismatch {
                expected: Self::CLASS_NAME,
                found: bundle.class_name().to_string(),
            });
        }
        Ok(())
    }
}
