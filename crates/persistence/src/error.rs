// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence error taxonomy.

use thiserror::Error;

/// Errors raised while saving a live object to a [`crate::Bundle`] or
/// reconstructing one from a bundle.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("bundle is missing required field {field:?}")]
    MissingField { field: String },

    #[error("bundle field {field:?} has the wrong shape: expected {expected}")]
    WrongShape { field: String, expected: &'static str },

    #[error("bundle class_name {found:?} does not match the expected type {expected:?}")]
    ClassMismatch { expected: &'static str, found: String },

    #[error("no constructor registered for class_name {0:?}")]
    UnknownClass(String),

    #[error("refused to persist a method reference bound to another object's `{0}`")]
    ForeignMethodRef(String),

    #[error("{0}")]
    Other(String),
}
