// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The outline tree: four instruction kinds compiled once and walked
//! by a [`crate::stepper::Stepper`].

use serde::{Deserialize, Serialize};

/// A single outline instruction. Built with the free functions below
/// rather than matched on directly by callers outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Instruction {
    /// A single named step function call.
    Step(String),
    Sequence(Vec<Instruction>),
    /// Each branch is guarded by a named predicate, evaluated in order;
    /// the first whose predicate is true is taken. `else_` runs if none
    /// match.
    If(Vec<(String, Instruction)>, Option<Box<Instruction>>),
    /// Re-evaluates `predicate` before every iteration, including the
    /// first.
    While(String, Box<Instruction>),
    /// Short-circuits the remaining outline.
    Return,
}

pub fn step(name: impl Into<String>) -> Instruction {
    Instruction::Step(name.into())
}

pub fn sequence(children: Vec<Instruction>) -> Instruction {
    Instruction::Sequence(children)
}

pub fn if_then(branches: Vec<(String, Instruction)>, else_: Option<Instruction>) -> Instruction {
    Instruction::If(branches, else_.map(Box::new))
}

pub fn while_loop(predicate: impl Into<String>, body: Instruction) -> Instruction {
    Instruction::While(predicate.into(), Box::new(body))
}

pub fn return_now() -> Instruction {
    Instruction::Return
}

/// A compiled workchain tree. Immutable once built; steppers hold only
/// a cursor, never a copy of the tree itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outline {
    pub(crate) root: Instruction,
}

impl Outline {
    pub fn new(root: Instruction) -> Self {
        Self { root }
    }
}
