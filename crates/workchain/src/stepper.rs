// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stepper: a depth-first walk over an [`Outline`], whose entire
//! persisted state is a cursor — the path of child indices from the
//! root to the active leaf, plus one iteration counter per `While`
//! ancestor on that path.
//!
//! A `Step` leaf contributes no entry of its own to the path; the path
//! names the route to it, and [`Outline::current_step`] resolves the
//! leaf name from that route. This keeps "which leaf is active" and
//! "how did we get here" the same piece of state, so reloading a
//! cursor re-enters the exact same leaf without re-evaluating any
//! predicate already passed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::outline::{Instruction, Outline};
use crate::predicate::PredicateRegistry;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cursor {
    pub path: Vec<usize>,
    pub loop_counters: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepperOutcome {
    /// The cursor now names a live `Step` leaf, not yet executed.
    Active(String),
    /// The outline is exhausted, or a `Return` was hit.
    Finished,
}

enum WalkResult {
    Leaf(String),
    Done,
}

fn choose_branch<'a>(
    branches: &'a [(String, Instruction)],
    else_: &'a Option<Box<Instruction>>,
    registry: &PredicateRegistry,
    state: &Value,
) -> Option<(usize, &'a Instruction)> {
    match branches.iter().position(|(predicate, _)| registry.eval(predicate, state)) {
        Some(i) => Some((i, &branches[i].1)),
        None => else_.as_ref().map(|boxed| (branches.len(), boxed.as_ref())),
    }
}

fn resolve_branch<'a>(
    branches: &'a [(String, Instruction)],
    else_: &'a Option<Box<Instruction>>,
    idx: usize,
) -> &'a Instruction {
    if idx < branches.len() {
        &branches[idx].1
    } else {
        else_.as_ref().expect("cursor names an else branch that doesn't exist").as_ref()
    }
}

/// Finds the first leaf under `node`, extending `path`/`counters` from
/// `depth` (== `path.len()` on entry) onward.
fn enter(
    node: &Instruction,
    path: &mut Vec<usize>,
    counters: &mut Vec<u64>,
    depth: usize,
    registry: &PredicateRegistry,
    state: &Value,
) -> WalkResult {
    match node {
        Instruction::Step(name) => WalkResult::Leaf(name.clone()),
        Instruction::Return => WalkResult::Done,
        Instruction::Sequence(children) => {
            for (idx, child) in children.iter().enumerate() {
                path.push(idx);
                counters.push(0);
                match enter(child, path, counters, depth + 1, registry, state) {
                    WalkResult::Leaf(name) => return WalkResult::Leaf(name),
                    WalkResult::Done => {
                        path.truncate(depth);
                        counters.truncate(depth);
                    }
                }
            }
            WalkResult::Done
        }
        Instruction::If(branches, else_) => match choose_branch(branches, else_, registry, state) {
            None => WalkResult::Done,
            Some((idx, instr)) => {
                path.push(idx);
                counters.push(0);
                match enter(instr, path, counters, depth + 1, registry, state) {
                    WalkResult::Leaf(name) => WalkResult::Leaf(name),
                    WalkResult::Done => {
                        path.truncate(depth);
                        counters.truncate(depth);
                        WalkResult::Done
                    }
                }
            }
        },
        Instruction::While(predicate, body) => {
            if !registry.eval(predicate, state) {
                return WalkResult::Done;
            }
            path.push(0);
            counters.push(0);
            match enter(body, path, counters, depth + 1, registry, state) {
                WalkResult::Leaf(name) => WalkResult::Leaf(name),
                WalkResult::Done => {
                    path.truncate(depth);
                    counters.truncate(depth);
                    WalkResult::Done
                }
            }
        }
    }
}

/// `path[depth]` already names the child of `node` whose subtree just
/// finished; moves past it to the next leaf, if any.
fn advance_from(
    node: &Instruction,
    path: &mut Vec<usize>,
    counters: &mut Vec<u64>,
    depth: usize,
    registry: &PredicateRegistry,
    state: &Value,
) -> WalkResult {
    let idx = path[depth];
    match node {
        Instruction::Step(_) | Instruction::Return => {
            unreachable!("a leaf cannot have a deeper cursor segment")
        }
        Instruction::Sequence(children) => {
            if depth + 1 < path.len() {
                match advance_from(&children[idx], path, counters, depth + 1, registry, state) {
                    WalkResult::Leaf(name) => return WalkResult::Leaf(name),
                    WalkResult::Done => {}
                }
            }
            path.truncate(depth);
            counters.truncate(depth);
            for next in (idx + 1)..children.len() {
                path.push(next);
                counters.push(0);
                match enter(&children[next], path, counters, depth + 1, registry, state) {
                    WalkResult::Leaf(name) => return WalkResult::Leaf(name),
                    WalkResult::Done => {
                        path.truncate(depth);
                        counters.truncate(depth);
                    }
                }
            }
            WalkResult::Done
        }
        Instruction::If(branches, else_) => {
            let instr = resolve_branch(branches, else_, idx);
            if depth + 1 < path.len() {
                match advance_from(instr, path, counters, depth + 1, registry, state) {
                    WalkResult::Leaf(name) => return WalkResult::Leaf(name),
                    WalkResult::Done => {}
                }
            }
            path.truncate(depth);
            counters.truncate(depth);
            WalkResult::Done
        }
        Instruction::While(predicate, body) => {
            if depth + 1 < path.len() {
                match advance_from(body, path, counters, depth + 1, registry, state) {
                    WalkResult::Leaf(name) => return WalkResult::Leaf(name),
                    WalkResult::Done => {}
                }
            }
            if registry.eval(predicate, state) {
                counters[depth] += 1;
                path.truncate(depth + 1);
                counters.truncate(depth + 1);
                match enter(body, path, counters, depth + 1, registry, state) {
                    WalkResult::Leaf(name) => return WalkResult::Leaf(name),
                    WalkResult::Done => {
                        // An always-empty loop body would otherwise spin
                        // forever; treat it as contributing nothing.
                        path.truncate(depth);
                        counters.truncate(depth);
                        return WalkResult::Done;
                    }
                }
            }
            path.truncate(depth);
            counters.truncate(depth);
            WalkResult::Done
        }
    }
}

fn current_step<'a>(node: &'a Instruction, path: &[usize], depth: usize) -> Option<&'a str> {
    if depth == path.len() {
        return match node {
            Instruction::Step(name) => Some(name.as_str()),
            _ => None,
        };
    }
    let idx = path[depth];
    match node {
        Instruction::Sequence(children) => current_step(&children[idx], path, depth + 1),
        Instruction::If(branches, else_) => {
            current_step(resolve_branch(branches, else_, idx), path, depth + 1)
        }
        Instruction::While(_, body) => current_step(body, path, depth + 1),
        Instruction::Step(_) | Instruction::Return => None,
    }
}

impl Outline {
    /// Finds the first leaf, evaluating guards against `state`
    /// (ordinarily `Value::Null` before any step has produced output).
    pub fn start(&self, registry: &PredicateRegistry, state: &Value) -> (Cursor, StepperOutcome) {
        let mut path = Vec::new();
        let mut counters = Vec::new();
        let result = enter(&self.root, &mut path, &mut counters, 0, registry, state);
        (Cursor { path, loop_counters: counters }, outcome_from(result))
    }

    /// Moves `cursor` past its current leaf, evaluating any
    /// newly-encountered guard against `state` (the value the leaf
    /// that just ran produced).
    pub fn advance(
        &self,
        cursor: &Cursor,
        registry: &PredicateRegistry,
        state: &Value,
    ) -> (Cursor, StepperOutcome) {
        let mut path = cursor.path.clone();
        let mut counters = cursor.loop_counters.clone();
        let result = if path.is_empty() {
            // The whole outline was a single bare `Step`; nothing follows it.
            WalkResult::Done
        } else {
            advance_from(&self.root, &mut path, &mut counters, 0, registry, state)
        };
        (Cursor { path, loop_counters: counters }, outcome_from(result))
    }

    pub fn current_step(&self, cursor: &Cursor) -> Option<&str> {
        current_step(&self.root, &cursor.path, 0)
    }
}

fn outcome_from(result: WalkResult) -> StepperOutcome {
    match result {
        WalkResult::Leaf(name) => StepperOutcome::Active(name),
        WalkResult::Done => StepperOutcome::Finished,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{if_then, sequence, step, while_loop};

    fn always(value: bool) -> crate::predicate::Predicate {
        std::sync::Arc::new(move |_: &Value| value)
    }

    #[test]
    fn s9_outline_visits_the_else_branch_and_skips_the_if_branch() {
        let outline = Outline::new(sequence(vec![
            step("step_a"),
            if_then(
                vec![("cond".to_string(), step("step_b"))],
                Some(step("step_c")),
            ),
            step("step_d"),
        ]));
        let mut registry = PredicateRegistry::new();
        registry.register("cond", always(false));

        let (cursor, outcome) = outline.start(&registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Active("step_a".to_string()));

        let (cursor, outcome) = outline.advance(&cursor, &registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Active("step_c".to_string()));

        let (cursor, outcome) = outline.advance(&cursor, &registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Active("step_d".to_string()));

        let (_, outcome) = outline.advance(&cursor, &registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Finished);
    }

    #[test]
    fn reloading_a_cursor_resumes_at_the_if_node_without_rerunning_step_a() {
        let outline = Outline::new(sequence(vec![
            step("step_a"),
            if_then(vec![("cond".to_string(), step("step_b"))], Some(step("step_c"))),
            step("step_d"),
        ]));
        let mut registry = PredicateRegistry::new();
        registry.register("cond", always(false));

        let (cursor, _) = outline.start(&registry, &Value::Null);
        let (cursor_after_a, outcome) = outline.advance(&cursor, &registry, &Value::Null);

        // A fresh stepper built straight from the serialized cursor lands
        // on the same leaf a continuously-running one would reach.
        let reloaded: Cursor =
            serde_json::from_value(serde_json::to_value(&cursor_after_a).unwrap()).unwrap();
        assert_eq!(outline.current_step(&reloaded), Some("step_c"));
        assert_eq!(outcome, StepperOutcome::Active("step_c".to_string()));
    }

    #[test]
    fn while_loop_reevaluates_its_predicate_every_iteration() {
        let outline = Outline::new(sequence(vec![
            while_loop("keep_going", step("tick")),
            step("done"),
        ]));
        let remaining = std::sync::Arc::new(std::sync::atomic::AtomicI64::new(2));
        let mut registry = PredicateRegistry::new();
        let r = std::sync::Arc::clone(&remaining);
        registry.register(
            "keep_going",
            std::sync::Arc::new(move |_: &Value| r.load(std::sync::atomic::Ordering::SeqCst) > 0),
        );

        let (mut cursor, outcome) = outline.start(&registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Active("tick".to_string()));
        assert_eq!(cursor.loop_counters, vec![0, 0]);

        remaining.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        let (next_cursor, outcome) = outline.advance(&cursor, &registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Active("tick".to_string()));
        assert_eq!(next_cursor.loop_counters, vec![0, 1]);
        cursor = next_cursor;

        remaining.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        let (next_cursor, outcome) = outline.advance(&cursor, &registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Active("done".to_string()));
        cursor = next_cursor;

        let (_, outcome) = outline.advance(&cursor, &registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Finished);
    }

    #[test]
    fn a_bare_step_outline_finishes_after_one_leaf() {
        let outline = Outline::new(step("only"));
        let registry = PredicateRegistry::new();
        let (cursor, outcome) = outline.start(&registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Active("only".to_string()));
        let (_, outcome) = outline.advance(&cursor, &registry, &Value::Null);
        assert_eq!(outcome, StepperOutcome::Finished);
    }
}
