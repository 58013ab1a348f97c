// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turning a [`Process`] into a [`Bundle`] and back.

use chrono::{DateTime, Utc};
use corral_core::{Clock, Pid};
use corral_persistence::{Bundle, LoadContext, PersistError, SaveContext, Savable};

use crate::behavior::ProcessBehavior;
use crate::process::Process;
use crate::state::ProcessState;

const STATE_CREATED: &str = "created";
const STATE_RUNNING: &str = "running";
const STATE_WAITING: &str = "waiting";
const STATE_FINISHED: &str = "finished";
const STATE_EXCEPTED: &str = "excepted";
const STATE_KILLED: &str = "killed";

fn save_state(state: &ProcessState) -> Bundle {
    let mut bundle = Bundle::new("corral.process.ProcessState");
    match state {
        ProcessState::Created => {
            bundle.set_value("label", STATE_CREATED).expect("label serializes");
        }
        ProcessState::Running { step, args } => {
            bundle.set_value("label", STATE_RUNNING).expect("label serializes");
            bundle.set_step_ref("step", step.clone());
            bundle.set_value("args", args).expect("args serialize");
        }
        ProcessState::Waiting { resume_step, message, data } => {
            bundle.set_value("label", STATE_WAITING).expect("label serializes");
            if let Some(step) = resume_step {
                bundle.set_step_ref("resume_step", step.clone());
            }
            bundle.set_value("message", message).expect("message serializes");
            bundle.set_value("data", data).expect("data serializes");
        }
        ProcessState::Finished { result, successful } => {
            bundle.set_value("label", STATE_FINISHED).expect("label serializes");
            bundle.set_value("result", result).expect("result serializes");
            bundle.set_value("successful", successful).expect("bool serializes");
        }
        ProcessState::Excepted { message } => {
            bundle.set_value("label", STATE_EXCEPTED).expect("label serializes");
            bundle.set_value("message", message).expect("message serializes");
        }
        ProcessState::Killed { message } => {
            bundle.set_value("label", STATE_KILLED).expect("label serializes");
            bundle.set_value("message", message).expect("message serializes");
        }
    }
    bundle
}

fn load_state(bundle: &Bundle) -> Result<ProcessState, PersistError> {
    let label: String = bundle.get_value("label")?;
    Ok(match label.as_str() {
        STATE_CREATED => ProcessState::Created,
        STATE_RUNNING => ProcessState::Running {
            step: bundle.get_step_ref("step")?,
            args: bundle.get_value("args")?,
        },
        STATE_WAITING => ProcessState::Waiting {
            resume_step: bundle.get_optional_step_ref("resume_step")?,
            message: bundle.get_optional_value("message")?,
            data: bundle.get_optional_value("data")?,
        },
        STATE_FINISHED => ProcessState::Finished {
            result: bundle.get_value("result")?,
            successful: bundle.get_value("successful")?,
        },
        STATE_EXCEPTED => ProcessState::Excepted { message: bundle.get_value("message")? },
        STATE_KILLED => {
            ProcessState::Killed { message: bundle.get_optional_value("message")? }
        }
        other => return Err(PersistError::Other(format!("unknown state label {other:?}"))),
    })
}

impl<B, C> Savable for Process<B, C>
where
    B: ProcessBehavior + Savable,
    C: Clock + Default,
{
    const CLASS_NAME: &'static str = "corral.process.Process";

    fn save(&self, ctx: &SaveContext) -> Bundle {
        let mut bundle = Bundle::new(Self::CLASS_NAME);
        bundle.set_value("pid", self.pid().to_string()).expect("pid serializes");
        bundle
            .set_value("created_at_ms", self.created_at().timestamp_millis())
            .expect("timestamp serializes");
        bundle.set_value("raw_inputs", self.raw_inputs()).expect("raw inputs serialize");
        bundle.set_value("parsed_inputs", self.parsed_inputs()).expect("parsed inputs serialize");
        bundle
            .set_value("outputs", serde_json::Value::Object(self.outputs()))
            .expect("outputs serialize");
        bundle.set_value("paused", self.is_paused()).expect("bool serializes");
        bundle.set_value("status", self.status()).expect("status serializes");
        bundle
            .set_value("pre_paused_status", self.pre_paused_status())
            .expect("pre-paused status serializes");

        let state = self.state.lock().clone().unwrap_or(ProcessState::Created);
        bundle.set_nested("state", save_state(&state));
        bundle.set_nested("behavior", self.behavior.save(ctx));
        bundle.set_nested("events", self.events.save(ctx));
        bundle
    }

    fn load(bundle: &Bundle, ctx: &LoadContext) -> Result<Self, PersistError> {
        Self::check_class(bundle)?;

        let pid_str: String = bundle.get_value("pid")?;
        let pid: Pid =
            pid_str.parse().map_err(|_| PersistError::Other(format!("invalid pid {pid_str:?}")))?;
        let created_ms: i64 = bundle.get_value("created_at_ms")?;
        let created_at: DateTime<Utc> =
            DateTime::from_timestamp_millis(created_ms).unwrap_or_else(Utc::now);
        let raw_inputs = bundle.get_value("raw_inputs")?;
        let parsed_inputs = bundle.get_value("parsed_inputs")?;
        let outputs_value: serde_json::Value = bundle.get_value("outputs")?;
        let outputs = outputs_value.as_object().cloned().unwrap_or_default();
        let paused: bool = bundle.get_value("paused")?;
        let status: Option<String> = bundle.get_optional_value("status")?;
        let pre_paused_status: Option<String> =
            bundle.get_optional_value("pre_paused_status")?;

        let state = load_state(bundle.get_nested("state")?)?;
        let behavior = B::load(bundle.get_nested("behavior")?, ctx)?;
        let events = match bundle.get_nested("events") {
            Ok(events_bundle) => crate::event::EventTable::load(events_bundle, ctx)?,
            Err(_) => crate::event::EventTable::new(),
        };

        Ok(Process::from_parts(
            pid,
            behavior,
            C::default(),
            created_at,
            raw_inputs,
            parsed_inputs,
            outputs,
            state,
            paused,
            status,
            pre_paused_status,
            events,
        ))
    }
}
