// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materializes processes from task messages.
//!
//! Parameterized over one concrete [`ProcessBehavior`] type `B`; a
//! registry dispatching `process_class_id` across several behavior
//! types would need an object-safe wrapper trait (`ProcessBehavior`
//! carries an associated const, so it cannot be boxed directly) — left
//! as a documented simplification rather than built speculatively.

use std::sync::Arc;

use corral_comms::Communicator;
use corral_core::{Clock, SystemClock};
use corral_persistence::{LoadContext, SaveContext, Savable};
use corral_process::{Pid, Process, ProcessBehavior};
use corral_storage::Persister;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::LaunchError;
use crate::task::{ContinueArgs, CreateArgs, LaunchArgs, TaskReply};

/// Builds a fresh `B` from a task's `init_args`/`init_kwargs`.
pub type BehaviorFactory<B> = Arc<dyn Fn(Value, Value) -> Result<B, String> + Send + Sync>;

pub struct ProcessLauncher<B: ProcessBehavior + Savable, C: Clock = SystemClock> {
    factory: BehaviorFactory<B>,
    persister: Option<Arc<dyn Persister>>,
    communicator: Option<Arc<dyn Communicator>>,
    clock: C,
}

impl<B: ProcessBehavior + Savable> ProcessLauncher<B, SystemClock> {
    pub fn new(factory: BehaviorFactory<B>) -> Self {
        Self::with_clock(factory, SystemClock)
    }
}

impl<B: ProcessBehavior + Savable, C: Clock> ProcessLauncher<B, C> {
    pub fn with_clock(factory: BehaviorFactory<B>, clock: C) -> Self {
        Self { factory, persister: None, communicator: None, clock }
    }

    pub fn with_persister(mut self, persister: Arc<dyn Persister>) -> Self {
        self.persister = Some(persister);
        self
    }

    pub fn with_communicator(mut self, communicator: Arc<dyn Communicator>) -> Self {
        self.communicator = Some(communicator);
        self
    }

    fn merge_args(args: &Value, kwargs: &Value) -> Value {
        let mut merged = args.as_object().cloned().unwrap_or_default();
        if let Some(kw) = kwargs.as_object() {
            for (k, v) in kw {
                merged.insert(k.clone(), v.clone());
            }
        }
        Value::Object(merged)
    }

    fn attach_and_start(&self, process: &Arc<Process<B, C>>) {
        if let Some(comm) = &self.communicator {
            corral_comms::attach(Arc::clone(process), Arc::clone(comm));
        }
        process.start();
    }

    fn persist(&self, process: &Process<B, C>) -> Result<(), LaunchError> {
        let persister = self.persister.as_ref().ok_or_else(|| {
            LaunchError::TaskRejected("no persister configured".to_string())
        })?;
        let bundle = process.save(&SaveContext::new());
        persister.save_checkpoint(process.pid(), None, &bundle)?;
        Ok(())
    }

    /// `launch { process_class_id, init_args, init_kwargs, persist, nowait }`.
    #[instrument(skip(self, args))]
    pub async fn launch(&self, args: LaunchArgs) -> Result<TaskReply, LaunchError> {
        if args.process_class_id != B::CLASS_NAME {
            return Err(LaunchError::TaskRejected(format!(
                "unknown process_class_id {:?}, this launcher only builds {:?}",
                args.process_class_id,
                B::CLASS_NAME
            )));
        }
        let behavior = (self.factory)(args.init_args.clone(), args.init_kwargs.clone())
            .map_err(LaunchError::TaskRejected)?;
        let raw_inputs = Self::merge_args(&args.init_args, &args.init_kwargs);
        let process = Process::with_clock(behavior, raw_inputs, self.clock.clone())
            .map_err(LaunchError::TaskRejected)?;
        if args.persist {
            self.persist(&process)?;
        }
        info!(pid = %process.pid(), nowait = args.nowait, "launching process");
        self.attach_and_start(&process);
        self.await_reply(process, args.nowait).await
    }

    /// `continue { pid, tag?, nowait }`.
    #[instrument(skip(self, args))]
    pub async fn continue_process(&self, args: ContinueArgs) -> Result<TaskReply, LaunchError> {
        let persister = self.persister.as_ref().ok_or_else(|| {
            LaunchError::TaskRejected("no persister configured".to_string())
        })?;
        let bundle = persister.load_checkpoint(args.pid, args.tag.as_deref())?;
        let loaded = Process::<B, C>::load(&bundle, &LoadContext::new())?;
        let process = Arc::new(loaded);
        info!(pid = %process.pid(), nowait = args.nowait, "continuing process");
        self.attach_and_start(&process);
        self.await_reply(process, args.nowait).await
    }

    /// `create { process_class_id, init_args, init_kwargs, persist }` —
    /// constructs and optionally persists, never runs.
    #[instrument(skip(self, args))]
    pub fn create(&self, args: CreateArgs) -> Result<Pid, LaunchError> {
        if args.process_class_id != B::CLASS_NAME {
            return Err(LaunchError::TaskRejected(format!(
                "unknown process_class_id {:?}",
                args.process_class_id
            )));
        }
        let behavior = (self.factory)(args.init_args.clone(), args.init_kwargs.clone())
            .map_err(LaunchError::TaskRejected)?;
        let raw_inputs = Self::merge_args(&args.init_args, &args.init_kwargs);
        let process = Process::with_clock(behavior, raw_inputs, self.clock.clone())
            .map_err(LaunchError::TaskRejected)?;
        if args.persist {
            self.persist(&process)?;
        }
        Ok(process.pid())
    }

    async fn await_reply(
        &self,
        process: Arc<Process<B, C>>,
        nowait: bool,
    ) -> Result<TaskReply, LaunchError> {
        if nowait {
            return Ok(TaskReply { pid: process.pid(), terminal: None });
        }
        let terminal = process.wait_terminal().await;
        match &terminal {
            corral_process::TerminalOutcome::Excepted { message } => {
                Err(LaunchError::Unsuccessful(message.clone()))
            }
            corral_process::TerminalOutcome::Killed { message } => Err(LaunchError::Unsuccessful(
                message.clone().unwrap_or_else(|| "killed".to_string()),
            )),
            corral_process::TerminalOutcome::Finished { .. } => {
                Ok(TaskReply { pid: process.pid(), terminal: Some(terminal) })
            }
        }
    }
}
