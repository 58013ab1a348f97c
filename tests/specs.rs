//! Workspace-level end-to-end specs: each test drives a real process
//! (or launcher, or workchain) through a complete seed scenario, across
//! crate boundaries, the way a caller assembling the whole runtime
//! would. Per-module unit tests already cover these mechanisms in
//! isolation; these specs check the crates compose correctly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use corral_comms::{attach, Communicator, LocalCommunicator, RpcIntent, RpcMessage, RpcOutcome};
use corral_core::{Pid, StateLabel};
use corral_launcher::{BehaviorFactory, LaunchArgs, LaunchError, ProcessLauncher};
use corral_persistence::{Bundle, LoadContext, PersistError, SaveContext, Savable};
use corral_process::{
    Process, ProcessBehavior, StepCommand, StepContext, StepOutcome, TerminalOutcome,
};
use corral_storage::{InMemoryPersister, Persister};
use corral_workchain::{if_then, sequence, step, Outline, PredicateRegistry, StepFn, WorkChainBehavior, WorkChainDefinition};
use serde_json::Value;

/// S2: a three-step chain, `run -> step2 -> step3 -> null`.
struct ThreeStep;

#[async_trait]
impl ProcessBehavior for ThreeStep {
    const CLASS_NAME: &'static str = "specs.ThreeStep";

    fn initial_step(&self) -> &str {
        "run"
    }

    async fn call_step(&self, step: &str, args: Value, _ctx: &StepContext) -> StepOutcome {
        match step {
            "run" => StepOutcome::Command(StepCommand::Continue {
                next_step: "step2".to_string(),
                args,
            }),
            "step2" => StepOutcome::Command(StepCommand::Continue {
                next_step: "step3".to_string(),
                args,
            }),
            "step3" => StepOutcome::Command(StepCommand::stopped_with(Value::Null)),
            other => StepOutcome::Failed(format!("unknown step {other:?}")),
        }
    }
}

#[tokio::test]
async fn s2_multi_step_chain_emits_a_running_transition_per_step() {
    let process = Process::new(ThreeStep, Value::Null).unwrap();
    let running_count = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&running_count);
    process.events().register(move |event| {
        if let corral_process::ProcessEvent::StateChanged { to: StateLabel::Running, .. } = event {
            counted.fetch_add(1, Ordering::SeqCst);
        }
    });
    process.start();
    let terminal = process.wait_terminal().await;
    assert_eq!(terminal, TerminalOutcome::Finished { result: Value::Null, successful: true });
    assert_eq!(running_count.load(Ordering::SeqCst), 4);
}

/// S4: pauses mid-step, via an external gate the step awaits inside
/// `call_step`. `arrived` tells the test the step has reached the await
/// point (so `stepping` is already `true`); `gate` is what the step
/// itself awaits. A pause interrupts entry into the step's result, but
/// the step invocation itself is never cancelled and keeps running to
/// completion in the background, so a paused-then-resumed run leaves
/// two invocations blocked on `gate` at once: the abandoned original and
/// the retried one spawned on resume. A `Semaphore` rather than a
/// `Notify` lets the test hand out a permit for each, instead of one
/// permit racing between them.
struct AwaitsAGate {
    arrived: Arc<tokio::sync::Notify>,
    gate: Arc<tokio::sync::Semaphore>,
}

#[async_trait]
impl ProcessBehavior for AwaitsAGate {
    const CLASS_NAME: &'static str = "specs.AwaitsAGate";

    fn initial_step(&self) -> &str {
        "wait_for_gate"
    }

    async fn call_step(&self, step: &str, args: Value, _ctx: &StepContext) -> StepOutcome {
        match step {
            "wait_for_gate" => {
                self.arrived.notify_one();
                let _ = self.gate.acquire().await.unwrap();
                StepOutcome::Command(StepCommand::stopped_with(args))
            }
            other => StepOutcome::Failed(format!("unknown step {other:?}")),
        }
    }
}

#[tokio::test]
async fn s4_pause_mid_step_suspends_before_the_next_transition() {
    let arrived = Arc::new(tokio::sync::Notify::new());
    let gate = Arc::new(tokio::sync::Semaphore::new(0));
    let process = Process::new(
        AwaitsAGate { arrived: Arc::clone(&arrived), gate: Arc::clone(&gate) },
        serde_json::json!(7),
    )
    .unwrap();
    process.start();

    // Once the step has announced arrival it is genuinely stuck
    // awaiting `gate`, so `stepping` is guaranteed true and `pause()`
    // will interrupt the in-flight step rather than racing it.
    arrived.notified().await;
    let outcome = process.pause(Some("by test".to_string())).await.unwrap();
    assert_eq!(outcome, corral_process::ControlOutcome::Paused);
    assert!(process.is_paused());
    assert_eq!(process.status().as_deref(), Some("by test"));

    // One permit for the abandoned invocation still running in the
    // background (its result is discarded once it finally completes),
    // one for the retried invocation that actually decides the outcome.
    gate.add_permits(2);
    process.play().await.unwrap();
    let terminal = process.wait_terminal().await;
    assert_eq!(terminal, TerminalOutcome::Finished { result: serde_json::json!(7), successful: true });
}

/// S6: a step that fails outright (the corral equivalent of raising).
struct Boom;

#[async_trait]
impl ProcessBehavior for Boom {
    const CLASS_NAME: &'static str = "specs.Boom";

    fn initial_step(&self) -> &str {
        "run"
    }

    async fn call_step(&self, _step: &str, _args: Value, _ctx: &StepContext) -> StepOutcome {
        StepOutcome::Failed("boom".to_string())
    }
}

#[tokio::test]
async fn s6_a_failed_step_excepts_the_process() {
    let process = Process::new(Boom, Value::Null).unwrap();
    let excepted_message: Arc<parking_lot::Mutex<Option<String>>> =
        Arc::new(parking_lot::Mutex::new(None));
    let captured = Arc::clone(&excepted_message);
    process.events().register(move |event| {
        if let corral_process::ProcessEvent::Excepted { message, .. } = event {
            *captured.lock() = Some(message.clone());
        }
    });
    process.start();
    let terminal = process.wait_terminal().await;
    match terminal {
        TerminalOutcome::Excepted { message } => assert!(message.contains("boom")),
        other => panic!("expected Excepted, got {other:?}"),
    }
    assert_eq!(excepted_message.lock().as_deref(), Some("boom"));
}

/// S3/S7 behavior: waits with a message, resumes with whatever value it
/// is given.
struct Echo {
    message: String,
}

#[async_trait]
impl ProcessBehavior for Echo {
    const CLASS_NAME: &'static str = "specs.Echo";

    fn initial_step(&self) -> &str {
        "announce"
    }

    async fn call_step(&self, step: &str, args: Value, _ctx: &StepContext) -> StepOutcome {
        match step {
            "announce" => StepOutcome::Command(StepCommand::Wait {
                resume_step: Some("settle".to_string()),
                message: Some(self.message.clone()),
                data: None,
            }),
            "settle" => StepOutcome::Command(StepCommand::stopped_with(args)),
            other => StepOutcome::Failed(format!("unknown step {other:?}")),
        }
    }
}

impl Savable for Echo {
    const CLASS_NAME: &'static str = "specs.Echo";

    fn save(&self, _ctx: &SaveContext) -> Bundle {
        let mut bundle = Bundle::new(Self::CLASS_NAME);
        bundle.set_value("message", &self.message).expect("message serializes");
        bundle
    }

    fn load(bundle: &Bundle, _ctx: &LoadContext) -> Result<Self, PersistError> {
        Self::check_class(bundle)?;
        Ok(Echo { message: bundle.get_value("message")? })
    }
}

async fn wait_for_label(process: &Arc<Process<Echo>>, label: StateLabel) {
    let mut labels = process.subscribe_label();
    loop {
        if *labels.borrow() == label {
            return;
        }
        labels.changed().await.unwrap();
    }
}

#[tokio::test]
async fn s3_wait_then_resume_returns_the_resumed_value() {
    let process = Process::new(Echo { message: "waiting for go".to_string() }, Value::Null).unwrap();
    process.start();
    wait_for_label(&process, StateLabel::Waiting).await;
    assert_eq!(process.status(), None);
    process.resume(Some(serde_json::json!(42))).unwrap();
    let terminal = process.wait_terminal().await;
    assert_eq!(terminal, TerminalOutcome::Finished { result: serde_json::json!(42), successful: true });
}

#[tokio::test]
async fn s5_kill_while_waiting_raises_through_the_terminal_future() {
    let process = Process::new(Echo { message: "forever".to_string() }, Value::Null).unwrap();
    process.start();
    wait_for_label(&process, StateLabel::Waiting).await;
    let outcome = process.kill(Some("stop now".to_string())).await.unwrap();
    assert_eq!(outcome, corral_process::ControlOutcome::Killed);
    let terminal = process.wait_terminal().await;
    assert_eq!(terminal, TerminalOutcome::Killed { message: Some("stop now".to_string()) });
}

#[tokio::test]
async fn s7_save_load_mid_wait_then_resume_on_a_fresh_process() {
    let persister = InMemoryPersister::new();
    let process = Process::new(Echo { message: "waiting for go".to_string() }, Value::Null).unwrap();
    process.start();
    wait_for_label(&process, StateLabel::Waiting).await;

    let bundle = process.save(&SaveContext::new());
    persister.save_checkpoint(process.pid(), None, &bundle).unwrap();

    let loaded_bundle = persister.load_checkpoint(process.pid(), None).unwrap();
    let reloaded = Arc::new(Process::<Echo>::load(&loaded_bundle, &LoadContext::new()).unwrap());
    assert_eq!(reloaded.pid(), process.pid());
    assert_eq!(reloaded.label(), StateLabel::Waiting);
    reloaded.start();

    reloaded.resume(Some(serde_json::json!(7))).unwrap();
    let terminal = reloaded.wait_terminal().await;
    assert_eq!(terminal, TerminalOutcome::Finished { result: serde_json::json!(7), successful: true });
}

/// S8: a launcher drives an add-style process to completion, both
/// awaited and fire-and-forget.
struct Adder;

#[async_trait]
impl ProcessBehavior for Adder {
    const CLASS_NAME: &'static str = "specs.Adder";

    fn initial_step(&self) -> &str {
        "add"
    }

    async fn call_step(&self, step: &str, args: Value, _ctx: &StepContext) -> StepOutcome {
        match step {
            "add" => {
                let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
                let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
                StepOutcome::Command(StepCommand::stopped_with(serde_json::json!(a + b)))
            }
            other => StepOutcome::Failed(format!("unknown step {other:?}")),
        }
    }
}

impl Savable for Adder {
    const CLASS_NAME: &'static str = "specs.Adder";

    fn save(&self, _ctx: &SaveContext) -> Bundle {
        Bundle::new(Self::CLASS_NAME)
    }

    fn load(bundle: &Bundle, _ctx: &LoadContext) -> Result<Self, PersistError> {
        Self::check_class(bundle)?;
        Ok(Adder)
    }
}

fn adder_factory() -> BehaviorFactory<Adder> {
    Arc::new(|_args, _kwargs| Ok(Adder))
}

#[tokio::test]
async fn s8_launcher_happy_path_awaited_and_fire_and_forget() {
    let launcher: ProcessLauncher<Adder> = ProcessLauncher::new(adder_factory());

    let reply = launcher
        .launch(LaunchArgs {
            process_class_id: Adder::CLASS_NAME.to_string(),
            init_args: serde_json::json!({"a": 2, "b": 3}),
            init_kwargs: Value::Null,
            persist: false,
            nowait: false,
        })
        .await
        .unwrap();
    assert_eq!(reply.terminal, Some(TerminalOutcome::Finished { result: serde_json::json!(5), successful: true }));

    let reply = launcher
        .launch(LaunchArgs {
            process_class_id: Adder::CLASS_NAME.to_string(),
            init_args: serde_json::json!({"a": 10, "b": 20}),
            init_kwargs: Value::Null,
            persist: false,
            nowait: true,
        })
        .await
        .unwrap();
    assert!(reply.terminal.is_none());
    assert_ne!(reply.pid, Pid::new());
}

/// S9: `[step_a, if(cond){step_b} else {step_c}, step_d]`, run with
/// `cond=false`; saving mid-run resumes at the `if` node.
fn recording_step(name: &'static str, log: Arc<parking_lot::Mutex<Vec<&'static str>>>) -> StepFn {
    Arc::new(move |value: Value| {
        let log = Arc::clone(&log);
        Box::pin(async move {
            log.lock().push(name);
            value
        })
    })
}

fn s9_definition(
    log: Arc<parking_lot::Mutex<Vec<&'static str>>>,
) -> WorkChainDefinition {
    let outline = Outline::new(sequence(vec![
        step("step_a"),
        if_then(vec![("cond".to_string(), step("step_b"))], Some(step("step_c"))),
        step("step_d"),
    ]));
    let mut steps = std::collections::HashMap::new();
    for name in ["step_a", "step_b", "step_c", "step_d"] {
        steps.insert(name.to_string(), recording_step(name, Arc::clone(&log)));
    }
    let mut predicates = PredicateRegistry::new();
    predicates.register("cond", Arc::new(|_: &Value| false));
    WorkChainDefinition::new(outline, steps, predicates)
}

#[tokio::test]
async fn s9_workchain_visits_the_else_branch_and_skips_the_if_branch() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let behavior = WorkChainBehavior::new(s9_definition(Arc::clone(&log))).unwrap();
    let process = Process::new(behavior, Value::Null).unwrap();
    process.start();
    let terminal = process.wait_terminal().await;
    assert!(terminal.is_successful());
    assert_eq!(*log.lock(), vec!["step_a", "step_c", "step_d"]);
}

/// A variant of the S9 outline whose `step_c` announces that it has
/// started (so the test knows the cursor has already advanced past the
/// `if` node) and then blocks until the test lets it continue — the
/// only way to deterministically observe "cursor at step_c, step_c not
/// yet run" without racing a watch channel that coalesces transitions.
fn s9_gated_definition(
    log: Arc<parking_lot::Mutex<Vec<&'static str>>>,
    arrived: Arc<tokio::sync::Notify>,
    proceed: Arc<tokio::sync::Notify>,
) -> WorkChainDefinition {
    let outline = Outline::new(sequence(vec![
        step("step_a"),
        if_then(vec![("cond".to_string(), step("step_b"))], Some(step("step_c"))),
        step("step_d"),
    ]));
    let mut steps: std::collections::HashMap<String, StepFn> = std::collections::HashMap::new();
    steps.insert("step_a".to_string(), recording_step("step_a", Arc::clone(&log)));
    steps.insert("step_b".to_string(), recording_step("step_b", Arc::clone(&log)));
    steps.insert(
        "step_c".to_string(),
        Arc::new(move |value: Value| {
            let log = Arc::clone(&log);
            let arrived = Arc::clone(&arrived);
            let proceed = Arc::clone(&proceed);
            Box::pin(async move {
                arrived.notify_one();
                proceed.notified().await;
                log.lock().push("step_c");
                value
            })
        }),
    );
    let mut predicates = PredicateRegistry::new();
    predicates.register("cond", Arc::new(|_: &Value| false));
    WorkChainDefinition::new(outline, steps, predicates)
}

#[tokio::test]
async fn s9_reloading_after_step_a_resumes_at_the_if_node_without_rerunning_step_a() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let arrived = Arc::new(tokio::sync::Notify::new());
    // The original process's `step_c` blocks forever on a gate nothing
    // ever notifies; it is abandoned in place once its cursor has been
    // captured, not driven to completion.
    let never_proceeds = Arc::new(tokio::sync::Notify::new());
    let original_definition = s9_gated_definition(Arc::clone(&log), Arc::clone(&arrived), never_proceeds);
    let behavior = WorkChainBehavior::new(original_definition).unwrap();
    let process = Process::new(behavior, Value::Null).unwrap();
    process.start();

    // step_c announces it has started (and is blocked before logging)
    // only once the outline has already advanced past step_a's if-node.
    arrived.notified().await;
    assert_eq!(*log.lock(), vec!["step_a"]);
    assert_eq!(process.label(), StateLabel::Running);

    let bundle = process.save(&SaveContext::new());

    // A freshly built (but structurally identical) definition stands in
    // for "the caller re-registers its outline/steps/predicates after a
    // restart" — it shares the same `log` so the two runs' step
    // invocations can be told apart.
    let reload_definition = s9_definition(Arc::clone(&log));
    let mut load_ctx = LoadContext::new();
    load_ctx.extensions.insert(reload_definition);
    let reloaded = Arc::new(Process::<WorkChainBehavior>::load(&bundle, &load_ctx).unwrap());
    reloaded.start();

    let terminal = reloaded.wait_terminal().await;
    assert!(terminal.is_successful());
    // step_a ran exactly once, in the original process; the reloaded
    // run resumes at the if-node's chosen leaf and only runs step_c and
    // step_d, never re-running step_a.
    assert_eq!(*log.lock(), vec!["step_a", "step_c", "step_d"]);
}

/// S10: an RPC `pause` then `play` round trip through a communicator.
#[tokio::test]
async fn s10_rpc_pause_then_play_round_trips_the_pre_pause_status() {
    let comm: Arc<dyn Communicator> = Arc::new(LocalCommunicator::new());
    let process = Process::new(Echo { message: "hi".to_string() }, Value::Null).unwrap();
    attach(Arc::clone(&process), Arc::clone(&comm));
    process.start();
    wait_for_label(&process, StateLabel::Waiting).await;

    let status_before = comm
        .rpc_send(RpcMessage::new(process.pid(), RpcIntent::Status))
        .await
        .unwrap();
    assert!(matches!(status_before.outcome, RpcOutcome::Ok { .. }));

    let pause_reply =
        comm.rpc_send(RpcMessage::new(process.pid(), RpcIntent::Pause)).await.unwrap();
    assert!(matches!(pause_reply.outcome, RpcOutcome::Ok { .. }));
    assert!(process.is_paused());

    let play_reply =
        comm.rpc_send(RpcMessage::new(process.pid(), RpcIntent::Play)).await.unwrap();
    assert!(matches!(play_reply.outcome, RpcOutcome::Ok { .. }));
    assert!(!process.is_paused());

    loop {
        if process.resume(Some(serde_json::json!("go"))).is_ok() {
            break;
        }
        tokio::task::yield_now().await;
    }
    let terminal = process.wait_terminal().await;
    assert!(terminal.is_successful());
}

#[tokio::test]
async fn launching_an_unknown_process_class_is_rejected() {
    let launcher: ProcessLauncher<Adder> = ProcessLauncher::new(adder_factory());
    let err = launcher
        .launch(LaunchArgs {
            process_class_id: "not.a.real.class".to_string(),
            init_args: Value::Null,
            init_kwargs: Value::Null,
            persist: false,
            nowait: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LaunchError::TaskRejected(_)));
}
