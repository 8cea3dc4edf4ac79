//! Isolated, time-bounded snippet execution.
//!
//! Each generation gets its own worker thread with its own interpreter,
//! buffer, and RNG; nothing is shared with the host except an abort flag
//! and a one-shot result channel. The buffer is transferred back by move,
//! never aliased.
//!
//! Termination model: a thread cannot be killed safely, so the facade sets
//! the abort flag and stops waiting; the interpreter observes the flag at
//! its next fuel check and unwinds on its own. The reply channel is already
//! closed by then, so a late result is dropped.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::{LimnError, Result};
use crate::mesh::buffer::{MaterialHints, MeshBuffer};
use crate::sandbox::interp::{Interp, Interrupt};
use crate::sandbox::parser;
use crate::scene::SceneBounds;

/// Lines of wrapper prologue injected ahead of the user source. This runner
/// executes the source directly, but reported line numbers subtract the
/// offset regardless so the adjustment lives in exactly one place.
const PROLOGUE_LINES: u32 = 0;

/// Grace added to the facade-side wait beyond the interpreter's own
/// deadline, so the worker usually gets to report the timeout itself (with
/// vertex counts intact) before the channel is abandoned.
const RECV_GRACE: Duration = Duration::from_millis(250);

/// Everything a completed sandbox hands back to the facade.
#[derive(Debug)]
pub struct SandboxOutput {
    pub mesh: MeshBuffer,
    pub material: MaterialHints,
}

/// Execution knobs, filled in from the engine settings.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub timeout: Duration,
    pub fuel_check_interval: u32,
    pub initial_vertex_capacity: usize,
}

/// Runs validated source to completion, timeout, or cancellation.
///
/// `abort` is the cancel line: setting it from any thread makes the
/// interpreter stop at its next fuel check.
pub fn run_sandbox(
    source: String,
    seed: u32,
    scene: SceneBounds,
    config: &SandboxConfig,
    abort: Arc<AtomicBool>,
) -> Result<SandboxOutput> {
    let timeout = config.timeout;
    let fuel_interval = config.fuel_check_interval;
    let capacity = config.initial_vertex_capacity;
    let worker_abort = abort.clone();

    let (tx, rx) = flume::bounded::<Result<SandboxOutput>>(1);

    let spawned = thread::Builder::new()
        .name("limn-sandbox".to_string())
        .spawn(move || {
            let deadline = Instant::now() + timeout;
            let result = execute(&source, seed, scene, deadline, worker_abort, fuel_interval, capacity, timeout);
            // The facade may have stopped listening; that is fine.
            let _ = tx.send(result);
        });

    if let Err(err) = spawned {
        return Err(LimnError::Runtime {
            message: format!("failed to spawn sandbox thread: {err}"),
            line: None,
            vertices_so_far: 0,
        });
    }

    match rx.recv_timeout(timeout + RECV_GRACE) {
        Ok(result) => match result {
            // A cancel can race completion; cancellation wins and the
            // buffers are discarded
            Ok(_) if abort.load(std::sync::atomic::Ordering::Relaxed) => Err(LimnError::Cancelled),
            other => other,
        },
        Err(flume::RecvTimeoutError::Timeout) => {
            abort.store(true, std::sync::atomic::Ordering::Relaxed);
            log::warn!("sandbox exceeded its {:.0} s budget, abandoning", timeout.as_secs_f32());
            Err(LimnError::Timeout {
                seconds: timeout.as_secs_f32(),
            })
        }
        Err(flume::RecvTimeoutError::Disconnected) => Err(LimnError::Runtime {
            message: "sandbox terminated unexpectedly".to_string(),
            line: None,
            vertices_so_far: 0,
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn execute(
    source: &str,
    seed: u32,
    scene: SceneBounds,
    deadline: Instant,
    abort: Arc<AtomicBool>,
    fuel_interval: u32,
    capacity: usize,
    timeout: Duration,
) -> Result<SandboxOutput> {
    // The source was validated on the facade side; parsing again here keeps
    // the AST on the worker thread. A failure at this point is still a
    // validation error, just a very late one.
    let program = match parser::parse(source) {
        Ok(program) => program,
        Err(err) => return Err(LimnError::Validation(err.to_string())),
    };

    let mut interp = Interp::new(seed, scene, deadline, abort, fuel_interval, capacity);
    match interp.run(&program) {
        Ok(()) => Ok(SandboxOutput {
            mesh: std::mem::take(&mut interp.mesh),
            material: interp.material,
        }),
        Err(Interrupt::Error { message, line }) => Err(LimnError::Runtime {
            message,
            line: Some(line.saturating_sub(PROLOGUE_LINES)),
            vertices_so_far: interp.mesh.vertex_count(),
        }),
        Err(Interrupt::Timeout) => Err(LimnError::Timeout {
            seconds: timeout.as_secs_f32(),
        }),
        Err(Interrupt::Cancelled) => Err(LimnError::Cancelled),
    }
}
