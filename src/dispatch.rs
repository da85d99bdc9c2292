//! Rate-limited dispatch of a template as sequential create requests.
//!
//! Tasks are submitted strictly in template order, one at a time, with a
//! fixed pause after every submission (including the last). Failures are
//! counted and reported, never retried, and never stop the batch.

use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::derive::*;
use crate::gateway::TaskGateway;
use crate::task::{TaskPayload, TaskSpec};

/// Pause after each submission. The remote service caps task creation at
/// roughly 12 requests per minute.
pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(8);

/// Blocks between submissions.
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// What happened to one template entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Created { name: String, id: String },
    Failed { name: String, reason: String, payload: TaskPayload },
}

/// Aggregate result of one dispatch. `outcomes` is in template order and
/// always has one entry per submitted task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub successes: usize,
    pub failures: usize,
    pub outcomes: Vec<TaskOutcome>,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.successes + self.failures
    }

    pub fn summary(&self) -> String {
        format!(
            "Task Creations Completed with {}/{} success and {} failures.",
            self.successes,
            self.total(),
            self.failures
        )
    }
}

/// Submit every task in `tasks` through `gateway`, pausing `delay` after each.
pub fn dispatch<G, P>(
    gateway: &G,
    pacer: &mut P,
    delay: Duration,
    tasks: &[TaskSpec],
    params: &RunParams,
) -> DispatchReport
where
    G: TaskGateway + ?Sized,
    P: Pacer + ?Sized,
{
    let total = tasks.len();
    let mut report = DispatchReport::default();
    info!(total, workspace = %params.workspace_id, "dispatch started");

    for (i, spec) in tasks.iter().enumerate() {
        println!("Creating task {}/{}...", i + 1, total);

        let Derived { payload, date_fault } = derive_payload(spec, params, Utc::now());
        if let Some(fault) = date_fault {
            println!("{}, setting to today.", fault);
            warn!(task = %spec.name, "{fault}");
        }

        match gateway.create_task(&payload) {
            Ok(created) => {
                println!("Task '{}' created successfully! (ID: {})", spec.name, created.id);
                report.successes += 1;
                report.outcomes.push(TaskOutcome::Created {
                    name: spec.name.clone(),
                    id: created.id,
                });
            }
            Err(e) => {
                let sent = serde_json::to_string(&payload).unwrap_or_else(|_| format!("{payload:?}"));
                println!("Error creating task '{}'.", spec.name);
                println!("Payload sent: `{}`", sent);
                warn!(task = %spec.name, error = %e, "task creation failed");
                report.failures += 1;
                report.outcomes.push(TaskOutcome::Failed {
                    name: spec.name.clone(),
                    reason: e.to_string(),
                    payload,
                });
            }
        }

        debug!(?delay, "pausing before next submission");
        pacer.pause(delay);
    }

    info!(successes = report.successes, failures = report.failures, "dispatch finished");
    report
}
