//! # Tick Loop
//!
//! Drives a [`HostRuntime`] from a scripted snapshot source on a fixed
//! interval until the script ends, the tick limit is hit or shutdown is
//! signalled.

use std::time::Duration;

use shared_types::TickSnapshot;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::RuntimeError;
use crate::runtime::HostRuntime;

/// Why the tick loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    ScriptFinished,
    TickLimit,
    Shutdown,
}

/// Summary of one tick loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub events: usize,
    pub faults: usize,
    pub exit: LoopExit,
}

/// Feed `script` into `runtime`, one snapshot per `interval`.
pub async fn run_tick_loop<I>(
    runtime: &mut HostRuntime,
    script: I,
    interval: Duration,
    max_ticks: u64,
    mut shutdown: watch::Receiver<bool>,
) -> Result<LoopSummary, RuntimeError>
where
    I: IntoIterator<Item = TickSnapshot>,
{
    let mut script = script.into_iter();
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut summary = LoopSummary {
        ticks: 0,
        events: 0,
        faults: 0,
        exit: LoopExit::ScriptFinished,
    };

    info!(interval_ms = interval.as_millis() as u64, max_ticks, "Tick loop started");

    loop {
        if summary.ticks >= max_ticks {
            summary.exit = LoopExit::TickLimit;
            break;
        }
        if *shutdown.borrow() {
            summary.exit = LoopExit::Shutdown;
            break;
        }

        tokio::select! {
            _ = timer.tick() => {
                let Some(snapshot) = script.next() else {
                    summary.exit = LoopExit::ScriptFinished;
                    break;
                };
                let report = runtime.on_tick(&snapshot)?;
                summary.ticks += 1;
                summary.events += report.events.len();
                summary.faults += report.faults;
                if !report.events.is_empty() {
                    debug!(tick = report.tick, events = report.events.len(), "Tick produced events");
                }
            }
            changed = shutdown.changed() => {
                // A dropped sender also ends the loop.
                if changed.is_err() || *shutdown.borrow() {
                    summary.exit = LoopExit::Shutdown;
                    break;
                }
            }
        }
    }

    info!(
        ticks = summary.ticks,
        events = summary.events,
        faults = summary.faults,
        exit = ?summary.exit,
        "Tick loop finished"
    );
    Ok(summary)
}
