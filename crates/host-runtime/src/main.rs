//! # Flightline Host
//!
//! Demo host: wires the runtime with two demo modules and flies a scripted
//! suborbital hop through the tick loop.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize logging and metrics
//! 3. Register modules and start the runtime
//! 4. Enter flight, launch, drive ticks until the script ends or Ctrl+C
//! 5. Save, stop and print a summary

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};

use flightline_telemetry::{init_telemetry, FanoutLogSink, MemoryLogSink, TracingLogSink};
use host_runtime::demo::{FlightRecorder, RangeSafety, SuborbitalHop, HOPPER_ID};
use host_runtime::{run_tick_loop, HostConfig, HostEvent, HostRuntime};
use shared_types::{PartRef, SaveInfo, Scene, VesselRef};

#[tokio::main]
async fn main() -> Result<()> {
    let config = HostConfig::from_env().context("Failed to load host configuration")?;
    let telemetry =
        init_telemetry(config.telemetry.clone()).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Flightline Host v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let journal_tail = Arc::new(MemoryLogSink::new(config.telemetry.memory_log_capacity));
    let log = FanoutLogSink::new()
        .with(Arc::new(TracingLogSink::new("bus")))
        .with(journal_tail.clone());

    let mut runtime = HostRuntime::with_log_sink(config.clone(), Arc::new(log));
    let recorder = Arc::new(FlightRecorder::new());
    runtime.register_module(recorder.clone())?;
    runtime.register_module(Arc::new(RangeSafety::new()))?;
    runtime.start()?;

    let hopper = VesselRef::new(HOPPER_ID, "Hopper");
    runtime.on_scene_changed(Scene::Flight)?;
    runtime.on_host_event(HostEvent::VesselLaunched {
        vessel: hopper.clone(),
    })?;
    runtime.on_host_event(HostEvent::StageActivated {
        vessel: hopper.clone(),
        stage: 1,
    })?;
    let veto = runtime.on_host_event(HostEvent::PartAttached {
        part: PartRef::new(9, "strut"),
        target: PartRef::new(1, RangeSafety::PROTECTED_PART),
        vessel: hopper.clone(),
    })?;
    info!(vetoed = veto.vetoed, "Attachment to launch clamp requested");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    let summary = run_tick_loop(
        &mut runtime,
        SuborbitalHop::new(),
        config.tick_interval(),
        config.max_ticks,
        shutdown_rx,
    )
    .await?;

    runtime.on_host_event(HostEvent::GameSaved(SaveInfo {
        title: "hop".to_string(),
        universal_time: summary.ticks as f64,
    }))?;

    let bus_stats = runtime.bus().stats();
    let detector_stats = runtime.detector_metrics();
    runtime.stop()?;

    info!(
        ticks = summary.ticks,
        events = summary.events,
        faults = summary.faults,
        exit = ?summary.exit,
        "Flight complete"
    );
    info!(bus = %serde_json::to_string(&bus_stats)?, "Bus statistics");
    info!(detector = %serde_json::to_string(&detector_stats)?, "Detector statistics");
    info!(bus_log_lines = journal_tail.len(), "Bus log retained in memory");

    for entry in recorder.journal() {
        println!("{entry}");
    }
    println!("{}", telemetry.metrics().gather_text()?);

    Ok(())
}
