//! # Host Event Routing
//!
//! Translates discrete host callbacks into bus traffic.
//!
//! Structural changes (part attach/detach, staging) are first published as
//! typed events so priority subscribers can veto them; the game-event
//! multicast is skipped only when a cancel-capable subscription halted the
//! publish. Everything else is a plain capability multicast.

use shared_bus::{EventBus, MulticastReport, PublishOutcome};
use shared_types::{
    BodyInfo, CelestialEvents, Event, GameEvents, PartAttached, PartDetached, PartRef, SaveEvents,
    SaveInfo, StageActivated, SubscriberFault, VesselRef,
};

/// A discrete notification raised by the host simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    VesselLaunched {
        vessel: VesselRef,
    },
    VesselRecovered {
        vessel: VesselRef,
        quick: bool,
    },
    VesselDestroyed {
        vessel: VesselRef,
    },
    StageActivated {
        vessel: VesselRef,
        stage: i32,
    },
    PartAttached {
        part: PartRef,
        target: PartRef,
        vessel: VesselRef,
    },
    PartDetached {
        part: PartRef,
        vessel: VesselRef,
    },
    ScienceReceived {
        data: f64,
        subject: String,
        vessel: VesselRef,
        lab: bool,
    },
    ExperimentDeployed {
        experiment: String,
        vessel: VesselRef,
    },
    ActionGroup {
        vessel: VesselRef,
        group: String,
    },
    OrbitChanged {
        vessel: VesselRef,
    },
    Landed {
        vessel: VesselRef,
        body: BodyInfo,
        latitude: f64,
        longitude: f64,
    },
    GameSaved(SaveInfo),
    GameLoaded(SaveInfo),
}

impl HostEvent {
    /// Metric label for this kind of event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VesselLaunched { .. } => "vessel_launched",
            Self::VesselRecovered { .. } => "vessel_recovered",
            Self::VesselDestroyed { .. } => "vessel_destroyed",
            Self::StageActivated { .. } => "stage_activated",
            Self::PartAttached { .. } => "part_attached",
            Self::PartDetached { .. } => "part_detached",
            Self::ScienceReceived { .. } => "science_received",
            Self::ExperimentDeployed { .. } => "experiment_deployed",
            Self::ActionGroup { .. } => "action_group",
            Self::OrbitChanged { .. } => "orbit_changed",
            Self::Landed { .. } => "landed",
            Self::GameSaved(_) => "game_saved",
            Self::GameLoaded(_) => "game_loaded",
        }
    }
}

/// What routing one host event did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Typed publish that preceded the multicast, if any.
    pub published: Option<PublishOutcome>,
    /// True when a cancel-capable subscription halted the typed publish.
    pub vetoed: bool,
    /// Capability multicast, absent when vetoed.
    pub multicast: Option<MulticastReport>,
}

impl RouteOutcome {
    fn multicast(report: MulticastReport) -> Self {
        Self {
            multicast: Some(report),
            ..Self::default()
        }
    }

    /// Publish `event`, then multicast unless a cancel-capable subscription
    /// halted it. A cancel flag left by any other subscriber is advisory.
    fn gated<T, F>(bus: &EventBus, event: &mut T, multicast: F) -> Result<Self, SubscriberFault>
    where
        T: Event,
        F: FnOnce(&T) -> MulticastReport,
    {
        let published = bus.publish(event)?;
        let vetoed = published.was_halted();
        Ok(Self {
            published: Some(published),
            vetoed,
            multicast: (!vetoed).then(|| multicast(event)),
        })
    }
}

/// Route one host event through the bus.
pub fn route_host_event(bus: &EventBus, event: HostEvent) -> Result<RouteOutcome, SubscriberFault> {
    let outcome = match event {
        HostEvent::VesselLaunched { vessel } => {
            RouteOutcome::multicast(bus.multicast::<dyn GameEvents, _>(
                "on_vessel_launched",
                format_args!("{vessel}"),
                |m| m.on_vessel_launched(&vessel),
            ))
        }
        HostEvent::VesselRecovered { vessel, quick } => {
            RouteOutcome::multicast(bus.multicast::<dyn GameEvents, _>(
                "on_vessel_recovered",
                format_args!("{vessel}, {quick}"),
                |m| m.on_vessel_recovered(&vessel, quick),
            ))
        }
        HostEvent::VesselDestroyed { vessel } => {
            RouteOutcome::multicast(bus.multicast::<dyn GameEvents, _>(
                "on_vessel_destroyed",
                format_args!("{vessel}"),
                |m| m.on_vessel_destroyed(&vessel),
            ))
        }
        HostEvent::StageActivated { vessel, stage } => {
            let mut event = StageActivated {
                vessel,
                stage,
                ..StageActivated::default()
            };
            RouteOutcome::gated(bus, &mut event, |e| {
                bus.multicast::<dyn GameEvents, _>(
                    "on_stage_activated",
                    format_args!("{}, {}", e.vessel, e.stage),
                    |m| m.on_stage_activated(&e.vessel, e.stage),
                )
            })?
        }
        HostEvent::PartAttached {
            part,
            target,
            vessel,
        } => {
            let mut event = PartAttached {
                part,
                target,
                vessel,
                ..PartAttached::default()
            };
            RouteOutcome::gated(bus, &mut event, |e| {
                bus.multicast::<dyn GameEvents, _>(
                    "on_part_attached",
                    format_args!("{}, {}, {}", e.part.name, e.target.name, e.vessel),
                    |m| m.on_part_attached(&e.part, &e.target, &e.vessel),
                )
            })?
        }
        HostEvent::PartDetached { part, vessel } => {
            let mut event = PartDetached {
                part,
                vessel,
                ..PartDetached::default()
            };
            RouteOutcome::gated(bus, &mut event, |e| {
                bus.multicast::<dyn GameEvents, _>(
                    "on_part_detached",
                    format_args!("{}, {}", e.part.name, e.vessel),
                    |m| m.on_part_detached(&e.part, &e.vessel),
                )
            })?
        }
        HostEvent::ScienceReceived {
            data,
            subject,
            vessel,
            lab,
        } => RouteOutcome::multicast(bus.multicast::<dyn GameEvents, _>(
            "on_science_received",
            format_args!("{data:.2}, {subject}, {vessel}, {lab}"),
            |m| m.on_science_received(data, &subject, &vessel, lab),
        )),
        HostEvent::ExperimentDeployed { experiment, vessel } => {
            RouteOutcome::multicast(bus.multicast::<dyn GameEvents, _>(
                "on_experiment_deployed",
                format_args!("{experiment}, {vessel}"),
                |m| m.on_experiment_deployed(&experiment, &vessel),
            ))
        }
        HostEvent::ActionGroup { vessel, group } => {
            RouteOutcome::multicast(bus.multicast::<dyn GameEvents, _>(
                "on_action_group",
                format_args!("{vessel}, {group}"),
                |m| m.on_action_group(&vessel, &group),
            ))
        }
        HostEvent::OrbitChanged { vessel } => {
            RouteOutcome::multicast(bus.multicast::<dyn CelestialEvents, _>(
                "on_orbit_changed",
                format_args!("{vessel}"),
                |m| m.on_orbit_changed(&vessel),
            ))
        }
        HostEvent::Landed {
            vessel,
            body,
            latitude,
            longitude,
        } => RouteOutcome::multicast(bus.multicast::<dyn CelestialEvents, _>(
            "on_landing_detected",
            format_args!("{vessel}, {}, {latitude:.4}, {longitude:.4}", body.name),
            |m| m.on_landing_detected(&vessel, &body, latitude, longitude),
        )),
        HostEvent::GameSaved(save) => RouteOutcome::multicast(bus.multicast::<dyn SaveEvents, _>(
            "on_game_saved",
            format_args!("{}", save.title),
            |m| m.on_game_saved(&save),
        )),
        HostEvent::GameLoaded(save) => {
            RouteOutcome::multicast(bus.multicast::<dyn SaveEvents, _>(
                "on_game_loaded",
                format_args!("{}", save.title),
                |m| m.on_game_loaded(&save),
            ))
        }
    };

    Ok(outcome)
}
