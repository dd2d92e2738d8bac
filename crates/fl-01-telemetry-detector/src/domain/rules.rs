//! Rule evaluation
//!
//! Pure function from (previous state, snapshot, thresholds) to
//! (next state, events). No I/O.
//!
//! Within a tick, events are produced in this order:
//!
//! 1. vessels that left the loaded set, by id
//! 2. vessels that entered the loaded set, in snapshot order
//! 3. per loaded vessel, in snapshot order: SOI change, atmosphere,
//!    high speed, orbit decay, apoapsis, periapsis, low fuel, low charge,
//!    impact, resource flow
//! 4. collision pairs
//! 5. throttle
//!
//! A reading that is absent or not finite skips the rules that need it and
//! leaves their state untouched.

use shared_types::{Scene, TickSnapshot, VesselId, VesselState};
use std::collections::BTreeSet;

use super::edge::EdgeState;
use super::events::TelemetryEvent;
use super::thresholds::{DetectorSettings, Thresholds};
use super::tracker::{AtmosphereEdges, PairKey, TrackerState, VesselTrack};

fn finite(reading: Option<f64>) -> Option<f64> {
    reading.filter(|value| value.is_finite())
}

/// Evaluate one tick, updating `state` and returning the events it produced.
pub fn evaluate(
    state: &mut TrackerState,
    snapshot: &TickSnapshot,
    thresholds: &Thresholds,
    settings: &DetectorSettings,
) -> Vec<TelemetryEvent> {
    let mut events = Vec::new();

    // A vessel id listed twice is evaluated once, from its first entry.
    let mut seen: BTreeSet<VesselId> = BTreeSet::new();
    let loaded: Vec<&VesselState> = snapshot
        .loaded_vessels()
        .filter(|vessel| seen.insert(vessel.id))
        .collect();

    let departed: Vec<VesselId> = state
        .vessels
        .keys()
        .filter(|id| !seen.contains(id))
        .copied()
        .collect();
    for id in departed {
        if let Some(track) = state.forget(id) {
            events.push(TelemetryEvent::VesselUnloaded {
                vessel: track.vessel,
            });
        }
    }

    for vessel in &loaded {
        if !state.vessels.contains_key(&vessel.id) {
            state
                .vessels
                .insert(vessel.id, VesselTrack::new(vessel.vessel_ref()));
            events.push(TelemetryEvent::VesselLoaded {
                vessel: vessel.vessel_ref(),
            });
        }
    }

    for vessel in &loaded {
        if let Some(track) = state.vessels.get_mut(&vessel.id) {
            if track.vessel.name != vessel.name {
                track.vessel.name.clone_from(&vessel.name);
            }
            evaluate_vessel(track, vessel, thresholds, settings, &mut events);
        }
    }

    evaluate_collisions(state, &loaded, thresholds, &mut events);
    evaluate_throttle(state, snapshot, settings, &mut events);

    events
}

fn evaluate_vessel(
    track: &mut VesselTrack,
    state: &VesselState,
    thresholds: &Thresholds,
    settings: &DetectorSettings,
    events: &mut Vec<TelemetryEvent>,
) {
    let vessel = state.vessel_ref();
    let altitude = finite(state.altitude_m);
    let speed = finite(state.surface_speed_mps);
    let orbit = state.orbit.unwrap_or_default();

    if let Some(body) = &state.body {
        if let Some(previous) = &track.body {
            if previous.name != body.name {
                events.push(TelemetryEvent::SoiChanged {
                    vessel: vessel.clone(),
                    from: previous.clone(),
                    to: body.clone(),
                });
            }
        }
        track.body = Some(body.clone());

        let inside = body.has_atmosphere;
        match track.atmosphere.as_mut() {
            Some(edges) => {
                if edges.entry.step(inside, !inside) {
                    events.push(TelemetryEvent::AtmosphereEntry {
                        vessel: vessel.clone(),
                        body: body.clone(),
                    });
                }
                if edges.exit.step(!inside, inside) {
                    events.push(TelemetryEvent::AtmosphereExit {
                        vessel: vessel.clone(),
                        body: body.clone(),
                    });
                }
            }
            None => track.atmosphere = Some(AtmosphereEdges::seeded(inside)),
        }
    }

    if let Some(speed) = speed {
        if track.high_speed.step_level(speed > thresholds.high_speed_mps) {
            events.push(TelemetryEvent::HighSpeed {
                vessel: vessel.clone(),
                speed,
            });
        }
    }

    // Periapsis altitude is measured from the surface.
    if let (Some(_), Some(periapsis), Some(time_to_decay)) = (
        state.body.as_ref(),
        finite(orbit.periapsis_altitude_m),
        finite(orbit.time_to_periapsis_s),
    ) {
        if track
            .orbit_decay
            .step_level(periapsis < thresholds.decay_margin_m())
        {
            events.push(TelemetryEvent::OrbitDecayWarning {
                vessel: vessel.clone(),
                time_to_decay,
            });
        }
    }

    if let (Some(altitude), Some(apoapsis), Some(time_to_apoapsis)) = (
        altitude,
        finite(orbit.apoapsis_altitude_m),
        finite(orbit.time_to_apoapsis_s),
    ) {
        let within = (altitude - apoapsis).abs() < thresholds.apoapsis_accuracy_m;
        if track.apoapsis.step_level(within) {
            events.push(TelemetryEvent::ApoapsisReached {
                vessel: vessel.clone(),
                altitude: apoapsis,
                time_to_apoapsis,
            });
        }
    }

    if let (Some(altitude), Some(periapsis), Some(time_to_periapsis)) = (
        altitude,
        finite(orbit.periapsis_altitude_m),
        finite(orbit.time_to_periapsis_s),
    ) {
        let within = (altitude - periapsis).abs() < thresholds.periapsis_accuracy_m;
        if track.periapsis.step_level(within) {
            events.push(TelemetryEvent::PeriapsisReached {
                vessel: vessel.clone(),
                altitude: periapsis,
                time_to_periapsis,
            });
        }
    }

    if let Some(current) = finite(state.resource(&settings.fuel_resource)) {
        if track.low_fuel.step_level(current < thresholds.low_fuel) {
            events.push(TelemetryEvent::FuelLow {
                vessel: vessel.clone(),
                current,
                threshold: thresholds.low_fuel,
            });
        }
    }

    if let Some(current) = finite(state.resource(&settings.charge_resource)) {
        if track.low_charge.step_level(current < thresholds.low_charge) {
            events.push(TelemetryEvent::ChargeLow {
                vessel: vessel.clone(),
                current,
                threshold: thresholds.low_charge,
            });
        }
    }

    if let (Some(altitude), Some(speed), Some(body)) = (altitude, speed, state.body.as_ref()) {
        let contact = altitude <= settings.ground_contact_m;
        if track
            .impact
            .step(contact && speed > thresholds.impact_speed_mps, !contact)
        {
            events.push(TelemetryEvent::Impact {
                vessel: vessel.clone(),
                body: body.clone(),
                speed,
                position: state.position,
            });
        }
    }

    // A resource missing from this snapshot starts over on its next sighting.
    track
        .resources
        .retain(|resource, _| state.resources.contains_key(resource));
    for (resource, &current) in &state.resources {
        if !current.is_finite() {
            continue;
        }
        let previous = track.resources.insert(resource.clone(), current);
        if let Some(previous) = previous {
            if (current - previous).abs() > settings.resource_epsilon {
                events.push(TelemetryEvent::ResourceFlow {
                    vessel: vessel.clone(),
                    resource: resource.clone(),
                    previous,
                    current,
                });
            }
        }
    }
}

fn evaluate_collisions(
    state: &mut TrackerState,
    loaded: &[&VesselState],
    thresholds: &Thresholds,
    events: &mut Vec<TelemetryEvent>,
) {
    for (index, a) in loaded.iter().enumerate() {
        for b in &loaded[index + 1..] {
            let Some(key) = PairKey::new(a.id, b.id) else {
                continue;
            };
            let (Some(pa), Some(pb)) = (a.position, b.position) else {
                continue;
            };
            let distance = pa.distance(&pb);
            if !distance.is_finite() {
                continue;
            }

            let edge: &mut EdgeState = state.pairs.entry(key).or_default();
            if edge.step_level(distance < thresholds.collision_distance_m) {
                let (low, high) = if a.id < b.id { (a, b) } else { (b, a) };
                events.push(TelemetryEvent::CollisionWarning {
                    vessel: low.vessel_ref(),
                    other: high.vessel_ref(),
                    distance,
                });
            }
        }
    }
}

fn evaluate_throttle(
    state: &mut TrackerState,
    snapshot: &TickSnapshot,
    settings: &DetectorSettings,
    events: &mut Vec<TelemetryEvent>,
) {
    if snapshot.scene != Scene::Flight {
        return;
    }
    let (Some(active), Some(throttle)) = (snapshot.active_vessel, finite(snapshot.throttle)) else {
        return;
    };
    let Some(vessel) = snapshot.vessel(active).filter(|v| v.loaded) else {
        return;
    };

    let changed = match state.last_throttle {
        Some(last) => (throttle - last).abs() > settings.throttle_epsilon,
        None => true,
    };
    if changed {
        state.last_throttle = Some(throttle);
        events.push(TelemetryEvent::ThrottleChanged {
            vessel: vessel.vessel_ref(),
            throttle,
        });
    }
}
