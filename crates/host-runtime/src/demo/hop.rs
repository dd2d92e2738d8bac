//! Scripted vertical suborbital hop.
//!
//! One simulated second per tick: a full-throttle burn until the tank is dry,
//! a ballistic coast over apoapsis, a fall back to the pad and a few ticks at
//! rest. A launch clamp stays on the pad next to the vessel.

use shared_types::{BodyInfo, OrbitState, TickSnapshot, Vec3, VesselState};

const GRAVITY: f64 = 9.81;
const THRUST_ACCEL: f64 = 31.81;
const FUEL_START: f64 = 480.0;
const FUEL_BURN: f64 = 8.0;
const CHARGE_START: f64 = 20.0;
const CHARGE_DRAIN: f64 = 0.05;
const SETTLE_TICKS: u32 = 5;

pub const HOPPER_ID: u64 = 1;
pub const CLAMP_ID: u64 = 2;

pub fn kerbin() -> BodyInfo {
    BodyInfo {
        name: "Kerbin".to_string(),
        radius_m: 600_000.0,
        has_atmosphere: true,
    }
}

/// Snapshot source for the demo flight.
#[derive(Debug, Clone)]
pub struct SuborbitalHop {
    tick: u64,
    altitude: f64,
    velocity: f64,
    apex: f64,
    fuel: f64,
    charge: f64,
    /// Ticks spent on the ground since touchdown.
    landed: Option<u32>,
    body: BodyInfo,
}

impl Default for SuborbitalHop {
    fn default() -> Self {
        Self::new()
    }
}

impl SuborbitalHop {
    pub fn new() -> Self {
        Self {
            tick: 0,
            altitude: 0.0,
            velocity: 0.0,
            apex: 0.0,
            fuel: FUEL_START,
            charge: CHARGE_START,
            landed: None,
            body: kerbin(),
        }
    }

    fn in_flight(&self) -> bool {
        self.tick > 0 && self.landed.is_none()
    }

    fn orbit(&self) -> OrbitState {
        let climbing = self.velocity > 0.0;
        let coasting = self.fuel <= 0.0;

        let apoapsis = if climbing {
            self.altitude + self.velocity * self.velocity / (2.0 * GRAVITY)
        } else {
            self.apex
        };
        let time_to_surface = (self.velocity
            + (self.velocity * self.velocity + 2.0 * GRAVITY * self.altitude).sqrt())
            / GRAVITY;

        OrbitState {
            apoapsis_altitude_m: Some(apoapsis),
            // A vertical trajectory passes through the body's centre.
            periapsis_altitude_m: Some(-self.body.radius_m),
            time_to_apoapsis_s: climbing.then(|| self.velocity / GRAVITY),
            time_to_periapsis_s: coasting.then_some(time_to_surface),
        }
    }

    fn snapshot(&self) -> TickSnapshot {
        let throttle = if self.fuel > 0.0 && self.landed.is_none() {
            1.0
        } else {
            0.0
        };

        let mut hopper = VesselState::new(HOPPER_ID, "Hopper")
            .with_body(self.body.clone())
            .with_altitude(self.altitude)
            .with_speed(self.velocity.abs())
            .with_resource("LiquidFuel", self.fuel)
            .with_resource("ElectricCharge", self.charge)
            .with_position(Vec3::new(0.0, 0.0, self.body.radius_m + self.altitude));
        if self.in_flight() {
            hopper = hopper.with_orbit(self.orbit());
        }

        let clamp = VesselState::new(CLAMP_ID, "Launch Clamp")
            .with_body(self.body.clone())
            .with_altitude(0.0)
            .with_speed(0.0)
            .with_position(Vec3::new(25.0, 0.0, self.body.radius_m));

        TickSnapshot::new(self.tick)
            .with_vessel(hopper)
            .with_vessel(clamp)
            .with_active(HOPPER_ID, throttle)
    }

    fn advance(&mut self) {
        self.tick += 1;

        if let Some(resting) = self.landed.as_mut() {
            *resting += 1;
            self.velocity = 0.0;
            return;
        }

        let thrusting = self.fuel > 0.0;
        let accel = if thrusting {
            THRUST_ACCEL - GRAVITY
        } else {
            -GRAVITY
        };
        self.velocity += accel;
        self.altitude += self.velocity;
        if thrusting {
            self.fuel = (self.fuel - FUEL_BURN).max(0.0);
        }
        self.charge = (self.charge - CHARGE_DRAIN).max(0.0);
        self.apex = self.apex.max(self.altitude);

        if self.altitude <= 0.0 {
            // Touchdown keeps its velocity for one snapshot so the impact is seen.
            self.altitude = 0.0;
            self.landed = Some(0);
        }
    }
}

impl Iterator for SuborbitalHop {
    type Item = TickSnapshot;

    fn next(&mut self) -> Option<TickSnapshot> {
        if self.landed.is_some_and(|resting| resting >= SETTLE_TICKS) {
            return None;
        }
        let snapshot = self.snapshot();
        self.advance();
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::VesselId;

    #[test]
    fn test_hop_lands_and_ends() {
        let ticks: Vec<TickSnapshot> = SuborbitalHop::new().collect();
        assert!(ticks.len() > 300 && ticks.len() < 420);

        let last = ticks.last().unwrap().vessel(VesselId(HOPPER_ID)).unwrap();
        assert_eq!(last.altitude_m, Some(0.0));
        assert_eq!(last.surface_speed_mps, Some(0.0));
    }

    #[test]
    fn test_hop_burns_then_coasts() {
        let ticks: Vec<TickSnapshot> = SuborbitalHop::new().collect();
        assert_eq!(ticks[0].throttle, Some(1.0));
        assert!(ticks[0].vessel(VesselId(HOPPER_ID)).unwrap().orbit.is_none());

        let dry = ticks
            .iter()
            .position(|t| t.throttle == Some(0.0))
            .unwrap();
        assert_eq!(dry, 60);
        let apex = ticks
            .iter()
            .filter_map(|t| t.vessel(VesselId(HOPPER_ID)).and_then(|v| v.altitude_m))
            .fold(0.0_f64, f64::max);
        assert!(apex > 100_000.0);
    }

    #[test]
    fn test_touchdown_tick_reports_impact_speed() {
        let touchdown = SuborbitalHop::new()
            .skip(1)
            .find(|t| t.vessel(VesselId(HOPPER_ID)).unwrap().altitude_m == Some(0.0))
            .unwrap();
        let hopper = touchdown.vessel(VesselId(HOPPER_ID)).unwrap();
        assert!(hopper.surface_speed_mps.unwrap() > 1000.0);
        assert_eq!(touchdown.throttle, Some(0.0));
    }
}
