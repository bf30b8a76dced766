//! Ground truth oracle for simulation.
//!
//! The Oracle maintains the true state of the simulated airspace:
//! - True positions of all aircraft, in metres east/north/up of the observer
//! - Constant-velocity kinematics
//! - Report generation (noise, partial reports, radio silence)

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use skytrack_core::geo::{self, ObserverPose};
use skytrack_core::Report;
use std::collections::BTreeMap;

/// Metres per second to knots.
const MPS_TO_KNOTS: f64 = 1.943_844;

/// A ground truth aircraft in the simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimAircraft {
    /// Transponder-style identifier
    pub id: String,

    /// Callsign
    pub label: String,

    /// Position [east, north, up] in metres from the observer
    pub position: Vector3<f64>,

    /// Velocity [east, north, up] in m/s
    pub velocity: Vector3<f64>,

    /// Aircraft is still in the simulation
    pub active: bool,

    /// Time of the next scheduled report (seconds)
    next_report_at: f64,

    /// Reports are suppressed while `silent_from <= t < silent_until`
    silence: Option<(f64, f64)>,
}

impl SimAircraft {
    /// Heading in degrees clockwise from north.
    pub fn heading(&self) -> f64 {
        self.velocity.x.atan2(self.velocity.y).to_degrees().rem_euclid(360.0)
    }

    /// Horizontal ground speed in knots.
    pub fn speed_knots(&self) -> f64 {
        self.velocity.xy().norm() * MPS_TO_KNOTS
    }

    pub fn is_silent_at(&self, time: f64) -> bool {
        self.silence
            .map(|(from, until)| time >= from && time < until)
            .unwrap_or(false)
    }
}

/// The Oracle - maintains ground truth and generates reports.
pub struct Oracle {
    /// Observer the local frame is anchored on
    observer: ObserverPose,

    /// RNG for noise, spawning and partial reports
    rng: ChaCha8Rng,

    /// All aircraft, ordered by id so iteration is deterministic
    aircraft: BTreeMap<String, SimAircraft>,

    /// Next aircraft number
    next_id: u32,

    /// Current simulation time (seconds)
    current_time: f64,

    /// Horizontal position noise standard deviation (metres)
    position_noise_std: f64,

    /// Probability that a report carries no position
    partial_probability: f64,

    /// Seconds between reports of one aircraft (0 = every step)
    report_interval: f64,
}

impl Oracle {
    /// Creates a new Oracle with the given physics seed.
    pub fn new(physics_seed: u64, observer: ObserverPose) -> Self {
        Self {
            observer,
            rng: ChaCha8Rng::seed_from_u64(physics_seed),
            aircraft: BTreeMap::new(),
            next_id: 0,
            current_time: 0.0,
            position_noise_std: 15.0,
            partial_probability: 0.0,
            report_interval: 1.0,
        }
    }

    pub fn observer(&self) -> &ObserverPose {
        &self.observer
    }

    /// Sets the horizontal position noise standard deviation in metres.
    pub fn set_position_noise(&mut self, std_dev: f64) {
        self.position_noise_std = std_dev.max(0.0);
    }

    /// Sets the chance that a report is emitted without coordinates.
    pub fn set_partial_probability(&mut self, probability: f64) {
        self.partial_probability = probability.clamp(0.0, 1.0);
    }

    /// Sets the per-aircraft report interval in seconds.
    pub fn set_report_interval(&mut self, secs: f64) {
        self.report_interval = secs.max(0.0);
    }

    pub fn report_interval(&self) -> f64 {
        self.report_interval
    }

    pub fn position_noise(&self) -> f64 {
        self.position_noise_std
    }

    /// Spawns an aircraft and returns its id.
    pub fn spawn_aircraft(&mut self, position: Vector3<f64>, velocity: Vector3<f64>) -> String {
        let n = self.next_id;
        self.next_id += 1;

        let id = format!("{:06x}", 0x48_4000 + n);
        // Stagger first reports so aircraft do not all talk on the same tick
        let phase = self.rng.gen_range(0.0..=self.report_interval);
        let aircraft = SimAircraft {
            id: id.clone(),
            label: format!("SIM{:04}", n),
            position,
            velocity,
            active: true,
            next_report_at: self.current_time + phase,
            silence: None,
        };
        self.aircraft.insert(id.clone(), aircraft);

        id
    }

    /// Spawns `count` aircraft at random positions within `radius_m`,
    /// cruising between FL100 and FL380 at airliner speeds.
    pub fn spawn_random(&mut self, count: usize, radius_m: f64) -> Vec<String> {
        (0..count)
            .map(|_| {
                let bearing = self.rng.gen_range(0.0..std::f64::consts::TAU);
                let range = radius_m * self.rng.gen::<f64>().sqrt();
                let altitude = self.rng.gen_range(3_000.0..11_500.0);
                let course = self.rng.gen_range(0.0..std::f64::consts::TAU);
                let speed = self.rng.gen_range(110.0..250.0);

                let position = Vector3::new(
                    range * bearing.sin(),
                    range * bearing.cos(),
                    altitude - self.observer.altitude_m,
                );
                let velocity = Vector3::new(speed * course.sin(), speed * course.cos(), 0.0);
                self.spawn_aircraft(position, velocity)
            })
            .collect()
    }

    /// Suppresses reports from `id` during `[from, until)` seconds.
    pub fn silence(&mut self, id: &str, from: f64, until: f64) {
        if let Some(aircraft) = self.aircraft.get_mut(id) {
            aircraft.silence = Some((from, until));
        }
    }

    /// Removes an aircraft from the simulation.
    pub fn remove_aircraft(&mut self, id: &str) {
        if let Some(aircraft) = self.aircraft.get_mut(id) {
            aircraft.active = false;
        }
    }

    /// Advances physics by dt seconds.
    pub fn step(&mut self, dt: f64) {
        self.current_time += dt;

        for aircraft in self.aircraft.values_mut() {
            if aircraft.active {
                aircraft.position += aircraft.velocity * dt;
            }
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.current_time
    }

    /// Returns all active aircraft.
    pub fn active_aircraft(&self) -> Vec<&SimAircraft> {
        self.aircraft.values().filter(|a| a.active).collect()
    }

    /// Returns a specific aircraft by id.
    pub fn aircraft(&self, id: &str) -> Option<&SimAircraft> {
        self.aircraft.get(id)
    }

    /// Fastest horizontal speed among active aircraft (m/s).
    pub fn max_speed(&self) -> f64 {
        self.active_aircraft()
            .iter()
            .map(|a| a.velocity.xy().norm())
            .fold(0.0, f64::max)
    }

    /// Reports due at the current time.
    ///
    /// Silent aircraft skip their slot; a partial report keeps id, label and
    /// signal but drops every coordinate.
    pub fn generate_reports(&mut self) -> Vec<Report> {
        let now = self.current_time;
        let due: Vec<String> = self
            .aircraft
            .values()
            .filter(|a| a.active && a.next_report_at <= now)
            .map(|a| a.id.clone())
            .collect();

        let mut reports = Vec::with_capacity(due.len());
        for id in due {
            let report = self.report_for(&id, now);
            if let Some(aircraft) = self.aircraft.get_mut(&id) {
                aircraft.next_report_at = now + self.report_interval;
            }
            reports.extend(report);
        }
        reports
    }

    fn report_for(&mut self, id: &str, now: f64) -> Option<Report> {
        let aircraft = self.aircraft.get(id)?;
        if aircraft.is_silent_at(now) {
            return None;
        }

        let signal = -20.0 - aircraft.position.norm() / 10_000.0;
        let base = Report::new(id)
            .with_label(aircraft.label.clone())
            .with_signal(signal)
            .with_receiver("sim");

        let partial = self.partial_probability > 0.0 && self.rng.gen_bool(self.partial_probability);
        if partial {
            return Some(base);
        }

        let heading = aircraft.heading();
        let speed = aircraft.speed_knots();
        let position = aircraft.position;
        let (noise_east, noise_north) = self.sample_noise();

        let (lat, lon) =
            geo::offset_to_lat_lon(&self.observer, position.x + noise_east, position.y + noise_north);
        // Barometric altitude arrives in 25 ft steps
        let alt_feet = (geo::meters_to_feet(position.z + self.observer.altitude_m) / 25.0).round() * 25.0;

        Some(
            base.with_position(lat, lon, alt_feet)
                .with_heading(heading)
                .with_speed(speed),
        )
    }

    fn sample_noise(&mut self) -> (f64, f64) {
        match Normal::new(0.0, self.position_noise_std) {
            Ok(normal) if self.position_noise_std > 0.0 => {
                (normal.sample(&mut self.rng), normal.sample(&mut self.rng))
            }
            _ => (0.0, 0.0),
        }
    }

    /// Returns ground truth offsets for error calculation.
    pub fn ground_truth_positions(&self) -> Vec<(String, Vector3<f64>)> {
        self.aircraft
            .values()
            .filter(|a| a.active)
            .map(|a| (a.id.clone(), a.position))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn observer() -> ObserverPose {
        ObserverPose::new(52.2387, 6.8564, 50.0)
    }

    #[test]
    fn test_oracle_spawn_aircraft() {
        let mut oracle = Oracle::new(42, observer());

        let id = oracle.spawn_aircraft(
            Vector3::new(1_000.0, 2_000.0, 9_000.0),
            Vector3::new(200.0, 0.0, 0.0),
        );

        let aircraft = oracle.aircraft(&id).unwrap();
        assert_eq!(aircraft.position.x, 1_000.0);
        assert_eq!(aircraft.label, "SIM0000");
        assert_relative_eq!(aircraft.heading(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_oracle_physics_step() {
        let mut oracle = Oracle::new(42, observer());

        let id = oracle.spawn_aircraft(
            Vector3::new(0.0, 0.0, 9_000.0),
            Vector3::new(0.0, 200.0, 0.0), // 200 m/s due north
        );

        oracle.step(1.0);

        let aircraft = oracle.aircraft(&id).unwrap();
        assert!((aircraft.position.y - 200.0).abs() < 0.001);
    }

    #[test]
    fn test_noise_free_report_projects_back_to_truth() {
        let mut oracle = Oracle::new(7, observer());
        oracle.set_position_noise(0.0);
        oracle.set_report_interval(0.0);
        let id = oracle.spawn_aircraft(
            Vector3::new(-12_000.0, 30_000.0, 8_000.0),
            Vector3::zeros(),
        );

        let reports = oracle.generate_reports();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.id, id);

        let (lat, lon, alt) = report.coordinates().unwrap();
        let offset = geo::project(&observer(), lat, lon, alt);
        assert_relative_eq!(offset.east_m, -12_000.0, epsilon = 1e-6);
        assert_relative_eq!(offset.north_m, 30_000.0, epsilon = 1e-6);
        // 25 ft quantisation
        assert!((offset.up_m - 8_000.0).abs() < 4.0);
    }

    #[test]
    fn test_report_interval_and_silence() {
        let mut oracle = Oracle::new(3, observer());
        oracle.set_report_interval(1.0);
        let id = oracle.spawn_aircraft(Vector3::new(0.0, 5_000.0, 9_000.0), Vector3::zeros());
        oracle.silence(&id, 2.0, 4.0);

        let mut heard = Vec::new();
        for _ in 0..60 {
            oracle.step(0.1);
            if !oracle.generate_reports().is_empty() {
                heard.push(oracle.time());
            }
        }

        assert!(!heard.is_empty());
        assert!(heard.iter().all(|t| !(2.0..4.0).contains(t)));
        for pair in heard.windows(2) {
            assert!(pair[1] - pair[0] >= 1.0 - 1e-9);
        }
    }

    #[test]
    fn test_partial_reports_have_no_position() {
        let mut oracle = Oracle::new(11, observer());
        oracle.set_partial_probability(1.0);
        oracle.set_report_interval(0.0);
        oracle.spawn_random(5, 50_000.0);

        let reports = oracle.generate_reports();
        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(|r| !r.is_complete() && r.has_valid_id()));
    }

    #[test]
    fn test_oracle_deterministic() {
        let mut oracle1 = Oracle::new(42, observer());
        let mut oracle2 = Oracle::new(42, observer());
        oracle1.set_report_interval(0.0);
        oracle2.set_report_interval(0.0);

        oracle1.spawn_random(3, 80_000.0);
        oracle2.spawn_random(3, 80_000.0);

        // Same seed = same traffic and same noise
        assert_eq!(oracle1.generate_reports(), oracle2.generate_reports());
    }
}
