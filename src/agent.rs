//! Map agents and their per-tick kinematics.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::rng::SimRngExt;
use crate::scenario::Envelope;
use crate::wind::{WindError, WindField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Balloon,
    Dirigible,
    Predator,
    Prey,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [
        AgentKind::Balloon,
        AgentKind::Dirigible,
        AgentKind::Predator,
        AgentKind::Prey,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AgentKind::Balloon => "balloon",
            AgentKind::Dirigible => "dirigible",
            AgentKind::Predator => "predator",
            AgentKind::Prey => "prey",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Free balloon carried by the wind for a fixed number of ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balloon {
    pub position: Coordinate,
    remaining_steps: u32,
}

impl Balloon {
    pub fn new(position: Coordinate, remaining_steps: u32) -> Self {
        Self {
            position,
            remaining_steps,
        }
    }

    pub fn remaining_steps(&self) -> u32 {
        self.remaining_steps
    }

    /// Ages the balloon by one tick and drifts it by the wind at its cell.
    /// On a wind miss the balloon still ages but stays where it is.
    pub fn step(&mut self, wind: &WindField) -> Result<(), WindError> {
        self.remaining_steps = self.remaining_steps.saturating_sub(1);
        let vector = wind.lookup(&self.position)?;
        self.position.translate(vector.u, vector.v);
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.remaining_steps == 0
    }
}

/// Powered airship flying point to point at constant speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dirigible {
    pub position: Coordinate,
    destination: Coordinate,
    speed: f64,
}

impl Dirigible {
    pub fn new(position: Coordinate, destination: Coordinate, speed: f64) -> Self {
        Self {
            position,
            destination,
            speed,
        }
    }

    pub fn destination(&self) -> Coordinate {
        self.destination
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn step(&mut self) {
        self.position.step_toward(&self.destination, self.speed);
    }

    /// True once another tick would reach or pass the destination.
    pub fn is_terminal(&self) -> bool {
        self.position.distance(&self.destination) < self.speed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prey {
    pub position: Coordinate,
    speed: f64,
    destination: Option<Coordinate>,
}

impl Prey {
    pub fn new(position: Coordinate, speed: f64) -> Self {
        Self {
            position,
            speed,
            destination: None,
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    /// Wanders between random waypoints inside `envelope`. A new waypoint is
    /// drawn when there is none or the current one is within one step.
    pub fn step<R: Rng>(&mut self, rng: &mut R, envelope: &Envelope) {
        let destination = match self.destination {
            Some(point) if self.position.distance(&point) >= self.speed => point,
            _ => {
                let point = rng.point_in(envelope);
                self.destination = Some(point);
                point
            }
        };
        self.position.step_toward(&destination, self.speed);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predator {
    pub position: Coordinate,
    speed: f64,
}

impl Predator {
    pub fn new(position: Coordinate, speed: f64) -> Self {
        Self { position, speed }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Picks the closest candidate. On equal distance the earliest candidate
    /// in iteration order wins.
    pub fn nearest<K: Copy>(
        &self,
        candidates: impl IntoIterator<Item = (K, Coordinate)>,
    ) -> Option<(K, Coordinate)> {
        let mut best: Option<(K, Coordinate, f64)> = None;
        for (key, position) in candidates {
            let distance = self.position.distance(&position);
            match best {
                Some((_, _, best_distance)) if distance >= best_distance => {}
                _ => best = Some((key, position, distance)),
            }
        }
        best.map(|(key, position, _)| (key, position))
    }

    /// Steps toward `target` and reports whether it is now within capture range.
    pub fn pursue(&mut self, target: &Coordinate) -> bool {
        self.position.step_toward(target, self.speed);
        self.position.distance(target) < self.speed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Agent {
    Balloon(Balloon),
    Dirigible(Dirigible),
    Predator(Predator),
    Prey(Prey),
}

impl Agent {
    pub fn kind(&self) -> AgentKind {
        match self {
            Agent::Balloon(_) => AgentKind::Balloon,
            Agent::Dirigible(_) => AgentKind::Dirigible,
            Agent::Predator(_) => AgentKind::Predator,
            Agent::Prey(_) => AgentKind::Prey,
        }
    }

    pub fn position(&self) -> Coordinate {
        match self {
            Agent::Balloon(balloon) => balloon.position,
            Agent::Dirigible(dirigible) => dirigible.position,
            Agent::Predator(predator) => predator.position,
            Agent::Prey(prey) => prey.position,
        }
    }

    /// Whether the population sweep should remove this agent. Predators and
    /// prey never expire on their own; prey leave only when captured.
    pub fn is_terminal(&self) -> bool {
        match self {
            Agent::Balloon(balloon) => balloon.is_terminal(),
            Agent::Dirigible(dirigible) => dirigible.is_terminal(),
            Agent::Predator(_) | Agent::Prey(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::geo::project;
    use crate::wind::{LongitudePolicy, WindRecord};

    #[test]
    fn balloon_expires_after_its_steps() {
        let field = WindField::default();
        let mut balloon = Balloon::new(Coordinate::default(), 2);
        let _ = balloon.step(&field);
        assert!(!balloon.is_terminal());
        let _ = balloon.step(&field);
        assert!(balloon.is_terminal());
        let _ = balloon.step(&field);
        assert_eq!(balloon.remaining_steps(), 0);
    }

    #[test]
    fn balloon_drifts_by_scaled_wind() {
        let start = project(10.0, 20.0);
        let field = WindField::build(
            [WindRecord {
                u: 1.0,
                v: -2.0,
                lat: 10.0,
                lon: 20.0,
            }],
            LongitudePolicy::default(),
        );
        let mut balloon = Balloon::new(start, 5);
        balloon.step(&field).unwrap();
        assert_eq!(balloon.position, Coordinate::new(start.x + 100.0, start.y - 200.0));
        assert_eq!(balloon.remaining_steps(), 4);
    }

    #[test]
    fn balloon_without_wind_stays_put() {
        let mut balloon = Balloon::new(Coordinate::new(5.0, 5.0), 3);
        assert!(balloon.step(&WindField::default()).is_err());
        assert_eq!(balloon.position, Coordinate::new(5.0, 5.0));
    }

    #[test]
    fn dirigible_reaches_destination_without_overshoot() {
        let mut dirigible =
            Dirigible::new(Coordinate::new(0.0, 0.0), Coordinate::new(100.0, 0.0), 30.0);
        dirigible.step();
        assert_eq!(dirigible.position, Coordinate::new(30.0, 0.0));
        dirigible.step();
        dirigible.step();
        assert!(dirigible.is_terminal());
        dirigible.step();
        assert_eq!(dirigible.position, Coordinate::new(100.0, 0.0));
        dirigible.step();
        assert_eq!(dirigible.position, Coordinate::new(100.0, 0.0));
    }

    #[test]
    fn dirigible_far_from_destination_is_live() {
        let dirigible =
            Dirigible::new(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 30.0), 30.0);
        assert!(!Agent::Dirigible(dirigible).is_terminal());
    }

    #[test]
    fn prey_picks_new_waypoint_when_close() {
        let envelope = Envelope {
            min_x: 0.0,
            max_x: 1_000.0,
            min_y: 0.0,
            max_y: 1_000.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut prey = Prey::new(Coordinate::new(500.0, 500.0), 10.0);
        prey.step(&mut rng, &envelope);
        let first = prey.destination().unwrap();
        assert!(envelope.contains(&first));

        prey.position = first;
        prey.step(&mut rng, &envelope);
        assert_ne!(prey.destination(), Some(first));
    }

    #[test]
    fn nearest_prefers_earliest_on_ties() {
        let predator = Predator::new(Coordinate::new(0.0, 0.0), 1.0);
        let candidates = vec![
            (1_u64, Coordinate::new(5.0, 0.0)),
            (2, Coordinate::new(0.0, -5.0)),
            (3, Coordinate::new(9.0, 0.0)),
        ];
        assert_eq!(predator.nearest(candidates).map(|(id, _)| id), Some(1));
        assert_eq!(predator.nearest(Vec::<(u64, Coordinate)>::new()), None);
    }

    #[test]
    fn pursuit_captures_within_speed() {
        let mut predator = Predator::new(Coordinate::new(0.0, 0.0), 10.0);
        assert!(predator.pursue(&Coordinate::new(6.0, 3.0)));
        assert_eq!(predator.position, Coordinate::new(6.0, 3.0));

        let mut chaser = Predator::new(Coordinate::new(0.0, 0.0), 10.0);
        assert!(!chaser.pursue(&Coordinate::new(50.0, 0.0)));
        assert_eq!(chaser.position, Coordinate::new(10.0, 0.0));
    }

    #[test]
    fn capture_is_judged_after_the_step() {
        let mut predator = Predator::new(Coordinate::new(0.0, 0.0), 10.0);
        assert!(predator.pursue(&Coordinate::new(15.0, 0.0)));
        assert_eq!(predator.position, Coordinate::new(10.0, 0.0));
    }
}
