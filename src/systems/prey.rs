use anyhow::Result;
use rand::Rng;

use crate::{
    agent::{Agent, AgentKind, Prey},
    engine::{System, SystemContext},
    population::Population,
    rng::{SimRngExt, SystemRng},
    scenario::{Envelope, PredatorPreySettings},
};

/// A prey at a random point in `envelope` with a speed from the configured range.
pub fn random_prey<R: Rng>(rng: &mut R, settings: &PredatorPreySettings, envelope: &Envelope) -> Agent {
    let position = rng.point_in(envelope);
    let speed = rng.real_in(settings.prey_speed.min, settings.prey_speed.max);
    Agent::Prey(Prey::new(position, speed))
}

pub struct PreySystem;

impl PreySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PreySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PreySystem {
    fn name(&self) -> &str {
        "prey"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        population: &mut Population<'_>,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let envelope = &ctx.settings.envelope;
        for id in population.ids_of_kind(AgentKind::Prey) {
            if let Some(Agent::Prey(prey)) = population.get_mut(id) {
                prey.step(rng, envelope);
            }
        }
        Ok(())
    }
}
