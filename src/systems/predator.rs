use anyhow::Result;
use rand::Rng;
use tracing::{debug, info};

use crate::{
    agent::{Agent, AgentKind, Predator},
    engine::{System, SystemContext},
    population::Population,
    rng::{SimRngExt, SystemRng},
    scenario::{Envelope, PredatorPreySettings},
    systems::random_prey,
};

pub fn random_predator<R: Rng>(
    rng: &mut R,
    settings: &PredatorPreySettings,
    envelope: &Envelope,
) -> Agent {
    let position = rng.point_in(envelope);
    let speed = rng.real_in(settings.predator_speed.min, settings.predator_speed.max);
    Agent::Predator(Predator::new(position, speed))
}

/// Each predator chases the closest prey alive at the moment it moves.
/// A caught prey is removed and a replacement spawns at once, so later
/// predators in the same pass may target the newcomer.
pub struct PredatorSystem;

impl PredatorSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PredatorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PredatorSystem {
    fn name(&self) -> &str {
        "predator"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        population: &mut Population<'_>,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in population.ids_of_kind(AgentKind::Predator) {
            let prey: Vec<_> = population
                .ids_of_kind(AgentKind::Prey)
                .into_iter()
                .filter_map(|prey_id| population.get(prey_id).map(|agent| (prey_id, agent.position())))
                .collect();

            let Some(Agent::Predator(predator)) = population.get_mut(id) else {
                continue;
            };
            let Some((target, target_position)) = predator.nearest(prey) else {
                debug!(tick = ctx.tick, id = id.raw(), "no prey to chase");
                continue;
            };
            if !predator.pursue(&target_position) {
                continue;
            }

            info!(tick = ctx.tick, predator = id.raw(), prey = target.raw(), "prey captured");
            population.despawn(target);
            population.spawn(random_prey(rng, &ctx.settings.predator_prey, &ctx.settings.envelope));
        }
        Ok(())
    }
}
