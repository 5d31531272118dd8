use anyhow::Result;
use tracing::debug;

use crate::{
    agent::{Agent, AgentKind},
    engine::{System, SystemContext},
    population::Population,
    rng::SystemRng,
};

pub struct BalloonDriftSystem;

impl BalloonDriftSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BalloonDriftSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BalloonDriftSystem {
    fn name(&self) -> &str {
        "balloon_drift"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        population: &mut Population<'_>,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in population.ids_of_kind(AgentKind::Balloon) {
            if let Some(Agent::Balloon(balloon)) = population.get_mut(id) {
                // A miss only pins this balloon for the tick.
                if let Err(err) = balloon.step(ctx.wind) {
                    debug!(tick = ctx.tick, id = id.raw(), %err, "balloon held in place");
                }
            }
        }
        Ok(())
    }
}
