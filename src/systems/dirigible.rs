use anyhow::Result;

use crate::{
    agent::{Agent, AgentKind},
    engine::{System, SystemContext},
    population::Population,
    rng::SystemRng,
};

pub struct DirigibleSystem;

impl DirigibleSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DirigibleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DirigibleSystem {
    fn name(&self) -> &str {
        "dirigible"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        population: &mut Population<'_>,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for id in population.ids_of_kind(AgentKind::Dirigible) {
            if let Some(Agent::Dirigible(dirigible)) = population.get_mut(id) {
                dirigible.step();
            }
        }
        Ok(())
    }
}
