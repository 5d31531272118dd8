use anyhow::Result;
use tracing::debug;

use crate::{
    agent::{Agent, AgentKind, Balloon, Dirigible},
    engine::{System, SystemContext},
    population::Population,
    rng::{SimRngExt, SystemRng},
    world::EntityId,
};

/// Per-tick population policy for the airship scenario.
///
/// Exactly one action runs per tick, checked in order: spawn a balloon,
/// spawn a dirigible, or sweep out every agent whose run is over. A tick
/// that spawns never also despawns.
pub struct PopulationControlSystem;

impl PopulationControlSystem {
    pub fn new() -> Self {
        Self
    }

    fn spawn_balloon(
        ctx: &SystemContext,
        population: &mut Population<'_>,
        rng: &mut SystemRng<'_>,
    ) {
        let settings = &ctx.settings.balloons;
        let position = rng.point_in(&ctx.settings.envelope);
        let steps = rng.int_in(settings.min_steps, settings.max_steps);
        population.spawn(Agent::Balloon(Balloon::new(position, steps)));
    }

    fn spawn_dirigible(
        ctx: &SystemContext,
        population: &mut Population<'_>,
        rng: &mut SystemRng<'_>,
    ) -> bool {
        let cities = &ctx.settings.cities;
        let Some((from, to)) = rng.pick_two_distinct(cities.len()) else {
            debug!(tick = ctx.tick, cities = cities.len(), "not enough cities for a dirigible route");
            return false;
        };
        let settings = &ctx.settings.dirigibles;
        let speed = rng.real_in(settings.min_speed, settings.max_speed);
        debug!(tick = ctx.tick, from = %cities[from].name, to = %cities[to].name, "dirigible route");
        population.spawn(Agent::Dirigible(Dirigible::new(
            cities[from].position(),
            cities[to].position(),
            speed,
        )));
        true
    }

    /// Collects first, removes second.
    fn sweep(population: &mut Population<'_>) -> usize {
        let expired: Vec<EntityId> = AgentKind::ALL
            .into_iter()
            .flat_map(|kind| population.ids_of_kind(kind))
            .filter(|id| population.get(*id).is_some_and(Agent::is_terminal))
            .collect();
        for id in &expired {
            population.despawn(*id);
        }
        expired.len()
    }
}

impl Default for PopulationControlSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for PopulationControlSystem {
    fn name(&self) -> &str {
        "population"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        population: &mut Population<'_>,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let balloons = &ctx.settings.balloons;
        let dirigibles = &ctx.settings.dirigibles;

        if rng.chance(balloons.spawn_probability)
            && population.count(AgentKind::Balloon) < balloons.cap
        {
            Self::spawn_balloon(ctx, population, rng);
            return Ok(());
        }
        if rng.chance(dirigibles.spawn_probability)
            && population.count(AgentKind::Dirigible) < dirigibles.cap
            && Self::spawn_dirigible(ctx, population, rng)
        {
            return Ok(());
        }

        let removed = Self::sweep(population);
        if removed > 0 {
            debug!(tick = ctx.tick, removed, "expired agents swept");
        }
        Ok(())
    }
}
