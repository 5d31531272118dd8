use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    population::{Population, PopulationCounters, PopulationEvent},
    rng::{RngManager, SystemRng},
    scenario::{
        BalloonSettings, City, DirigibleSettings, Envelope, PredatorPreySettings, Scenario,
        SimulationMode,
    },
    systems::{
        random_predator, random_prey, BalloonDriftSystem, DirigibleSystem,
        PopulationControlSystem, PredatorSystem, PreySystem,
    },
    wind::WindField,
    world::ObjectStore,
};

const INITIALIZE_STREAM: &str = "initialize";

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: Option<u64>,
    pub mode: SimulationMode,
    pub tick_interval_ms: u64,
    pub envelope: Envelope,
    pub balloons: BalloonSettings,
    pub dirigibles: DirigibleSettings,
    pub cities: Vec<City>,
    pub predator_prey: PredatorPreySettings,
}

impl EngineSettings {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            mode: scenario.mode,
            tick_interval_ms: scenario.tick_interval_ms,
            envelope: scenario.envelope,
            balloons: scenario.balloons.clone(),
            dirigibles: scenario.dirigibles.clone(),
            cities: scenario.cities.clone(),
            predator_prey: scenario.predator_prey.clone(),
        }
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    wind: WindField,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            wind: WindField::default(),
            systems: Vec::new(),
        }
    }

    pub fn with_wind(mut self, wind: WindField) -> Self {
        self.wind = wind;
        self
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Installs the tick order for the configured mode: balloons, dirigibles,
    /// then population control; or prey then predators.
    pub fn with_standard_systems(self) -> Self {
        match self.settings.mode {
            SimulationMode::Airships => self
                .with_system(BalloonDriftSystem::new())
                .with_system(DirigibleSystem::new())
                .with_system(PopulationControlSystem::new()),
            SimulationMode::PredatorPrey => self
                .with_system(PreySystem::new())
                .with_system(PredatorSystem::new()),
        }
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
            wind: self.wind,
            counters: PopulationCounters::default(),
            tick: 0,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
    wind: WindField,
    counters: PopulationCounters,
    tick: u64,
}

impl Engine {
    /// Takes over `world`: counts what it already holds and seeds the
    /// starting predator/prey population when that mode is active.
    pub fn initialize(&mut self, world: &mut dyn ObjectStore) -> Result<()> {
        self.counters = PopulationCounters::from_store(world);
        if self.settings.mode == SimulationMode::PredatorPrey {
            let settings = &self.settings.predator_prey;
            let envelope = &self.settings.envelope;
            let mut rng = self.rng.stream(INITIALIZE_STREAM);
            let mut population = Population::new(world, &mut self.counters);
            for _ in 0..settings.prey {
                population.spawn(random_prey(&mut rng, settings, envelope));
            }
            for _ in 0..settings.predators {
                population.spawn(random_predator(&mut rng, settings, envelope));
            }
        }
        info!(
            scenario = %self.settings.scenario_name,
            mode = ?self.settings.mode,
            wind_cells = self.wind.len(),
            "engine initialized"
        );
        Ok(())
    }

    /// Advances one logical step. `elapsed_ms` is recorded but does not
    /// scale movement.
    pub fn update(&mut self, world: &mut dyn ObjectStore, elapsed_ms: u64) -> Result<TickSummary> {
        self.tick += 1;
        let tick = self.tick;
        let mut population = Population::new(world, &mut self.counters);
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick,
                elapsed_ms,
                settings: &self.settings,
                wind: &self.wind,
            };
            system.run(&ctx, &mut population, &mut rng_stream)?;
        }
        let (spawned, despawned) = population.into_events();
        self.counters.reconcile(world);
        debug!(tick, spawned = spawned.len(), despawned = despawned.len(), "tick complete");

        Ok(TickSummary {
            tick,
            elapsed_ms,
            spawned,
            despawned,
            census: self.counters.clone(),
        })
    }

    pub fn run(&mut self, world: &mut dyn ObjectStore, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut dyn ObjectStore, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TickSummary),
    {
        let interval = self.settings.tick_interval_ms;
        for _ in 0..ticks {
            let summary = self.update(world, interval)?;
            hook(&summary);
        }
        Ok(())
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn counters(&self) -> &PopulationCounters {
        &self.counters
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub elapsed_ms: u64,
    pub spawned: Vec<PopulationEvent>,
    pub despawned: Vec<PopulationEvent>,
    pub census: PopulationCounters,
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub elapsed_ms: u64,
    pub settings: &'a EngineSettings,
    pub wind: &'a WindField,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        population: &mut Population<'_>,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
