pub mod agent;
pub mod engine;
pub mod geo;
pub mod population;
pub mod rng;
pub mod scenario;
pub mod systems;
pub mod wind;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::{ObjectStore, World};
