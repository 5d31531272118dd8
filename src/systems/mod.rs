mod balloon;
mod dirigible;
mod population;
mod predator;
mod prey;

pub use balloon::BalloonDriftSystem;
pub use dirigible::DirigibleSystem;
pub use population::PopulationControlSystem;
pub use predator::{random_predator, PredatorSystem};
pub use prey::{random_prey, PreySystem};
