//! Live-agent counters and the spawn/despawn path that keeps them honest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::agent::{Agent, AgentKind};
use crate::world::{EntityId, ObjectStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} counter is {counted} but the world holds {actual}")]
pub struct PopulationError {
    pub kind: AgentKind,
    pub counted: usize,
    pub actual: usize,
}

/// One counter per agent kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopulationCounters {
    counts: BTreeMap<AgentKind, usize>,
}

impl PopulationCounters {
    /// Counts what the store already holds.
    pub fn from_store(store: &dyn ObjectStore) -> Self {
        let mut counters = Self::default();
        for kind in AgentKind::ALL {
            counters.set(kind, store.count_of_kind(kind));
        }
        counters
    }

    pub fn get(&self, kind: AgentKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    fn increment(&mut self, kind: AgentKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    fn decrement(&mut self, kind: AgentKind) {
        let count = self.counts.entry(kind).or_insert(0);
        *count = count.saturating_sub(1);
    }

    fn set(&mut self, kind: AgentKind, value: usize) {
        self.counts.insert(kind, value);
    }

    /// Compares every counter with the store.
    pub fn verify(&self, store: &dyn ObjectStore) -> Result<(), PopulationError> {
        for kind in AgentKind::ALL {
            let counted = self.get(kind);
            let actual = store.count_of_kind(kind);
            if counted != actual {
                return Err(PopulationError {
                    kind,
                    counted,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Checks the counters against the store. Debug builds panic on a
    /// mismatch; release builds log it and adopt the store's numbers.
    /// Returns how many kinds were corrected.
    pub fn reconcile(&mut self, store: &dyn ObjectStore) -> usize {
        let mut corrected = 0;
        while let Err(err) = self.verify(store) {
            if cfg!(debug_assertions) {
                panic!("population invariant violated: {err}");
            }
            warn!(
                kind = %err.kind,
                counted = err.counted,
                actual = err.actual,
                "population counter out of sync, resynchronising"
            );
            self.set(err.kind, err.actual);
            corrected += 1;
        }
        corrected
    }
}

/// A population-affecting record emitted during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEvent {
    pub id: EntityId,
    pub kind: AgentKind,
}

/// Pairs the object store with the counters. Systems spawn and despawn
/// only through this, so the two never drift apart.
pub struct Population<'a> {
    store: &'a mut dyn ObjectStore,
    counters: &'a mut PopulationCounters,
    spawned: Vec<PopulationEvent>,
    despawned: Vec<PopulationEvent>,
}

impl<'a> Population<'a> {
    pub fn new(store: &'a mut dyn ObjectStore, counters: &'a mut PopulationCounters) -> Self {
        Self {
            store,
            counters,
            spawned: Vec::new(),
            despawned: Vec::new(),
        }
    }

    pub fn spawn(&mut self, agent: Agent) -> EntityId {
        let kind = agent.kind();
        let position = agent.position();
        let id = self.store.add_object(agent);
        self.counters.increment(kind);
        info!(id = id.raw(), %kind, x = position.x, y = position.y, "spawned");
        self.spawned.push(PopulationEvent { id, kind });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Agent> {
        let agent = self.store.remove_object(id)?;
        let kind = agent.kind();
        self.counters.decrement(kind);
        info!(id = id.raw(), %kind, "despawned");
        self.despawned.push(PopulationEvent { id, kind });
        Some(agent)
    }

    pub fn count(&self, kind: AgentKind) -> usize {
        self.counters.get(kind)
    }

    pub fn ids_of_kind(&self, kind: AgentKind) -> Vec<EntityId> {
        self.store.ids_of_kind(kind)
    }

    pub fn get(&self, id: EntityId) -> Option<&Agent> {
        self.store.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.store.get_mut(id)
    }

    pub fn into_events(self) -> (Vec<PopulationEvent>, Vec<PopulationEvent>) {
        (self.spawned, self.despawned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Balloon, Prey};
    use crate::geo::Coordinate;
    use crate::world::World;

    #[test]
    fn spawn_and_despawn_track_the_store() {
        let mut world = World::new();
        let mut counters = PopulationCounters::default();
        let mut population = Population::new(&mut world, &mut counters);
        let a = population.spawn(Agent::Balloon(Balloon::new(Coordinate::default(), 1)));
        population.spawn(Agent::Prey(Prey::new(Coordinate::default(), 2.0)));
        assert_eq!(population.count(AgentKind::Balloon), 1);
        assert!(population.despawn(a).is_some());
        assert!(population.despawn(a).is_none());
        let (spawned, despawned) = population.into_events();
        assert_eq!(spawned.len(), 2);
        assert_eq!(despawned.len(), 1);

        assert_eq!(counters.get(AgentKind::Balloon), 0);
        assert_eq!(counters.get(AgentKind::Prey), 1);
        assert!(counters.verify(&world).is_ok());
    }

    #[test]
    fn verify_reports_external_removal() {
        let mut world = World::new();
        let mut counters = PopulationCounters::default();
        let id = Population::new(&mut world, &mut counters)
            .spawn(Agent::Prey(Prey::new(Coordinate::default(), 2.0)));
        world.remove_object(id);
        assert_eq!(
            counters.verify(&world),
            Err(PopulationError {
                kind: AgentKind::Prey,
                counted: 1,
                actual: 0
            })
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "population invariant violated")]
    fn reconcile_is_fatal_in_debug_builds() {
        let mut world = World::new();
        let mut counters = PopulationCounters::default();
        world.add_object(Agent::Prey(Prey::new(Coordinate::default(), 2.0)));
        counters.reconcile(&world);
    }
}
