use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The shared collection of map objects the engine reads and writes.
///
/// `ids_of_kind` must return ids in a stable order; nearest-target ties are
/// broken by that order.
pub trait ObjectStore {
    fn add_object(&mut self, agent: Agent) -> EntityId;
    fn remove_object(&mut self, id: EntityId) -> Option<Agent>;
    fn ids_of_kind(&self, kind: AgentKind) -> Vec<EntityId>;
    fn get(&self, id: EntityId) -> Option<&Agent>;
    fn get_mut(&mut self, id: EntityId) -> Option<&mut Agent>;

    fn count_of_kind(&self, kind: AgentKind) -> usize {
        self.ids_of_kind(kind).len()
    }
}

/// In-memory object store. Ids are handed out in increasing order, so
/// iteration follows creation order.
#[derive(Debug, Default)]
pub struct World {
    next_entity: u64,
    objects: BTreeMap<EntityId, Agent>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = (EntityId, &Agent)> {
        self.objects.iter().map(|(id, agent)| (*id, agent))
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }
}

impl ObjectStore for World {
    fn add_object(&mut self, agent: Agent) -> EntityId {
        let id = self.allocate();
        self.objects.insert(id, agent);
        id
    }

    fn remove_object(&mut self, id: EntityId) -> Option<Agent> {
        self.objects.remove(&id)
    }

    fn ids_of_kind(&self, kind: AgentKind) -> Vec<EntityId> {
        self.objects
            .iter()
            .filter(|(_, agent)| agent.kind() == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    fn get(&self, id: EntityId) -> Option<&Agent> {
        self.objects.get(&id)
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.objects.get_mut(&id)
    }
}
