//! Entity registry
//!
//! Owns every live entity in spawn order. Removal during a collision scan
//! goes through `mark` and a single compacting `prune` afterwards, so no
//! element is skipped or visited twice while indices shift.

use glam::Vec2;

use super::entity::{DespawnReason, Entity, EntityId, EntityInit, EntityKind};

/// Record of an entity leaving the registry; callers use it for scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Despawned {
    pub id: EntityId,
    pub kind: EntityKind,
    pub tag: u32,
    pub reason: DespawnReason,
    pub position: Vec2,
}

impl Despawned {
    fn from_entity(entity: &Entity, reason: DespawnReason) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind,
            tag: entity.tag,
            reason,
            position: entity.body.position,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    next_id: u32,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn spawn(&mut self, kind: EntityKind, init: EntityInit) -> EntityId {
        let id = self.next_entity_id();
        self.entities.push(Entity::new(id, kind, init));
        log::trace!("Spawned {:?} {:?} at {:?}", kind, id, init.body.position);
        id
    }

    /// Remove one entity immediately, keeping the order of the rest
    pub fn despawn(&mut self, id: EntityId, reason: DespawnReason) -> Option<Despawned> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        let entity = self.entities.remove(idx);
        Some(Despawned::from_entity(&entity, reason))
    }

    /// Flag an entity for removal by the next `prune`.
    ///
    /// Returns false if the entity is unknown or already marked; the first
    /// reason wins.
    pub fn mark(&mut self, id: EntityId, reason: DespawnReason) -> bool {
        match self.entities.iter_mut().find(|e| e.id == id) {
            Some(entity) if entity.pending.is_none() => {
                entity.pending = Some(reason);
                entity.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Remove every marked entity plus every entity the predicate expires,
    /// in one order-preserving pass.
    pub fn prune<F>(&mut self, mut predicate: F) -> Vec<Despawned>
    where
        F: FnMut(&Entity) -> Option<DespawnReason>,
    {
        let mut removed = Vec::new();
        self.entities.retain(|entity| {
            let reason = entity.pending.or_else(|| predicate(entity));
            match reason {
                Some(reason) => {
                    removed.push(Despawned::from_entity(entity, reason));
                    false
                }
                None => true,
            }
        });
        if !removed.is_empty() {
            log::trace!("Pruned {} entities", removed.len());
        }
        removed
    }

    /// Remove only marked entities
    pub fn compact(&mut self) -> Vec<Despawned> {
        self.prune(|_| None)
    }

    pub fn for_each<F: FnMut(&Entity)>(&self, visitor: F) {
        self.entities.iter().for_each(visitor);
    }

    pub fn for_each_mut<F: FnMut(&mut Entity)>(&mut self, visitor: F) {
        self.entities.iter_mut().for_each(visitor);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// First live entity of a kind carrying `tag`
    pub fn find_tag(&self, kind: EntityKind, tag: u32) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.alive && e.kind == kind && e.tag == tag)
    }

    pub fn find_tag_mut(&mut self, kind: EntityKind, tag: u32) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|e| e.alive && e.kind == kind && e.tag == tag)
    }

    /// Live entities of a kind
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.alive && e.kind == kind).count()
    }

    pub fn hostile_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.alive && e.kind.is_hostile())
            .count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop everything and restart ID allocation
    pub fn clear(&mut self) {
        self.entities.clear();
        self.next_id = 1;
    }
}
