//! Entities: one polymorphic game object type for every title
//!
//! Instead of a struct per game (plane, crate, bird, invader, bullet, coin)
//! every object is an [`Entity`] with a kind tag. Behaviour that differs per
//! kind is expressed through [`Capabilities`] and through the game rules.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::KinematicBody;
use super::collision::{BoundingBox, ContactFlags};
use crate::platform::{TextureHandle, UvRect};

/// Stable entity identifier (monotonic within one run)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// What role an entity plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    /// Hostile: crates, birds, invaders
    Obstacle,
    Collectible,
    Projectile,
    /// Cosmetic only: clouds, title art
    Decoration,
}

/// Capability flags derived from the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Takes part in overlap tests
    pub collidable: bool,
    pub drawable: bool,
    /// May carry an age-based lifetime
    pub expires: bool,
    /// Keeps simulating after the game is won or lost
    pub cosmetic: bool,
}

impl EntityKind {
    pub fn capabilities(self) -> Capabilities {
        match self {
            EntityKind::Player | EntityKind::Obstacle | EntityKind::Collectible => Capabilities {
                collidable: true,
                drawable: true,
                expires: false,
                cosmetic: false,
            },
            EntityKind::Projectile => Capabilities {
                collidable: true,
                drawable: true,
                expires: true,
                cosmetic: false,
            },
            EntityKind::Decoration => Capabilities {
                collidable: false,
                drawable: true,
                expires: true,
                cosmetic: true,
            },
        }
    }

    /// Hostiles must all be cleared to win
    pub fn is_hostile(self) -> bool {
        self == EntityKind::Obstacle
    }
}

/// Why an entity left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DespawnReason {
    /// Left the play field (e.g. a crate the player dodged)
    OffScreen,
    /// Outlived its TTL
    Expired,
    /// Picked up by the player
    Collected,
    /// Shot down
    Destroyed,
    /// Used up in a collision (e.g. a bullet that hit)
    Consumed,
    /// Explicit removal with no gameplay meaning
    Removed,
}

/// Opaque render state; only the renderer interprets it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub texture: TextureHandle,
    pub uv: UvRect,
    /// Quad size in world units
    pub scale: Vec2,
    /// Animation frame index, advanced by game rules
    pub frame: u32,
}

impl Sprite {
    pub fn new(texture: TextureHandle, scale: Vec2) -> Self {
        Self {
            texture,
            uv: UvRect::FULL,
            scale,
            frame: 0,
        }
    }

    pub fn with_uv(mut self, uv: UvRect) -> Self {
        self.uv = uv;
        self
    }
}

/// Everything needed to spawn an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityInit {
    pub body: KinematicBody,
    pub bbox: BoundingBox,
    pub sprite: Sprite,
    pub ttl: Option<f32>,
    pub tag: u32,
}

impl EntityInit {
    pub fn new(body: KinematicBody, bbox: BoundingBox, sprite: Sprite) -> Self {
        Self {
            body,
            bbox,
            sprite,
            ttl: None,
            tag: 0,
        }
    }

    pub fn with_ttl(mut self, ttl: f32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tag(mut self, tag: u32) -> Self {
        self.tag = tag;
        self
    }
}

/// A live game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: KinematicBody,
    pub bbox: BoundingBox,
    pub alive: bool,
    /// Seconds since spawn
    pub age: f32,
    pub ttl: Option<f32>,
    pub sprite: Sprite,
    pub contacts: ContactFlags,
    /// Per-game discriminator (bird vs crate, left vs right paddle)
    pub tag: u32,
    /// Set when marked for removal during a collision scan
    pub(crate) pending: Option<DespawnReason>,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, init: EntityInit) -> Self {
        let ttl = if kind.capabilities().expires { init.ttl } else { None };
        Self {
            id,
            kind,
            body: init.body,
            bbox: init.bbox,
            alive: true,
            age: 0.0,
            ttl,
            sprite: init.sprite,
            contacts: ContactFlags::default(),
            tag: init.tag,
            pending: None,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// AABB overlap against another entity
    pub fn overlaps(&self, other: &Entity) -> bool {
        super::collision::overlaps(self.body.position, &self.bbox, other.body.position, &other.bbox)
    }

    /// Whether this entity should take part in collision tests right now
    pub fn is_collidable(&self) -> bool {
        self.alive && self.kind.capabilities().collidable
    }

    pub fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.age > ttl)
    }
}
