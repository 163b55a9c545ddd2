//! Deterministic simulation module
//!
//! All gameplay mechanics live here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies beyond opaque handles

pub mod body;
pub mod clock;
pub mod collision;
pub mod entity;
pub mod mode;
pub mod registry;
pub mod tilemap;
pub mod world;

pub use body::KinematicBody;
pub use clock::SimulationClock;
pub use collision::{
    BoundingBox, ContactFlags, TileContactReport, overlaps, resolve_tile_contacts, sample_tile_contacts,
};
pub use entity::{Capabilities, DespawnReason, Entity, EntityId, EntityInit, EntityKind, Sprite};
pub use mode::{GameMode, ModeInput, ModeMachine, Outcome, Transition};
pub use registry::{Despawned, EntityRegistry};
pub use tilemap::{CellIndex, TileGrid, TileKind, TilePalette};
pub use world::{AudioEvent, World};
