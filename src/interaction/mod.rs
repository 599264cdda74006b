//! # Interaction Core
//!
//! Turns window input into scene changes:
//!
//! - [`pointer`]: pixel coordinates to normalized device coordinates
//! - [`picking`]: camera rays against an explicit candidate set
//! - [`decal`]: hover hits on the floor drive the decal uniform
//! - [`toggle`]: clicks swap which character is visible
//! - [`session`]: wires the pieces together for one scene session
//!
//! Nothing in here touches the GPU, so the whole core runs in tests.

pub mod decal;
pub mod picking;
pub mod pointer;
pub mod session;
pub mod toggle;

pub use decal::{CursorHint, DecalUniform, DecalUpdater};
pub use picking::{
    CandidateSet, MeshRaycaster, PickError, PickHit, PickResult, PickingService, RayCast,
};
pub use pointer::{PointerState, Viewport};
pub use session::{InteractionSession, StageRoles};
pub use toggle::{Character, CharacterState, CharacterToggle};
