//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod normalize;
pub mod render;
pub mod validate;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use builder::{BuilderOptions, BuiltTree, HierarchyBuilder, DEFAULT_ROOT_NAME};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use normalize::{lookup_key, sanitize_url, Normalizer, SentinelSet, DEFAULT_SENTINELS};
pub use render::{ClickOutcome, NodeId, NodeState, RenderConfig, Renderer, Tooltip};
pub use validate::{
    contains_placeholder, find_dangling_references, find_name_collisions, summarize_levels,
    DanglingReferences, LevelSummary, NameCollision,
};
