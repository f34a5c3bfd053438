//! # Identity Graph Model
//!
//! Plain DTOs shared by the matcher, the relationship graph and the export
//! layer. This module is pure data: no I/O, no state.

pub mod node;
pub mod edge;
pub mod value;
pub mod property_map;

pub use node::{EntityNode, NewNode};
pub use edge::{EdgeId, EdgeType, EntityEdge, NewEdge, RelationshipType};
pub use value::Value;
pub use property_map::{PropertyMap, properties};
