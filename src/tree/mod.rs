//! Virtual filesystem tree
//!
//! `store` owns the id-addressed node arena and its structural invariants;
//! `ops` layers the atomic create/rename/delete/update/search operations on
//! top of it. Folders hold ordered child-id lists rather than nested child
//! objects, so mutating one node touches one map entry.

pub mod node;
pub mod ops;
pub mod store;

pub use node::{Node, NodePayload};
pub use ops::{ProjectTree, RemovedSet, Search};
pub use store::NodeStore;
