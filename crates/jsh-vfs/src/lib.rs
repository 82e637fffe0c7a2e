//! Virtual file system for jsh.
//!
//! [`VPath`] implements the path algebra (components, join, absolute
//! resolution). [`MemoryVfs`] stores a tree of [`Node`]s rooted at `/` and
//! resolves paths by walking down from the root.

mod memory;
mod node;
mod path;

pub use memory::{MAX_LINK_HOPS, MemoryVfs};
pub use node::{Content, Node, NodeKind};
pub use path::{ROOT, SEPARATOR, VPath};
