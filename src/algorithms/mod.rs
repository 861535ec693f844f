//! Graph algorithms: traversal layering feeds for visualization.

mod traversal;

pub use traversal::{TraversalTree, bfs_tree, dfs_tree};
