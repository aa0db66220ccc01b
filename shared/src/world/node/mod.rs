pub mod changes;
pub mod diff_mask;
pub mod error;
pub mod node_kinds;
pub mod replicate;
