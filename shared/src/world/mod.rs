pub mod delete_list;
pub mod node;
pub mod node_tree;
pub mod pending_changes;
pub mod world_reader;
pub mod world_writer;
