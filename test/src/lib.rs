pub mod local_socket;

pub use helpers::*;
pub use local_socket::{LocalHub, LocalSocket, LocalSocketPair};
pub use test_protocol::{protocol, reversed_protocol, Label, TestKinds, Transform};
