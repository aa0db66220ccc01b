mod client;
mod client_config;
mod client_state;

pub use client::Client;
pub use client_config::ClientConfig;
pub use client_state::ClientState;
