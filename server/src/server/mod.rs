mod server;
mod server_config;
mod server_state;

pub use server::Server;
pub use server_config::ServerConfig;
pub use server_state::ServerState;
