mod relay_config;
mod relay_error;
mod relay_server;
mod relay_service;
mod save_handler;
mod ws_handler;

pub use relay_config::*;
pub use relay_error::*;
pub use relay_server::*;
pub use relay_service::*;
pub use save_handler::*;
pub use ws_handler::*;
