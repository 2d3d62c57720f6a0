mod listener;
mod ws_handler;

pub use listener::*;
pub use ws_handler::*;
