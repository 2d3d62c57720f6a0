mod server_command;
mod server_handle;
mod signalling_server;
mod snapshot;

pub use server_command::*;
pub use server_handle::*;
pub use signalling_server::*;
pub use snapshot::*;
