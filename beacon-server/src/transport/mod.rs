mod outbound;
mod protocol;

pub use outbound::*;
pub use protocol::*;
