mod dispatcher;
mod hub_protocol;
mod signaling_channel;
mod ws_channel;

pub use dispatcher::*;
pub use hub_protocol::*;
pub use signaling_channel::*;
pub use ws_channel::*;
