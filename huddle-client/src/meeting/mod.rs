mod meeting_behavior;
mod meeting_command;
mod meeting_session;
mod roster;

pub use meeting_behavior::*;
pub use meeting_command::*;
pub use meeting_session::*;
pub use roster::*;
