mod glare;
mod negotiation_session;
mod negotiation_state;

pub use glare::*;
pub use negotiation_session::*;
pub use negotiation_state::*;
