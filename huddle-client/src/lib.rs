mod config;
mod error;
mod media;
mod meeting;
mod negotiation;
mod orchestrator;
mod signaling;
mod transport;

pub use config::*;
pub use error::*;
pub use media::*;
pub use meeting::*;
pub use negotiation::*;
pub use orchestrator::*;
pub use signaling::*;
pub use transport::*;
