mod peer_orchestrator;

pub use peer_orchestrator::*;
