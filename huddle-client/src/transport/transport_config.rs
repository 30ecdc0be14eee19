use huddle_core::IceServerConfig;
use huddle_core::utils::default_ice_servers;

/// ICE configuration applied to every peer connection.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
        }
    }
}
