use crate::model::IceServerConfig;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_4: &str = "stun:stun3.l.google.com:19302";

/// Public STUN servers used when no ICE configuration is supplied.
pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![IceServerConfig::stun(vec![
        DEFAULT_STUN_ADDR.to_owned(),
        DEFAULT_STUN_ADDR_2.to_owned(),
        DEFAULT_STUN_ADDR_3.to_owned(),
        DEFAULT_STUN_ADDR_4.to_owned(),
    ])]
}
