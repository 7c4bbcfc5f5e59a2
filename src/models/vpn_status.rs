use serde::{Deserialize, Serialize};

/// Tunnel state scraped from daemon logs. Every field defaults to
/// "unknown"; a missing signal is never an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VpnStatus {
    pub connected: bool,
    pub healthy: bool,
    #[serde(rename = "publicIP")]
    pub public_ip: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub location: Option<String>,
    pub provider: Option<String>,
    pub server: Option<String>,
}
