use serde::{Deserialize, Serialize};

/// Instance information returned by `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Server version.
    pub revolt: String,
    #[serde(default)]
    pub features: NodeFeatures,
    /// Event socket URL.
    pub ws: String,
    /// Web client URL.
    pub app: String,
    #[serde(default)]
    pub vapid: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeFeatures {
    pub email: bool,
    pub invite_only: bool,
    pub autumn: FeatureEndpoint,
    pub january: FeatureEndpoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureEndpoint {
    pub enabled: bool,
    pub url: String,
}
