use std::collections::HashMap;

use serde::Deserialize;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const CHECKOUT_EXPIRED: &str = "checkout.session.expired";

/// The subset of a gateway event the service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: SessionObject,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl GatewayEvent {
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.data
            .object
            .metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
