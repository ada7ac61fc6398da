use aws_sdk_dynamodb::Client as RawClient;

/// Thin wrapper over the SDK client; every supported call is exposed through its own trait so
/// repositories can state exactly what they need.
#[derive(Debug, Clone)]
pub struct Adapter {
    pub(crate) raw: RawClient,
}

impl From<RawClient> for Adapter {
    fn from(raw: RawClient) -> Self {
        Adapter { raw }
    }
}
