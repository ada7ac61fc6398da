use serde::{Deserialize, Serialize};

/// Role value the identity provider stores in the public metadata of educators.
pub const EDUCATOR_ROLE: &str = "educator";

/// Claims carried by the bearer tokens minted by the identity provider.
///
/// Only `sub` is guaranteed; the profile fields depend on the token template configured on the
/// provider side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn is_educator(&self) -> bool {
        self.role.as_deref() == Some(EDUCATOR_ROLE)
    }
}
