//! Identity provider: bearer token verification, user lifecycle callbacks and role updates.

mod admin;
mod token;
mod webhook;

pub use admin::{ClerkAdmin, IdentityAdmin, IdentityAdminError, EDUCATOR_ROLE};
pub use token::{TokenError, TokenVerifier};
#[cfg(test)]
pub(crate) use webhook::sign_user_event;
pub use webhook::{verify_user_event, UserEvent, UserEventData};
