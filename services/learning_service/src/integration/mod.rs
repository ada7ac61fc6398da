//! Clients and verifiers for the third parties the service delegates to.

pub mod identity;
pub mod media;
pub mod payment;
pub mod signature;
