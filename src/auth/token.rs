//! Token secrets and the token set returned by code exchanges and refreshes.

pub mod secret;
pub mod set;
