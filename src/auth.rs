//! Auth-domain models: scope sets, token secrets and sets, and normalized identities.

pub mod identity;
pub mod scope;
pub mod token;

pub use identity::*;
pub use scope::*;
pub use token::{secret::*, set::*};
