//! Auth-domain value types: credentials, identity hints, and scope sets.

pub mod credential;
pub mod hint;
pub mod scope;

pub use credential::*;
pub use hint::*;
pub use scope::*;
