//! Variable storage: flavors, origins and the scope stack.

pub mod automatic;
pub mod env;
pub mod types;

pub use env::Environment;
pub use types::{Flavor, Origin, Payload, Var};
