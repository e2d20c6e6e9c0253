// Domain value objects
pub mod connection_state;
pub mod delivery_outcome;
pub mod delivery_target;
pub mod identifiers;

pub use connection_state::*;
pub use delivery_outcome::*;
pub use delivery_target::*;
pub use identifiers::*;
