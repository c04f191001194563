//! Identity state, genesis identifiers and the identity aggregate.

pub mod aggregate;
pub mod id;
pub mod state;

pub use aggregate::{auth_claim, binds_auth_key, Identity, TreeStores};
pub use id::{Id, IdType};
pub use state::{compose_state, record_root_transition, TreeState};
