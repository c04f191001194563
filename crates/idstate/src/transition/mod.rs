//! State transitions: the signed statement that moves an identity from
//! one state to the next, and the bundle the circuit consumes.

pub mod inputs;
pub mod signer;

pub use inputs::StateTransitionInputs;
pub use signer::{transition_hash, AuthEvidence, StateTransitionSigner, TransitionPhase};
