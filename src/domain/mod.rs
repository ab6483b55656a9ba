//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine trait)
//! - `wizard` - Request composition, reply parsing and the wizard session state machine

pub mod foundation;
pub mod wizard;
