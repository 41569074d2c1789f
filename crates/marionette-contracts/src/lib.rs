//! # marionette-contracts
//!
//! Shared types and contracts for the MARIONETTE capability registry.
//!
//! Every crate in the workspace imports from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod audit;
pub mod capability;
pub mod error;
