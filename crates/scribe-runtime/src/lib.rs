//! # scribe-runtime
//!
//! The interactive workflow engine:
//!
//! - [`store::SessionStore`] — per-conversation sessions with an at-most-one
//!   in-flight-transition guarantee
//! - [`machine::WorkflowMachine`] — the state machine and its generation
//!   steps
//! - [`dispatcher::Dispatcher`] — immediate acknowledgment plus deferred
//!   asynchronous execution with a per-transition deadline
//! - [`views`] — pure view builders, one per session state
//!
//! ## Crate Position
//!
//! Depends on `scribe-core` (types, collaborator traits) and `scribe-llm`
//! (generation adapter). The HTTP shell in `scribe-server` sits on top.

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod machine;
pub mod store;
pub mod views;

pub use dispatcher::Dispatcher;
pub use machine::WorkflowMachine;
pub use store::{SessionStore, TransitionGuard};
