//! Generic actor framework for state-owning tasks.
//!
//! This module provides the building blocks the board and session actors are made of.
//!
//! # Main Components
//!
//! - [`ActorState`] - Trait that a piece of owned state implements to be driven by an actor
//! - [`StateActor`] - Generic actor that owns the state and processes its messages one at a time
//! - [`Mailbox`] / [`WeakMailbox`] - Cloneable handles used to send messages to the actor
//! - [`FrameworkError`] - Common error types
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning full actors.

pub mod core;
pub mod mock;

// Re-export core types for convenience
pub use self::core::*;
