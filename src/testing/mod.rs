//! Testing Utilities Module
//!
//! Provides helpers for unit and integration tests: an in-memory chain,
//! builders for message logs and receipts, and common assertions.
//!
//! ## Submodules
//!
//! - `fake_chain` - Scripted `ChainProvider` implementation
//! - `mock_messages` - Build the logs and receipts a message leaves behind
//! - `assertions` - Common test assertions

pub mod assertions;
pub mod fake_chain;
pub mod mock_messages;

// Re-export commonly used items
pub use assertions::*;
pub use fake_chain::*;
pub use mock_messages::*;
