//! Event abstractions shared by the storefront components.
//!
//! Components model user interaction as commands handled by an aggregate; the
//! accepted changes are events. Nothing here persists or publishes them.

pub mod event;
pub mod handler;

pub use event::Event;
pub use handler::execute;
