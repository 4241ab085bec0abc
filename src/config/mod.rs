//! Configuration management
//!
//! Handles the JSON store that holds the saved streaming services, the
//! selected service and the pool of released ids.

pub mod store;

pub use store::JsonStore;
