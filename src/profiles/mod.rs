//! Streaming service profiles
//!
//! Holds the saved service configurations for a session: id allocation,
//! the ordered registry, the editable form and the controller that keeps
//! them in step with the host.

pub mod allocator;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod form;
pub mod payload;
pub mod registry;

/// Small positive integer identifying a saved service (0 is never issued)
pub type ServiceId = u32;

pub use controller::ProfileController;
pub use descriptor::ServiceDescriptor;
pub use error::ProfileError;
