//! Garage CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the Garage controller.

pub mod bucket;
pub mod key;
pub mod key_access;
pub mod managed;
pub mod references;

pub use bucket::*;
pub use key::*;
pub use key_access::*;
pub use managed::*;
pub use references::*;
