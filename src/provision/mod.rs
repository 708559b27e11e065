//! Turns environment descriptors into declared resources. The endpoint
//! provisioner handles one environment, the edge provisioner puts CloudFront in
//! front of an endpoint, and the composer declares a whole stack.

pub mod endpoint;
pub use endpoint::*;
pub mod edge;
pub use edge::*;
pub mod compose;
pub use compose::*;
