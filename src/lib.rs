//! Declares side-by-side API Gateway environments ("current" and "pilot" by
//! default) behind custom domains in one Route53 hosted zone, optionally
//! fronted by CloudFront, as a CloudFormation template.
//!
//! ```no_run
//! use envstack::{compose, ComposeSettings, ProvisioningContext};
//!
//! let ctx = ProvisioningContext::new("Z0123456789", "example.com", "arn:aws:acm:ap-northeast-1:1:certificate/abc", "ap-northeast-1")?;
//! let composition = compose(&ctx, &ComposeSettings::default())?;
//! println!("{}", composition.template.to_json_pretty()?);
//! # Ok::<(), envstack::Error>(())
//! ```

pub mod context;
pub mod descriptor;
pub mod error;
pub mod provision;
pub mod resources;
pub mod template;
pub mod variables;
pub mod verify;

pub use context::{ProvisioningContext, DEFAULT_REGION};
pub use descriptor::EnvironmentDescriptor;
pub use error::{Error, Result};
pub use provision::{compose, provision, provision_edge, ComposeSettings, Composition, EdgeDistribution, Endpoint};
pub use template::Template;
