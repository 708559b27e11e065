pub use std::collections::BTreeMap;

pub use serde::{Serialize, Deserialize};
pub use serde_json::{json, Value};

pub use crate::error::{Error, Result};
pub use crate::template::*;

mod lambda;
pub use lambda::*;
mod api_gateway;
pub use api_gateway::*;
mod certificate;
pub use certificate::*;
mod cloudfront;
pub use cloudfront::*;
mod route53;
pub use route53::*;
