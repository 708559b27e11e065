use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid resource name {name:?}\n{reason}")]
    InvalidLogicalId { name: String, reason: &'static str },

    #[error("Resource {0} is already declared with a different definition")]
    ConflictingResource(String),

    #[error("Invalid stack name {0:?}\nMust only consist of alphanumeric characters and hyphens, must start with an alphabetical character, and cannot be longer than 128 characters.")]
    InvalidStackName(String),

    #[error("Invalid record name {name:?}\n{reason}")]
    InvalidRecordName { name: String, reason: String },

    #[error("Invalid zone name {0:?}")]
    InvalidZoneName(String),

    #[error("Invalid hosted zone id {0:?}\nMust be the id without the /hostedzone/ prefix, eg: Z0123456789ABCDEFGHIJ")]
    InvalidHostedZoneId(String),

    #[error("Invalid certificate ARN {arn:?}\n{reason}")]
    InvalidCertificateArn { arn: String, reason: &'static str },

    #[error("Certificate {arn} is issued in {region}, but CloudFront only accepts certificates from {required}")]
    EdgeCertificateRegion { arn: String, region: String, required: &'static str },

    #[error("The edge layer is enabled but no edge certificate ARN was provided")]
    MissingEdgeCertificate,

    #[error("{0}")]
    InvalidRegion(String),

    #[error("Invalid lambda configuration for {name}\n{reason}")]
    InvalidLambda { name: String, reason: String },

    #[error("Invalid route {method} {path}\n{reason}")]
    InvalidRoute { method: String, path: String, reason: &'static str },

    #[error("Invalid distribution {name}\n{reason}")]
    InvalidDistribution { name: String, reason: &'static str },

    #[error("DNS name {name} is declared by both {first} and {second}")]
    RecordCollision { name: String, first: String, second: String },

    #[error("Nothing to provision: no environments were configured")]
    NoEnvironments,

    #[error("Failed to read {path:?}\n{source}")]
    ReadFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to write {path:?}\n{source}")]
    WriteFile { path: PathBuf, source: std::io::Error },

    #[error("Failed to serialize template\n{0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Endpoint check failed for {url}\n{reason}")]
    EndpointCheck { url: String, reason: String },
}
