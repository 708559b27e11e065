use crate::error::{Error, Result};
use crate::resources::{CertificateRef, HostedZoneRef};

pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// what every provisioner shares: the zone records go into, and the
/// certificates custom domains are bound to. Built once, then only borrowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningContext {
    pub hosted_zone: HostedZoneRef,
    /// regional certificate used by the API Gateway custom domains.
    pub certificate: CertificateRef,
    /// us-east-1 certificate, only needed by the edge layer.
    pub edge_certificate: Option<CertificateRef>,
    /// the region the stack is deployed to.
    pub region: String,
}

impl ProvisioningContext {
    pub fn new<S: AsRef<str>>(hosted_zone_id: S, zone_name: S, certificate_arn: S, region: S) -> Result<Self> {
        if let Some(err) = aws_regions::verify_region(region.as_ref()) {
            return Err(Error::InvalidRegion(err));
        }
        Ok(Self {
            hosted_zone: HostedZoneRef::from_attributes(hosted_zone_id.as_ref(), zone_name.as_ref())?,
            certificate: CertificateRef::from_certificate_arn(certificate_arn)?,
            edge_certificate: None,
            region: region.as_ref().to_string(),
        })
    }

    pub fn with_edge_certificate<S: AsRef<str>>(mut self, certificate_arn_edge: S) -> Result<Self> {
        self.edge_certificate = Some(CertificateRef::for_edge(certificate_arn_edge)?);
        Ok(self)
    }

    pub fn zone_name(&self) -> &str {
        &self.hosted_zone.name
    }

    pub fn edge_certificate(&self) -> Result<&CertificateRef> {
        self.edge_certificate.as_ref().ok_or(Error::MissingEdgeCertificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_raw_inputs() {
        let ctx = ProvisioningContext::new("Z1", "example.com", "arn:cert:1", DEFAULT_REGION).unwrap();
        assert_eq!(ctx.zone_name(), "example.com");
        assert_eq!(ctx.certificate.arn, "arn:cert:1");
        assert!(matches!(ctx.edge_certificate(), Err(Error::MissingEdgeCertificate)));
    }

    #[test]
    fn rejects_unknown_region() {
        let err = ProvisioningContext::new("Z1", "example.com", "arn:cert:1", "moon-1").unwrap_err();
        assert!(matches!(err, Error::InvalidRegion(_)));
    }

    #[test]
    fn edge_certificate_is_validated() {
        let ctx = ProvisioningContext::new("Z1", "example.com", "arn:cert:1", DEFAULT_REGION).unwrap();
        assert!(ctx.clone().with_edge_certificate("arn:aws:acm:ap-northeast-1:1:certificate/a").is_err());
        let ctx = ctx.with_edge_certificate("arn:aws:acm:us-east-1:1:certificate/a").unwrap();
        assert_eq!(ctx.edge_certificate().unwrap().region.as_deref(), Some("us-east-1"));
    }
}
