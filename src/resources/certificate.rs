use super::*;

/// a reference to an ACM certificate that already exists. We never issue
/// certificates, we only point resources at them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRef {
    pub arn: String,
    /// only known when the ARN is a full ACM ARN, eg:
    /// `arn:aws:acm:us-east-1:123456789012:certificate/abcd-...`
    pub region: Option<String>,
}

impl CertificateRef {
    pub fn from_certificate_arn<S: AsRef<str>>(arn: S) -> Result<Self> {
        let arn = arn.as_ref().trim();
        let invalid = |reason| Error::InvalidCertificateArn { arn: arn.to_string(), reason };
        if !arn.starts_with("arn:") {
            return Err(invalid("Must start with 'arn:'"));
        }
        if arn.chars().any(|c| c.is_whitespace()) {
            return Err(invalid("Must not contain whitespace"));
        }
        let parts: Vec<&str> = arn.split(':').collect();
        if parts.len() < 3 || parts[1].is_empty() || parts[2].is_empty() {
            return Err(invalid("Must have the form arn:partition:service:..."));
        }
        // arn:partition:acm:region:account:certificate/id
        let region = match parts.as_slice() {
            [_, _, "acm", region, _, resource] => {
                if region.is_empty() || !resource.starts_with("certificate/") {
                    return Err(invalid("ACM ARNs must name a region and a certificate/<id> resource"));
                }
                Some(region.to_string())
            }
            _ => None,
        };
        Ok(Self { arn: arn.to_string(), region })
    }

    /// CloudFront can only use certificates from us-east-1, no matter which
    /// region the rest of the stack is deployed to.
    pub fn for_edge<S: AsRef<str>>(arn: S) -> Result<Self> {
        let cert = Self::from_certificate_arn(arn)?;
        let required = aws_regions::CLOUDFRONT_CERTIFICATE_REGION;
        match cert.region.as_deref() {
            Some(region) if region == required => Ok(cert),
            Some(region) => Err(Error::EdgeCertificateRegion {
                arn: cert.arn.clone(),
                region: region.to_string(),
                required,
            }),
            None => Err(Error::InvalidCertificateArn {
                arn: cert.arn,
                reason: "Edge certificates must be full ACM ARNs so their region can be checked",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACM_TOKYO: &str = "arn:aws:acm:ap-northeast-1:123456789012:certificate/0f2b1f52-aaaa-bbbb-cccc-1234567890ab";
    const ACM_VIRGINIA: &str = "arn:aws:acm:us-east-1:123456789012:certificate/4c1e-dddd";

    #[test]
    fn parses_region_from_acm_arns() {
        let cert = CertificateRef::from_certificate_arn(ACM_TOKYO).unwrap();
        assert_eq!(cert.region.as_deref(), Some("ap-northeast-1"));
        // opaque identifiers are accepted as is
        let cert = CertificateRef::from_certificate_arn("arn:cert:1").unwrap();
        assert_eq!(cert.arn, "arn:cert:1");
        assert_eq!(cert.region, None);
    }

    #[test]
    fn rejects_malformed_arns() {
        assert!(CertificateRef::from_certificate_arn("").is_err());
        assert!(CertificateRef::from_certificate_arn("cert-123").is_err());
        assert!(CertificateRef::from_certificate_arn("arn:aws").is_err());
        assert!(CertificateRef::from_certificate_arn("arn:aws:acm:us-east-1:123:key/abc").is_err());
        assert!(CertificateRef::from_certificate_arn("arn:aws:acm: us-east-1:1:certificate/x").is_err());
    }

    #[test]
    fn edge_certificates_must_live_in_us_east_1() {
        assert!(CertificateRef::for_edge(ACM_VIRGINIA).is_ok());
        match CertificateRef::for_edge(ACM_TOKYO) {
            Err(Error::EdgeCertificateRegion { region, required, .. }) => {
                assert_eq!(region, "ap-northeast-1");
                assert_eq!(required, "us-east-1");
            }
            x => panic!("expected region error, got {:?}", x),
        }
        assert!(CertificateRef::for_edge("arn:cert:1").is_err());
    }
}
