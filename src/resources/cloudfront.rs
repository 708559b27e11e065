use super::*;

pub const DISTRIBUTION_TYPE: &str = "AWS::CloudFront::Distribution";

/// managed cache policy "CachingDisabled": every request goes to the origin.
/// https://docs.aws.amazon.com/AmazonCloudFront/latest/DeveloperGuide/using-managed-cache-policies.html
pub const CACHING_DISABLED_POLICY_ID: &str = "4135ea2d-6df8-44a3-9df3-4b5a84be39ad";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerProtocolPolicy {
    AllowAll,
    RedirectToHttps,
    HttpsOnly,
}

impl ViewerProtocolPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewerProtocolPolicy::AllowAll => "allow-all",
            ViewerProtocolPolicy::RedirectToHttps => "redirect-to-https",
            ViewerProtocolPolicy::HttpsOnly => "https-only",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OriginAndBehavior {
    /// may be an intrinsic, eg: a Fn::Sub that builds the execute-api host.
    pub domain_name: Value,
    pub id: String,
    /// prefixed to every request forwarded to the origin, eg: `/prod`
    pub origin_path: String,
    pub origin_protocol_policy: String,
    pub http_port: u16,
    pub https_port: u16,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub cache_policy_id: String,
}

impl Default for OriginAndBehavior {
    fn default() -> Self {
        Self {
            domain_name: Value::Null,
            id: "default-origin".into(),
            origin_path: Default::default(),
            origin_protocol_policy: "https-only".into(),
            http_port: 80,
            https_port: 443,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            cache_policy_id: CACHING_DISABLED_POLICY_ID.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CloudfrontDistribution {
    pub resource_name: String,
    pub comment: String,
    pub acm_certificate_arn: String,
    pub aliases: Vec<String>,
    pub origin: OriginAndBehavior,
}

pub fn add_cloudfront_resource(template: &mut Template, conf: &CloudfrontDistribution) -> Result<String> {
    let OriginAndBehavior {
        domain_name, id, origin_path, origin_protocol_policy, http_port, https_port,
        viewer_protocol_policy, cache_policy_id,
    } = &conf.origin;
    if domain_name.is_null() {
        return Err(Error::InvalidDistribution {
            name: conf.resource_name.clone(),
            reason: "cloudfront distribution origin domain_name is required",
        });
    }
    let mut origin = json!({
        "Id": id,
        "DomainName": domain_name,
        "CustomOriginConfig": {
            "HTTPPort": http_port,
            "HTTPSPort": https_port,
            "OriginProtocolPolicy": origin_protocol_policy,
            "OriginSSLProtocols": ["TLSv1.2"],
        },
    });
    if !origin_path.is_empty() {
        origin["OriginPath"] = json!(origin_path);
    }
    let mut config = json!({
        "Enabled": true,
        "Origins": [origin],
        "DefaultCacheBehavior": {
            "TargetOriginId": id,
            "ViewerProtocolPolicy": viewer_protocol_policy.as_str(),
            "CachePolicyId": cache_policy_id,
            "AllowedMethods": ["GET", "HEAD", "OPTIONS"],
            "Compress": true,
        },
    });
    if !conf.comment.is_empty() {
        config["Comment"] = json!(conf.comment);
    }
    if !conf.acm_certificate_arn.is_empty() {
        config["ViewerCertificate"] = json!({
            "AcmCertificateArn": conf.acm_certificate_arn,
            "MinimumProtocolVersion": "TLSv1.2_2021",
            "SslSupportMethod": "sni-only",
        });
    }
    if !conf.aliases.is_empty() {
        config["Aliases"] = json!(conf.aliases);
    }
    template.add_resource(&conf.resource_name, Resource::new(DISTRIBUTION_TYPE, json!({
        "DistributionConfig": config,
    })))?;
    Ok(conf.resource_name.clone())
}
