use tracing::info;

use crate::context::ProvisioningContext;
use crate::descriptor::EnvironmentDescriptor;
use crate::resources::*;

use super::endpoint::Endpoint;

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDistribution {
    pub record_name: String,
    /// record name of the endpoint this distribution fronts.
    pub origin_record_name: String,
    /// `{"Ref": <distribution>}`, the distribution id at deploy time.
    pub distribution_identifier: Value,
    /// `{api id}.execute-api.{region}.{url suffix}`, as a Fn::Sub
    pub origin_domain: Value,
    pub origin_path: String,
    /// fully qualified alias of the distribution.
    pub domain_name: String,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub cache_policy_id: String,
    pub distribution_resource: String,
    pub record_resource: String,
}

/// puts a CloudFront distribution in front of the stage of `endpoint` and
/// points `env.record_name` at it. `env` names the edge record, which must not
/// be the record of the endpoint itself.
pub fn provision_edge(
    ctx: &ProvisioningContext,
    env: &EnvironmentDescriptor,
    endpoint: &Endpoint,
    template: &mut Template,
) -> Result<EdgeDistribution> {
    let certificate = ctx.edge_certificate()?;
    let prefix = env.logical_prefix();
    let domain_name = ctx.hosted_zone.fqdn(&env.record_name);
    info!(record = env.record_name.as_str(), origin = endpoint.domain_name.as_str(), "provisioning edge distribution");

    let origin_domain = sub(&format!("${{{}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}", endpoint.api_resource));
    let origin = OriginAndBehavior {
        domain_name: origin_domain.clone(),
        id: format!("{}-origin", endpoint.record_name),
        origin_path: format!("/{}", endpoint.stage_name),
        viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
        cache_policy_id: CACHING_DISABLED_POLICY_ID.into(),
        ..Default::default()
    };
    let distribution = CloudfrontDistribution {
        resource_name: format!("{prefix}Distribution"),
        comment: format!("{} in front of {}", domain_name, endpoint.domain_name),
        acm_certificate_arn: certificate.arn.clone(),
        aliases: vec![domain_name.clone()],
        origin: origin.clone(),
    };
    let distribution_resource = add_cloudfront_resource(template, &distribution)?;

    let record = Route53RecordSet::alias_a(
        format!("{prefix}DistributionRecord"),
        domain_name.clone(),
        &ctx.hosted_zone,
        AliasTarget::cloudfront(&distribution_resource),
    );
    let record_resource = add_route53_resource(template, &record)?;

    template.add_output(
        &format!("{prefix}DistributionDomain"),
        &format!("CloudFront domain serving {domain_name}"),
        get_att(&distribution_resource, "DomainName"),
    )?;

    Ok(EdgeDistribution {
        record_name: env.record_name.clone(),
        origin_record_name: endpoint.record_name.clone(),
        distribution_identifier: r#ref(&distribution_resource),
        origin_domain,
        origin_path: origin.origin_path,
        domain_name,
        viewer_protocol_policy: origin.viewer_protocol_policy,
        cache_policy_id: origin.cache_policy_id,
        distribution_resource,
        record_resource,
    })
}
