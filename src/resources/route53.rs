use super::*;

pub const RECORD_SET_TYPE: &str = "AWS::Route53::RecordSet";

/// an existing hosted zone, looked up by attributes rather than created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZoneRef {
    pub id: String,
    /// without the trailing dot, eg: `example.com`
    pub name: String,
}

impl HostedZoneRef {
    pub fn from_attributes<S: AsRef<str>>(hosted_zone_id: S, zone_name: S) -> Result<Self> {
        let id = hosted_zone_id.as_ref().trim();
        // accept what the console and the CLI print
        let id = id.strip_prefix("/hostedzone/").unwrap_or(id);
        if id.is_empty() || id.len() > 32 || !id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return Err(Error::InvalidHostedZoneId(hosted_zone_id.as_ref().to_string()));
        }
        let name = zone_name.as_ref().trim().trim_end_matches('.').to_ascii_lowercase();
        if name.is_empty() || name.len() > 253 || !name.split('.').all(is_valid_label) || !name.contains('.') {
            return Err(Error::InvalidZoneName(zone_name.as_ref().to_string()));
        }
        Ok(Self { id: id.to_string(), name })
    }

    /// `record.zone`, no trailing dot.
    pub fn fqdn(&self, record_name: &str) -> String {
        format!("{record_name}.{}", self.name)
    }
}

/// a DNS label: 1-63 characters of [a-z0-9-], not starting or ending with '-'
pub fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasTarget {
    pub dns_name: Value,
    pub hosted_zone_id: Value,
}

impl AliasTarget {
    /// the regional endpoint of an API Gateway custom domain.
    pub fn api_gateway_domain(domain_resource: &str) -> Self {
        Self {
            dns_name: get_att(domain_resource, "RegionalDomainName"),
            hosted_zone_id: get_att(domain_resource, "RegionalHostedZoneId"),
        }
    }

    pub fn cloudfront(distribution_resource: &str) -> Self {
        Self {
            dns_name: get_att(distribution_resource, "DomainName"),
            hosted_zone_id: json!(aws_regions::CLOUDFRONT_HOSTED_ZONE_ID),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Route53RecordSet {
    pub resource_name: String,
    pub record_type: String,
    /// fully qualified name, with or without the trailing dot.
    pub name: String,
    pub hosted_zone: HostedZoneRef,
    pub alias_target: AliasTarget,
}

impl Route53RecordSet {
    pub fn alias_a<S: Into<String>>(resource_name: S, name: S, hosted_zone: &HostedZoneRef, alias_target: AliasTarget) -> Self {
        Self {
            resource_name: resource_name.into(),
            record_type: "A".into(),
            name: name.into(),
            hosted_zone: hosted_zone.clone(),
            alias_target,
        }
    }
}

pub fn add_route53_resource(template: &mut Template, conf: &Route53RecordSet) -> Result<String> {
    let Route53RecordSet { resource_name, record_type, name, hosted_zone, alias_target } = conf;
    let zone_suffix = format!(".{}", hosted_zone.name);
    let bare_name = name.trim_end_matches('.');
    if !bare_name.ends_with(&zone_suffix) && bare_name != hosted_zone.name {
        return Err(Error::InvalidRecordName {
            name: name.clone(),
            reason: format!("Must be inside the hosted zone {}", hosted_zone.name),
        });
    }
    let mut name = bare_name.to_string();
    name.push('.'); // record names must end in .
    template.add_resource(resource_name, Resource::new(RECORD_SET_TYPE, json!({
        "HostedZoneId": hosted_zone.id,
        "Name": name,
        "Comment": name,
        "Type": record_type,
        "AliasTarget": {
            "DNSName": alias_target.dns_name,
            "HostedZoneId": alias_target.hosted_zone_id,
        },
    })))?;
    Ok(resource_name.clone())
}
