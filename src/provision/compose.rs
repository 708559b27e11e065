use std::collections::BTreeMap;

use tracing::info;

use crate::context::ProvisioningContext;
use crate::descriptor::EnvironmentDescriptor;
use crate::error::{Error, Result};
use crate::template::Template;

use super::edge::{provision_edge, EdgeDistribution};
use super::endpoint::{provision, Endpoint};

pub const DEFAULT_EDGE_RECORD_PREFIX: &str = "cloudfront-";

#[derive(Debug, Clone)]
pub struct ComposeSettings {
    pub environments: Vec<EnvironmentDescriptor>,
    /// put a CloudFront distribution in front of every endpoint.
    pub edge_enabled: bool,
    /// the edge record of environment `x` is `{prefix}x`. Direct and edge
    /// records must not share a name, so an empty prefix is rejected when
    /// the edge layer is enabled.
    pub edge_record_prefix: String,
    pub description: String,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            environments: EnvironmentDescriptor::defaults(),
            edge_enabled: false,
            edge_record_prefix: DEFAULT_EDGE_RECORD_PREFIX.into(),
            description: "current and pilot message APIs behind custom domains".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub template: Template,
    pub endpoints: Vec<Endpoint>,
    pub distributions: Vec<EdgeDistribution>,
}

impl Composition {
    /// every DNS name the stack answers on.
    pub fn dns_names(&self) -> Vec<&str> {
        self.endpoints.iter().map(|e| e.domain_name.as_str())
            .chain(self.distributions.iter().map(|d| d.domain_name.as_str()))
            .collect()
    }
}

/// remembers which environment claimed which fully qualified name.
#[derive(Default)]
struct NameClaims(BTreeMap<String, String>);

impl NameClaims {
    fn claim(&mut self, name: String, owner: String) -> Result<()> {
        if let Some(first) = self.0.get(&name) {
            return Err(Error::RecordCollision { name, first: first.clone(), second: owner });
        }
        self.0.insert(name, owner);
        Ok(())
    }
}

pub fn edge_descriptor(env: &EnvironmentDescriptor, prefix: &str) -> Result<EnvironmentDescriptor> {
    EnvironmentDescriptor::new(env.message.clone(), format!("{prefix}{}", env.record_name))
}

/// declares every environment into one template. Every alias name is claimed
/// before anything is declared, so a collision fails the whole composition.
pub fn compose(ctx: &ProvisioningContext, settings: &ComposeSettings) -> Result<Composition> {
    if settings.environments.is_empty() {
        return Err(Error::NoEnvironments);
    }

    let edge_envs = if settings.edge_enabled {
        // fail before declaring anything when the certificate is missing
        ctx.edge_certificate()?;
        settings.environments.iter()
            .map(|env| edge_descriptor(env, &settings.edge_record_prefix))
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![]
    };

    let mut claims = NameClaims::default();
    for env in settings.environments.iter() {
        claims.claim(ctx.hosted_zone.fqdn(&env.record_name), format!("environment {}", env.record_name))?;
    }
    for (env, edge_env) in settings.environments.iter().zip(edge_envs.iter()) {
        claims.claim(ctx.hosted_zone.fqdn(&edge_env.record_name), format!("edge of environment {}", env.record_name))?;
    }

    let mut template = Template::new(settings.description.as_str());
    let mut endpoints = vec![];
    for env in settings.environments.iter() {
        endpoints.push(provision(ctx, env, &mut template)?);
    }
    let mut distributions = vec![];
    for (endpoint, edge_env) in endpoints.iter().zip(edge_envs.iter()) {
        distributions.push(provision_edge(ctx, edge_env, endpoint, &mut template)?);
    }

    info!(
        endpoints = endpoints.len(),
        distributions = distributions.len(),
        resources = template.resources.len(),
        "composed stack"
    );
    Ok(Composition { template, endpoints, distributions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DEFAULT_REGION;
    use crate::resources::{DISTRIBUTION_TYPE, RECORD_SET_TYPE, REST_API_TYPE};

    fn ctx() -> ProvisioningContext {
        ProvisioningContext::new("Z1", "example.com", "arn:cert:1", DEFAULT_REGION).unwrap()
    }

    fn edge_ctx() -> ProvisioningContext {
        ctx().with_edge_certificate("arn:aws:acm:us-east-1:1:certificate/edge").unwrap()
    }

    #[test]
    fn defaults_yield_current_and_pilot_without_edge() {
        let composition = compose(&ctx(), &ComposeSettings::default()).unwrap();
        let names: Vec<_> = composition.endpoints.iter().map(|e| e.record_name.as_str()).collect();
        assert_eq!(names, ["current", "pilot"]);
        assert!(composition.distributions.is_empty());
        assert_eq!(composition.template.resources_of_type(DISTRIBUTION_TYPE).count(), 0);
        assert_eq!(composition.template.resources_of_type(REST_API_TYPE).count(), 2);
        assert_eq!(composition.dns_names(), ["current.example.com", "pilot.example.com"]);
    }

    #[test]
    fn edge_layer_adds_prefixed_records() {
        let settings = ComposeSettings { edge_enabled: true, ..Default::default() };
        let composition = compose(&edge_ctx(), &settings).unwrap();
        assert_eq!(composition.distributions.len(), 2);
        assert_eq!(composition.dns_names(), [
            "current.example.com",
            "pilot.example.com",
            "cloudfront-current.example.com",
            "cloudfront-pilot.example.com",
        ]);
        assert_eq!(composition.template.resources_of_type(DISTRIBUTION_TYPE).count(), 2);
    }

    #[test]
    fn empty_edge_prefix_is_a_collision() {
        let settings = ComposeSettings { edge_enabled: true, edge_record_prefix: "".into(), ..Default::default() };
        match compose(&edge_ctx(), &settings) {
            Err(Error::RecordCollision { name, first, second }) => {
                assert_eq!(name, "current.example.com");
                assert_eq!(first, "environment current");
                assert_eq!(second, "edge of environment current");
            }
            x => panic!("expected a collision, got {:?}", x.map(|c| c.dns_names().len())),
        }
    }

    #[test]
    fn duplicate_record_names_are_rejected() {
        let settings = ComposeSettings {
            environments: vec![
                EnvironmentDescriptor::new("a", "current").unwrap(),
                EnvironmentDescriptor::new("b", "current").unwrap(),
            ],
            ..Default::default()
        };
        assert!(matches!(compose(&ctx(), &settings), Err(Error::RecordCollision { .. })));
    }

    #[test]
    fn edge_prefix_can_collide_with_another_environment() {
        let settings = ComposeSettings {
            environments: vec![
                EnvironmentDescriptor::new("a", "current").unwrap(),
                EnvironmentDescriptor::new("b", "edge-current").unwrap(),
            ],
            edge_enabled: true,
            edge_record_prefix: "edge-".into(),
            ..Default::default()
        };
        assert!(matches!(compose(&edge_ctx(), &settings), Err(Error::RecordCollision { .. })));
    }

    #[test]
    fn separators_keep_environments_apart() {
        let settings = ComposeSettings {
            environments: vec![
                EnvironmentDescriptor::new("dash", "blue-green").unwrap(),
                EnvironmentDescriptor::new("dot", "blue.green").unwrap(),
            ],
            ..Default::default()
        };
        let composition = compose(&ctx(), &settings).unwrap();
        assert_eq!(composition.dns_names(), ["blue-green.example.com", "blue.green.example.com"]);
        assert_ne!(composition.endpoints[0].api_resource, composition.endpoints[1].api_resource);
        assert_eq!(composition.template.resources_of_type(REST_API_TYPE).count(), 2);
    }

    #[test]
    fn direct_ids_never_meet_edge_ids() {
        let settings = ComposeSettings {
            environments: vec![
                EnvironmentDescriptor::new("a", "current").unwrap(),
                EnvironmentDescriptor::new("b", "cloudfront-current-distribution").unwrap(),
            ],
            edge_enabled: true,
            ..Default::default()
        };
        let composition = compose(&edge_ctx(), &settings).unwrap();
        assert_eq!(composition.distributions.len(), 2);
        let records: Vec<_> = composition.endpoints.iter().map(|e| e.record_resource.as_str())
            .chain(composition.distributions.iter().map(|d| d.record_resource.as_str()))
            .collect();
        for (i, a) in records.iter().enumerate() {
            assert!(!records[i + 1..].contains(a), "{a} declared twice");
        }
        assert_eq!(composition.template.resources_of_type(RECORD_SET_TYPE).count(), 4);
    }

    #[test]
    fn edge_without_certificate_fails_early() {
        let settings = ComposeSettings { edge_enabled: true, ..Default::default() };
        assert!(matches!(compose(&ctx(), &settings), Err(Error::MissingEdgeCertificate)));
    }

    #[test]
    fn nothing_to_compose() {
        let settings = ComposeSettings { environments: vec![], ..Default::default() };
        assert!(matches!(compose(&ctx(), &settings), Err(Error::NoEnvironments)));
    }

    #[test]
    fn a_third_environment_is_one_more_descriptor() {
        let mut settings = ComposeSettings::default();
        settings.environments.push(EnvironmentDescriptor::new("canary", "canary").unwrap());
        let composition = compose(&ctx(), &settings).unwrap();
        assert_eq!(composition.endpoints.len(), 3);
        assert_eq!(composition.endpoints[2].invoke("GET", "/message").unwrap().body, r#"{"message":"canary"}"#);
    }
}
