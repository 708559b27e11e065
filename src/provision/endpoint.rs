use tracing::info;

use crate::context::ProvisioningContext;
use crate::descriptor::EnvironmentDescriptor;
use crate::resources::*;

pub const MESSAGE_PATH: &str = "/message";

/// what one provisioned environment exposes to the rest of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub record_name: String,
    /// `{"Ref": <api>}`, resolves to the REST API id at deploy time.
    pub api_identifier: Value,
    pub stage_name: String,
    /// fully qualified, eg: `current.example.com`
    pub domain_name: String,
    pub routes: Vec<Route>,
    pub handler: StaticMessageHandler,
    /// logical ids, in case other resources need to reference them.
    pub api_resource: String,
    pub domain_resource: String,
    pub record_resource: String,
}

impl Endpoint {
    pub fn url(&self, path: &str) -> String {
        format!("https://{}{path}", self.domain_name)
    }

    /// what the endpoint answers for a request, without deploying anything.
    /// None means the API has no such route.
    pub fn invoke(&self, method: &str, path: &str) -> Option<HandlerResponse> {
        self.routes.iter()
            .any(|r| r.matches(method, path))
            .then(|| self.handler.invoke())
    }
}

/// declares handler, REST API, stage, custom domain and alias record of one
/// environment. Logical ids derive from the record name only, so declaring the
/// same environment twice yields the same graph.
pub fn provision(ctx: &ProvisioningContext, env: &EnvironmentDescriptor, template: &mut Template) -> Result<Endpoint> {
    let prefix = env.logical_prefix();
    let domain_name = ctx.hosted_zone.fqdn(&env.record_name);
    info!(record = env.record_name.as_str(), domain = domain_name.as_str(), "provisioning endpoint");

    let handler = StaticMessageHandler::new(env.message.as_str());
    let mut function = LambdaFunction::new(format!("{prefix}Handler"), handler.clone());
    function.description = format!("Answers {MESSAGE_PATH} for {domain_name}");
    let handler_resource = add_lambda_resource(template, &function)?;

    let routes = vec![Route::get(MESSAGE_PATH)];
    let api = RestApi {
        resource_name: format!("{prefix}Api"),
        api_name: env.api_name(),
        handler_resource,
        routes: routes.clone(),
        stage: StageOptions::default(),
    };
    let api_refs = add_rest_api_resource(template, &api)?;

    let domain = CustomDomain {
        resource_name: format!("{prefix}DomainName"),
        domain_name: domain_name.clone(),
        certificate: ctx.certificate.clone(),
    };
    let domain_resource = add_custom_domain_resource(template, &domain, &api_refs)?;

    let record = Route53RecordSet::alias_a(
        format!("{prefix}Record"),
        domain_name.clone(),
        &ctx.hosted_zone,
        AliasTarget::api_gateway_domain(&domain_resource),
    );
    let record_resource = add_route53_resource(template, &record)?;

    template.add_output(&format!("{prefix}MessageUrl"), &format!("GET {MESSAGE_PATH} of the {} environment", env.record_name), json!(format!("https://{domain_name}{MESSAGE_PATH}")))?;
    template.add_output(&format!("{prefix}ApiId"), &format!("REST API id of the {} environment", env.record_name), r#ref(&api_refs.api))?;

    Ok(Endpoint {
        record_name: env.record_name.clone(),
        api_identifier: r#ref(&api_refs.api),
        stage_name: api_refs.stage_name,
        domain_name,
        routes,
        handler,
        api_resource: api_refs.api,
        domain_resource,
        record_resource,
    })
}
