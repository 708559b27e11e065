use super::*;

pub const DEFAULT_STAGE_NAME: &str = "prod";
pub const REST_API_TYPE: &str = "AWS::ApiGateway::RestApi";
pub const METHOD_TYPE: &str = "AWS::ApiGateway::Method";
pub const STAGE_TYPE: &str = "AWS::ApiGateway::Stage";
pub const DOMAIN_NAME_TYPE: &str = "AWS::ApiGateway::DomainName";

/// API Gateway needs one account wide role to push execution logs.
/// Every API in the stack declares the same two resources, so they converge.
pub const CLOUDWATCH_ROLE_RESOURCE: &str = "ApiGatewayCloudWatchRole";
pub const ACCOUNT_RESOURCE: &str = "ApiGatewayAccount";

const VALID_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "ANY"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: String,
    /// absolute path, eg: `/message`
    pub path: String,
}

impl Route {
    pub fn new<S: AsRef<str>>(method: S, path: S) -> Self {
        Self { method: method.as_ref().to_ascii_uppercase(), path: path.as_ref().to_string() }
    }

    pub fn get<S: AsRef<str>>(path: S) -> Self {
        Self::new("GET", path.as_ref())
    }

    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    pub fn matches(&self, method: &str, path: &str) -> bool {
        (self.method == "ANY" || self.method.eq_ignore_ascii_case(method)) && self.path == path
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason| Error::InvalidRoute { method: self.method.clone(), path: self.path.clone(), reason };
        if !VALID_METHODS.contains(&self.method.as_str()) {
            return Err(invalid("Unsupported HTTP method"));
        }
        if !self.path.starts_with('/') {
            return Err(invalid("Path must start with '/'"));
        }
        if self.path.len() > 1 && (self.path.ends_with('/') || self.path.contains("//")) {
            return Err(invalid("Path segments must not be empty"));
        }
        let valid_segment = |s: &&str| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        if !self.segments().iter().all(valid_segment) {
            return Err(invalid("Path segments may only contain [A-Za-z0-9-_.]"));
        }
        Ok(())
    }

    /// logical id fragment, eg: `MessageGet`, or `RootGet` for `/`
    fn id_fragment(&self) -> String {
        let path = if self.segments().is_empty() { "Root".to_string() } else { pascal_case(&self.path) };
        format!("{path}{}", pascal_case(&self.method.to_ascii_lowercase()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingLevel {
    Off,
    Error,
    Info,
}

impl LoggingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggingLevel::Off => "OFF",
            LoggingLevel::Error => "ERROR",
            LoggingLevel::Info => "INFO",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageOptions {
    pub stage_name: String,
    pub logging_level: LoggingLevel,
    pub data_trace_enabled: bool,
    pub metrics_enabled: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            stage_name: DEFAULT_STAGE_NAME.into(),
            logging_level: LoggingLevel::Info,
            data_trace_enabled: true,
            metrics_enabled: true,
        }
    }
}

impl StageOptions {
    fn needs_cloudwatch_role(&self) -> bool {
        self.logging_level != LoggingLevel::Off || self.data_trace_enabled
    }
}

pub struct RestApi {
    /// logical id of the RestApi. Every other resource of this API is
    /// prefixed with it.
    pub resource_name: String,
    /// the physical name shown in the API Gateway console.
    pub api_name: String,
    /// logical id of the lambda function that backs every route.
    pub handler_resource: String,
    pub routes: Vec<Route>,
    pub stage: StageOptions,
}

/// logical ids of what `add_rest_api_resource` declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestApiRefs {
    pub api: String,
    pub deployment: String,
    pub stage: String,
    pub stage_name: String,
}

fn integration_uri(handler_resource: &str) -> Value {
    sub(&format!("arn:${{AWS::Partition}}:apigateway:${{AWS::Region}}:lambda:path/2015-03-31/functions/${{{handler_resource}.Arn}}/invocations"))
}

fn invoke_source_arn(api: &str, route: &Route) -> Value {
    let method = if route.method == "ANY" { "*" } else { route.method.as_str() };
    sub(&format!("arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{api}}}/*/{method}{}", route.path))
}

fn add_cloudwatch_account(template: &mut Template) -> Result<()> {
    let role = Resource::new("AWS::IAM::Role", json!({
        "AssumeRolePolicyDocument": {
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": "apigateway.amazonaws.com" },
                "Action": ["sts:AssumeRole"],
            }],
        },
        "ManagedPolicyArns": [
            sub("arn:${AWS::Partition}:iam::aws:policy/service-role/AmazonAPIGatewayPushToCloudWatchLogs"),
        ],
    }));
    let account = Resource::new("AWS::ApiGateway::Account", json!({
        "CloudWatchRoleArn": get_att(CLOUDWATCH_ROLE_RESOURCE, "Arn"),
    }));
    template.add_resource(CLOUDWATCH_ROLE_RESOURCE, role)?;
    template.add_resource(ACCOUNT_RESOURCE, account)
}

/// declares the api, one resource per path segment, one method + invoke
/// permission per route, a deployment and its stage.
pub fn add_rest_api_resource(template: &mut Template, conf: &RestApi) -> Result<RestApiRefs> {
    let api = conf.resource_name.as_str();
    if conf.routes.is_empty() {
        return Err(Error::InvalidRoute { method: "".into(), path: "".into(), reason: "A REST API needs at least one route" });
    }
    for (i, route) in conf.routes.iter().enumerate() {
        route.validate()?;
        if conf.routes[..i].iter().any(|r| r == route) {
            return Err(Error::InvalidRoute { method: route.method.clone(), path: route.path.clone(), reason: "Duplicate route" });
        }
    }

    template.add_resource(api, Resource::new(REST_API_TYPE, json!({
        "Name": conf.api_name,
        "EndpointConfiguration": { "Types": ["REGIONAL"] },
    })))?;

    let mut method_ids = vec![];
    let mut methods = vec![];
    for route in conf.routes.iter() {
        // walk the path, declaring every intermediate resource
        let mut parent = get_att(api, "RootResourceId");
        let mut prefix = String::new();
        for segment in route.segments() {
            prefix.push('/');
            prefix.push_str(segment);
            let resource_id = format!("{api}{}Resource", pascal_case(&prefix));
            template.add_resource(&resource_id, Resource::new("AWS::ApiGateway::Resource", json!({
                "RestApiId": r#ref(api),
                "ParentId": parent,
                "PathPart": segment,
            })))?;
            parent = r#ref(&resource_id);
        }

        let method_id = format!("{api}{}", route.id_fragment());
        let method = Resource::new(METHOD_TYPE, json!({
            "RestApiId": r#ref(api),
            "ResourceId": parent,
            "HttpMethod": route.method,
            "AuthorizationType": "NONE",
            "Integration": {
                "Type": "AWS_PROXY",
                "IntegrationHttpMethod": "POST",
                "Uri": integration_uri(&conf.handler_resource),
            },
        }));
        methods.push(method.properties.clone());
        template.add_resource(&method_id, method)?;
        template.add_resource(format!("{method_id}Permission"), Resource::new("AWS::Lambda::Permission", json!({
            "Action": "lambda:InvokeFunction",
            "FunctionName": get_att(&conf.handler_resource, "Arn"),
            "Principal": "apigateway.amazonaws.com",
            "SourceArn": invoke_source_arn(api, route),
        })))?;
        method_ids.push(method_id);
    }

    // a deployment is a snapshot of the methods. Its id carries a checksum of
    // them so that changing a route replaces the deployment.
    let checksum = adler::adler32_slice(serde_json::to_string(&methods)?.as_bytes());
    let deployment_id = format!("{api}Deployment{checksum:08x}");
    let mut deployment = Resource::new("AWS::ApiGateway::Deployment", json!({
        "RestApiId": r#ref(api),
        "Description": format!("Automatically created by envstack for {}", conf.api_name),
    }));
    for id in method_ids.iter() {
        deployment = deployment.depends_on(id);
    }
    template.add_resource(&deployment_id, deployment)?;

    let StageOptions { stage_name, logging_level, data_trace_enabled, metrics_enabled } = &conf.stage;
    let stage_id = format!("{api}Stage{}", pascal_case(stage_name));
    let mut stage = Resource::new(STAGE_TYPE, json!({
        "RestApiId": r#ref(api),
        "DeploymentId": r#ref(&deployment_id),
        "StageName": stage_name,
        "MethodSettings": [{
            "ResourcePath": "/*",
            "HttpMethod": "*",
            "LoggingLevel": logging_level.as_str(),
            "DataTraceEnabled": data_trace_enabled,
            "MetricsEnabled": metrics_enabled,
        }],
    }));
    if conf.stage.needs_cloudwatch_role() {
        add_cloudwatch_account(template)?;
        stage = stage.depends_on(ACCOUNT_RESOURCE);
    }
    template.add_resource(&stage_id, stage)?;

    Ok(RestApiRefs {
        api: api.to_string(),
        deployment: deployment_id,
        stage: stage_id,
        stage_name: stage_name.clone(),
    })
}

pub struct CustomDomain {
    pub resource_name: String,
    /// fully qualified, without the trailing dot. eg: `current.example.com`
    pub domain_name: String,
    pub certificate: CertificateRef,
}

/// declares a regional custom domain and maps its root path to the stage of `api`.
/// Returns the logical id of the domain.
pub fn add_custom_domain_resource(template: &mut Template, conf: &CustomDomain, api: &RestApiRefs) -> Result<String> {
    let domain_id = conf.resource_name.as_str();
    template.add_resource(domain_id, Resource::new(DOMAIN_NAME_TYPE, json!({
        "DomainName": conf.domain_name,
        "RegionalCertificateArn": conf.certificate.arn,
        "EndpointConfiguration": { "Types": ["REGIONAL"] },
        "SecurityPolicy": "TLS_1_2",
    })))?;
    template.add_resource(format!("{domain_id}Mapping"), Resource::new("AWS::ApiGateway::BasePathMapping", json!({
        "DomainName": r#ref(domain_id),
        "RestApiId": r#ref(&api.api),
        "Stage": r#ref(&api.stage),
    })))?;
    Ok(domain_id.to_string())
}
