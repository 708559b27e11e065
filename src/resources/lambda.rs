use super::*;

pub const LAMBDA_FUNCTION_TYPE: &str = "AWS::Lambda::Function";
pub const BASIC_EXECUTION_POLICY: &str = "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// what a handler hands back to API Gateway through the proxy integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// a handler that takes no input and always answers 200 with `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMessageHandler {
    pub message: String,
}

impl StaticMessageHandler {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }

    pub fn body(&self) -> String {
        json!({ "message": self.message }).to_string()
    }

    pub fn invoke(&self) -> HandlerResponse {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        HandlerResponse { status_code: 200, headers, body: self.body() }
    }

    /// the inline nodejs source deployed for this handler. The response is
    /// rendered here and embedded as JSON, so the deployed function returns
    /// byte for byte what `invoke` returns.
    pub fn inline_source(&self) -> Result<String> {
        let response = serde_json::to_string(&self.invoke())?;
        Ok(format!("exports.handler = async function(event) {{\n  return {response};\n}};\n"))
    }
}

pub struct LambdaFunction {
    /// logical name of the resource referenced in cloudformation.
    /// the execution role is named `{resource_name}ExecutionRole`.
    pub resource_name: String,
    pub description: String,
    /// in MB. Valid values: 128 - 10240
    pub memory: u32,
    /// in seconds. Valid values: 1 - 900
    pub timeout: u32,
    pub runtime: String,
    pub handler: StaticMessageHandler,
}

impl LambdaFunction {
    pub fn new<S: Into<String>>(resource_name: S, handler: StaticMessageHandler) -> Self {
        Self {
            resource_name: resource_name.into(),
            description: Default::default(),
            memory: 128,
            timeout: 30,
            runtime: "nodejs18.x".into(),
            handler,
        }
    }

    pub fn role_resource_name(&self) -> String {
        format!("{}ExecutionRole", self.resource_name)
    }

    pub fn is_valid(&self) -> Option<String> {
        if self.memory < 128 || self.memory > 10240 {
            return Some(format!("Invalid memory size {:?}\nMust be between 128 and 10240", self.memory));
        }
        if self.timeout < 1 || self.timeout > 900 {
            return Some(format!("Invalid timeout {:?}\nMust be between 1 and 900", self.timeout));
        }
        None
    }
}

/// declares the function and its execution role. Returns the logical id of the function.
pub fn add_lambda_resource(template: &mut Template, conf: &LambdaFunction) -> Result<String> {
    if let Some(reason) = conf.is_valid() {
        return Err(Error::InvalidLambda { name: conf.resource_name.clone(), reason });
    }
    let resource_name = conf.resource_name.as_str();
    let role_resource_name = conf.role_resource_name();
    let role = Resource::new("AWS::IAM::Role", json!({
        "AssumeRolePolicyDocument": {
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": "lambda.amazonaws.com" },
                "Action": ["sts:AssumeRole"],
            }],
        },
        "ManagedPolicyArns": [BASIC_EXECUTION_POLICY],
    }));
    let mut properties = json!({
        "Runtime": conf.runtime,
        "Handler": "index.handler",
        "Code": { "ZipFile": conf.handler.inline_source()? },
        "MemorySize": conf.memory,
        "Timeout": conf.timeout,
        "Role": get_att(&role_resource_name, "Arn"),
    });
    if !conf.description.is_empty() {
        properties["Description"] = json!(conf.description);
    }
    let function = Resource::new(LAMBDA_FUNCTION_TYPE, properties).depends_on(&role_resource_name);
    template.add_resource(&role_resource_name, role)?;
    template.add_resource(resource_name, function)?;
    Ok(resource_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_returns_message_as_json() {
        let resp = StaticMessageHandler::new("current").invoke();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, r#"{"message":"current"}"#);
        assert_eq!(resp.headers.get("Content-Type").map(String::as_str), Some("application/json"));
    }

    #[test]
    fn inline_source_escapes_message() {
        let handler = StaticMessageHandler::new("it's \"quoted\"");
        let src = handler.inline_source().unwrap();
        assert!(src.starts_with("exports.handler = async function(event)"));
        // the embedded response must round trip to exactly what invoke() returns
        let embedded = src.split("return ").nth(1).unwrap().split(";\n}").next().unwrap();
        let parsed: HandlerResponse = serde_json::from_str(embedded).unwrap();
        assert_eq!(parsed, handler.invoke());
    }

    #[test]
    fn declares_function_and_role() {
        let mut t = Template::default();
        let conf = LambdaFunction::new("CurrentHandler", StaticMessageHandler::new("current"));
        let id = add_lambda_resource(&mut t, &conf).unwrap();
        assert_eq!(id, "CurrentHandler");
        let f = t.resource("CurrentHandler").unwrap();
        assert_eq!(f.ty, LAMBDA_FUNCTION_TYPE);
        assert_eq!(f.properties["Role"], get_att("CurrentHandlerExecutionRole", "Arn"));
        assert_eq!(f.properties["MemorySize"], 128);
        assert!(t.resource("CurrentHandlerExecutionRole").is_some());
    }

    #[test]
    fn rejects_out_of_range_settings() {
        let mut t = Template::default();
        let mut conf = LambdaFunction::new("Fn", StaticMessageHandler::new("x"));
        conf.timeout = 0;
        assert!(matches!(add_lambda_resource(&mut t, &conf), Err(Error::InvalidLambda { .. })));
        conf.timeout = 30;
        conf.memory = 64;
        assert!(matches!(add_lambda_resource(&mut t, &conf), Err(Error::InvalidLambda { .. })));
        assert!(t.resources.is_empty());
    }
}
