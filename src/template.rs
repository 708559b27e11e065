use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, Result};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(ty: &str, properties: Value) -> Self {
        Self { ty: ty.to_string(), properties, depends_on: vec![] }
    }

    pub fn depends_on<S: AsRef<str>>(mut self, logical_id: S) -> Self {
        self.depends_on.push(logical_id.as_ref().to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOutput {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Value")]
    pub value: Value,
}

/// the whole declared graph. Keys are sorted so that declaring the same
/// environments always serializes to the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, ResourceOutput>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: None,
            resources: Default::default(),
            outputs: Default::default(),
        }
    }
}

impl Template {
    pub fn new<S: Into<String>>(description: S) -> Self {
        Self { description: Some(description.into()), ..Default::default() }
    }

    /// declares a resource under `logical_id`. Declaring the exact same resource
    /// twice converges to a single entry, a different definition under an
    /// existing id is rejected.
    pub fn add_resource<S: AsRef<str>>(&mut self, logical_id: S, resource: Resource) -> Result<()> {
        let logical_id = logical_id.as_ref();
        verify_logical_id(logical_id)?;
        if let Some(existing) = self.resources.get(logical_id) {
            if *existing == resource {
                debug!(logical_id, "resource already declared");
                return Ok(());
            }
            return Err(Error::ConflictingResource(logical_id.to_string()));
        }
        debug!(logical_id, ty = resource.ty.as_str(), "declared resource");
        self.resources.insert(logical_id.to_string(), resource);
        Ok(())
    }

    pub fn add_output(&mut self, logical_id: &str, description: &str, value: Value) -> Result<()> {
        verify_logical_id(logical_id)?;
        let output = ResourceOutput { description: description.to_string(), value };
        match self.outputs.get(logical_id) {
            Some(existing) if *existing != output => Err(Error::ConflictingResource(logical_id.to_string())),
            _ => {
                self.outputs.insert(logical_id.to_string(), output);
                Ok(())
            }
        }
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources_of_type<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.ty == ty)
    }

    /// we make it pretty so if a user needs to look at the stack in the Cfn console, it looks nice
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn verify_logical_id(resource_name: &str) -> Result<()> {
    let reason = if resource_name.len() > 255 {
        "must be less than 255 characters"
    } else if resource_name.is_empty() {
        "Must contain at least 1 character"
    } else if !resource_name.chars().all(|c| c.is_ascii_alphanumeric()) {
        "Must contain only alphanumeric characters [A-Za-z0-9]"
    } else {
        return Ok(());
    };
    Err(Error::InvalidLogicalId { name: resource_name.to_string(), reason })
}

// A stack name can contain only alphanumeric characters (case sensitive) and hyphens.
// It must start with an alphabetical character and can't be longer than 128 characters.
pub fn validate_stack_name(stack_name: &str) -> Result<String> {
    let starts_alpha = stack_name.chars().next().map_or(false, |c| c.is_ascii_alphabetic());
    let valid_chars = stack_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !starts_alpha || !valid_chars || stack_name.len() > 128 {
        return Err(Error::InvalidStackName(stack_name.to_string()));
    }
    Ok(stack_name.to_string())
}

/// turns an arbitrary name like `cloudfront-current` into a logical id
/// fragment like `CloudfrontCurrent`.
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn r#ref(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}
