use std::collections::HashMap;
use std::time::Duration;

use aws_sdk_cloudformation::{self, types::{Stack, StackStatus, Capability, OnFailure}};
use tracing::{debug, info};

pub use aws_sdk_cloudformation::Client;

/// how long to sleep between two describe calls while a stack operation is running.
pub const POLL_INTERVAL: Duration = Duration::from_millis(700);

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("Stack {0} not found")]
    NotFound(String),
    #[error("Stack {name} failed: {reason}")]
    Failed { name: String, reason: String },
    #[error("CloudFormation request for stack {name} failed\n{details}")]
    Request { name: String, details: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackProgress {
    Done,
    InProgress,
    Failed,
}

pub fn progress_of(status: &StackStatus) -> StackProgress {
    match status {
        // done and return success:
        StackStatus::DeleteComplete |
        StackStatus::CreateComplete |
        StackStatus::UpdateComplete |
        StackStatus::UpdateRollbackComplete |
        StackStatus::ImportComplete |
        StackStatus::ImportRollbackComplete => StackProgress::Done,

        // keep trying
        StackStatus::CreateInProgress |
        StackStatus::DeleteInProgress |
        StackStatus::ImportInProgress |
        StackStatus::ImportRollbackInProgress |
        StackStatus::ReviewInProgress |
        StackStatus::RollbackInProgress |
        StackStatus::UpdateCompleteCleanupInProgress |
        StackStatus::UpdateInProgress |
        StackStatus::UpdateRollbackCompleteCleanupInProgress |
        StackStatus::UpdateRollbackInProgress => StackProgress::InProgress,

        // RollbackComplete, CreateFailed, DeleteFailed, RollbackFailed, UpdateFailed, ...
        _ => StackProgress::Failed,
    }
}

pub async fn make_client(region: &str) -> Client {
    let region = aws_sdk_cloudformation::config::Region::new(region.to_string());
    let shared_config = aws_config::from_env().region(region).load().await;
    Client::new(&shared_config)
}

/// creates the stack if it does not exist yet, otherwise updates it. Then waits
/// until CloudFormation reports a terminal status and returns the stack outputs.
pub async fn deploy_stack(client: &Client, name: &str, template_body: &str) -> Result<HashMap<String, String>, DeployError> {
    info!(stack = name, "deploying stack");
    create_or_update_stack(client, name, template_body).await?;
    wait_for_output(client, name).await
}

pub async fn does_stack_exist(client: &Client, name: &str) -> Result<bool, DeployError> {
    match client.describe_stacks().stack_name(name).send().await {
        Ok(_) => Ok(true),
        Err(e) => {
            let e_str = format!("{:#?}", e);
            if e_str.contains("does not exist") {
                return Ok(false);
            }
            Err(DeployError::Request { name: name.to_string(), details: e_str })
        }
    }
}

/// returns None while the stack is still in progress.
pub async fn describe_stack(client: &Client, name: &str) -> Result<Option<Stack>, DeployError> {
    let resp = client.describe_stacks().stack_name(name).send().await
        .map_err(|e| DeployError::Request { name: name.to_string(), details: format!("{:#?}", e) })?;
    let first = resp.stacks()
        .and_then(|stacks| stacks.first())
        .ok_or_else(|| DeployError::NotFound(name.to_string()))?;
    let status = first.stack_status().ok_or_else(|| DeployError::NotFound(name.to_string()))?;
    debug!(stack = name, status = status.as_str(), "stack status");
    match progress_of(status) {
        StackProgress::Done => Ok(Some(first.clone())),
        StackProgress::InProgress => Ok(None),
        StackProgress::Failed => Err(DeployError::Failed {
            name: name.to_string(),
            reason: first.stack_status_reason().unwrap_or("Failed to get stack failure reason").to_string(),
        }),
    }
}

pub async fn wait_for_output(client: &Client, name: &str) -> Result<HashMap<String, String>, DeployError> {
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let stack = match describe_stack(client, name).await? {
            Some(stack) => stack,
            None => continue,
        };
        let mut out = HashMap::new();
        for output in stack.outputs().unwrap_or_default() {
            if let (Some(key), Some(val)) = (output.output_key(), output.output_value()) {
                out.insert(key.to_string(), val.to_string());
            }
        }
        info!(stack = name, outputs = out.len(), "stack is ready");
        return Ok(out);
    }
}

pub async fn create_or_update_stack(client: &Client, name: &str, body: &str) -> Result<(), DeployError> {
    let exists = does_stack_exist(client, name).await?;
    if exists {
        info!(stack = name, "updating stack");
        let res = client
            .update_stack()
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityIam)
            .stack_name(name)
            .template_body(body)
            .send()
            .await;
        if let Err(e) = res {
            let e_str = format!("{:#?}", e);
            if e_str.contains("No updates are to be performed") {
                info!(stack = name, "stack is already up to date");
                return Ok(())
            }
            return Err(DeployError::Request { name: name.to_string(), details: e_str })
        }
    } else {
        info!(stack = name, "creating stack");
        client
            .create_stack()
            .on_failure(OnFailure::Delete)
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityIam)
            .stack_name(name)
            .template_body(body)
            .send()
            .await
            .map_err(|e| DeployError::Request { name: name.to_string(), details: format!("{:#?}", e) })?;
    }
    Ok(())
}
