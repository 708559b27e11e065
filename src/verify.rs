use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::provision::{Composition, MESSAGE_PATH};

/// one request to make against a deployed stack, and what it must answer.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointCheck {
    pub url: String,
    pub expected_body: Value,
}

/// the checks of every DNS name a composition answers on. The edge records
/// serve the same message as the endpoint they front.
pub fn checks_for(composition: &Composition) -> Vec<EndpointCheck> {
    let mut checks = vec![];
    for endpoint in composition.endpoints.iter() {
        let expected_body = json!({ "message": endpoint.handler.message });
        checks.push(EndpointCheck { url: endpoint.url(MESSAGE_PATH), expected_body: expected_body.clone() });
        let fronting = composition.distributions.iter().filter(|d| d.origin_record_name == endpoint.record_name);
        for dist in fronting {
            checks.push(EndpointCheck {
                url: format!("https://{}{MESSAGE_PATH}", dist.domain_name),
                expected_body: expected_body.clone(),
            });
        }
    }
    checks
}

pub fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// requests `check.url` and compares the answer.
pub fn check_endpoint(agent: &ureq::Agent, check: &EndpointCheck) -> Result<()> {
    let resp = match agent.get(&check.url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(status, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            return Err(endpoint_error(check, format!("status {status}, body {body:?}")));
        }
        Err(e) => return Err(endpoint_error(check, e.to_string())),
    };
    let status = resp.status();
    let content_type = resp.header("content-type").unwrap_or_default().to_string();
    let body = resp.into_string().map_err(|e| endpoint_error(check, e.to_string()))?;
    check_response(check, status, &content_type, &body)?;
    info!(url = check.url.as_str(), "endpoint answers as expected");
    Ok(())
}

/// runs every check, returns how many failed. Failures are logged.
pub fn check_all(agent: &ureq::Agent, checks: &[EndpointCheck]) -> usize {
    checks.iter()
        .filter(|check| match check_endpoint(agent, check) {
            Ok(_) => false,
            Err(e) => {
                warn!(url = check.url.as_str(), "{e}");
                true
            }
        })
        .count()
}

pub fn check_response(check: &EndpointCheck, status: u16, content_type: &str, body: &str) -> Result<()> {
    if status != 200 {
        return Err(endpoint_error(check, format!("expected status 200, got {status}")));
    }
    if !content_type.to_ascii_lowercase().starts_with("application/json") {
        return Err(endpoint_error(check, format!("expected an application/json response, got {content_type:?}")));
    }
    let got: Value = serde_json::from_str(body)
        .map_err(|e| endpoint_error(check, format!("body {body:?} is not json: {e}")))?;
    if got != check.expected_body {
        return Err(endpoint_error(check, format!("expected body {}, got {}", check.expected_body, got)));
    }
    Ok(())
}

fn endpoint_error(check: &EndpointCheck, reason: String) -> Error {
    Error::EndpointCheck { url: check.url.clone(), reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ProvisioningContext, DEFAULT_REGION};
    use crate::provision::{compose, ComposeSettings};

    fn check() -> EndpointCheck {
        EndpointCheck { url: "https://current.example.com/message".into(), expected_body: json!({"message": "current"}) }
    }

    #[test]
    fn accepts_the_expected_answer() {
        assert!(check_response(&check(), 200, "application/json", r#"{"message":"current"}"#).is_ok());
        assert!(check_response(&check(), 200, "application/json; charset=utf-8", r#"{ "message": "current" }"#).is_ok());
    }

    #[test]
    fn rejects_wrong_answers() {
        assert!(check_response(&check(), 403, "application/json", r#"{"message":"current"}"#).is_err());
        assert!(check_response(&check(), 200, "text/html", r#"{"message":"current"}"#).is_err());
        assert!(check_response(&check(), 200, "application/json", r#"{"message":"pilot"}"#).is_err());
        match check_response(&check(), 200, "application/json", "nope") {
            Err(Error::EndpointCheck { url, .. }) => assert_eq!(url, "https://current.example.com/message"),
            x => panic!("expected an endpoint error, got {x:?}"),
        }
    }

    /// answers a single request with `status` and `body`, returns its url.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        use std::io::{Read, Write};
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let resp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len(),
            );
            stream.write_all(resp.as_bytes()).unwrap();
        });
        format!("http://{addr}/message")
    }

    #[test]
    fn checks_run_without_an_async_runtime() {
        let agent = make_agent(Duration::from_secs(5));
        let ok = EndpointCheck { url: serve_once("200 OK", r#"{"message":"current"}"#), ..check() };
        check_endpoint(&agent, &ok).unwrap();

        let unavailable = EndpointCheck { url: serve_once("503 Service Unavailable", r#"{"message":"down"}"#), ..check() };
        match check_endpoint(&agent, &unavailable) {
            Err(Error::EndpointCheck { reason, .. }) => assert!(reason.contains("503"), "{reason}"),
            x => panic!("expected an endpoint error, got {x:?}"),
        }
        assert_eq!(check_all(&agent, &[EndpointCheck { url: serve_once("200 OK", r#"{"message":"pilot"}"#), ..check() }]), 1);
    }

    #[test]
    fn one_check_per_dns_name() {
        let ctx = ProvisioningContext::new("Z1", "example.com", "arn:cert:1", DEFAULT_REGION)
            .unwrap()
            .with_edge_certificate("arn:aws:acm:us-east-1:1:certificate/edge")
            .unwrap();
        let settings = ComposeSettings { edge_enabled: true, ..Default::default() };
        let composition = compose(&ctx, &settings).unwrap();
        let checks = checks_for(&composition);
        let urls: Vec<_> = checks.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, [
            "https://current.example.com/message",
            "https://cloudfront-current.example.com/message",
            "https://pilot.example.com/message",
            "https://cloudfront-pilot.example.com/message",
        ]);
        assert_eq!(checks[1].expected_body, json!({"message": "current"}));
        assert_eq!(checks[3].expected_body, json!({"message": "pilot"}));
    }
}
