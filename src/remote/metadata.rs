//! Instance metadata service client
//!
//! Managed hosts learn their cloud account id and region from the
//! link-local instance metadata service. The exchange is two-step: PUT for a
//! short-lived session token, then GET the instance identity document with
//! that token attached. Both hops run with a 1-second timeout and a timeout
//! surfaces as an error. The caller decides whether to abort; this client
//! never silently defaults.

use crate::domain::{Result, StrataError};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://169.254.169.254";
const TOKEN_PATH: &str = "/latest/api/token";
const IDENTITY_DOCUMENT_PATH: &str = "/2016-09-02/dynamic/instance-identity/document";
const TOKEN_TTL_SECONDS: &str = "60";
const HOP_TIMEOUT: Duration = Duration::from_secs(1);

/// The subset of the instance identity document the library needs
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InstanceIdentity {
    /// Cloud region of the current host
    pub region: String,

    /// Cloud account id of the current host
    #[serde(rename = "accountId")]
    pub account_id: String,
}

/// Metadata service seam
pub trait MetadataService: Send + Sync {
    /// Fetch the instance identity document for the current host
    fn identity_document(&self) -> Result<InstanceIdentity>;
}

/// HTTP client for the link-local metadata endpoint
pub struct Imds {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl Imds {
    /// Client against the standard link-local address
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an explicit base URL (used by tests against a mock)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(HOP_TIMEOUT)
            .timeout(HOP_TIMEOUT)
            .build()
            .expect("metadata HTTP client construction is infallible with static options");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn session_token(&self) -> Result<String> {
        let response = self
            .client
            .put(format!("{}{}", self.base_url, TOKEN_PATH))
            .header("X-aws-ec2-metadata-token-ttl-seconds", TOKEN_TTL_SECONDS)
            .send()
            .map_err(|e| StrataError::Metadata(format!("token request failed: {e}")))?;

        let token = response
            .error_for_status()
            .map_err(|e| StrataError::Metadata(format!("token request failed: {e}")))?
            .text()
            .map_err(|e| StrataError::Metadata(format!("token response unreadable: {e}")))?;

        Ok(token.trim_end().to_string())
    }
}

impl Default for Imds {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataService for Imds {
    fn identity_document(&self) -> Result<InstanceIdentity> {
        let token = self.session_token()?;

        let response = self
            .client
            .get(format!("{}{}", self.base_url, IDENTITY_DOCUMENT_PATH))
            .header("X-aws-ec2-metadata-token", token)
            .send()
            .map_err(|e| StrataError::Metadata(format!("identity document request failed: {e}")))?;

        response
            .error_for_status()
            .map_err(|e| StrataError::Metadata(format!("identity document request failed: {e}")))?
            .json::<InstanceIdentity>()
            .map_err(|e| StrataError::Metadata(format!("identity document malformed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_token(server: &mut mockito::ServerGuard, token: &str) -> mockito::Mock {
        server
            .mock("PUT", TOKEN_PATH)
            .match_header("X-aws-ec2-metadata-token-ttl-seconds", TOKEN_TTL_SECONDS)
            .with_body(token)
            .create()
    }

    #[test]
    fn test_identity_document_two_step_exchange() {
        let mut server = mockito::Server::new();
        let token_mock = stub_token(&mut server, "session-token\n");
        let document_mock = server
            .mock("GET", IDENTITY_DOCUMENT_PATH)
            .match_header("X-aws-ec2-metadata-token", "session-token")
            .with_body(r#"{"region": "us-west-1", "accountId": "12345"}"#)
            .create();

        let identity = Imds::with_base_url(server.url()).identity_document().unwrap();

        assert_eq!(
            identity,
            InstanceIdentity {
                region: "us-west-1".to_string(),
                account_id: "12345".to_string(),
            }
        );
        token_mock.assert();
        document_mock.assert();
    }

    #[test]
    fn test_unreachable_endpoint_is_metadata_error() {
        // Reserved TEST-NET-1 address; connect fails fast
        let imds = Imds::with_base_url("http://192.0.2.1:1");
        let err = imds.identity_document().unwrap_err();
        assert!(matches!(err, StrataError::Metadata(_)));
    }

    #[test]
    fn test_malformed_document_is_metadata_error() {
        let mut server = mockito::Server::new();
        let _token = stub_token(&mut server, "t");
        let _document = server
            .mock("GET", IDENTITY_DOCUMENT_PATH)
            .with_body("not json")
            .create();

        let err = Imds::with_base_url(server.url())
            .identity_document()
            .unwrap_err();
        assert!(matches!(err, StrataError::Metadata(_)));
    }

    #[test]
    fn test_error_status_on_token_is_metadata_error() {
        let mut server = mockito::Server::new();
        let _token = server.mock("PUT", TOKEN_PATH).with_status(403).create();

        let err = Imds::with_base_url(server.url())
            .identity_document()
            .unwrap_err();
        assert!(matches!(err, StrataError::Metadata(_)));
    }
}
