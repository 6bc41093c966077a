//! Groups.io HTTP backend.
//!
//! This module provides the [`HttpApi`] implementation of [`Api`] on top of a
//! blocking `ureq` agent. The agent keeps the session cookie set by `login`,
//! so every later call on the same backend is authenticated.
//!
//! Groups.io reports failures in the JSON body (often with a 4xx status), so
//! the agent is configured not to turn status codes into transport errors.

use crate::backend::Api;
use crate::error::{Error, Result};
use crate::response::decode;
use crate::types::{LoginResponse, LoginUser, Page, RemoteMember, Subgroup};
use serde::de::DeserializeOwned;
use ureq::Body;
use ureq::http::Response;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://groups.io/api/v1";

/// Page size requested from listing endpoints.
const PAGE_LIMIT: &str = "100";

/// Groups.io backend over HTTPS.
pub struct HttpApi {
    /// HTTP agent holding the session cookie.
    agent: ureq::Agent,
    /// API base URL.
    api_base: String,
}

impl HttpApi {
    /// Create a backend against the public API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    /// Create a backend with a custom API base (for testing).
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build the URL for an endpoint.
    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base, endpoint)
    }

    /// Read and decode a response body.
    fn read<T: DeserializeOwned>(mut response: Response<Body>) -> Result<T> {
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        decode(status, &body)
    }
}

impl Default for HttpApi {
    fn default() -> Self {
        Self::new()
    }
}

impl Api for HttpApi {
    fn login(&self, email: &str, password: &str) -> Result<LoginUser> {
        let response = self
            .agent
            .post(&self.endpoint_url("login"))
            .send_form([("email", email), ("password", password)])?;

        let login: LoginResponse = Self::read(response)?;
        login
            .user
            .ok_or_else(|| Error::Authentication("response did not contain a user".to_string()))
    }

    fn get_subgroups(&self, group_name: &str, page_token: u64) -> Result<Page<Subgroup>> {
        let response = self
            .agent
            .post(&self.endpoint_url("getsubgroups"))
            .query("group_name", group_name)
            .query("limit", PAGE_LIMIT)
            .query("page_token", page_token.to_string())
            .send_empty()?;

        Self::read(response)
    }

    fn get_members(&self, group_name: &str, page_token: u64) -> Result<Page<RemoteMember>> {
        let response = self
            .agent
            .post(&self.endpoint_url("getmembers"))
            .query("group_name", group_name)
            .query("limit", PAGE_LIMIT)
            .query("page_token", page_token.to_string())
            .send_empty()?;

        Self::read(response)
    }

    fn direct_add(
        &self,
        group_name: &str,
        subgroup_name: &str,
        emails: &str,
        csrf: &str,
    ) -> Result<()> {
        let response = self
            .agent
            .post(&self.endpoint_url("directadd"))
            .query("group_name", group_name)
            .query("subgroupnames", subgroup_name)
            .query("emails", emails)
            .query("csrf", csrf)
            .send_empty()?;

        let _: serde_json::Value = Self::read(response)?;
        Ok(())
    }

    fn bulk_remove_members(&self, group_name: &str, emails: &str, csrf: &str) -> Result<()> {
        let response = self
            .agent
            .post(&self.endpoint_url("bulkremovemembers"))
            .query("group_name", group_name)
            .query("emails", emails)
            .query("csrf", csrf)
            .send_empty()?;

        let _: serde_json::Value = Self::read(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let backend = HttpApi::new();
        assert_eq!(
            backend.endpoint_url("getmembers"),
            "https://groups.io/api/v1/getmembers"
        );
    }

    #[test]
    fn test_custom_api_base() {
        let backend = HttpApi::with_api_base("http://localhost:8080/api/v1/");
        assert_eq!(backend.api_base(), "http://localhost:8080/api/v1");
        assert_eq!(
            backend.endpoint_url("login"),
            "http://localhost:8080/api/v1/login"
        );
    }

    #[test]
    fn test_default_impl() {
        let backend = HttpApi::default();
        assert_eq!(backend.api_base(), DEFAULT_API_BASE);
    }
}
