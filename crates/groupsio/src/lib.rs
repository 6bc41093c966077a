//! # groupsio
//!
//! Blocking client for the parts of the Groups.io v1 API needed to manage
//! subgroup membership.
//!
//! This crate provides functionality for:
//! - Logging in and keeping the session cookie and CSRF token
//! - Listing subgroups and members, following page tokens to the end
//! - Splitting members into ordinary members and moderators/admins
//! - Adding members one at a time and removing them in bulk
//!
//! ## Example
//!
//! ```no_run
//! use groupsio::Client;
//!
//! let mut client = Client::new();
//! client.login("bot@example.org", "secret").expect("login failed");
//!
//! let membership = client.membership("example+docs").expect("listing failed");
//! println!(
//!     "{} members, {} moderators",
//!     membership.members.len(),
//!     membership.moderators.len()
//! );
//! ```
//!
//! ## Pagination
//!
//! Listing endpoints return a `next_page_token`; `0` marks the final page.
//! [`pagination::fetch_all`] walks the pages and concatenates their `data`.

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod pagination;
mod response;
pub mod types;

pub use backend::http::{DEFAULT_API_BASE, HttpApi};
pub use backend::{Api, Call, MockApi};
pub use error::{Error, ErrorCategory, Result};
pub use types::{LoginUser, Membership, Page, RemoteMember, Subgroup, format_address};

use pagination::fetch_all;

/// High-level client for one authenticated session.
///
/// # Example
///
/// ```
/// use groupsio::{Client, MockApi};
///
/// let mock = MockApi::new();
/// mock.add_subgroup("acme+docs", None);
/// mock.add_ordinary("acme+docs", "c@x.org");
///
/// let mut client = Client::with_api(Box::new(mock.clone()));
/// client.login("bot@x.org", "secret").unwrap();
/// client.add_member("acme", "acme+docs", "b@x.org", Some("Bob")).unwrap();
///
/// let membership = client.membership("acme+docs").unwrap();
/// assert!(membership.members.contains("b@x.org"));
/// ```
pub struct Client {
    api: Box<dyn Api>,
    csrf: Option<String>,
}

impl Client {
    /// Create a client against the public API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_api(Box::new(HttpApi::new()))
    }

    /// Create a client against a custom API base URL.
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self::with_api(Box::new(HttpApi::with_api_base(api_base)))
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_api(api: Box<dyn Api>) -> Self {
        Self { api, csrf: None }
    }

    /// Log in, keeping the CSRF token for later mutating calls.
    pub fn login(&mut self, email: &str, password: &str) -> Result<LoginUser> {
        let user = self.api.login(email, password)?;
        self.csrf = Some(user.csrf_token.clone());
        Ok(user)
    }

    /// Whether [`login`](Self::login) has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.csrf.is_some()
    }

    fn csrf(&self) -> Result<&str> {
        self.csrf.as_deref().ok_or(Error::NotAuthenticated)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// All subgroups of `group_name`, across every page.
    pub fn subgroups(&self, group_name: &str) -> Result<Vec<Subgroup>> {
        fetch_all(|token| self.api.get_subgroups(group_name, token))
    }

    /// All member records of `group_name`, across every page.
    pub fn members(&self, group_name: &str) -> Result<Vec<RemoteMember>> {
        fetch_all(|token| self.api.get_members(group_name, token))
    }

    /// Membership of `group_name`, split into ordinary members and moderators.
    pub fn membership(&self, group_name: &str) -> Result<Membership> {
        let records = self.members(group_name)?;
        Ok(Membership::from_records(&records))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one address to `subgroup_name`, labelled with `name` when given.
    pub fn add_member(
        &self,
        group_name: &str,
        subgroup_name: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<()> {
        let csrf = self.csrf()?;
        let entry = format_address(email, name);
        self.api.direct_add(group_name, subgroup_name, &entry, csrf)
    }

    /// Remove all `emails` from `group_name` in a single call.
    ///
    /// Does nothing when `emails` is empty.
    pub fn remove_members<S: AsRef<str>>(&self, group_name: &str, emails: &[S]) -> Result<()> {
        if emails.is_empty() {
            return Ok(());
        }
        let csrf = self.csrf()?;
        let joined = emails
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        self.api.bulk_remove_members(group_name, &joined, csrf)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
