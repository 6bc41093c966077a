//! Backend trait and implementations for the Groups.io API.
//!
//! This module provides the [`Api`] trait. The primary implementation is
//! [`http::HttpApi`], which talks to the real service.
//!
//! # Testing
//!
//! Use [`MockApi`] for testing without network access:
//!
//! ```
//! use groupsio::backend::{Api, MockApi};
//!
//! let mock = MockApi::new();
//! mock.add_subgroup("acme+docs", Some("lists.acme.org"));
//! mock.add_ordinary("acme+docs", "a@x.org");
//!
//! let page = mock.get_members("acme+docs", 0).unwrap();
//! assert_eq!(page.data.len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{LoginUser, Page, RemoteMember, Subgroup};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// The raw calls the synchronizer needs from Groups.io.
///
/// Listing calls return a single page; use
/// [`fetch_all`](crate::pagination::fetch_all) to walk every page.
pub trait Api: Send + Sync {
    /// Log in and return the session user.
    fn login(&self, email: &str, password: &str) -> Result<LoginUser>;

    /// List one page of subgroups of `group_name`.
    fn get_subgroups(&self, group_name: &str, page_token: u64) -> Result<Page<Subgroup>>;

    /// List one page of members of `group_name` (a full `<group>+<sub>` name).
    fn get_members(&self, group_name: &str, page_token: u64) -> Result<Page<RemoteMember>>;

    /// Add `emails` directly (without invitation) to `subgroup_name`.
    fn direct_add(
        &self,
        group_name: &str,
        subgroup_name: &str,
        emails: &str,
        csrf: &str,
    ) -> Result<()>;

    /// Remove newline-separated `emails` from `group_name`.
    fn bulk_remove_members(&self, group_name: &str, emails: &str, csrf: &str) -> Result<()>;
}

/// A call recorded by [`MockApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login {
        email: String,
    },
    GetSubgroups {
        group_name: String,
        page_token: u64,
    },
    GetMembers {
        group_name: String,
        page_token: u64,
    },
    DirectAdd {
        group_name: String,
        subgroup_name: String,
        emails: String,
    },
    BulkRemove {
        group_name: String,
        emails: String,
    },
}

impl Call {
    /// Whether this call changes remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::DirectAdd { .. } | Self::BulkRemove { .. })
    }
}

#[derive(Debug, Default)]
struct MockState {
    credentials: Option<(String, String)>,
    page_size: Option<usize>,
    subgroups: Vec<Subgroup>,
    members: BTreeMap<String, Vec<RemoteMember>>,
    failing_groups: HashSet<String>,
    failing_adds: HashSet<String>,
    failing_removes: HashSet<String>,
    calls: Vec<Call>,
}

/// In-memory backend for testing without network access.
///
/// Clones share state, so a test can keep a handle while a
/// [`Client`](crate::Client) owns another. Page tokens are offsets into the
/// stored lists.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

const MOCK_CSRF: &str = "mock-csrf-token";
const DEFAULT_PAGE_SIZE: usize = 100;

impl MockApi {
    /// Create a new empty mock backend that accepts any login.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept this username/password pair.
    pub fn require_credentials(&self, email: impl Into<String>, password: impl Into<String>) {
        self.state.lock().unwrap().credentials = Some((email.into(), password.into()));
    }

    /// Number of items per listing page.
    pub fn set_page_size(&self, page_size: usize) {
        self.state.lock().unwrap().page_size = Some(page_size.max(1));
    }

    /// Register a subgroup.
    pub fn add_subgroup(&self, name: impl Into<String>, org_domain: Option<&str>) {
        let name = name.into();
        let mut state = self.state.lock().unwrap();
        state.members.entry(name.clone()).or_default();
        state.subgroups.push(Subgroup {
            name,
            org_domain: org_domain.map(str::to_string),
        });
    }

    /// Add a member record to a subgroup.
    pub fn add_member(&self, group_name: &str, member: RemoteMember) {
        let mut state = self.state.lock().unwrap();
        state
            .members
            .entry(group_name.to_string())
            .or_default()
            .push(member);
    }

    /// Add an ordinary member to a subgroup.
    pub fn add_ordinary(&self, group_name: &str, email: &str) {
        self.add_member(group_name, RemoteMember::ordinary(email));
    }

    /// Add a moderator to a subgroup.
    pub fn add_moderator(&self, group_name: &str, email: &str) {
        self.add_member(group_name, RemoteMember::moderator(email));
    }

    /// Make every `getmembers` call for this subgroup fail.
    pub fn fail_members_for(&self, group_name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_groups
            .insert(group_name.to_string());
    }

    /// Make `directadd` fail for this address.
    pub fn fail_add_for(&self, email: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_adds
            .insert(email.to_lowercase());
    }

    /// Make `bulkremovemembers` fail for this subgroup.
    pub fn fail_remove_for(&self, group_name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_removes
            .insert(group_name.to_string());
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that change remote state.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    /// Current member records of a subgroup.
    pub fn members_of(&self, group_name: &str) -> Vec<RemoteMember> {
        self.state
            .lock()
            .unwrap()
            .members
            .get(group_name)
            .cloned()
            .unwrap_or_default()
    }

    fn page<T: Clone>(items: &[T], page_token: u64, page_size: usize) -> Page<T> {
        let start = (page_token as usize).min(items.len());
        let end = (start + page_size).min(items.len());
        let next = if end < items.len() { end as u64 } else { 0 };
        Page::new(items[start..end].to_vec(), next)
    }
}

/// Extract the address from `Name <email>` or a bare address.
fn bare_address(entry: &str) -> String {
    let entry = entry.trim();
    match (entry.rfind('<'), entry.rfind('>')) {
        (Some(open), Some(close)) if open < close => entry[open + 1..close].trim().to_lowercase(),
        _ => entry.to_lowercase(),
    }
}

impl Api for MockApi {
    fn login(&self, email: &str, password: &str) -> Result<LoginUser> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Login {
            email: email.to_string(),
        });

        if let Some((expected_email, expected_password)) = &state.credentials
            && (expected_email != email || expected_password != password)
        {
            return Err(Error::api("invalid_password", Some(400)));
        }

        Ok(LoginUser {
            csrf_token: MOCK_CSRF.to_string(),
            email: Some(email.to_string()),
        })
    }

    fn get_subgroups(&self, group_name: &str, page_token: u64) -> Result<Page<Subgroup>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetSubgroups {
            group_name: group_name.to_string(),
            page_token,
        });

        let prefix = format!("{group_name}+");
        let matching: Vec<Subgroup> = state
            .subgroups
            .iter()
            .filter(|s| s.name.starts_with(&prefix))
            .cloned()
            .collect();
        let page_size = state.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(Self::page(&matching, page_token, page_size))
    }

    fn get_members(&self, group_name: &str, page_token: u64) -> Result<Page<RemoteMember>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetMembers {
            group_name: group_name.to_string(),
            page_token,
        });

        if state.failing_groups.contains(group_name) {
            return Err(Error::api("inadequate_permissions", Some(400)));
        }

        let Some(members) = state.members.get(group_name) else {
            return Err(Error::api("group_not_found", Some(404)));
        };
        let page_size = state.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(Self::page(members, page_token, page_size))
    }

    fn direct_add(
        &self,
        group_name: &str,
        subgroup_name: &str,
        emails: &str,
        csrf: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DirectAdd {
            group_name: group_name.to_string(),
            subgroup_name: subgroup_name.to_string(),
            emails: emails.to_string(),
        });

        if csrf != MOCK_CSRF {
            return Err(Error::api("bad_csrf", Some(400)));
        }

        let address = bare_address(emails);
        if state.failing_adds.contains(&address) {
            return Err(Error::api("bad_email", Some(400)));
        }

        let members = state
            .members
            .get_mut(subgroup_name)
            .ok_or_else(|| Error::api("group_not_found", Some(404)))?;
        if !members
            .iter()
            .any(|m| m.email.as_deref().map(str::to_lowercase) == Some(address.clone()))
        {
            members.push(RemoteMember::ordinary(address));
        }
        Ok(())
    }

    fn bulk_remove_members(&self, group_name: &str, emails: &str, csrf: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::BulkRemove {
            group_name: group_name.to_string(),
            emails: emails.to_string(),
        });

        if csrf != MOCK_CSRF {
            return Err(Error::api("bad_csrf", Some(400)));
        }
        if state.failing_removes.contains(group_name) {
            return Err(Error::api("inadequate_permissions", Some(400)));
        }

        let doomed: HashSet<String> = emails.lines().map(bare_address).collect();
        let members = state
            .members
            .get_mut(group_name)
            .ok_or_else(|| Error::api("group_not_found", Some(404)))?;
        members.retain(|m| {
            m.email
                .as_deref()
                .is_none_or(|email| !doomed.contains(&email.to_lowercase()))
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::fetch_all;

    #[test]
    fn test_mock_login_accepts_anything_by_default() {
        let mock = MockApi::new();
        let user = mock.login("bot@x.org", "secret").unwrap();
        assert_eq!(user.csrf_token, MOCK_CSRF);
    }

    #[test]
    fn test_mock_login_rejects_wrong_password() {
        let mock = MockApi::new();
        mock.require_credentials("bot@x.org", "secret");
        assert!(mock.login("bot@x.org", "wrong").is_err());
        assert!(mock.login("bot@x.org", "secret").is_ok());
    }

    #[test]
    fn test_mock_pagination() {
        let mock = MockApi::new();
        mock.set_page_size(2);
        mock.add_subgroup("acme+docs", None);
        for i in 0..5 {
            mock.add_ordinary("acme+docs", &format!("user{i}@x.org"));
        }

        let first = mock.get_members("acme+docs", 0).unwrap();
        assert_eq!(first.data.len(), 2);
        assert_eq!(first.next_page_token, 2);

        let all = fetch_all(|token| mock.get_members("acme+docs", token)).unwrap();
        assert_eq!(all.len(), 5);

        let tokens: Vec<u64> = mock
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GetMembers { page_token, .. } => Some(page_token),
                _ => None,
            })
            .collect();
        assert_eq!(tokens, vec![0, 0, 2, 4]);
    }

    #[test]
    fn test_mock_subgroups_filtered_by_parent() {
        let mock = MockApi::new();
        mock.add_subgroup("acme+docs", Some("lists.acme.org"));
        mock.add_subgroup("other+docs", None);

        let page = mock.get_subgroups("acme", 0).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "acme+docs");
    }

    #[test]
    fn test_mock_failures() {
        let mock = MockApi::new();
        mock.add_subgroup("acme+docs", None);
        mock.fail_members_for("acme+docs");
        assert!(mock.get_members("acme+docs", 0).is_err());
        assert!(mock.get_members("acme+missing", 0).is_err());
    }

    #[test]
    fn test_mock_direct_add_and_bulk_remove() {
        let mock = MockApi::new();
        mock.add_subgroup("acme+docs", None);
        mock.add_ordinary("acme+docs", "c@x.org");
        mock.add_moderator("acme+docs", "z@x.org");

        mock.direct_add("acme", "acme+docs", "Bob <B@x.org>", MOCK_CSRF)
            .unwrap();
        mock.bulk_remove_members("acme+docs", "c@x.org", MOCK_CSRF)
            .unwrap();

        let emails: Vec<String> = mock
            .members_of("acme+docs")
            .into_iter()
            .filter_map(|m| m.email)
            .collect();
        assert_eq!(emails, vec!["z@x.org", "b@x.org"]);
        assert_eq!(mock.mutations().len(), 2);
    }

    #[test]
    fn test_mock_rejects_bad_csrf() {
        let mock = MockApi::new();
        mock.add_subgroup("acme+docs", None);
        assert!(mock.direct_add("acme", "acme+docs", "a@x.org", "nope").is_err());
        assert!(mock.bulk_remove_members("acme+docs", "a@x.org", "nope").is_err());
    }

    #[test]
    fn test_bare_address() {
        assert_eq!(bare_address("Alice <A@x.org>"), "a@x.org");
        assert_eq!(bare_address(" a@x.org "), "a@x.org");
    }
}
