//! Wire types and membership sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Moderation status of an ordinary (non-moderator, non-admin) member.
pub const ORDINARY_MOD_STATUS: &str = "sub_modstatus_none";

/// One page of a paginated listing.
///
/// A `next_page_token` of `0` marks the final page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Token for the following page, `0` when there is none.
    #[serde(default)]
    pub next_page_token: u64,
}

impl<T> Page<T> {
    /// Create a page.
    pub fn new(data: Vec<T>, next_page_token: u64) -> Self {
        Self {
            data,
            next_page_token,
        }
    }

    /// Whether this is the last page.
    pub fn is_last(&self) -> bool {
        self.next_page_token == 0
    }
}

/// A subgroup as returned by `getsubgroups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subgroup {
    /// Full name, `<group>+<subgroup>`.
    pub name: String,
    /// Mail domain of the owning organisation.
    #[serde(default)]
    pub org_domain: Option<String>,
}

/// A member record as returned by `getmembers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMember {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub mod_status: Option<String>,
}

impl RemoteMember {
    /// Create an ordinary member.
    pub fn ordinary(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            full_name: None,
            mod_status: Some(ORDINARY_MOD_STATUS.to_string()),
        }
    }

    /// Create a moderator.
    pub fn moderator(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            full_name: None,
            mod_status: Some("sub_modstatus_moderator".to_string()),
        }
    }

    /// Whether this member has no elevated status.
    ///
    /// A record without a status counts as elevated, so it is never pruned.
    pub fn is_ordinary(&self) -> bool {
        self.mod_status.as_deref() == Some(ORDINARY_MOD_STATUS)
    }
}

/// The `user` object returned by `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    /// Token that must accompany every mutating call.
    pub csrf_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a successful `login` response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub user: Option<LoginUser>,
}

/// Remote membership of one subgroup, split by moderation status.
///
/// Both sets hold lowercased addresses and are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    /// Ordinary members, subject to reconciliation.
    pub members: BTreeSet<String>,
    /// Moderators and admins, never touched.
    pub moderators: BTreeSet<String>,
}

impl Membership {
    /// Partition member records into ordinary members and moderators.
    ///
    /// Records without an email are ignored.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RemoteMember>) -> Self {
        let mut membership = Self::default();
        for record in records {
            let Some(email) = record.email.as_deref() else {
                continue;
            };
            let email = email.trim().to_lowercase();
            if record.is_ordinary() {
                membership.members.insert(email);
            } else {
                membership.moderators.insert(email);
            }
        }
        // An address listed with both statuses stays protected.
        let moderators = &membership.moderators;
        membership.members.retain(|email| !moderators.contains(email));
        membership
    }

    /// Whether an address is present with any status.
    pub fn contains(&self, email: &str) -> bool {
        self.members.contains(email) || self.moderators.contains(email)
    }

    /// Total number of addresses.
    pub fn len(&self) -> usize {
        self.members.len() + self.moderators.len()
    }

    /// Whether the subgroup has no members at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Format an address for `directadd`, as `Name <email>` when a name is known.
pub fn format_address(email: &str, name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => format!("{name} <{email}>"),
        _ => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserialize() {
        let page: Page<Subgroup> = serde_json::from_str(
            r#"{"object":"list","data":[{"name":"acme+docs","org_domain":"lists.acme.org"}],"next_page_token":7}"#,
        )
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "acme+docs");
        assert_eq!(page.next_page_token, 7);
        assert!(!page.is_last());
    }

    #[test]
    fn test_page_defaults() {
        let page: Page<Subgroup> = serde_json::from_str(r#"{"object":"list"}"#).unwrap();
        assert!(page.data.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn test_membership_partition() {
        let records = vec![
            RemoteMember::ordinary("A@x.org"),
            RemoteMember::ordinary("c@x.org"),
            RemoteMember::moderator("z@x.org"),
            RemoteMember {
                email: None,
                full_name: Some("No Email".to_string()),
                mod_status: Some(ORDINARY_MOD_STATUS.to_string()),
            },
        ];

        let membership = Membership::from_records(&records);
        assert_eq!(
            membership.members.iter().collect::<Vec<_>>(),
            vec!["a@x.org", "c@x.org"]
        );
        assert!(membership.moderators.contains("z@x.org"));
        assert_eq!(membership.len(), 3);
        assert!(membership.contains("z@x.org"));
    }

    #[test]
    fn test_missing_status_is_protected() {
        let record = RemoteMember {
            email: Some("x@x.org".to_string()),
            full_name: None,
            mod_status: None,
        };
        let membership = Membership::from_records([&record]);
        assert!(membership.members.is_empty());
        assert!(membership.moderators.contains("x@x.org"));
    }

    #[test]
    fn test_member_and_moderator_overlap_stays_protected() {
        let records = vec![
            RemoteMember::ordinary("z@x.org"),
            RemoteMember::moderator("Z@x.org"),
        ];
        let membership = Membership::from_records(&records);
        assert!(membership.members.is_empty());
        assert_eq!(membership.moderators.len(), 1);
    }

    #[test]
    fn test_format_address() {
        assert_eq!(
            format_address("a@x.org", Some("Alice")),
            "Alice <a@x.org>"
        );
        assert_eq!(format_address("a@x.org", Some("  ")), "a@x.org");
        assert_eq!(format_address("a@x.org", None), "a@x.org");
    }

    #[test]
    fn test_login_response() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"object":"login","user":{"csrf_token":"abc","email":"bot@x.org"}}"#,
        )
        .unwrap();
        assert_eq!(resp.user.unwrap().csrf_token, "abc");

        let resp: LoginResponse = serde_json::from_str(r#"{"object":"login"}"#).unwrap();
        assert!(resp.user.is_none());
    }
}
