//! Typed records for the YAML configuration and definition files.
//!
//! Every key is optional at the serde level; required keys are checked once,
//! when the records are loaded, so the rest of the program works with plain
//! fields instead of presence checks.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;

/// Pattern an email field must contain to count as an address.
///
/// The first match inside the field is used, so `Alice <a@x.org>` yields
/// `a@x.org`.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+").expect("valid email pattern")
});

// ============================================================================
// Root config
// ============================================================================

/// The root configuration document as written on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawGroupConfig {
    pub group_name: Option<String>,
    pub group_domain: Option<String>,
    pub main_list: Option<String>,
    pub unified_list: Option<String>,
    pub index_template_file: Option<String>,
}

/// Validated global settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Parent group on Groups.io.
    pub group_name: String,
    /// Mail domain, used for `mailto:` links.
    pub group_domain: Option<String>,
    /// The parent group's own list; never reconciled.
    pub main_list: String,
    /// Aggregate list of all subgroup members, when enabled.
    pub unified_list: Option<String>,
    /// Index template, relative to the assets directory.
    pub index_template_file: String,
}

impl GroupConfig {
    /// Remote name of a subgroup: `<group>+<subgroup>`.
    pub fn remote_name(&self, subgroup: &str) -> String {
        format!("{}+{}", self.group_name, subgroup)
    }

    /// Whether a local subgroup may not be reconciled directly.
    pub fn is_protected(&self, subgroup: &str) -> bool {
        subgroup == self.main_list || self.unified_list.as_deref() == Some(subgroup)
    }
}

// ============================================================================
// Subgroup definitions
// ============================================================================

/// One subgroup entry in a definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubgroupDefinition {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,

    // Contact links
    pub about_url: Option<String>,
    pub development_list: Option<String>,
    pub calendar: Option<String>,
    pub slack: Option<String>,
    pub discourse: Option<String>,
    pub irc: Option<String>,
    pub chat: Option<String>,
    pub twitter_username: Option<String>,
    pub linkedin_username: Option<String>,
    pub youtube: Option<String>,
    pub artwork: Option<String>,

    // Governance
    pub charter: Option<String>,
    pub code_of_conduct: Option<String>,
    pub contributing: Option<String>,

    /// Associated repositories.
    #[serde(default, deserialize_with = "lenient_list")]
    pub git: Option<Vec<Repository>>,

    /// Desired membership. Absent means "no ordinary members".
    #[serde(default, deserialize_with = "lenient_list")]
    pub list_members: Option<Vec<Member>>,
}

impl SubgroupDefinition {
    /// Display name, falling back to the subgroup identifier.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        present(self.name.as_deref()).unwrap_or(id)
    }

    /// Member entries in file order.
    pub fn members(&self) -> &[Member] {
        self.list_members.as_deref().unwrap_or_default()
    }

    /// Repository entries in file order.
    pub fn repositories(&self) -> &[Repository] {
        self.git.as_deref().unwrap_or_default()
    }
}

/// A repository entry (`git: [{repo: ...}]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repository {
    pub repo: Option<String>,
}

/// A member entry in `list-members`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Member {
    #[serde(default, deserialize_with = "scalar_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: Option<String>,
    pub photo: Option<String>,
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub pronouns: Option<String>,
    pub sponsor: Option<String>,
    pub sponsor_website: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub github_username: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub twitter_username: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub linkedin_username: Option<String>,
    pub website: Option<String>,
    #[serde(default, deserialize_with = "scalar_flag")]
    pub include_on_meta_list: Option<bool>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub roles: Option<Vec<Role>>,
}

/// A validated member: lowercased address plus trimmed display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMember {
    pub email: String,
    pub name: String,
}

impl Member {
    /// Validate the entry: both fields present and the email field containing
    /// an address.
    pub fn validate(&self) -> Option<ValidMember> {
        let email = present(self.email.as_deref())?;
        let name = present(self.name.as_deref())?;
        let address = EMAIL_PATTERN.find(email)?;

        Some(ValidMember {
            email: address.as_str().to_lowercase(),
            name: name.to_string(),
        })
    }

    /// Whether the member asked not to be on the unified list.
    pub fn opted_out_of_meta_list(&self) -> bool {
        self.include_on_meta_list == Some(false)
    }

    /// Role entries in file order.
    pub fn roles(&self) -> &[Role] {
        self.roles.as_deref().unwrap_or_default()
    }
}

/// A role held by a member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Role {
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub term_begins: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub term_ends: Option<String>,
    #[serde(default)]
    pub is_voting: bool,
}

impl Role {
    /// Human-readable term: `A to B`, `since A`, `until B`, or empty.
    pub fn term(&self) -> String {
        match (
            present(self.term_begins.as_deref()),
            present(self.term_ends.as_deref()),
        ) {
            (Some(begins), Some(ends)) => format!("{begins} to {ends}"),
            (Some(begins), None) => format!("since {begins}"),
            (None, Some(ends)) => format!("until {ends}"),
            (None, None) => String::new(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Treat empty and whitespace-only strings as absent.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Entry type of a list that tolerates malformed items.
trait ListEntry: DeserializeOwned {
    /// Key the list is stored under, for diagnostics.
    const KEY: &'static str;
}

impl ListEntry for Member {
    const KEY: &'static str = "list-members";
}

impl ListEntry for Role {
    const KEY: &'static str = "roles";
}

impl ListEntry for Repository {
    const KEY: &'static str = "git";
}

/// Read a list entry by entry, dropping the ones that do not fit the record.
///
/// A bare string where a mapping belongs, or a sequence where a scalar
/// belongs, costs that one entry and a warning, not the whole file.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: ListEntry,
{
    let Some(values) = Option::<Vec<serde_yaml::Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let entries = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_yaml::from_value::<T>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping malformed {} entry #{}: {e}", T::KEY, index + 1);
                None
            }
        })
        .collect();
    Ok(Some(entries))
}

/// Accept a boolean, or the words `true`/`false` written as a string.
fn scalar_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b)),
        Some(serde_yaml::Value::String(s)) if s.trim().eq_ignore_ascii_case("true") => {
            Ok(Some(true))
        }
        Some(serde_yaml::Value::String(s)) if s.trim().eq_ignore_ascii_case("false") => {
            Ok(Some(false))
        }
        Some(other) => Err(D::Error::custom(format!(
            "expected true or false, found {other:?}"
        ))),
    }
}

/// Accept any YAML scalar for a text field.
///
/// Unquoted years, numeric handles and the like arrive as numbers or
/// booleans; they are kept as their textual form.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string, found {other:?}"
        ))),
    }
}
