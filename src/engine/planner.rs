//! Target selection and desired membership.
//!
//! Turns loaded definitions into the list of subgroups to reconcile, each with
//! its desired `{email -> name}` map, and folds those maps into the desired
//! membership of the unified list.

use groupsio::Subgroup;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::Definitions;
use crate::schema::{GroupConfig, SubgroupDefinition};

/// Desired membership: lowercased email → display name.
pub type LocalMembers = BTreeMap<String, String>;

/// A subgroup to reconcile against its remote counterpart.
#[derive(Debug, Clone)]
pub struct SubgroupTarget {
    /// Local identifier.
    pub id: String,
    /// Remote name, `<group>+<id>`.
    pub remote_name: String,
    /// Valid members from the definition.
    pub desired: LocalMembers,
    /// Members who asked not to be on the unified list.
    pub opted_out: BTreeSet<String>,
    /// Member entries dropped for a missing name or unusable email.
    pub invalid: usize,
    /// The definition has no `list-members` key.
    pub members_key_absent: bool,
}

/// Desired membership of the unified list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaMembership {
    /// Union of every subgroup's valid members.
    pub members: LocalMembers,
    /// Members excluded from the unified list.
    pub opted_out: BTreeSet<String>,
}

/// Subgroups present on Groups.io that this run may touch.
#[derive(Debug, Clone, Default)]
pub struct RemoteSubgroups {
    pub names: BTreeSet<String>,
    /// Mail domain reported by the service.
    pub domain: Option<String>,
}

/// Build the `{email -> name}` map of valid members; later duplicates win.
pub fn local_valid_members(definition: &SubgroupDefinition) -> (LocalMembers, usize) {
    let mut valid = LocalMembers::new();
    let mut invalid = 0;

    for member in definition.members() {
        match member.validate() {
            Some(m) => {
                valid.insert(m.email, m.name);
            }
            None => {
                log::debug!(
                    "Ignoring member entry with missing name or unusable email: {:?}",
                    member.email
                );
                invalid += 1;
            }
        }
    }

    (valid, invalid)
}

/// Valid members who set `include-on-meta-list: false`.
pub fn opted_out_members(definition: &SubgroupDefinition) -> BTreeSet<String> {
    definition
        .members()
        .iter()
        .filter(|m| m.opted_out_of_meta_list())
        .filter_map(|m| m.validate())
        .map(|m| m.email)
        .collect()
}

/// Select the subgroups to reconcile, in identifier order.
///
/// The main list and the unified list are never reconciled directly.
pub fn plan_subgroups(config: &GroupConfig, definitions: &Definitions) -> Vec<SubgroupTarget> {
    let mut targets = Vec::new();

    for (id, loaded) in &definitions.subgroups {
        if config.is_protected(id) {
            log::info!("You cannot modify {id}. Ignoring.");
            continue;
        }

        let definition = &loaded.definition;
        let (desired, invalid) = local_valid_members(definition);
        targets.push(SubgroupTarget {
            id: id.clone(),
            remote_name: config.remote_name(id),
            desired,
            opted_out: opted_out_members(definition),
            invalid,
            members_key_absent: definition.list_members.is_none(),
        });
    }

    targets
}

/// Fold every target's members into the unified list's desired membership.
pub fn collect_meta(targets: &[SubgroupTarget]) -> MetaMembership {
    let mut meta = MetaMembership::default();
    for target in targets {
        meta.members
            .extend(target.desired.iter().map(|(e, n)| (e.clone(), n.clone())));
        meta.opted_out.extend(target.opted_out.iter().cloned());
    }
    meta
}

/// Keep the remote subgroups named `<group>+<sub>`, minus the unified list.
pub fn matching_subgroups(config: &GroupConfig, remote: &[Subgroup]) -> RemoteSubgroups {
    let prefix = format!("{}+", config.group_name);
    let unified = config.unified_list.as_deref().map(|u| config.remote_name(u));

    let mut matching = RemoteSubgroups::default();
    for subgroup in remote {
        let is_unified = unified.as_deref() == Some(subgroup.name.as_str());
        if !subgroup.name.starts_with(&prefix) || is_unified {
            continue;
        }
        matching.names.insert(subgroup.name.clone());
        if let Some(domain) = &subgroup.org_domain {
            matching.domain = Some(domain.clone());
        }
    }
    matching
}
