//! Membership diff computation and display

use colored::Colorize;
use groupsio::Membership;
use std::collections::{BTreeMap, BTreeSet};

use super::planner::{LocalMembers, MetaMembership};

/// Changes needed to make a remote subgroup match its desired membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    /// Addresses to add, with the display name to send.
    pub to_add: BTreeMap<String, String>,
    /// Ordinary members to remove.
    pub to_remove: BTreeSet<String>,
}

impl MembershipDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

/// Reconcile one subgroup.
///
/// `to_add = desired - members - moderators` and
/// `to_remove = members - desired`. Moderators are never removed. An empty
/// `desired` removes every ordinary member.
pub fn reconcile(desired: &LocalMembers, remote: &Membership) -> MembershipDiff {
    let to_add = desired
        .iter()
        .filter(|(email, _)| !remote.contains(email))
        .map(|(email, name)| (email.clone(), name.clone()))
        .collect();

    let to_remove = remote
        .members
        .iter()
        .filter(|email| !desired.contains_key(*email))
        .cloned()
        .collect();

    MembershipDiff { to_add, to_remove }
}

/// Reconcile the unified list.
///
/// Same as [`reconcile`] over the union of all subgroups, except that opted-out
/// members are never added and are always in the removal set, whether or not
/// they are currently subscribed. An opt-out wins over moderator status.
pub fn reconcile_unified(meta: &MetaMembership, remote: &Membership) -> MembershipDiff {
    let mut diff = reconcile(&meta.members, remote);

    diff.to_add.retain(|email, _| !meta.opted_out.contains(email));
    diff.to_remove.extend(meta.opted_out.iter().cloned());

    diff
}

/// Display one target's diff
pub fn display_diff(remote_name: &str, diff: &MembershipDiff, remote: &Membership) {
    println!();
    println!(
        "┌─ {} {}",
        remote_name.bold(),
        format!(
            "({} members, {} protected)",
            remote.members.len(),
            remote.moderators.len()
        )
        .dimmed()
    );

    if diff.is_empty() {
        println!("│   {} No changes needed", "✓".green());
    }

    for (email, name) in &diff.to_add {
        println!("│   {} {:<40} {}", "+".green(), email, name.dimmed());
    }
    for email in &diff.to_remove {
        println!("│   {} {:<40} {}", "-".red(), email, "(will remove)".dimmed());
    }

    println!(
        "└─ {} to add, {} to remove",
        diff.to_add.len().to_string().green(),
        diff.to_remove.len().to_string().red()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(entries: &[(&str, &str)]) -> LocalMembers {
        entries
            .iter()
            .map(|(e, n)| ((*e).to_string(), (*n).to_string()))
            .collect()
    }

    fn remote(members: &[&str], moderators: &[&str]) -> Membership {
        Membership {
            members: members.iter().map(|s| (*s).to_string()).collect(),
            moderators: moderators.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn docs_scenario() {
        let desired = local(&[("a@x.org", "Alice"), ("b@x.org", "Bob")]);
        let remote = remote(&["a@x.org", "c@x.org"], &["z@x.org"]);

        let diff = reconcile(&desired, &remote);
        assert_eq!(diff.to_add, local(&[("b@x.org", "Bob")]));
        assert_eq!(diff.to_remove, set(&["c@x.org"]));
        assert_eq!(diff.len(), 2);
    }

    #[test]
    fn moderators_are_never_added_or_removed() {
        let desired = local(&[("z@x.org", "Zed")]);
        let remote = remote(&[], &["z@x.org", "y@x.org"]);

        let diff = reconcile(&desired, &remote);
        assert!(diff.is_empty());
    }

    #[test]
    fn empty_desired_prunes_all_ordinary_members() {
        let remote = remote(&["a@x.org", "c@x.org"], &["z@x.org"]);

        let diff = reconcile(&LocalMembers::new(), &remote);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, remote.members);
    }

    #[test]
    fn applying_diff_converges() {
        let desired = local(&[("a@x.org", "A"), ("b@x.org", "B"), ("d@x.org", "D")]);
        let mut state = remote(&["a@x.org", "c@x.org", "e@x.org"], &["z@x.org"]);

        let diff = reconcile(&desired, &state);
        for email in &diff.to_remove {
            state.members.remove(email);
        }
        state.members.extend(diff.to_add.keys().cloned());

        let desired_keys: BTreeSet<String> = desired.keys().cloned().collect();
        assert_eq!(state.members, desired_keys);
        assert!(state.moderators.contains("z@x.org"));
        assert!(reconcile(&desired, &state).is_empty());
    }

    #[test]
    fn unified_removes_opt_outs_even_when_absent() {
        let meta = MetaMembership {
            members: local(&[("a@x.org", "A"), ("o@x.org", "Out")]),
            opted_out: set(&["o@x.org", "ghost@x.org"]),
        };
        let remote = remote(&["a@x.org", "stale@x.org"], &[]);

        let diff = reconcile_unified(&meta, &remote);
        assert!(diff.to_add.is_empty());
        assert_eq!(
            diff.to_remove,
            set(&["ghost@x.org", "o@x.org", "stale@x.org"])
        );
        assert!(diff.to_remove.is_superset(&meta.opted_out));
    }

    #[test]
    fn unified_adds_missing_members() {
        let meta = MetaMembership {
            members: local(&[("a@x.org", "A"), ("b@x.org", "B")]),
            opted_out: BTreeSet::new(),
        };
        let remote = remote(&["a@x.org"], &["m@x.org"]);

        let diff = reconcile_unified(&meta, &remote);
        assert_eq!(diff.to_add, local(&[("b@x.org", "B")]));
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn unified_removes_opted_out_moderators() {
        let meta = MetaMembership {
            members: LocalMembers::new(),
            opted_out: set(&["z@x.org"]),
        };
        let remote = remote(&[], &["z@x.org", "m@x.org"]);

        let diff = reconcile_unified(&meta, &remote);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, set(&["z@x.org"]));
    }
}
