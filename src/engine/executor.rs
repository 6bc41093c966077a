//! Mutator - applies membership diffs to Groups.io

use colored::Colorize;
use groupsio::Client;

use super::differ::MembershipDiff;

/// Options for execution
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Issue mutating calls. When false the run is a dry run.
    pub update_remote: bool,
}

/// Summary of execution results, counted per address
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub added: usize,
    pub removed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ExecuteSummary {
    pub fn total_changes(&self) -> usize {
        self.added + self.removed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn merge(&mut self, other: ExecuteSummary) {
        self.added += other.added;
        self.removed += other.removed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Apply one target's diff.
///
/// Additions go one address per call into `remote_name` under `group_name`;
/// removals go in a single bulk call against `remote_name`. Failures are
/// logged and counted, never returned. Nothing is sent in a dry run.
///
/// Callers only get here with a freshly fetched membership; a list whose
/// members could not be listed is never passed in.
pub fn apply(
    client: &Client,
    group_name: &str,
    remote_name: &str,
    diff: &MembershipDiff,
    opts: ExecuteOptions,
) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();

    if !opts.update_remote {
        summary.skipped = diff.len();
        return summary;
    }

    for (email, name) in &diff.to_add {
        let name = (!name.is_empty()).then_some(name.as_str());
        match client.add_member(group_name, remote_name, email, name) {
            Ok(()) => {
                log::info!("Added {email} to {remote_name}");
                summary.added += 1;
            }
            Err(e) => {
                log::warn!("Something went wrong: {remote_name} | {}", e.kind());
                summary.failed += 1;
            }
        }
    }

    if !diff.to_remove.is_empty() {
        let emails: Vec<&str> = diff.to_remove.iter().map(String::as_str).collect();
        match client.remove_members(remote_name, &emails) {
            Ok(()) => {
                log::info!("Removed {} member(s) from {remote_name}", emails.len());
                summary.removed += emails.len();
            }
            Err(e) => {
                log::warn!("Something went wrong: {remote_name} | {}", e.kind());
                summary.failed += emails.len();
            }
        }
    }

    summary
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary, update_remote: bool) {
    println!();
    if !update_remote {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.is_success() && summary.total_changes() == 0 {
        println!("  {} Already in sync", "✓".green().bold());
    } else if summary.is_success() {
        println!("  {} Membership synchronized", "✓".green().bold());
    } else {
        println!("  {} Membership synchronized with errors", "⚠".yellow().bold());
    }

    if summary.added > 0 {
        println!("    • {} members added", summary.added);
    }
    if summary.removed > 0 {
        println!("    • {} members removed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} changes skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "changes".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupsio::{Call, MockApi};
    use std::collections::{BTreeMap, BTreeSet};

    fn logged_in(mock: &MockApi) -> Client {
        let mut client = Client::with_api(Box::new(mock.clone()));
        client.login("bot@x.org", "pw").unwrap();
        client
    }

    fn docs_mock() -> MockApi {
        let mock = MockApi::new();
        mock.add_subgroup("acme+docs", None);
        mock.add_ordinary("acme+docs", "a@x.org");
        mock.add_ordinary("acme+docs", "c@x.org");
        mock.add_moderator("acme+docs", "z@x.org");
        mock
    }

    fn diff(add: &[(&str, &str)], remove: &[&str]) -> MembershipDiff {
        MembershipDiff {
            to_add: add
                .iter()
                .map(|(e, n)| ((*e).to_string(), (*n).to_string()))
                .collect::<BTreeMap<_, _>>(),
            to_remove: remove
                .iter()
                .map(|e| (*e).to_string())
                .collect::<BTreeSet<_>>(),
        }
    }

    const LIVE: ExecuteOptions = ExecuteOptions {
        update_remote: true,
    };

    #[test]
    fn applies_adds_and_one_bulk_remove() {
        let mock = docs_mock();
        let client = logged_in(&mock);

        let summary = apply(
            &client,
            "acme",
            "acme+docs",
            &diff(&[("b@x.org", "Bob"), ("d@x.org", "Dee")], &["c@x.org"]),
            LIVE,
        );

        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 1);
        assert!(summary.is_success());

        let mutations = mock.mutations();
        assert_eq!(mutations.len(), 3);
        assert_eq!(
            mutations[0],
            Call::DirectAdd {
                group_name: "acme".to_string(),
                subgroup_name: "acme+docs".to_string(),
                emails: "Bob <b@x.org>".to_string(),
            }
        );
        assert_eq!(
            mutations[2],
            Call::BulkRemove {
                group_name: "acme+docs".to_string(),
                emails: "c@x.org".to_string(),
            }
        );

        let members: BTreeSet<String> = mock
            .members_of("acme+docs")
            .into_iter()
            .map(|m| m.email.unwrap_or_default().to_lowercase())
            .collect();
        assert!(members.contains("b@x.org"));
        assert!(!members.contains("c@x.org"));
        assert!(members.contains("z@x.org"));
    }

    #[test]
    fn no_remove_call_when_nothing_to_remove() {
        let mock = docs_mock();
        let client = logged_in(&mock);

        apply(
            &client,
            "acme",
            "acme+docs",
            &diff(&[("b@x.org", "Bob")], &[]),
            LIVE,
        );

        assert!(
            !mock
                .mutations()
                .iter()
                .any(|c| matches!(c, Call::BulkRemove { .. }))
        );
    }

    #[test]
    fn dry_run_issues_no_mutations() {
        let mock = docs_mock();
        let client = logged_in(&mock);

        let summary = apply(
            &client,
            "acme",
            "acme+docs",
            &diff(&[("b@x.org", "Bob")], &["c@x.org"]),
            ExecuteOptions::default(),
        );

        assert!(mock.mutations().is_empty());
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.total_changes(), 0);
    }

    #[test]
    fn add_failure_continues_with_next_address() {
        let mock = docs_mock();
        mock.fail_add_for("b@x.org");
        let client = logged_in(&mock);

        let summary = apply(
            &client,
            "acme",
            "acme+docs",
            &diff(&[("b@x.org", "Bob"), ("d@x.org", "Dee")], &["c@x.org"]),
            LIVE,
        );

        assert_eq!(summary.added, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(mock.mutations().len(), 3);
    }

    #[test]
    fn remove_failure_is_counted() {
        let mock = docs_mock();
        mock.fail_remove_for("acme+docs");
        let client = logged_in(&mock);

        let summary = apply(
            &client,
            "acme",
            "acme+docs",
            &diff(&[], &["a@x.org", "c@x.org"]),
            LIVE,
        );

        assert_eq!(summary.removed, 0);
        assert_eq!(summary.failed, 2);
        assert!(!summary.is_success());
    }

    #[test]
    fn summaries_merge() {
        let mut total = ExecuteSummary {
            added: 1,
            ..Default::default()
        };
        total.merge(ExecuteSummary {
            added: 2,
            removed: 3,
            failed: 1,
            skipped: 4,
        });
        assert_eq!(
            total,
            ExecuteSummary {
                added: 3,
                removed: 3,
                failed: 1,
                skipped: 4,
            }
        );
    }
}
