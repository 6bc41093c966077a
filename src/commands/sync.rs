use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use groupsio::{Client, Membership};
use std::path::PathBuf;

use crate::config::{self, Definitions};
use crate::directory::{self, INDEX_FILE};
use crate::engine::{
    self, ExecuteOptions, ExecuteSummary, MembershipDiff, SubgroupTarget, collect_meta,
    matching_subgroups, plan_subgroups, reconcile, reconcile_unified,
};
use crate::progress;
use crate::schema::GroupConfig;
use crate::ui;
use crate::Context;

/// Groups.io login.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Both values, or nothing.
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        if let Some(problem) = Self::problem(username.as_deref(), password.as_deref()) {
            log::warn!("{problem}, ignoring the credentials");
            return None;
        }
        Some(Self {
            username: username?,
            password: password?,
        })
    }

    /// Why the given parts cannot be used, if they cannot. Nothing set at all
    /// is not a problem.
    fn problem(username: Option<&str>, password: Option<&str>) -> Option<&'static str> {
        match (username, password) {
            (None, None) => None,
            (Some(""), Some("")) => Some("GROUPSIO_USERNAME and GROUPSIO_PASSWORD are empty"),
            (Some(""), Some(_)) => Some("GROUPSIO_USERNAME is empty"),
            (Some(_), Some("")) => Some("GROUPSIO_PASSWORD is empty"),
            (Some(_), Some(_)) => None,
            (Some(_), None) => Some("GROUPSIO_USERNAME is set without GROUPSIO_PASSWORD"),
            (None, Some(_)) => Some("GROUPSIO_PASSWORD is set without GROUPSIO_USERNAME"),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<hidden>")
            .finish()
    }
}

/// Options for one run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Render the Markdown directory.
    pub render_directory: bool,
    /// Apply changes to Groups.io.
    pub update_remote: bool,
    /// Config directory as given on the command line.
    pub config_dir: String,
    pub output_dir: PathBuf,
    pub api_base: String,
    pub credentials: Option<Credentials>,
}

/// What the remote phase did.
#[derive(Debug, Default)]
pub struct RemoteOutcome {
    pub summary: ExecuteSummary,
    /// Mail domain reported by Groups.io for the matching subgroups.
    pub domain: Option<String>,
}

pub fn run(ctx: &Context, opts: SyncOptions) -> Result<()> {
    if opts.update_remote && opts.credentials.is_none() {
        bail!(
            "Updating Groups.io requires credentials: set GROUPSIO_USERNAME and GROUPSIO_PASSWORD"
        );
    }

    if !ctx.quiet {
        ui::header("Groups.io Membership Sync");
    }

    let config_dir = config::resolve_config_dir(&opts.config_dir);
    let group = config::load_group_config(&config_dir)?;
    let definitions = config::load_definitions(&config_dir)?;
    if definitions.is_empty() {
        log::warn!("Every subgroup definition is empty");
    }
    let targets = plan_subgroups(&group, &definitions);

    report_local(ctx, &group, &definitions, &targets);

    let mut remote_domain = None;
    match &opts.credentials {
        Some(credentials) => {
            let mut client = Client::with_api_base(opts.api_base.as_str());
            login(ctx, &mut client, credentials)?;

            let exec = ExecuteOptions {
                update_remote: opts.update_remote,
            };
            let outcome = run_remote(ctx, &client, &group, &targets, exec)?;
            if !ctx.quiet {
                engine::print_summary(&outcome.summary, opts.update_remote);
            }
            remote_domain = outcome.domain;
        }
        None => {
            log::info!("No Groups.io credentials, skipping the remote comparison");
            if !ctx.quiet {
                ui::dim("Set GROUPSIO_USERNAME and GROUPSIO_PASSWORD to compare with Groups.io");
            }
        }
    }

    if opts.render_directory {
        let domain = group.group_domain.clone().or(remote_domain);
        let template = config::load_index_template(&config_dir, &group)?;
        let rendered = directory::render_directory(
            &group,
            &definitions,
            domain.as_deref(),
            &template,
            &opts.config_dir,
            Utc::now(),
        )?;
        let written = directory::write_directory(&rendered, &opts.output_dir)?;

        if !ctx.quiet {
            println!();
            ui::success(&format!(
                "Wrote {} and {} to {}",
                ui::plural(written.len().saturating_sub(1), "subgroup page"),
                INDEX_FILE,
                opts.output_dir.display()
            ));
        }
    }

    Ok(())
}

fn report_local(
    ctx: &Context,
    group: &GroupConfig,
    definitions: &Definitions,
    targets: &[SubgroupTarget],
) {
    for target in targets {
        if target.invalid > 0 {
            log::warn!(
                "{}: ignored {} member entries with a missing name or unusable email",
                target.id,
                target.invalid
            );
        }
        if target.members_key_absent {
            log::info!("{} has no list-members", target.id);
        }
    }

    if ctx.quiet {
        return;
    }

    ui::section("Local definitions");
    ui::kv("Group", &group.group_name);
    ui::kv("Definition files", &definitions.files.to_string());
    ui::kv("Subgroups", &definitions.len().to_string());
    ui::kv("Reconciled", &targets.len().to_string());
    if !definitions.skipped.is_empty() {
        ui::kv("Empty", &definitions.skipped.join(", "));
    }
    if ctx.verbose > 0 {
        for target in targets {
            ui::dim(&format!(
                "{} -> {} ({})",
                target.id,
                target.remote_name,
                ui::plural(target.desired.len(), "member")
            ));
        }
    }
    if let Some(unified) = &group.unified_list {
        let meta = collect_meta(targets);
        ui::kv(
            "Unified list",
            &format!(
                "{} ({} members, {} opted out)",
                group.remote_name(unified),
                meta.members.len(),
                meta.opted_out.len()
            ),
        );
    }
}

fn login(ctx: &Context, client: &mut Client, credentials: &Credentials) -> Result<()> {
    let pb = progress::spinner("Logging in to Groups.io...", ctx.quiet);
    match client.login(&credentials.username, &credentials.password) {
        Ok(_) => {
            progress::finish_success(&pb, &format!("Logged in as {}", credentials.username));
            Ok(())
        }
        Err(e) => {
            progress::finish_error(&pb, "Login failed");
            let category = e.category();
            Err(e).context(format!("{category}. {}", category.advice()))
        }
    }
}

/// Fetch remote state, reconcile every target, then the unified list.
///
/// Listing the parent group's subgroups must succeed. A failed member listing
/// only stops that one target from being modified.
pub fn run_remote(
    ctx: &Context,
    client: &Client,
    group: &GroupConfig,
    targets: &[SubgroupTarget],
    opts: ExecuteOptions,
) -> Result<RemoteOutcome> {
    let mut outcome = RemoteOutcome::default();

    let pb = progress::spinner(
        &format!("Fetching subgroups of {}...", group.group_name),
        ctx.quiet,
    );
    let subgroups = match client.subgroups(&group.group_name) {
        Ok(subgroups) => subgroups,
        Err(e) => {
            progress::finish_error(&pb, "Could not list subgroups");
            return Err(e)
                .with_context(|| format!("Failed to list subgroups of {}", group.group_name));
        }
    };
    let remote = matching_subgroups(group, &subgroups);
    progress::finish_success(
        &pb,
        &format!("Found {} matching subgroups", remote.names.len()),
    );
    outcome.domain = remote.domain.clone();

    if remote.names.is_empty() {
        log::warn!(
            "No subgroups named {}+... found on Groups.io",
            group.group_name
        );
        return Ok(outcome);
    }

    for target in targets {
        if !remote.names.contains(&target.remote_name) {
            log::info!("{} does not exist on Groups.io, skipping", target.remote_name);
            continue;
        }
        if target.members_key_absent {
            log::warn!(
                "{} has no list-members: every ordinary member of {} will be removed",
                target.id,
                target.remote_name
            );
        }

        let Some(membership) = fetch_membership(ctx, client, &target.remote_name) else {
            continue;
        };
        let diff = reconcile(&target.desired, &membership);
        outcome
            .summary
            .merge(show_and_apply(ctx, client, group, &target.remote_name, &diff, &membership, opts));
    }

    if let Some(unified) = &group.unified_list {
        let remote_name = group.remote_name(unified);
        let meta = collect_meta(targets);

        if let Some(membership) = fetch_membership(ctx, client, &remote_name) {
            let diff = reconcile_unified(&meta, &membership);
            outcome
                .summary
                .merge(show_and_apply(ctx, client, group, &remote_name, &diff, &membership, opts));
        }
    }

    Ok(outcome)
}

/// Current membership, or `None` after logging why it is unavailable.
fn fetch_membership(ctx: &Context, client: &Client, remote_name: &str) -> Option<Membership> {
    let pb = progress::spinner(&format!("Fetching members of {remote_name}..."), ctx.quiet);
    match client.membership(remote_name) {
        Ok(membership) => {
            pb.finish_and_clear();
            Some(membership)
        }
        Err(e) => {
            progress::finish_error(&pb, &format!("Could not fetch {remote_name}"));
            log::error!("Something went wrong: {remote_name} | {}", e.kind());
            None
        }
    }
}

fn show_and_apply(
    ctx: &Context,
    client: &Client,
    group: &GroupConfig,
    remote_name: &str,
    diff: &MembershipDiff,
    membership: &Membership,
    opts: ExecuteOptions,
) -> ExecuteSummary {
    if !ctx.quiet {
        engine::display_diff(remote_name, diff, membership);
    }
    engine::apply(client, &group.group_name, remote_name, diff, opts)
}
