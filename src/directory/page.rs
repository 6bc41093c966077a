//! Markdown page for one subgroup.

use std::path::Path;

use crate::schema::{Member, SubgroupDefinition, ValidMember, present};

/// Marker placed at the top of every generated file.
pub const AUTOGENERATED_MARKER: &str = "<!-- AUTOGENERATED PAGE, DO NOT EDIT IT DIRECTLY -->";

/// Ordered list of optional Markdown blocks, joined once with blank lines.
#[derive(Debug, Default)]
pub struct PageBuilder {
    blocks: Vec<String>,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block; blank blocks are dropped.
    pub fn push(&mut self, block: impl Into<String>) -> &mut Self {
        let block = block.into();
        if !block.trim().is_empty() {
            self.blocks.push(block);
        }
        self
    }

    /// Append a block when present.
    pub fn push_opt(&mut self, block: Option<String>) -> &mut Self {
        if let Some(block) = block {
            self.push(block);
        }
        self
    }

    /// Join the blocks, ending with a single newline.
    pub fn build(&self) -> String {
        let mut page = self
            .blocks
            .iter()
            .map(|b| b.trim_end())
            .collect::<Vec<_>>()
            .join("\n\n");
        page.push('\n');
        page
    }
}

/// Render the page for subgroup `id`.
///
/// `domain` is the mail domain for the mailing-list link; the link is left
/// out when it is unknown. `source` is the definition file, named in the
/// footer.
pub fn render_subgroup_page(
    id: &str,
    definition: &SubgroupDefinition,
    domain: Option<&str>,
    source: &Path,
) -> String {
    let members: Vec<(ValidMember, &Member)> = definition
        .members()
        .iter()
        .filter_map(|m| m.validate().map(|valid| (valid, m)))
        .collect();

    let mut page = PageBuilder::new();
    page.push(AUTOGENERATED_MARKER)
        .push(header(id, definition))
        .push_opt(contact_links(id, definition, domain))
        .push_opt(governance(definition, &members))
        .push_opt(repositories(definition))
        .push_opt(members_section(&members))
        .push(footer(source));
    page.build()
}

fn header(id: &str, definition: &SubgroupDefinition) -> String {
    let name = definition.display_name(id);
    let mut header = PageBuilder::new();
    header.push(format!("# {name}"));
    if let Some(logo) = present(definition.logo.as_deref()) {
        header.push(format!(
            r#"<img align="right" src="{logo}" width=200 alt="{name} logo">"#
        ));
    }
    header.push_opt(present(definition.description.as_deref()).map(str::to_string));
    header.build()
}

fn link(label: &str, target: &str) -> String {
    format!("[{label}]({target})")
}

fn contact_links(id: &str, def: &SubgroupDefinition, domain: Option<&str>) -> Option<String> {
    let field = |value: &Option<String>| present(value.as_deref()).map(str::to_string);

    let links: Vec<String> = [
        field(&def.about_url).map(|u| link("About", &u)),
        present(domain).map(|d| link("Mailing list", &format!("mailto:{id}@{d}"))),
        field(&def.development_list).map(|u| link("Dev list", &u)),
        field(&def.calendar).map(|u| link("Calendar", &u)),
        field(&def.slack).map(|u| link("Slack", &u)),
        field(&def.discourse).map(|u| link("Discourse", &u)),
        field(&def.irc).map(|u| link("IRC", &u)),
        field(&def.chat).map(|u| link("Chat", &u)),
        field(&def.twitter_username)
            .map(|h| link("Twitter", &format!("https://twitter.com/{h}"))),
        field(&def.linkedin_username).map(|h| {
            link(
                "LinkedIn",
                &format!("https://www.linkedin.com/company/{h}"),
            )
        }),
        field(&def.youtube).map(|u| link("YouTube", &u)),
        field(&def.artwork).map(|u| link("Artwork", &u)),
    ]
    .into_iter()
    .flatten()
    .collect();

    (!links.is_empty()).then(|| links.join(" | "))
}

fn governance(def: &SubgroupDefinition, members: &[(ValidMember, &Member)]) -> Option<String> {
    let links: Vec<String> = [
        ("Charter", &def.charter),
        ("Code of Conduct", &def.code_of_conduct),
        ("CONTRIBUTING.md", &def.contributing),
    ]
    .into_iter()
    .filter_map(|(label, value)| present(value.as_deref()).map(|u| link(label, u)))
    .collect();

    let mut rows = Vec::new();
    for (valid, member) in members {
        for role in member.roles().iter().filter(|r| r.is_voting) {
            if let Some(title) = present(role.title.as_deref()) {
                rows.push(format!("| {} | {} | {} |", valid.name, title, role.term()));
            }
        }
    }

    if links.is_empty() && rows.is_empty() {
        return None;
    }

    let mut section = PageBuilder::new();
    section.push("## Governance:").push(links.join(" | "));
    if !rows.is_empty() {
        let mut table = vec![
            "| Voting members | Role | Term |".to_string(),
            "|---|---|---|".to_string(),
        ];
        table.extend(rows);
        section.push(table.join("\n"));
    }
    Some(section.build())
}

fn repositories(def: &SubgroupDefinition) -> Option<String> {
    let repos: Vec<String> = def
        .repositories()
        .iter()
        .filter_map(|r| present(r.repo.as_deref()))
        .map(|repo| format!("* {}", link(repo, repo)))
        .collect();

    (!repos.is_empty()).then(|| format!("## Repositories:\n\n{}", repos.join("\n")))
}

fn members_section(members: &[(ValidMember, &Member)]) -> Option<String> {
    if members.is_empty() {
        return None;
    }

    let mut section = PageBuilder::new();
    section.push("## Members:");
    for (valid, member) in members {
        section.push(member_block(valid, member));
    }
    Some(section.build())
}

fn member_block(valid: &ValidMember, member: &Member) -> String {
    let name = &valid.name;
    let mut block = PageBuilder::new();
    block.push(format!("### **{name}**"));

    if let Some(photo) = present(member.photo.as_deref()) {
        block.push(format!(
            r#"<img src="{photo}" height=100 alt="Profile photo of {name}">"#
        ));
    }

    let roles: Vec<String> = member
        .roles()
        .iter()
        .filter_map(|role| {
            let title = present(role.title.as_deref())?;
            let mut line = format!("* **{title}**");
            if role.is_voting {
                line.push_str(", voting member");
            }
            let term = role.term();
            if !term.is_empty() {
                line.push_str(&format!(" ({term})"));
            }
            Some(line)
        })
        .collect();
    block.push(roles.join("\n"));

    block.push_opt(present(member.bio.as_deref()).map(str::to_string));

    if let Some(sponsor) = present(member.sponsor.as_deref()) {
        let sponsor = match present(member.sponsor_website.as_deref()) {
            Some(site) => link(sponsor, site),
            None => sponsor.to_string(),
        };
        block.push(format!("Participating on behalf of **{sponsor}**"));
    }

    let field = |value: &Option<String>| present(value.as_deref()).map(str::to_string);
    let details: Vec<String> = [
        field(&member.github_username).map(|h| link("GitHub", &format!("https://github.com/{h}"))),
        field(&member.twitter_username)
            .map(|h| link("Twitter", &format!("https://twitter.com/{h}"))),
        field(&member.linkedin_username)
            .map(|h| link("LinkedIn", &format!("https://www.linkedin.com/in/{h}"))),
        field(&member.website).map(|u| link("Website", &u)),
        field(&member.pronouns).map(|p| format!("Pronouns: {p}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    block.push(details.join(" | "));

    block.build()
}

fn footer(source: &Path) -> String {
    let source = source.to_string_lossy().replace('\\', "/");
    format!(
        "------\n\nThis directory is automatically generated. \
         To make changes, please submit a pull request against [{source}](/{source})"
    )
}
