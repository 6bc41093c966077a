//! Markdown member directory
//!
//! Renders one page per subgroup definition plus a `README.md` index, from
//! local definitions only. Nothing here talks to Groups.io.

pub mod index;
pub mod page;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Definitions;
use crate::schema::GroupConfig;

use index::{IndexEntry, render_index};
use page::render_subgroup_page;

/// Name of the generated index page.
pub const INDEX_FILE: &str = "README.md";

/// One generated subgroup page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub file_name: String,
    pub title: String,
    pub content: String,
}

/// Every page of one run, ready to write.
#[derive(Debug, Clone)]
pub struct Directory {
    pub pages: Vec<RenderedPage>,
    pub index: String,
}

/// Output file for a subgroup: slashes become dashes.
pub fn page_file_name(id: &str) -> String {
    format!("{}.md", id.replace('/', "-"))
}

/// Render all pages and the index.
///
/// The main list and the unified list get no page. `domain` is the mail
/// domain for `mailto:` links, if known.
pub fn render_directory(
    config: &GroupConfig,
    definitions: &Definitions,
    domain: Option<&str>,
    template: &str,
    config_dir_label: &str,
    generated: DateTime<Utc>,
) -> Result<Directory> {
    let mut pages = Vec::new();

    for (id, loaded) in &definitions.subgroups {
        if config.is_protected(id) {
            continue;
        }

        let definition = &loaded.definition;
        pages.push(RenderedPage {
            file_name: page_file_name(id),
            title: definition.display_name(id).to_string(),
            content: render_subgroup_page(id, definition, domain, &loaded.source),
        });
    }

    let entries: Vec<IndexEntry> = pages
        .iter()
        .map(|p| IndexEntry {
            title: p.title.clone(),
            path: p.file_name.clone(),
        })
        .collect();
    let index = render_index(template, &entries, config_dir_label, generated)
        .context("Failed to render the directory index")?;

    Ok(Directory { pages, index })
}

/// Write every page and the index into `out_dir`, returning the written paths.
pub fn write_directory(directory: &Directory, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(directory.pages.len() + 1);
    for page in &directory.pages {
        let path = out_dir.join(&page.file_name);
        fs::write(&path, &page.content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::debug!("Wrote {}", path.display());
        written.push(path);
    }

    let index_path = out_dir.join(INDEX_FILE);
    fs::write(&index_path, &directory.index)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;
    written.push(index_path);

    Ok(written)
}
