//! Root index page from a `$placeholder` template.

use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

use super::page::AUTOGENERATED_MARKER;

/// Timestamp format for `$generated_date`.
pub const GENERATED_DATE_FORMAT: &str = "%Y-%m-%d at %H:%M:%S UTC";

/// `$$`, `$name`, `${name}`, or a stray `$`.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$(?:(?P<escaped>\$)|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\}|(?P<invalid>))",
    )
    .expect("valid placeholder pattern")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown placeholder '${0}' in index template")]
    UnknownPlaceholder(String),

    #[error("Invalid placeholder in index template, line {line}, col {col}")]
    InvalidPlaceholder { line: usize, col: usize },
}

/// An entry of the subgroup list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub title: String,
    pub path: String,
}

/// Replace placeholders in `template` with `values`.
pub fn substitute(template: &str, values: &BTreeMap<&str, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);
        out.push_str(&replacement(template, &caps, whole.start(), values)?);
        last = whole.end();
    }
    out.push_str(&template[last..]);

    Ok(out)
}

fn replacement(
    template: &str,
    caps: &Captures<'_>,
    offset: usize,
    values: &BTreeMap<&str, String>,
) -> Result<String, TemplateError> {
    if caps.name("escaped").is_some() {
        return Ok("$".to_string());
    }

    let Some(name) = caps.name("named").or_else(|| caps.name("braced")) else {
        let before = &template[..offset];
        let line = before.matches('\n').count() + 1;
        let col = before.len() - before.rfind('\n').map_or(0, |i| i + 1) + 1;
        return Err(TemplateError::InvalidPlaceholder { line, col });
    };

    values
        .get(name.as_str())
        .cloned()
        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.as_str().to_string()))
}

/// Bullet list of pages, sorted by title.
pub fn subgroup_list(entries: &[IndexEntry]) -> String {
    let mut sorted: Vec<&IndexEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.path.cmp(&b.path)));
    sorted
        .iter()
        .map(|e| format!("* [{}]({})\n", e.title, e.path))
        .collect()
}

/// Render `README.md`.
pub fn render_index(
    template: &str,
    entries: &[IndexEntry],
    config_dir_label: &str,
    generated: DateTime<Utc>,
) -> Result<String, TemplateError> {
    let values = BTreeMap::from([
        ("subgroups", subgroup_list(entries)),
        ("group_configs_dir", config_dir_label.to_string()),
        (
            "generated_date",
            generated.format(GENERATED_DATE_FORMAT).to_string(),
        ),
    ]);

    let body = substitute(template, &values)?;
    Ok(format!("{AUTOGENERATED_MARKER}\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn values() -> BTreeMap<&'static str, String> {
        BTreeMap::from([("name", "World".to_string())])
    }

    #[test]
    fn substitutes_both_forms() {
        let out = substitute("Hello $name, ${name}s!", &values()).unwrap();
        assert_eq!(out, "Hello World, Worlds!");
    }

    #[test]
    fn dollar_escape() {
        let out = substitute("Cost: $$5 for $name", &values()).unwrap();
        assert_eq!(out, "Cost: $5 for World");
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = substitute("Hi $nobody", &values()).unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder("nobody".to_string()));
    }

    #[test]
    fn stray_dollar_is_an_error() {
        let err = substitute("line one\nprice: $5", &values()).unwrap_err();
        assert_eq!(err, TemplateError::InvalidPlaceholder { line: 2, col: 8 });
    }

    #[test]
    fn list_is_sorted_by_title() {
        let entries = vec![
            IndexEntry {
                title: "Zeta".to_string(),
                path: "zeta.md".to_string(),
            },
            IndexEntry {
                title: "Alpha".to_string(),
                path: "alpha.md".to_string(),
            },
        ];
        assert_eq!(
            subgroup_list(&entries),
            "* [Alpha](alpha.md)\n* [Zeta](zeta.md)\n"
        );
    }

    #[test]
    fn renders_index_with_marker_and_date() {
        let generated = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        let entries = vec![IndexEntry {
            title: "Docs".to_string(),
            path: "docs.md".to_string(),
        }];
        let out = render_index(
            "# Groups\n\n$subgroups\nFrom ${group_configs_dir} on $generated_date.\n",
            &entries,
            "groups",
            generated,
        )
        .unwrap();

        assert!(out.starts_with(AUTOGENERATED_MARKER));
        assert!(out.contains("* [Docs](docs.md)\n"));
        assert!(out.contains("From groups on 2024-03-05 at 07:08:09 UTC."));
    }
}
