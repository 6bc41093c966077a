use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::schema::{GroupConfig, RawGroupConfig, SubgroupDefinition, present};

/// Directory (inside the config dir) holding the root config and templates.
pub const ASSETS_DIR: &str = "assets";

/// Root configuration file name inside [`ASSETS_DIR`].
pub const CONFIG_FILE: &str = "config.yml";

/// Resolve the config directory, expanding a leading `~`.
pub fn resolve_config_dir(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Root config
// ============================================================================

/// Load and validate `<config_dir>/assets/config.yml`.
pub fn load_group_config(config_dir: &Path) -> Result<GroupConfig> {
    let path = config_dir.join(ASSETS_DIR).join(CONFIG_FILE);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Could not read config: {}", path.display()))?;
    let raw: Option<RawGroupConfig> = serde_yaml::from_str(&content)
        .with_context(|| format!("Invalid config format: {}", path.display()))?;
    let Some(raw) = raw else {
        bail!("Config is empty: {}", path.display());
    };

    validate_group_config(raw)
}

/// Check required keys and apply defaults.
pub fn validate_group_config(raw: RawGroupConfig) -> Result<GroupConfig> {
    let Some(group_name) = owned(raw.group_name.as_deref()) else {
        bail!("No group name ('group-name: ...') defined in config");
    };
    let Some(main_list) = owned(raw.main_list.as_deref()) else {
        bail!("No main list ('main-list: ...') defined in config");
    };
    let Some(index_template_file) = owned(raw.index_template_file.as_deref()) else {
        bail!("No index template file ('index-template-file: ...') defined in config");
    };

    let group_domain = owned(raw.group_domain.as_deref());
    if group_domain.is_none() {
        log::warn!("Group domain ('group-domain: ...') not specified in config");
    }

    let unified_list = owned(raw.unified_list.as_deref());
    match &unified_list {
        None => log::info!(
            "No unified list ('unified-list: ...') defined in config, it will not be managed"
        ),
        Some(unified) if *unified == main_list => {
            bail!("You cannot use {main_list} as your unified list")
        }
        Some(_) => {}
    }

    Ok(GroupConfig {
        group_name,
        group_domain,
        main_list,
        unified_list,
        index_template_file,
    })
}

fn owned(value: Option<&str>) -> Option<String> {
    present(value).map(str::to_string)
}

/// Read the index template named in the config.
pub fn load_index_template(config_dir: &Path, config: &GroupConfig) -> Result<String> {
    let path = config_dir
        .join(ASSETS_DIR)
        .join(&config.index_template_file);
    fs::read_to_string(&path)
        .with_context(|| format!("Could not read index template: {}", path.display()))
}

// ============================================================================
// Subgroup definitions
// ============================================================================

/// A subgroup definition and the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedSubgroup {
    pub source: PathBuf,
    pub definition: SubgroupDefinition,
}

/// All non-empty subgroup definitions, keyed by subgroup identifier.
#[derive(Debug, Default)]
pub struct Definitions {
    pub subgroups: BTreeMap<String, LoadedSubgroup>,
    /// Definition files read, including empty ones.
    pub files: usize,
    /// Identifiers (or file names) skipped because they were empty.
    pub skipped: Vec<String>,
}

impl Definitions {
    /// Number of usable subgroup definitions.
    pub fn len(&self) -> usize {
        self.subgroups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subgroups.is_empty()
    }
}

/// Load every definition file below `config_dir`, skipping the assets directory.
///
/// Each file maps subgroup identifiers to definitions. Empty files and empty
/// definitions are skipped; finding no definition files at all is an error.
pub fn load_definitions(config_dir: &Path) -> Result<Definitions> {
    if !config_dir.is_dir() {
        bail!("Config directory not found: {}", config_dir.display());
    }

    let mut definitions = Definitions::default();

    let walker = WalkDir::new(config_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == ASSETS_DIR));

    for entry in walker {
        let entry = entry.with_context(|| format!("Could not walk {}", config_dir.display()))?;
        if !entry.file_type().is_file() || !is_yaml(entry.path()) {
            continue;
        }

        definitions.files += 1;
        load_definition_file(entry.path(), &mut definitions)?;
    }

    if definitions.files == 0 {
        bail!("No lists defined in {}", config_dir.display());
    }

    Ok(definitions)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml")
    )
}

fn load_definition_file(path: &Path, definitions: &mut Definitions) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;

    let parsed: Option<BTreeMap<String, Option<SubgroupDefinition>>> = if content.trim().is_empty()
    {
        None
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid definition file: {}", path.display()))?
    };

    let Some(entries) = parsed else {
        log::info!("Empty definition file ({}).", path.display());
        definitions.skipped.push(path.display().to_string());
        return Ok(());
    };

    for (id, definition) in entries {
        let Some(definition) = definition else {
            log::info!("Empty group definition ({id}).");
            definitions.skipped.push(id);
            continue;
        };

        let loaded = LoadedSubgroup {
            source: path.to_path_buf(),
            definition,
        };
        if let Some(previous) = definitions.subgroups.insert(id.clone(), loaded) {
            log::warn!(
                "Subgroup {id} is defined in both {} and {}, using the latter",
                previous.source.display(),
                path.display()
            );
        }
    }

    Ok(())
}
