/// Configuration system for liverisk.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::LiveriskConfig::default()`]
/// 2. **User global config** — `~/.liverisk/config.toml`
/// 3. **Project local config** — `.liverisk.toml` in the current working directory
/// 4. **Environment variables** — `LIVERISK_*` overrides (highest precedence)
///
/// Layers are merged key by key: a key a file does not set keeps the value
/// from the layer below it. A file that fails to parse, or whose values do not
/// fit the schema, is skipped as a whole.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::predict::RacePolicy;

pub use schema::LiveriskConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration: defaults → global TOML → project
/// TOML → env vars.
pub fn load() -> LiveriskConfig {
    let mut config = load_layers(&[global_config_path(), project_config_path()]);
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files, lowest precedence first, over the built-in
/// defaults.
fn load_layers(paths: &[Option<PathBuf>]) -> LiveriskConfig {
    let Ok(mut merged) = toml::Value::try_from(LiveriskConfig::default()) else {
        return LiveriskConfig::default();
    };

    for path in paths.iter().flatten() {
        let Some(layer) = read_toml_layer(path) else {
            continue;
        };
        let mut candidate = merged.clone();
        merge_toml(&mut candidate, layer);
        if candidate.clone().try_into::<LiveriskConfig>().is_ok() {
            merged = candidate;
        }
    }

    merged.try_into().unwrap_or_default()
}

/// Read a TOML file as an untyped value. Missing or malformed files yield
/// `None` so a broken config never blocks a prediction.
fn read_toml_layer(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Recursively overlay `overlay` onto `base`. Tables merge per key, any other
/// value replaces what was there.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.liverisk`, home of the global config and the prediction log.
pub fn liverisk_home_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".liverisk"))
}

fn global_config_path() -> Option<PathBuf> {
    liverisk_home_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".liverisk.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `LIVERISK_ENDPOINT` — prediction endpoint URL
/// - `LIVERISK_TIMEOUT_MS` — request timeout (`0` = none)
/// - `LIVERISK_RACE_POLICY` — `last-resolved-wins` | `latest-submission-wins`
/// - `LIVERISK_WEB_ADDR` — form page listen address
/// - `LIVERISK_LOGGING` — prediction history log (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut LiveriskConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from(config: &mut LiveriskConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("LIVERISK_ENDPOINT")
        && !val.is_empty()
    {
        config.client.endpoint = val;
    }
    if let Some(val) = var("LIVERISK_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.client.timeout_ms = ms;
    }
    if let Some(val) = var("LIVERISK_RACE_POLICY")
        && let Some(policy) = parse_race_policy(&val)
    {
        config.client.race_policy = policy;
    }
    if let Some(val) = var("LIVERISK_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Some(val) = var("LIVERISK_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a race policy name.
pub fn parse_race_policy(val: &str) -> Option<RacePolicy> {
    match val.to_ascii_lowercase().replace('_', "-").as_str() {
        "last-resolved-wins" | "last-resolved" => Some(RacePolicy::LastResolvedWins),
        "latest-submission-wins" | "latest-submission" => Some(RacePolicy::LatestSubmissionWins),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config management (init / set / reset / show)
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.liverisk/config.toml`.
///
/// Returns an error if the file already exists, unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, LiveriskConfig::default_toml()).context("failed to write config file")?;
    Ok(())
}

/// Set a single config key (dotted, e.g. `client.endpoint`) in the global
/// config file, creating the file from defaults if needed.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&LiveriskConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;

    // Reject writes that would leave the file unloadable.
    toml::from_str::<LiveriskConfig>(&updated)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, updated).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path. The existing
/// value's type decides how `raw_value` is parsed.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((sections, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be dotted, e.g. 'client.endpoint': '{key}'");
    };

    let mut current = root;
    for part in sections.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{sections}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("unsupported config value type for '{key}'"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
