//! Recipe configuration loader.
//!
//! A pipeline is configured by one TOML file: named recipes (fetch recipes
//! carry a URL template, parse recipes a translator tag) and an ordered
//! `[[groups]]` list wiring them into category contributions. Unlike an
//! optional UI preferences file, a missing recipe file is an error — the
//! pipeline cannot run without one.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::recipe::{FetchRecipe, ParseRecipe, RecipeGroup, RecipePair, RecipeRegistry};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read recipe config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML in recipe config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("recipe config too large: {0}")]
    TooLarge(String),

    /// Structurally valid TOML that does not describe a runnable pipeline.
    #[error("invalid recipe config: {0}")]
    Invalid(String),
}

// ============================================================================
// Raw (serde) shape
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    root_parent_param: Option<String>,
    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_max_feed_bytes")]
    max_feed_bytes: usize,
    #[serde(default)]
    recipes: HashMap<String, RawRecipe>,
    #[serde(default)]
    groups: Vec<RawGroup>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_feed_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize)]
struct RawRecipe {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    translator: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category_fetch: Option<String>,
    #[serde(default)]
    category_parse: Option<String>,
    item_fetch: String,
    item_parse: String,
    #[serde(default)]
    live: bool,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Validated pipeline configuration: the recipe registry plus transport
/// tuning knobs.
#[derive(Debug, Clone)]
pub struct Config {
    pub registry: RecipeRegistry,
    pub request_timeout: Duration,
    pub max_feed_bytes: usize,
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load and validate a recipe configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::Io)`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line info
    /// - Unresolvable recipe references, half-configured category pairs,
    ///   groups with neither recipes nor a name, invalid URLs →
    ///   `Err(ConfigError::Invalid)`
    /// - Unknown top-level keys → accepted, logged as a warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "{} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "root_parent_param",
                "request_timeout_secs",
                "max_feed_bytes",
                "recipes",
                "groups",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "unknown key in recipe config, ignoring");
                }
            }
        }

        let raw: RawConfig = toml::from_str(&content)?;
        let config = Self::resolve(raw)?;
        tracing::info!(
            path = %path.display(),
            groups = config.registry.len(),
            "loaded recipe configuration"
        );
        Ok(config)
    }

    fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.groups.is_empty() {
            return Err(ConfigError::Invalid("no [[groups]] configured".into()));
        }

        let mut groups = Vec::with_capacity(raw.groups.len());
        for (index, group) in raw.groups.iter().enumerate() {
            let category = match (&group.category_fetch, &group.category_parse) {
                (None, None) => {
                    if group.name.is_none() {
                        return Err(ConfigError::Invalid(format!(
                            "group {index}: needs either category recipes or a literal name"
                        )));
                    }
                    None
                }
                (Some(fetch), Some(parse)) => Some(RecipePair {
                    fetch: resolve_fetch(&raw.recipes, fetch)?,
                    parse: resolve_parse(&raw.recipes, parse)?,
                }),
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "group {index}: category_fetch and category_parse must be set together"
                    )));
                }
            };

            groups.push(RecipeGroup {
                name: group.name.clone(),
                category,
                items: RecipePair {
                    fetch: resolve_fetch(&raw.recipes, &group.item_fetch)?,
                    parse: resolve_parse(&raw.recipes, &group.item_parse)?,
                },
                live: group.live,
            });
        }

        Ok(Self {
            registry: RecipeRegistry::new(groups, raw.root_parent_param),
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            max_feed_bytes: raw.max_feed_bytes,
        })
    }
}

fn resolve_fetch(
    recipes: &HashMap<String, RawRecipe>,
    name: &str,
) -> Result<FetchRecipe, ConfigError> {
    let raw = recipes
        .get(name)
        .ok_or_else(|| ConfigError::Invalid(format!("unknown recipe '{name}'")))?;
    let url = raw
        .url
        .as_ref()
        .ok_or_else(|| ConfigError::Invalid(format!("recipe '{name}' has no url")))?;

    // Placeholders are substituted at fetch time; validate with dummies.
    let probe = url.replace("{param}", "probe").replace("{page}", "1");
    url::Url::parse(&probe)
        .map_err(|e| ConfigError::Invalid(format!("recipe '{name}' has an invalid url: {e}")))?;

    Ok(FetchRecipe {
        name: name.to_owned(),
        url: url.clone(),
    })
}

fn resolve_parse(
    recipes: &HashMap<String, RawRecipe>,
    name: &str,
) -> Result<ParseRecipe, ConfigError> {
    let raw = recipes
        .get(name)
        .ok_or_else(|| ConfigError::Invalid(format!("unknown recipe '{name}'")))?;
    let translator = raw
        .translator
        .as_ref()
        .ok_or_else(|| ConfigError::Invalid(format!("recipe '{name}' has no translator")))?;

    Ok(ParseRecipe {
        name: name.to_owned(),
        translator: translator.clone(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
root_parent_param = "root-playlist"
request_timeout_secs = 10

[recipes.cats]
url = "https://api.example.com/playlists?parent={param}"

[recipes.cats-parse]
translator = "json-categories"

[recipes.vids]
url = "https://api.example.com/videos?playlist={param}&page={page}"

[recipes.vids-parse]
translator = "json-items"

[[groups]]
category_fetch = "cats"
category_parse = "cats-parse"
item_fetch = "vids"
item_parse = "vids-parse"

[[groups]]
name = "Live Now"
item_fetch = "vids"
item_parse = "vids-parse"
live = true
"#;

    fn write_config(dir_name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("recipes.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_valid_config_resolves() {
        let path = write_config("lineup_config_valid", VALID);
        let config = Config::load(&path).unwrap();

        assert_eq!(config.registry.len(), 2);
        assert_eq!(config.registry.root_parent_param(), Some("root-playlist"));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_feed_bytes, 10 * 1024 * 1024); // default

        let first = config.registry.group(0).unwrap();
        assert!(first.category.is_some());
        assert!(!first.live);

        let second = config.registry.group(1).unwrap();
        assert!(second.category.is_none());
        assert_eq!(second.name.as_deref(), Some("Live Now"));
        assert!(second.live);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load(Path::new("/tmp/lineup_nonexistent_recipes.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let path = write_config("lineup_config_badtoml", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_no_groups_rejected() {
        let path = write_config("lineup_config_nogroups", "[recipes.x]\nurl = \"https://e.com\"\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_group_without_recipes_or_name_rejected() {
        let content = r#"
[recipes.vids]
url = "https://api.example.com/videos"
[recipes.vids-parse]
translator = "json-items"
[[groups]]
item_fetch = "vids"
item_parse = "vids-parse"
"#;
        let path = write_config("lineup_config_anon_group", content);
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("literal name"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_half_category_pair_rejected() {
        let content = r#"
[recipes.cats]
url = "https://api.example.com/playlists"
[recipes.vids]
url = "https://api.example.com/videos"
[recipes.vids-parse]
translator = "json-items"
[[groups]]
name = "X"
category_fetch = "cats"
item_fetch = "vids"
item_parse = "vids-parse"
"#;
        let path = write_config("lineup_config_half_pair", content);
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("set together"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unknown_recipe_reference_rejected() {
        let content = r#"
[[groups]]
name = "X"
item_fetch = "missing"
item_parse = "missing-too"
"#;
        let path = write_config("lineup_config_unknown_ref", content);
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("unknown recipe"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_fetch_recipe_without_url_rejected() {
        let content = r#"
[recipes.vids]
translator = "json-items"
[recipes.vids-parse]
translator = "json-items"
[[groups]]
name = "X"
item_fetch = "vids"
item_parse = "vids-parse"
"#;
        let path = write_config("lineup_config_no_url", content);
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("no url"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_invalid_url_rejected() {
        let content = r#"
[recipes.vids]
url = "not a url at all"
[recipes.vids-parse]
translator = "json-items"
[[groups]]
name = "X"
item_fetch = "vids"
item_parse = "vids-parse"
"#;
        let path = write_config("lineup_config_bad_url", content);
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid url"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let content = "a".repeat(1_048_577);
        let path = write_config("lineup_config_too_large", &content);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        std::fs::remove_file(&path).ok();
    }
}
