//! Configuration loading and parsing for analysis defaults
//!
//! Reads `kaizen-utils.toml`: which globals exist, how the reference tracker
//! treats CommonJS interop, and what side-effect detection assumes.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::reference_tracker::ReferenceTrackerOptions;
use crate::scope::{Environment, ScopeOptions};
use crate::side_effect::{SideEffectOptions, VisitorKeys};

pub const CONFIG_FILENAME: &str = "kaizen-utils.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "globals",
    "reference_tracker",
    "side_effects",
    "visitor_keys",
];
const KNOWN_SECTION_KEYS: &[(&str, &[&str])] = &[
    ("globals", &["builtin", "environments", "extra"]),
    ("reference_tracker", &["mode", "global_object_names"]),
    (
        "side_effects",
        &["consider_getters", "consider_implicit_type_conversion"],
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: AnalysisConfig,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub globals: GlobalsConfig,
    pub reference_tracker: ReferenceTrackerOptions,
    pub side_effects: SideEffectOptions,
    /// Child slots per node type for side-effect detection.
    pub visitor_keys: VisitorKeys,
}

impl AnalysisConfig {
    pub fn scope_options(&self) -> ScopeOptions {
        self.globals.scope_options()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlobalsConfig {
    /// Declare the ECMAScript built-ins.
    pub builtin: bool,
    pub environments: Vec<Environment>,
    /// Additional global names.
    pub extra: Vec<String>,
}

impl Default for GlobalsConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            environments: vec![Environment::Browser, Environment::Node, Environment::CommonJs],
            extra: Vec::new(),
        }
    }
}

impl GlobalsConfig {
    pub fn scope_options(&self) -> ScopeOptions {
        ScopeOptions::from_environments(self.builtin, &self.environments).with_globals(&self.extra)
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse(path: &Path, content: &str) -> Result<AnalysisConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    let content = read(path)?;
    parse(path, &content)
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = read(path)?;
    let config = parse(path, &content)?;
    let warnings = detect_unknown_keys(&content);

    for warning in &warnings {
        tracing::debug!(path = %path.display(), "{warning}");
    }

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known) in KNOWN_SECTION_KEYS {
        if let Some(toml::Value::Table(entries)) = table.get(*section) {
            for key in entries.keys() {
                if !known.contains(&key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    warnings
}

pub fn load_config_or_default(start_dir: &Path) -> AnalysisConfig {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}

pub fn load_config_or_default_with_warnings(start_dir: &Path) -> ConfigResult {
    match find_config_file(start_dir) {
        Some(path) => load_config_with_warnings(&path).unwrap_or_default(),
        None => ConfigResult::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_tracker::TrackerMode;
    use std::fs;

    fn create_temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    fn load_config_from_file() {
        let dir = create_temp_dir();
        let config_path = write_config(
            &dir,
            r#"
[globals]
builtin = false
environments = ["node", "commonjs"]
extra = ["myGlobal"]

[reference_tracker]
mode = "legacy"
global_object_names = ["globalThis"]

[side_effects]
consider_getters = true

[visitor_keys]
CallExpression = ["callee"]
"#,
        );

        let config = load_config(&config_path).unwrap();

        assert!(!config.globals.builtin);
        assert_eq!(
            config.globals.environments,
            vec![Environment::Node, Environment::CommonJs]
        );
        assert_eq!(config.globals.extra, vec!["myGlobal"]);
        assert_eq!(config.reference_tracker.mode, TrackerMode::Legacy);
        assert_eq!(config.reference_tracker.global_object_names, vec!["globalThis"]);
        assert!(config.side_effects.consider_getters);
        assert!(!config.side_effects.consider_implicit_type_conversion);
        assert_eq!(
            config.visitor_keys.get("CallExpression"),
            Some(&["callee".to_string()][..])
        );
    }

    #[test]
    fn scope_options_follow_globals_section() {
        let dir = create_temp_dir();
        let config_path = write_config(
            &dir,
            "[globals]\nbuiltin = false\nenvironments = []\nextra = [\"only\"]",
        );

        let config = load_config(&config_path).unwrap();

        assert_eq!(config.scope_options().globals, vec!["only"]);
    }

    #[test]
    fn default_config_when_missing() {
        let dir = create_temp_dir();
        let config = load_config_or_default(dir.path());

        assert_eq!(config, AnalysisConfig::default());
        assert!(config.globals.builtin);
        assert_eq!(config.reference_tracker.mode, TrackerMode::Strict);
        assert_eq!(config.scope_options(), ScopeOptions::default());
    }

    #[test]
    fn error_on_invalid_toml() {
        let dir = create_temp_dir();
        let config_path = write_config(&dir, "this is not valid { toml }");

        let result = load_config(&config_path);

        match result.unwrap_err() {
            ConfigError::ParseError { path, message } => {
                assert_eq!(path, config_path);
                assert!(!message.is_empty());
            }
            _ => panic!("Expected ParseError"),
        }
    }

    #[test]
    fn error_on_unknown_environment() {
        let dir = create_temp_dir();
        let config_path = write_config(&dir, "[globals]\nenvironments = [\"deno\"]");

        assert!(matches!(
            load_config(&config_path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn error_when_file_is_missing() {
        let dir = create_temp_dir();
        let missing = dir.path().join(CONFIG_FILENAME);

        assert!(matches!(
            load_config(&missing),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn find_config_file_in_parent_directory() {
        let parent = create_temp_dir();
        let child = parent.path().join("subdir");
        fs::create_dir(&child).unwrap();
        let config_path = write_config(&parent, "");

        assert_eq!(find_config_file(&child), Some(config_path));
    }

    #[test]
    fn find_config_file_returns_none_when_not_found() {
        let dir = create_temp_dir();

        assert!(find_config_file(dir.path()).is_none());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let dir = create_temp_dir();
        let config_path = write_config(
            &dir,
            "[side_effects]\nconsider_implicit_type_conversion = true",
        );

        let config = load_config(&config_path).unwrap();

        assert_eq!(config.globals, GlobalsConfig::default());
        assert_eq!(config.reference_tracker, ReferenceTrackerOptions::default());
        assert!(config.side_effects.consider_implicit_type_conversion);
    }

    #[test]
    fn empty_config_file_uses_defaults() {
        let dir = create_temp_dir();
        let config_path = write_config(&dir, "");

        assert_eq!(load_config(&config_path).unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn warns_on_unknown_options() {
        let dir = create_temp_dir();
        write_config(
            &dir,
            r#"
unknown_option = true

[globals]
builtins = true

[side_effects]
consider_getters = true
"#,
        );

        let result = load_config_or_default_with_warnings(dir.path());

        assert_eq!(
            result.warnings,
            vec![
                "Unknown config option: 'unknown_option'".to_string(),
                "Unknown config option in [globals]: 'builtins'".to_string(),
            ]
        );
        assert!(result.config.side_effects.consider_getters);
    }

    #[test]
    fn config_error_display_is_helpful() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("/path/to/kaizen-utils.toml"),
            message: "expected `=`".to_string(),
        };

        let msg = format!("{}", err);

        assert!(msg.contains("/path/to/kaizen-utils.toml"));
        assert!(msg.contains("expected `=`"));
    }
}
