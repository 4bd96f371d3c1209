use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::errors::{ConfigError, Result};
use crate::theme::Theme;

/// File names probed by [`BuildConfiguration::discover`], in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "tailwind.config.js",
    "tailwind.config.cjs",
    "tailwind.config.mjs",
    "tailwind.config.json",
    "tailwind.config.yaml",
    "tailwind.config.yml",
];

/// Tailwind build configuration
///
/// Mirrors the object exported by `tailwind.config.js`. Keys the crate does
/// not model are kept in `extra` so the record survives a round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfiguration {
    /// Files scanned for class usage
    pub content: ContentConfig,

    /// Theme replacements and extensions
    pub theme: Theme,

    /// Plugin references, in load order
    pub plugins: Vec<PluginRef>,

    /// Core plugin toggles; absent means every core plugin is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_plugins: Option<CorePlugins>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<DarkMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    /// Classes emitted whether or not they were seen in content
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safelist: Vec<String>,

    /// Classes never emitted
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocklist: Vec<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Content scan configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "ContentRepr", into = "ContentRepr")]
pub struct ContentConfig {
    /// Resolve `files` against the configuration file's directory
    /// instead of the working directory
    pub relative: bool,

    /// Glob patterns; a leading `!` negates
    pub files: Vec<String>,
}

/// `content` is either `{ relative, files }` or a bare array of patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentRepr {
    Files(Vec<String>),
    Object {
        #[serde(default)]
        relative: bool,
        #[serde(default)]
        files: Vec<String>,
    },
}

impl From<ContentRepr> for ContentConfig {
    fn from(repr: ContentRepr) -> Self {
        match repr {
            ContentRepr::Files(files) => Self { relative: false, files },
            ContentRepr::Object { relative, files } => Self { relative, files },
        }
    }
}

impl From<ContentConfig> for ContentRepr {
    fn from(content: ContentConfig) -> Self {
        ContentRepr::Object {
            relative: content.relative,
            files: content.files,
        }
    }
}

/// Reference to a plugin module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "PluginRepr")]
pub enum PluginRef {
    /// `require("@tailwindcss/forms")`
    Module(String),
    /// `require("@tailwindcss/typography")({ className: "prose" })`
    Configured {
        name: String,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        options: Value,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PluginRepr {
    Module(String),
    Configured {
        name: String,
        #[serde(default)]
        options: Value,
    },
}

/// `require("x")()` carries no options and is the same plugin as `require("x")`
impl From<PluginRepr> for PluginRef {
    fn from(repr: PluginRepr) -> Self {
        match repr {
            PluginRepr::Module(name) => PluginRef::Module(name),
            PluginRepr::Configured { name, options } if options.is_null() => PluginRef::Module(name),
            PluginRepr::Configured { name, options } => PluginRef::Configured { name, options },
        }
    }
}

impl PluginRef {
    pub fn name(&self) -> &str {
        match self {
            PluginRef::Module(name) => name,
            PluginRef::Configured { name, .. } => name,
        }
    }

    pub fn options(&self) -> Option<&Value> {
        match self {
            PluginRef::Module(_) => None,
            PluginRef::Configured { options, .. } if options.is_null() => None,
            PluginRef::Configured { options, .. } => Some(options),
        }
    }
}

/// Core plugin overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorePlugins {
    /// `{ preflight: false }`: listed plugins toggled, the rest stay enabled
    Toggles(IndexMap<String, bool>),
    /// `["margin", "padding"]`: only the listed plugins are enabled
    Allowlist(Vec<String>),
}

impl CorePlugins {
    pub fn is_enabled(&self, name: &str) -> bool {
        match self {
            CorePlugins::Toggles(toggles) => toggles.get(name).copied().unwrap_or(true),
            CorePlugins::Allowlist(enabled) => enabled.iter().any(|p| p == name),
        }
    }

    /// Plugins explicitly switched off. An allow-list disables everything it
    /// does not name, which cannot be enumerated here, so it reports nothing.
    pub fn disabled(&self) -> Vec<String> {
        match self {
            CorePlugins::Toggles(toggles) => toggles
                .iter()
                .filter(|(_, enabled)| !**enabled)
                .map(|(name, _)| name.clone())
                .collect(),
            CorePlugins::Allowlist(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkModeStrategy {
    Media,
    Class,
    Selector,
    Variant,
}

impl DarkModeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DarkModeStrategy::Media => "media",
            DarkModeStrategy::Class => "class",
            DarkModeStrategy::Selector => "selector",
            DarkModeStrategy::Variant => "variant",
        }
    }
}

/// `darkMode: "class"` or `darkMode: ["selector", "[data-mode=\"dark\"]"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DarkMode {
    Strategy(DarkModeStrategy),
    Custom(DarkModeStrategy, String),
}

impl DarkMode {
    pub fn strategy(&self) -> DarkModeStrategy {
        match self {
            DarkMode::Strategy(strategy) | DarkMode::Custom(strategy, _) => *strategy,
        }
    }

    /// The custom selector or variant, if one was given
    pub fn selector(&self) -> Option<&str> {
        match self {
            DarkMode::Strategy(_) => None,
            DarkMode::Custom(_, selector) => Some(selector),
        }
    }
}

/// A configuration together with the file it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: BuildConfiguration,
    pub path: PathBuf,
}

impl LoadedConfig {
    /// Directory relative patterns resolve against in `relative` mode
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl BuildConfiguration {
    /// The configuration this project ships: HTML and scripts under
    /// `frontend/`, resolved next to the config file, no theme or plugin
    /// changes.
    pub fn shipped() -> Self {
        Self {
            content: ContentConfig {
                relative: true,
                files: vec!["./frontend/**/*.{html,js}".to_string()],
            },
            ..Self::default()
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::parse("<json>", format!("Failed to parse JSON config: {}", e)))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::parse("<yaml>", format!("Failed to parse YAML config: {}", e)))
    }

    /// Parse the object exported by a `tailwind.config.js` module
    #[cfg(feature = "js")]
    pub fn from_js_str(content: &str) -> Result<Self> {
        Self::from_js_source(content, "<js>")
    }

    #[cfg(feature = "js")]
    fn from_js_source(content: &str, name: &str) -> Result<Self> {
        let value = crate::loader::parse_js_module(content, name)?;
        serde_json::from_value(value)
            .map_err(|e| ConfigError::parse(name, format!("Invalid configuration object: {}", e)))
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<LoadedConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::parse(path.display().to_string(), format!("Failed to read config file: {}", e))
        })?;
        let name = path.display().to_string();

        let config = match path.extension().and_then(|s| s.to_str()) {
            #[cfg(feature = "js")]
            Some("js") | Some("cjs") | Some("mjs") => Self::from_js_source(&content, &name)?,
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                ConfigError::parse(&name, format!("Failed to parse JSON config: {}", e))
            })?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                ConfigError::parse(&name, format!("Failed to parse YAML config: {}", e))
            })?,
            _ => return Err(ConfigError::UnsupportedFormat(name)),
        };

        tracing::debug!(path = %path.display(), "loaded configuration");
        config.validate()?;

        Ok(LoadedConfig {
            config,
            path: path.to_path_buf(),
        })
    }

    /// Find the configuration file in `dir`
    pub fn discover(dir: &Path) -> Result<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ConfigError::NotFound(dir.display().to_string()))
    }

    /// Reject values the CSS generator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.content.files.is_empty() {
            tracing::warn!("content.files is empty; no classes will be scanned");
        }

        for pattern in &self.content.files {
            let body = pattern.strip_prefix('!').unwrap_or(pattern);
            if body.trim().is_empty() {
                return Err(ConfigError::Invalid("content pattern must not be empty".to_string()));
            }
        }

        if matches!(self.separator.as_deref(), Some("")) {
            return Err(ConfigError::Invalid("separator must not be empty".to_string()));
        }

        if matches!(self.prefix.as_deref(), Some(p) if p.chars().any(char::is_whitespace)) {
            return Err(ConfigError::Invalid("prefix must not contain whitespace".to_string()));
        }

        if let Some(plugin) = self.plugins.iter().find(|p| p.name().is_empty()) {
            return Err(ConfigError::Invalid(format!("plugin reference has no module name: {:?}", plugin)));
        }

        Ok(())
    }

    pub fn core_plugin_enabled(&self, name: &str) -> bool {
        self.core_plugins
            .as_ref()
            .map_or(true, |core| core.is_enabled(name))
    }

    /// Whether the base style reset is emitted
    pub fn preflight_enabled(&self) -> bool {
        self.core_plugin_enabled("preflight")
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(PluginRef::name).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
