use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::scanner::Candidate;
use crate::theme::DesignTokens;

/// Metadata for the generated manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Version of the manifest format
    pub version: String,

    /// Timestamp when the manifest was generated
    pub generated_at: DateTime<Utc>,

    /// Configuration file the scan was driven by
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,

    /// Directory content patterns were resolved against
    pub base_dir: String,

    /// Whether patterns were resolved relative to the config file
    pub relative: bool,

    /// Number of files scanned
    pub files_scanned: usize,

    /// Number of unique candidate classes
    pub candidates: usize,

    /// Tool version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanner_version: Option<String>,
}

/// Where a candidate class was seen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestClassInfo {
    /// Number of occurrences of this class
    pub count: usize,

    /// Locations as `path:line:column`
    pub files: Vec<String>,

    /// Included through the safelist rather than the scan
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub safelisted: bool,
}

/// Everything the CSS generator needs for one build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanManifest {
    pub metadata: ManifestMetadata,

    /// Candidate classes in first-seen order
    pub classes: IndexMap<String, ManifestClassInfo>,

    /// Resolved design tokens
    pub theme: DesignTokens,

    /// Plugin module names, in load order
    pub plugins: Vec<String>,

    /// Plugin options by module name
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub plugin_options: IndexMap<String, Value>,

    /// Core plugins switched off
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_core_plugins: Vec<String>,

    pub preflight: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ManifestStatistics>,
}

/// Statistics about the scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStatistics {
    /// Total bytes of scanned content
    pub bytes_scanned: u64,

    /// Number of files that contained at least one candidate
    pub files_with_classes: usize,

    /// Candidates dropped by the blocklist
    pub blocked: usize,

    /// Processing time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,

    /// Top used classes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_classes: Option<Vec<TopClass>>,
}

/// Information about frequently used classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopClass {
    pub name: String,
    pub count: usize,
    pub file_count: usize,
}

impl ScanManifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self {
            metadata: ManifestMetadata {
                version: "1.0.0".to_string(),
                generated_at: Utc::now(),
                config_path: None,
                base_dir: ".".to_string(),
                relative: false,
                files_scanned: 0,
                candidates: 0,
                scanner_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
            classes: IndexMap::new(),
            theme: DesignTokens::new(),
            plugins: Vec::new(),
            plugin_options: IndexMap::new(),
            disabled_core_plugins: Vec::new(),
            preflight: true,
            statistics: None,
        }
    }

    /// Record one occurrence of a class
    pub fn add_class(&mut self, class_name: String, location: String) {
        let entry = self.classes.entry(class_name).or_insert_with(|| ManifestClassInfo {
            count: 0,
            files: Vec::new(),
            safelisted: false,
        });

        entry.count += 1;
        if !entry.files.contains(&location) {
            entry.files.push(location);
        }
        self.metadata.candidates = self.classes.len();
    }

    /// Ensure a class is present even if no file used it
    pub fn add_safelisted(&mut self, class_name: String) {
        self.classes
            .entry(class_name)
            .or_insert_with(|| ManifestClassInfo {
                count: 0,
                files: Vec::new(),
                safelisted: true,
            });
        self.metadata.candidates = self.classes.len();
    }

    /// Calculate and set statistics
    pub fn calculate_statistics(&mut self, bytes_scanned: u64, blocked: usize, processing_time_ms: Option<u64>) {
        let mut files_with_classes = HashSet::new();
        for class_info in self.classes.values() {
            for location in &class_info.files {
                // Strip the trailing `:line:column`
                let path = location.rsplitn(3, ':').nth(2).unwrap_or(location.as_str());
                files_with_classes.insert(path.to_string());
            }
        }

        let mut class_list: Vec<_> = self
            .classes
            .iter()
            .filter(|(_, info)| info.count > 0)
            .map(|(name, info)| TopClass {
                name: name.clone(),
                count: info.count,
                file_count: info.files.len(),
            })
            .collect();

        class_list.sort_by(|a, b| b.count.cmp(&a.count));
        let top_classes = class_list.into_iter().take(10).collect();

        self.statistics = Some(ManifestStatistics {
            bytes_scanned,
            files_with_classes: files_with_classes.len(),
            blocked,
            processing_time_ms,
            top_classes: Some(top_classes),
        });
    }

    /// Convert manifest to pretty JSON string
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ScanManifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for creating manifests
pub struct ManifestBuilder {
    manifest: ScanManifest,
    start_time: Option<std::time::Instant>,
    blocklist: HashSet<String>,
    blocked: usize,
    bytes_scanned: u64,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            manifest: ScanManifest::new(),
            start_time: Some(std::time::Instant::now()),
            blocklist: HashSet::new(),
            blocked: 0,
            bytes_scanned: 0,
        }
    }

    pub fn with_config_path(mut self, path: String) -> Self {
        self.manifest.metadata.config_path = Some(path);
        self
    }

    pub fn with_base_dir(mut self, base_dir: String, relative: bool) -> Self {
        self.manifest.metadata.base_dir = base_dir;
        self.manifest.metadata.relative = relative;
        self
    }

    pub fn with_files_scanned(mut self, count: usize, bytes: u64) -> Self {
        self.manifest.metadata.files_scanned = count;
        self.bytes_scanned = bytes;
        self
    }

    pub fn with_theme(mut self, theme: DesignTokens) -> Self {
        self.manifest.theme = theme;
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<String>, options: IndexMap<String, Value>) -> Self {
        self.manifest.plugins = plugins;
        self.manifest.plugin_options = options;
        self
    }

    pub fn with_core_plugins(mut self, disabled: Vec<String>, preflight: bool) -> Self {
        self.manifest.disabled_core_plugins = disabled;
        self.manifest.preflight = preflight;
        self
    }

    /// Classes in the blocklist are dropped from candidates added later
    pub fn with_blocklist(mut self, blocklist: &[String]) -> Self {
        self.blocklist = blocklist.iter().cloned().collect();
        self
    }

    pub fn with_candidates(mut self, candidates: &[Candidate]) -> Self {
        for candidate in candidates {
            if self.blocklist.contains(&candidate.value) {
                self.blocked += 1;
                continue;
            }
            self.manifest.add_class(
                candidate.value.clone(),
                format!("{}:{}:{}", candidate.file_path, candidate.line, candidate.column),
            );
        }
        self
    }

    pub fn with_safelist(mut self, safelist: &[String]) -> Self {
        for class in safelist {
            self.manifest.add_safelisted(class.clone());
        }
        self
    }

    /// Build the final manifest with statistics
    pub fn build(mut self) -> ScanManifest {
        let processing_time = self.start_time.map(|t| t.elapsed().as_millis() as u64);
        self.manifest
            .calculate_statistics(self.bytes_scanned, self.blocked, processing_time);
        self.manifest
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
