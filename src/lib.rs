pub mod args;
pub mod config;
pub mod content;
pub mod errors;
#[cfg(feature = "js")]
pub mod loader;
pub mod manifest;
pub mod scanner;
pub mod theme;
pub mod writer;

pub use args::{Cli, Commands, ConfigArgs, FilesArgs, OutputFormat, ScanArgs, ShowArgs};
pub use config::{
    BuildConfiguration, ContentConfig, CorePlugins, DarkMode, DarkModeStrategy, LoadedConfig, PluginRef,
};
pub use content::{expand_braces, resolve_base, ContentPatterns};
pub use errors::{ConfigError, Result};
pub use manifest::{ManifestBuilder, ScanManifest};
pub use scanner::{extract_candidates, Candidate, ScannedFile, SecurityConfig};
pub use theme::{DesignTokens, Theme};
pub use writer::to_js_module;

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Options for one scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Invocation working directory
    pub cwd: PathBuf,
    /// Extra exclude globs; relative ones resolve against `cwd`
    pub exclude: Vec<String>,
    pub jobs: Option<usize>,
    pub security: SecurityConfig,
    /// The generator's default theme
    pub default_theme: DesignTokens,
    /// Show a progress bar while scanning
    pub progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            exclude: Vec::new(),
            jobs: None,
            security: SecurityConfig::default(),
            default_theme: DesignTokens::new(),
            progress: false,
        }
    }
}

impl ScanOptions {
    pub fn from_args(args: &ScanArgs) -> Result<Self> {
        let default_theme: DesignTokens = match &args.defaults {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str(&content).map_err(|e| {
                    ConfigError::parse(path.display().to_string(), format!("Invalid default theme: {}", e))
                })?
            }
            None => DesignTokens::new(),
        };

        let max_file_size = args
            .max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| {
                ConfigError::Invalid(format!("Maximum file size is too large: {} MB", args.max_file_size_mb))
            })?;

        Ok(Self {
            cwd: working_dir(&args.config)?,
            exclude: args.exclude.clone(),
            jobs: args.jobs,
            security: SecurityConfig {
                max_file_size,
                allow_symlinks: args.allow_symlinks,
            },
            default_theme,
            progress: !args.no_progress,
        })
    }
}

/// Performance statistics
#[derive(Debug, Clone, Default)]
pub struct PerformanceStats {
    pub total_duration: Duration,
    pub collect_duration: Duration,
    pub scan_duration: Duration,
    pub files_per_second: f64,
    pub bytes_processed: u64,
}

/// Result of a scan
#[derive(Debug)]
pub struct ScanOutcome {
    pub base_dir: PathBuf,
    pub files: Vec<ScannedFile>,
    pub manifest: ScanManifest,
    pub stats: PerformanceStats,
}

fn working_dir(args: &ConfigArgs) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &args.cwd {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => cwd.join(dir),
        None => cwd,
    })
}

/// Load the configuration named by `args`, or discover it in the working
/// directory
pub fn load_config(args: &ConfigArgs) -> Result<LoadedConfig> {
    let process_cwd = std::env::current_dir()?;
    let path = match &args.config {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => process_cwd.join(path),
        None => BuildConfiguration::discover(&working_dir(args)?)?,
    };
    BuildConfiguration::from_file(&path)
}

/// Resolve the content patterns of `loaded` into the files to scan
pub fn resolve_scan_set(loaded: &LoadedConfig, options: &ScanOptions) -> Result<(PathBuf, Vec<ScannedFile>)> {
    let content = &loaded.config.content;
    let base = resolve_base(content, Some(loaded.dir()), &options.cwd);
    let mut patterns = ContentPatterns::resolve(content, &base);
    if patterns.is_empty() {
        tracing::warn!("No content patterns configured, nothing will be scanned");
    }
    patterns.exclude_globs(&options.exclude, &options.cwd);
    let files = scanner::collect_files(&patterns, &base, &options.security)?;

    tracing::debug!(files = files.len(), base = %base.display(), "resolved scan set");
    Ok((base, files))
}

/// Resolve, scan and summarize a project
pub fn scan_project(loaded: &LoadedConfig, options: &ScanOptions) -> Result<ScanOutcome> {
    let start_time = Instant::now();
    let mut stats = PerformanceStats::default();
    let config = &loaded.config;

    let (base_dir, files) = resolve_scan_set(loaded, options)?;
    stats.collect_duration = start_time.elapsed();
    stats.bytes_processed = files.iter().map(|f| f.size).sum();

    if files.is_empty() {
        tracing::warn!("No files matched the content patterns {:?}", config.content.files);
    } else {
        tracing::info!(
            "Found {} files to scan ({:.2} MB)",
            files.len(),
            stats.bytes_processed as f64 / (1024.0 * 1024.0)
        );
    }

    let scan_start = Instant::now();
    let candidates = scan_with_progress(&files, options)?;
    stats.scan_duration = scan_start.elapsed();

    let plugin_options: IndexMap<String, serde_json::Value> = config
        .plugins
        .iter()
        .filter_map(|p| p.options().map(|o| (p.name().to_string(), o.clone())))
        .collect();

    let manifest = ManifestBuilder::new()
        .with_config_path(loaded.path.display().to_string())
        .with_base_dir(base_dir.display().to_string(), config.content.relative)
        .with_files_scanned(files.len(), stats.bytes_processed)
        .with_theme(config.theme.resolve(&options.default_theme))
        .with_plugins(
            config.plugin_names().into_iter().map(String::from).collect(),
            plugin_options,
        )
        .with_core_plugins(
            config.core_plugins.as_ref().map(CorePlugins::disabled).unwrap_or_default(),
            config.preflight_enabled(),
        )
        .with_blocklist(&config.blocklist)
        .with_candidates(&candidates)
        .with_safelist(&config.safelist)
        .build();

    stats.total_duration = start_time.elapsed();
    stats.files_per_second = files.len() as f64 / stats.total_duration.as_secs_f64().max(f64::EPSILON);

    tracing::info!(
        "Scanned {} files, {} unique candidates from {} occurrences",
        files.len(),
        manifest.classes.len(),
        candidates.len()
    );

    Ok(ScanOutcome {
        base_dir,
        files,
        manifest,
        stats,
    })
}

#[cfg(feature = "cli")]
fn scan_with_progress(files: &[ScannedFile], options: &ScanOptions) -> Result<Vec<Candidate>> {
    use indicatif::{ProgressBar, ProgressStyle};

    let progress_bar = (options.progress && !files.is_empty()).then(|| {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message("Scanning content...");
        pb
    });

    let candidates = scanner::scan_files(files, options.jobs, |path| {
        if let Some(pb) = &progress_bar {
            pb.inc(1);
            pb.set_message(format!(
                "Scanning: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            ));
        }
    })?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message("✓ Complete");
    }
    Ok(candidates)
}

#[cfg(not(feature = "cli"))]
fn scan_with_progress(files: &[ScannedFile], options: &ScanOptions) -> Result<Vec<Candidate>> {
    scanner::scan_files(files, options.jobs, |_| {})
}

/// Write file atomically by writing to temp file then renaming
pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
    use std::io::Write;

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");

    let mut file = std::fs::File::create(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;

    std::fs::rename(&temp_path, path)?;

    Ok(())
}

/// Render the configuration in the requested format
pub fn render_config(config: &BuildConfiguration, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Js => to_js_module(config),
        OutputFormat::Json => Ok(config.to_json_pretty()? + "\n"),
        OutputFormat::Yaml => config.to_yaml(),
    }
}

#[cfg(feature = "cli")]
async fn write_stdout(content: &str) -> Result<()> {
    use tokio::io::{self, AsyncWriteExt};

    let mut stdout = io::stdout();
    stdout
        .write_all(content.as_bytes())
        .await
        .map_err(|e| ConfigError::OutputError {
            path: "stdout".to_string(),
            message: e.to_string(),
        })?;
    stdout.flush().await.map_err(|e| ConfigError::OutputError {
        path: "stdout".to_string(),
        message: e.to_string(),
    })
}

/// Handle the scan command
#[cfg(feature = "cli")]
pub async fn run_scan(args: ScanArgs, verbose: bool) -> Result<ScanOutcome> {
    args.validate().map_err(ConfigError::Invalid)?;

    let loaded = load_config(&args.config)?;
    let mut options = ScanOptions::from_args(&args)?;
    // Progress output would interleave with debug logs
    options.progress &= !verbose;

    let outcome = scan_project(&loaded, &options)?;

    if let Some(output) = &args.output_manifest {
        if args.dry_run {
            tracing::info!("Dry run: not writing {}", output.display());
        } else {
            let content = outcome.manifest.to_pretty_json()?;
            write_atomic(output, &content).map_err(|e| ConfigError::OutputError {
                path: output.display().to_string(),
                message: e.to_string(),
            })?;
            tracing::info!("Wrote manifest to {}", output.display());
        }
    }

    if verbose {
        let stats = &outcome.stats;
        tracing::debug!(
            total_ms = stats.total_duration.as_millis() as u64,
            collect_ms = stats.collect_duration.as_millis() as u64,
            scan_ms = stats.scan_duration.as_millis() as u64,
            files_per_second = stats.files_per_second,
            "scan performance"
        );
    }

    Ok(outcome)
}

/// Handle the files command: one resolved path per line
#[cfg(feature = "cli")]
pub async fn handle_files_command(args: FilesArgs) -> Result<()> {
    let loaded = load_config(&args.config)?;
    let options = ScanOptions {
        cwd: working_dir(&args.config)?,
        exclude: args.exclude,
        ..ScanOptions::default()
    };

    let (_, files) = resolve_scan_set(&loaded, &options)?;
    let mut out = String::new();
    for file in &files {
        out.push_str(&file.path.display().to_string());
        out.push('\n');
    }
    write_stdout(&out).await
}

/// Handle the show command
#[cfg(feature = "cli")]
pub async fn handle_show_command(args: ShowArgs) -> Result<()> {
    let loaded = load_config(&args.config)?;
    let rendered = render_config(&loaded.config, args.format)?;
    write_stdout(&rendered).await
}

/// Handle the check command
#[cfg(feature = "cli")]
pub async fn handle_check_command(args: ConfigArgs) -> Result<()> {
    let loaded = load_config(&args)?;
    let config = &loaded.config;
    let mut summary = format!(
        "{}: ok ({} content pattern(s), relative: {}, {} plugin(s), preflight: {}, theme: {})",
        loaded.path.display(),
        config.content.files.len(),
        config.content.relative,
        config.plugins.len(),
        if config.preflight_enabled() { "on" } else { "off" },
        if config.theme.is_empty() { "defaults" } else { "customized" },
    );
    if let Some(dark_mode) = &config.dark_mode {
        summary.push_str(&format!("\ndark mode: {}", dark_mode.strategy().as_str()));
        if let Some(selector) = dark_mode.selector() {
            summary.push_str(&format!(" ({})", selector));
        }
    }
    summary.push('\n');
    write_stdout(&summary).await
}
