use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tailwind build configuration tool - loads tailwind.config and resolves the content scan
#[derive(Parser, Debug)]
#[command(name = "tailwind-config")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short = 'v', long = "verbose", global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan content files for candidate classes and write a build manifest
    Scan(ScanArgs),
    /// Print the files selected by the content patterns
    Files(FilesArgs),
    /// Print the loaded configuration
    Show(ShowArgs),
    /// Load and validate the configuration
    Check(ConfigArgs),
}

/// Where to find the configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file path
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        env = "TAILWIND_CONFIG",
        help = "Path to tailwind.config.{js,cjs,mjs,json,yaml,yml} (discovered in the working directory if omitted)"
    )]
    pub config: Option<PathBuf>,

    /// Working directory override
    #[arg(
        long = "cwd",
        value_name = "DIR",
        help = "Directory non-relative content patterns resolve against"
    )]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the scan command
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output manifest file path (JSON)
    #[arg(
        short = 'o',
        long = "output-manifest",
        value_name = "PATH",
        help = "Path where the JSON manifest will be written"
    )]
    pub output_manifest: Option<PathBuf>,

    /// Exclude patterns (glob patterns to exclude)
    #[arg(
        short = 'e',
        long = "exclude",
        value_name = "PATTERN",
        num_args = 0..,
        help = "Patterns to exclude from scanning"
    )]
    pub exclude: Vec<String>,

    /// Number of parallel threads to use
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "NUM",
        help = "Number of parallel threads to use (defaults to number of CPU cores)"
    )]
    pub jobs: Option<usize>,

    /// Default design tokens
    #[arg(
        long = "defaults",
        value_name = "PATH",
        help = "JSON file with the generator's default theme, merged with the configured theme"
    )]
    pub defaults: Option<PathBuf>,

    /// Maximum size of a scanned file in MB
    #[arg(long = "max-file-size", value_name = "MB", default_value_t = 10)]
    pub max_file_size_mb: u64,

    /// Follow symbolic links
    #[arg(long = "allow-symlinks", default_value_t = false)]
    pub allow_symlinks: bool,

    /// Dry run (don't write the manifest)
    #[arg(
        long = "dry-run",
        default_value_t = false,
        help = "Perform the scan but don't write the manifest"
    )]
    pub dry_run: bool,

    /// Disable the progress bar
    #[arg(long = "no-progress", default_value_t = false)]
    pub no_progress: bool,
}

/// Arguments for the files command
#[derive(Args, Debug, Clone)]
pub struct FilesArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(short = 'e', long = "exclude", value_name = "PATTERN", num_args = 0..)]
    pub exclude: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `module.exports = { ... }`
    Js,
    #[default]
    Json,
    Yaml,
}

/// Arguments for the show command
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

impl ScanArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if let Some(jobs) = self.jobs {
            if jobs == 0 {
                return Err("Number of jobs must be at least 1".to_string());
            }
        }

        if self.max_file_size_mb == 0 {
            return Err("Maximum file size must be at least 1 MB".to_string());
        }
        if self.max_file_size_mb.checked_mul(1024 * 1024).is_none() {
            return Err(format!("Maximum file size is too large: {} MB", self.max_file_size_mb));
        }

        if let (Some(output), Some(config)) = (&self.output_manifest, &self.config.config) {
            if output == config {
                return Err("Manifest path must differ from the configuration path".to_string());
            }
        }

        Ok(())
    }
}
