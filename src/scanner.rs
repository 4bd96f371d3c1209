use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::content::ContentPatterns;
use crate::errors::{ConfigError, Result};

/// Security configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Maximum file size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Allow symbolic links
    pub allow_symlinks: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            allow_symlinks: false,
        }
    }
}

/// A file selected by the content patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// A token that may be a utility class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub value: String,
    pub file_path: String,
    /// 1-indexed
    pub line: usize,
    /// 1-indexed, in characters
    pub column: usize,
}

/// Collect files matching the include patterns, minus excludes, with
/// security checks. Symbolic links must not lead out of `root`. The result
/// is sorted and free of duplicates.
pub fn collect_files(
    patterns: &ContentPatterns,
    root: &Path,
    security: &SecurityConfig,
) -> Result<Vec<ScannedFile>> {
    let excludes = patterns
        .exclude
        .iter()
        .map(|p| glob::Pattern::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped_count = 0;

    for pattern in &patterns.include {
        for entry in glob::glob(pattern)? {
            let path = entry?;

            if excludes.iter().any(|p| p.matches_path(&path)) {
                continue;
            }

            // Symlinked directories report is_dir() on their target
            if path.is_dir() {
                continue;
            }

            if let Err(e) = validate_input_file(&path, root, security) {
                tracing::warn!("Skipping file - {}", e);
                skipped_count += 1;
                continue;
            }

            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

            if seen.insert(path.clone()) {
                files.push(ScannedFile { path, size });
            }
        }
    }

    if skipped_count > 0 {
        tracing::warn!("Skipped {} files due to security constraints", skipped_count);
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Check if a file is safe to read
fn validate_input_file(path: &Path, root: &Path, security: &SecurityConfig) -> Result<()> {
    if let Some(link) = symlink_on_path(path, root) {
        if !security.allow_symlinks {
            return Err(ConfigError::SecurityError(format!(
                "Symbolic link not allowed: {}",
                link.display()
            )));
        }

        let target = path.canonicalize().map_err(|e| {
            ConfigError::SecurityError(format!("Cannot resolve symlink target for '{}': {}", path.display(), e))
        })?;
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        if !target.starts_with(&root) {
            return Err(ConfigError::SecurityError(format!(
                "Symlink target '{}' is outside '{}'",
                target.display(),
                root.display()
            )));
        }
    }

    let metadata = fs::metadata(path).map_err(|e| {
        ConfigError::SecurityError(format!("Cannot read file metadata for '{}': {}", path.display(), e))
    })?;

    if metadata.len() > security.max_file_size {
        return Err(ConfigError::SecurityError(format!(
            "File '{}' exceeds maximum size limit ({} MB > {} MB)",
            path.display(),
            metadata.len() / (1024 * 1024),
            security.max_file_size / (1024 * 1024)
        )));
    }

    Ok(())
}

/// The first symbolic link among `path` and its ancestors below `root`.
/// Paths outside `root` only have their last component checked.
fn symlink_on_path(path: &Path, root: &Path) -> Option<PathBuf> {
    if !path.starts_with(root) {
        return path.is_symlink().then(|| path.to_path_buf());
    }
    path.ancestors()
        .take_while(|ancestor| *ancestor != root)
        .find(|ancestor| ancestor.is_symlink())
        .map(Path::to_path_buf)
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9_\-:/.\[\]#%!@()&>+*=,']+").expect("valid token regex")
    })
}

/// Split source text into candidate class names.
///
/// Mirrors the shape of Tailwind's default extractor: anything that looks
/// like a utility, a variant-prefixed utility or an arbitrary value is kept.
/// Deciding which candidates are real utilities is the CSS generator's job.
pub fn extract_candidates(content: &str, file_path: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (line_index, line) in content.lines().enumerate() {
        for found in token_regex().find_iter(line) {
            let raw = found.as_str();
            for token in split_token(raw) {
                if is_candidate(token) {
                    let offset = found.start() + (token.as_ptr() as usize - raw.as_ptr() as usize);
                    let column = line[..offset].chars().count() + 1;
                    candidates.push(Candidate {
                        value: token.to_string(),
                        file_path: file_path.to_string(),
                        line: line_index + 1,
                        column,
                    });
                }
            }
        }
    }

    candidates
}

/// Arbitrary values keep their brackets; outside brackets `=`, `,`, `>`,
/// quotes and parens separate tokens
fn split_token(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in raw.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '=' | ',' | '\'' | '(' | ')' | '>' if depth == 0 => {
                parts.push(&raw[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);

    parts
        .into_iter()
        .map(|p| p.trim_start_matches(['/', '.', ':', '>', '+', '*', '&']))
        .map(|p| p.trim_end_matches(['.', ':', '/', '>', '+', '*', '&']))
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_candidate(token: &str) -> bool {
    if token.len() > 256 || token.contains("//") {
        return false;
    }
    if !token.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    // Unbalanced brackets are a truncated arbitrary value
    token.matches('[').count() == token.matches(']').count()
}

/// Read and scan a single file
pub fn scan_file(path: &Path) -> Result<Vec<Candidate>> {
    let content = fs::read_to_string(path)
        .map_err(|e| std::io::Error::new(e.kind(), format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(extract_candidates(&content, &path.display().to_string()))
}

/// Scan files in parallel. Unreadable files are logged and skipped.
/// `on_file` runs once per file after it has been scanned.
pub fn scan_files<F>(files: &[ScannedFile], jobs: Option<usize>, on_file: F) -> Result<Vec<Candidate>>
where
    F: Fn(&Path) + Sync,
{
    let run = || {
        files
            .par_iter()
            .map(|file| {
                let candidates = if file.size == 0 {
                    Vec::new()
                } else {
                    match scan_file(&file.path) {
                        Ok(candidates) => candidates,
                        Err(e) => {
                            tracing::warn!("Skipping unreadable file - {}", e);
                            Vec::new()
                        }
                    }
                };
                on_file(&file.path);
                candidates
            })
            .collect::<Vec<_>>()
    };

    let per_file = match jobs {
        Some(num_jobs) => rayon::ThreadPoolBuilder::new()
            .num_threads(num_jobs)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("Cannot start {} scan threads: {}", num_jobs, e)))?
            .install(run),
        None => run(),
    };

    Ok(per_file.into_iter().flatten().collect())
}
