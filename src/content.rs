//! Turns `content.files` into concrete glob patterns.

use std::path::{Path, PathBuf};

use crate::config::ContentConfig;

/// Directory the content patterns are resolved against.
///
/// In `relative` mode that is the configuration file's directory, so the
/// scan set does not depend on where the build was started; otherwise the
/// invocation working directory.
pub fn resolve_base(content: &ContentConfig, config_dir: Option<&Path>, cwd: &Path) -> PathBuf {
    match config_dir {
        Some(dir) if content.relative => {
            if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                cwd.join(dir)
            }
        }
        _ => cwd.to_path_buf(),
    }
}

/// Expand `{a,b}` alternations into plain glob patterns.
///
/// Nested groups are supported. A group without a comma, or an unbalanced
/// brace, is kept literally.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close)) = find_group(pattern) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let body = &pattern[open + 1..close];
    let suffix = &pattern[close + 1..];
    let alternatives = split_alternatives(body);

    if alternatives.len() < 2 {
        let literal = &pattern[..=close];
        return expand_braces(suffix)
            .into_iter()
            .map(|rest| format!("{}{}", literal, rest))
            .collect();
    }

    alternatives
        .into_iter()
        .flat_map(|alt| expand_braces(&format!("{}{}{}", prefix, alt, suffix)))
        .collect()
}

/// Byte offsets of the first balanced `{...}` group
fn find_group(pattern: &str) -> Option<(usize, usize)> {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => {
                let mut depth = 0;
                let mut j = i;
                while j < bytes.len() {
                    match bytes[j] {
                        b'\\' => j += 1,
                        b'{' => depth += 1,
                        b'}' => {
                            depth -= 1;
                            if depth == 0 {
                                return Some((i, j));
                            }
                        }
                        _ => {}
                    }
                    j += 1;
                }
                return None;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn split_alternatives(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&body[start..]);
    parts
}

/// Include and exclude globs anchored at a base directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl ContentPatterns {
    pub fn resolve(content: &ContentConfig, base: &Path) -> Self {
        let mut patterns = Self::default();

        for raw in &content.files {
            let (negated, body) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };

            for expanded in expand_braces(body) {
                let anchored = anchor(&expanded, base);
                if negated {
                    patterns.exclude.push(anchored);
                } else {
                    patterns.include.push(anchored);
                }
            }
        }

        tracing::debug!(
            base = %base.display(),
            include = patterns.include.len(),
            exclude = patterns.exclude.len(),
            "resolved content patterns"
        );
        patterns
    }

    /// Add excludes given outside the configuration, such as `-e` on the
    /// command line. Relative globs are anchored at `dir` like includes are.
    pub fn exclude_globs(&mut self, globs: &[String], dir: &Path) {
        for glob in globs {
            self.exclude
                .extend(expand_braces(glob).iter().map(|expanded| anchor(expanded, dir)));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }
}

fn anchor(pattern: &str, base: &Path) -> String {
    let mut trimmed = pattern;
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }

    if Path::new(trimmed).is_absolute() {
        return trimmed.to_string();
    }

    // The base directory is matched literally even if it contains `[` or `*`
    let base = glob::Pattern::escape(&base.to_string_lossy());
    if base.ends_with('/') {
        format!("{}{}", base, trimmed)
    } else {
        format!("{}/{}", base, trimmed)
    }
}
