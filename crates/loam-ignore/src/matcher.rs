use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::error::{IgnoreError, IgnoreResult};

/// `*` crosses `/`, leading dots are ordinary characters.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    source: String,
    pattern: Pattern,
    dir_only: bool,
}

impl Rule {
    fn compile(source: &str) -> IgnoreResult<Self> {
        let pattern = Pattern::new(&collapse_stars(source)).map_err(|e| IgnoreError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.msg.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            pattern,
            dir_only: source.ends_with('/'),
        })
    }

    fn matches(&self, rel: &str) -> bool {
        if self.dir_only {
            let as_dir = format!("{rel}/");
            self.pattern.matches_with(&as_dir, MATCH_OPTIONS)
        } else {
            self.pattern.matches_with(rel, MATCH_OPTIONS)
        }
    }
}

/// Decides which repo-relative paths are excluded from versioning.
///
/// Relative paths are `/`-separated and never start with `/`. The metadata
/// directory is excluded regardless of the configured patterns.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    file: Option<PathBuf>,
    metadata_dir: String,
    rules: Vec<Rule>,
}

impl IgnoreMatcher {
    /// A matcher with no patterns and no backing file.
    pub fn empty(metadata_dir: impl Into<String>) -> Self {
        Self {
            file: None,
            metadata_dir: metadata_dir.into(),
            rules: Vec::new(),
        }
    }

    /// A matcher over the given patterns, with no backing file.
    pub fn from_patterns<I, S>(metadata_dir: impl Into<String>, patterns: I) -> IgnoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::empty(metadata_dir);
        for p in patterns {
            let p = p.as_ref().trim();
            if is_pattern_line(p) {
                matcher.rules.push(Rule::compile(p)?);
            }
        }
        Ok(matcher)
    }

    /// Load patterns from `file`. A missing file yields an empty matcher.
    ///
    /// Lines that are not valid globs are skipped with a warning so that a
    /// hand-edited ignore file cannot make the repository unusable.
    pub fn load(file: impl Into<PathBuf>, metadata_dir: impl Into<String>) -> IgnoreResult<Self> {
        let file = file.into();
        let mut matcher = Self::empty(metadata_dir);
        let text = match fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) if e.kind() == IoErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        for line in text.lines().map(str::trim).filter(|l| is_pattern_line(l)) {
            match Rule::compile(line) {
                Ok(rule) => matcher.rules.push(rule),
                Err(e) => warn!(file = %file.display(), error = %e, "skipping ignore pattern"),
            }
        }
        debug!(file = %file.display(), patterns = matcher.rules.len(), "ignore patterns loaded");
        matcher.file = Some(file);
        Ok(matcher)
    }

    /// Name of the metadata directory this matcher always excludes.
    pub fn metadata_dir(&self) -> &str {
        &self.metadata_dir
    }

    /// The active patterns, in file order.
    pub fn patterns(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.source.clone()).collect()
    }

    /// Returns `true` if `rel` itself matches a pattern or is the metadata
    /// directory (or inside it).
    pub fn should_ignore(&self, rel: &str) -> bool {
        if self.is_metadata(rel) {
            return true;
        }
        self.rules.iter().any(|rule| rule.matches(rel))
    }

    /// Returns `true` if `rel` or any of its ancestor directories is ignored.
    pub fn is_excluded(&self, rel: &str) -> bool {
        if self.should_ignore(rel) {
            return true;
        }
        rel.match_indices('/')
            .any(|(idx, _)| self.should_ignore(&rel[..idx]))
    }

    /// Append `pattern` unless already present. Returns `true` if it was added.
    ///
    /// The ignore file, when there is one, is rewritten atomically with the
    /// new pattern appended and its existing lines (comments included) kept.
    pub fn add(&mut self, pattern: &str) -> IgnoreResult<bool> {
        let pattern = pattern.trim();
        if !is_pattern_line(pattern) {
            return Err(IgnoreError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "empty or comment".to_string(),
            });
        }
        if self.rules.iter().any(|r| r.source == pattern) {
            return Ok(false);
        }
        let rule = Rule::compile(pattern)?;

        if let Some(file) = &self.file {
            let mut text = match fs::read_to_string(file) {
                Ok(text) => text,
                Err(e) if e.kind() == IoErrorKind::NotFound => String::new(),
                Err(e) => return Err(e.into()),
            };
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(pattern);
            text.push('\n');
            loam_store::document::write_bytes_atomic(file, text.as_bytes())?;
        }

        debug!(pattern, "ignore pattern added");
        self.rules.push(rule);
        Ok(true)
    }

    /// Drop every pattern and delete the ignore file.
    pub fn clear(&mut self) -> IgnoreResult<()> {
        self.rules.clear();
        if let Some(file) = &self.file {
            loam_store::document::remove_document(file)?;
        }
        Ok(())
    }

    fn is_metadata(&self, rel: &str) -> bool {
        !self.metadata_dir.is_empty()
            && rel.split('/').next() == Some(self.metadata_dir.as_str())
    }
}

/// Reduce each run of `*` to one. A single `*` already crosses `/`, and
/// `glob` would otherwise read `**` as a recursive wildcard.
fn collapse_stars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

fn is_pattern_line(line: &str) -> bool {
    !line.is_empty() && !line.starts_with('#')
}
