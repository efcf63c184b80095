//! Dependency manifest handling.
//!
//! The manifest (`requirements.txt`) is read and installed by the package
//! manager, not by buildprep; parsing here is diagnostic only. It backs the
//! `validate` subcommand and the entry count logged before the manifest
//! install step, and never alters what the package manager installs.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Version comparison operators accepted in a specifier, longest first so
/// two-character operators match before their one-character prefixes.
const CONSTRAINT_OPS: &[&str] = &["==", ">=", "<=", "~=", "!=", ">", "<"];

/// One manifest line: a package name with an optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Package identifier (e.g., `requests`).
    pub name: String,
    /// Version constraint including its operator (e.g., `==2.31.0`), if any.
    pub constraint: Option<String>,
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.constraint {
            Some(c) => write!(f, "{}{}", self.name, c),
            None => write!(f, "{}", self.name),
        }
    }
}

impl std::str::FromStr for Requirement {
    type Err = RequirementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim();
        if spec.is_empty() {
            return Err(RequirementError::Empty);
        }
        if spec.starts_with('-') {
            // pip directive lines (-r, -e, --hash, ...) are the package
            // manager's business; buildprep refuses to half-understand them
            return Err(RequirementError::Directive(spec.to_string()));
        }

        let (name, constraint) = match CONSTRAINT_OPS
            .iter()
            .filter_map(|op| spec.find(op).map(|idx| (idx, *op)))
            .min_by_key(|(idx, _)| *idx)
        {
            Some((idx, _op)) => {
                let name = spec[..idx].trim();
                let constraint = spec[idx..].trim();
                (name.to_string(), Some(constraint.to_string()))
            }
            None => (spec.to_string(), None),
        };

        if !is_valid_name(&name) {
            return Err(RequirementError::InvalidName(name));
        }
        if let Some(c) = &constraint {
            // Operator with nothing after it, e.g. "requests=="
            let version = CONSTRAINT_OPS
                .iter()
                .find_map(|op| c.strip_prefix(op))
                .unwrap_or("")
                .trim();
            if version.is_empty() {
                return Err(RequirementError::InvalidConstraint(c.clone()));
            }
        }

        Ok(Requirement { name, constraint })
    }
}

/// Package names: alphanumeric start, then alphanumerics plus `.`, `_`, `-`,
/// optionally followed by an extras group like `[socks]`.
fn is_valid_name(name: &str) -> bool {
    let base = match name.find('[') {
        Some(idx) => {
            if !name.ends_with(']') {
                return false;
            }
            &name[..idx]
        }
        None => name,
    };

    let mut chars = base.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Error for invalid requirement lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    /// The line is empty after trimming.
    Empty,
    /// The line is a pip directive, not a package specifier.
    Directive(String),
    /// The package name is malformed.
    InvalidName(String),
    /// The version constraint has an operator but no version.
    InvalidConstraint(String),
}

impl std::fmt::Display for RequirementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequirementError::Empty => write!(f, "Empty requirement"),
            RequirementError::Directive(s) => {
                write!(f, "Directive lines are not supported: '{}'", s)
            }
            RequirementError::InvalidName(s) => write!(f, "Invalid package name '{}'", s),
            RequirementError::InvalidConstraint(s) => {
                write!(f, "Invalid version constraint '{}'", s)
            }
        }
    }
}

impl std::error::Error for RequirementError {}

/// A parsed dependency manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Path the manifest was loaded from.
    pub path: PathBuf,
    /// Parsed requirements, in file order.
    pub requirements: Vec<Requirement>,
}

impl Manifest {
    /// Load and parse a manifest file.
    ///
    /// Blank lines and `#` comments (full-line or trailing) are skipped.
    /// Any remaining line that is not a valid package specifier fails the
    /// load with its line number.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest from {:?}", path))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content (factored out for tests).
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut requirements = Vec::new();

        for (idx, raw_line) in content.lines().enumerate() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            let requirement: Requirement = line.parse().map_err(|e: RequirementError| {
                anyhow::anyhow!("{:?} line {}: {}", path, idx + 1, e)
            })?;
            requirements.push(requirement);
        }

        Ok(Self {
            path: path.to_path_buf(),
            requirements,
        })
    }

    /// Number of package entries
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// True if the manifest lists no packages
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Validate the manifest beyond line-level parsing.
    pub fn validate(&self) -> Result<()> {
        if self.requirements.is_empty() {
            anyhow::bail!("Manifest {:?} lists no packages", self.path);
        }
        Ok(())
    }
}

/// Strip a full-line or trailing `#` comment.
///
/// A trailing comment needs whitespace before the `#`, matching how the
/// package manager reads the file.
fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return "";
    }
    match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line,
    }
}
