//! Validated runtime configuration.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, PathRole};

/// Default minimum interval between pass dispatches, in seconds.
pub const DEFAULT_PERIOD_SECS: u64 = 300;

const MAX_COMPONENT_BYTES: usize = 255;
const MAX_PATH_BYTES: usize = 4096;

/// Everything the daemon needs to mirror one tree into another.
///
/// Construct with [`MirrorConfig::new`], which performs pre-flight
/// validation; a value of this type always names an existing source
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub logfile: PathBuf,
    pub period: Duration,
}

impl MirrorConfig {
    /// Validate the three paths and build the configuration.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] encountered, checking in order:
    /// source syntax, source existence, replica syntax, logfile syntax,
    /// nesting of source and replica, logfile inside either tree.
    pub fn new(
        source: impl Into<PathBuf>,
        replica: impl Into<PathBuf>,
        logfile: impl Into<PathBuf>,
        period_secs: u64,
    ) -> Result<Self, ConfigError> {
        let source = source.into();
        let replica = replica.into();
        let logfile = logfile.into();

        check_syntax(PathRole::Source, &source)?;
        if !source.exists() {
            return Err(ConfigError::SourceMissing { path: source });
        }
        if !source.is_dir() {
            return Err(ConfigError::SourceNotDirectory { path: source });
        }
        check_syntax(PathRole::Replica, &replica)?;
        check_syntax(PathRole::Logfile, &logfile)?;

        let resolved_source = resolve(&source);
        let resolved_replica = resolve(&replica);
        if resolved_replica.starts_with(&resolved_source)
            || resolved_source.starts_with(&resolved_replica)
        {
            return Err(ConfigError::NestedRoots {
                source_dir: source,
                replica_dir: replica,
            });
        }

        let resolved_logfile = resolve(&logfile);
        for (role, root, resolved) in [
            (PathRole::Source, &source, &resolved_source),
            (PathRole::Replica, &replica, &resolved_replica),
        ] {
            if resolved_logfile.starts_with(resolved) {
                return Err(ConfigError::LogfileInsideTree {
                    logfile,
                    role,
                    root: root.clone(),
                });
            }
        }

        Ok(Self {
            source,
            replica,
            logfile,
            period: Duration::from_secs(period_secs),
        })
    }
}

fn check_syntax(role: PathRole, path: &Path) -> Result<(), ConfigError> {
    validate_path_syntax(path).map_err(|reason| ConfigError::InvalidPath {
        role,
        path: path.to_path_buf(),
        reason,
    })
}

/// Check that `path` is a name the host filesystem could create.
///
/// Existence is not checked. Returns a short reason on failure.
pub fn validate_path_syntax(path: &Path) -> Result<(), &'static str> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err("path is empty");
    }
    if path.to_string_lossy().contains('\0') {
        return Err("path contains a NUL byte");
    }
    if raw.len() > MAX_PATH_BYTES {
        return Err("path is too long");
    }
    for component in path.components() {
        if let Component::Normal(name) = component {
            if name.len() > MAX_COMPONENT_BYTES {
                return Err("path component longer than 255 bytes");
            }
            check_platform_component(&name.to_string_lossy())?;
        }
    }
    Ok(())
}

#[cfg(windows)]
fn check_platform_component(name: &str) -> Result<(), &'static str> {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    if name
        .chars()
        .any(|c| c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*'))
    {
        return Err("path contains a character Windows does not allow");
    }
    let stem = name.split('.').next().unwrap_or(name);
    if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
        return Err("path uses a reserved Windows device name");
    }
    if name.ends_with(' ') || name.ends_with('.') {
        return Err("path component ends with a space or dot");
    }
    Ok(())
}

#[cfg(not(windows))]
fn check_platform_component(_name: &str) -> Result<(), &'static str> {
    Ok(())
}

/// Best-effort canonical form of `path` for the nesting check. The replica
/// may not exist yet, so the deepest existing ancestor is canonicalized and
/// the missing tail is appended to it.
fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = std::fs::canonicalize(existing) {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_invalid() {
        assert_eq!(validate_path_syntax(Path::new("")), Err("path is empty"));
    }

    #[test]
    fn overlong_component_is_invalid() {
        let name = "x".repeat(256);
        assert!(validate_path_syntax(&Path::new("/tmp").join(name)).is_err());
    }

    #[test]
    fn ordinary_paths_are_valid() {
        assert!(validate_path_syntax(Path::new("/var/log/replica.log")).is_ok());
        assert!(validate_path_syntax(Path::new("relative/dir")).is_ok());
    }
}
