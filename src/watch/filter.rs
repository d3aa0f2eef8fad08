// src/watch/filter.rs

//! The watch/ignore decision for a single path.

use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::logging::{RecoverySink, Tag};

/// Rules selecting which paths are in scope.
///
/// `paths` entries may contain shell-glob metacharacters (`*`, `**`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Watch {
    #[serde(default)]
    pub exts: Vec<String>,

    #[serde(default)]
    pub paths: Vec<String>,
}

/// Rules excluding paths from scope. Ignore rules win over watch rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ignore {
    /// Reject paths whose final component starts with `.`.
    #[serde(default)]
    pub dot: bool,

    #[serde(default)]
    pub exts: Vec<String>,

    #[serde(default)]
    pub paths: Vec<String>,
}

/// Compiled watch/ignore rules plus the recovery sink that absorbs the
/// non-fatal failures (unresolvable paths, bad globs) the decision can hit.
pub struct PathFilter {
    watch: Watch,
    ignore: Ignore,
    recovery: RecoverySink,
}

impl PathFilter {
    pub fn new(watch: Watch, ignore: Ignore, recovery: RecoverySink) -> Self {
        Self {
            watch,
            ignore,
            recovery,
        }
    }

    /// Decide whether `path` is in scope. Total: every failure mode reports
    /// to the recovery sink and rejects; nothing here panics or errors.
    ///
    /// The pipeline short-circuits on the first rejection:
    /// empty path → dot rule → extension rules → ignore path rules → watch
    /// path rules. On acceptance, `want_stat` additionally stats the path
    /// (`None` if the stat races with the filesystem).
    ///
    /// Path rules match by *substring containment* against the absolute
    /// path, not by prefix or tree membership: a rule naming `core` also
    /// matches `/unrelated/core-legacy/x`. Existing configurations depend on
    /// this, so it stays.
    pub fn validate(&self, path: &str, want_stat: bool) -> (bool, Option<Metadata>) {
        if path.is_empty() {
            return (false, None);
        }

        if self.ignore.dot && is_dot(path) {
            return (false, None);
        }

        let ext = ext_of(path);
        if !ext.is_empty() {
            if self.ignore.exts.iter().any(|e| e == ext) {
                return (false, None);
            }
            if !self.watch.exts.is_empty() && !self.watch.exts.iter().any(|e| e == ext) {
                return (false, None);
            }
        }

        let abs = match absolute(path) {
            Ok(p) => p,
            Err(err) => {
                self.recovery.push(Tag::Error, format!("resolving {path:?}: {err}"));
                return (false, None);
            }
        };
        let abs = abs.to_string_lossy().into_owned();

        for rule in &self.ignore.paths {
            if self.rule_matches(&abs, rule) {
                return (false, None);
            }
        }

        if !self.watch.paths.is_empty()
            && !self.watch.paths.iter().any(|rule| self.rule_matches(&abs, rule))
        {
            return (false, None);
        }

        let info = if want_stat {
            std::fs::metadata(path).ok()
        } else {
            None
        };
        (true, info)
    }

    /// One path rule against one absolute path.
    ///
    /// A rule matches when the absolute path contains the rule's absolute
    /// form, or (for rules carrying `*`) when any filesystem expansion of
    /// the rule contains the absolute path.
    fn rule_matches(&self, abs: &str, rule: &str) -> bool {
        let rule_abs = match absolute(rule) {
            Ok(p) => p.to_string_lossy().into_owned(),
            Err(err) => {
                self.recovery.push(Tag::Error, format!("resolving {rule:?}: {err}"));
                return false;
            }
        };

        if abs.contains(&rule_abs) {
            return true;
        }

        if rule.contains('*') {
            let entries = match glob::glob(&rule_abs) {
                Ok(entries) => entries,
                Err(err) => {
                    self.recovery.push(Tag::Error, format!("glob {rule:?}: {err}"));
                    return false;
                }
            };
            for entry in entries {
                match entry {
                    Ok(expansion) => {
                        if expansion.to_string_lossy().contains(abs) {
                            return true;
                        }
                    }
                    Err(err) => {
                        self.recovery.push(Tag::Error, format!("glob {rule:?}: {err}"));
                        return false;
                    }
                }
            }
        }

        false
    }
}

/// True when the final path component starts with `.`.
pub(crate) fn is_dot(path: &str) -> bool {
    Path::new(path)
        .file_name()
        .map_or(false, |name| name.to_string_lossy().starts_with('.'))
}

/// The suffix after the last `.` of the basename, empty when there is none.
pub(crate) fn ext_of(path: &str) -> &str {
    let base = match path.rfind(['/', '\\']) {
        Some(i) => &path[i + 1..],
        None => path,
    };
    match base.rfind('.') {
        Some(i) => &base[i + 1..],
        None => "",
    }
}

/// Absolute, lexically-cleaned form of `path` (CWD-joined when relative,
/// `.`/`..` components resolved without touching the filesystem).
pub(crate) fn absolute(path: &str) -> io::Result<PathBuf> {
    let p = Path::new(path);
    let joined = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}
