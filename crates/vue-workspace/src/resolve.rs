//! Import specifier resolution.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// Suffixes tried after the specifier as written.
const CANDIDATE_SUFFIXES: &[&str] = &[".vue", ".ts", ".d.ts", "/index.ts", "/index.vue"];

/// Where a specifier points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(Utf8PathBuf),
    /// A bare specifier: a package name and the rest of the path.
    Package {
        name: String,
        subpath: Option<String>,
    },
}

/// Resolves specifiers the way the type checker would for this workspace.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    base_url: Option<Utf8PathBuf>,
    /// `paths` patterns with their targets, relative to `paths_base`.
    aliases: IndexMap<String, Vec<String>>,
    paths_base: Utf8PathBuf,
    /// Extra component extensions tried after `.vue`.
    extensions: Vec<String>,
}

impl Resolver {
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            paths_base: root.to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: Option<Utf8PathBuf>) -> Self {
        self.base_url = base_url;
        self
    }

    /// `paths` patterns whose targets are relative to `base`.
    pub fn with_aliases(mut self, base: Utf8PathBuf, aliases: IndexMap<String, Vec<String>>) -> Self {
        self.paths_base = base;
        self.aliases = aliases;
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .filter(|ext| ext != ".vue")
            .collect();
        self
    }

    /// Resolve `specifier` imported from the file `from`. `exists` answers
    /// whether a candidate file is present.
    pub fn resolve(
        &self,
        from: &Utf8Path,
        specifier: &str,
        exists: impl Fn(&Utf8Path) -> bool,
    ) -> Option<Resolved> {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            let dir = from.parent().unwrap_or(Utf8Path::new(""));
            return self.find_file(&dir.join(specifier), &exists).map(Resolved::File);
        }
        if specifier.starts_with('/') {
            return self
                .find_file(Utf8Path::new(specifier), &exists)
                .map(Resolved::File);
        }

        for (pattern, targets) in &self.aliases {
            let Some(captured) = match_pattern(pattern, specifier) else {
                continue;
            };
            for target in targets {
                let candidate = self.paths_base.join(target.replacen('*', captured, 1));
                if let Some(found) = self.find_file(&candidate, &exists) {
                    return Some(Resolved::File(found));
                }
            }
        }

        if let Some(base) = &self.base_url {
            if let Some(found) = self.find_file(&base.join(specifier), &exists) {
                return Some(Resolved::File(found));
            }
        }

        package_name(specifier).map(|(name, subpath)| Resolved::Package {
            name: name.to_string(),
            subpath: subpath.map(String::from),
        })
    }

    fn find_file(&self, candidate: &Utf8Path, exists: &impl Fn(&Utf8Path) -> bool) -> Option<Utf8PathBuf> {
        let candidate = normalize(candidate);
        if candidate.extension().is_some() && exists(&candidate) {
            return Some(candidate);
        }
        let base = candidate.as_str().trim_end_matches('/');
        CANDIDATE_SUFFIXES
            .iter()
            .copied()
            .chain(self.extensions.iter().map(String::as_str))
            .map(|suffix| Utf8PathBuf::from(format!("{}{}", base, suffix)))
            .find(|path| exists(path))
    }
}

/// Match a `paths` pattern with at most one `*`, returning the captured
/// part (empty for exact patterns).
fn match_pattern<'a>(pattern: &str, specifier: &'a str) -> Option<&'a str> {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => specifier
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix)),
        None => (pattern == specifier).then_some(""),
    }
}

/// Split a bare specifier into package name and subpath.
pub fn package_name(specifier: &str) -> Option<(&str, Option<&str>)> {
    if specifier.is_empty() || specifier.starts_with('.') {
        return None;
    }
    let split_at = if specifier.starts_with('@') {
        let scope_end = specifier.find('/')?;
        specifier[scope_end + 1..]
            .find('/')
            .map(|i| scope_end + 1 + i)
    } else {
        specifier.find('/')
    };
    Some(match split_at {
        Some(i) => (&specifier[..i], Some(&specifier[i + 1..])),
        None => (specifier, None),
    })
}

/// Resolve `.` and `..` without touching the file system.
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut result = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other.as_str()),
        }
    }
    result
}
