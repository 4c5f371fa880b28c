//! TypeScript configuration handling.

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{TsError, TsResult};

/// TypeScript configuration (tsconfig.json).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    /// Compiler options.
    #[serde(default)]
    pub compiler_options: CompilerOptions,
    /// Include patterns.
    #[serde(default)]
    pub include: Vec<String>,
    /// Exclude patterns.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Files to include.
    #[serde(default)]
    pub files: Vec<String>,
    /// Extends another config.
    #[serde(default)]
    pub extends: Option<String>,
    /// Component compiler options.
    #[serde(default)]
    pub vue_compiler_options: VueCompilerOptions,
}

impl TsConfig {
    /// Load a tsconfig.json and every config it extends.
    pub fn load(path: &Path) -> TsResult<Self> {
        let mut config = Self::load_single(path)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        config.compiler_options.config_dir = Some(base_dir.to_path_buf());
        config.resolve(base_dir, 0)?;
        Ok(config)
    }

    /// Parse a single config without following `extends`.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let content = remove_trailing_commas(&remove_json_comments(content));
        serde_json::from_str(&content)
    }

    fn load_single(path: &Path) -> TsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|e| TsError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Find tsconfig.json in a directory or its parents.
    pub fn find(dir: &Path) -> Option<Utf8PathBuf> {
        let mut current = dir;
        loop {
            for name in ["tsconfig.json", "jsconfig.json"] {
                let candidate = current.join(name);
                if candidate.exists() {
                    return Utf8PathBuf::from_path_buf(candidate).ok();
                }
            }
            current = current.parent()?;
        }
    }

    /// Follow `extends`, merging base settings under this config's own.
    fn resolve(&mut self, base_dir: &Path, depth: usize) -> TsResult<()> {
        let Some(extends) = self.extends.take() else {
            return Ok(());
        };
        if depth > 16 {
            return Err(TsError::Config {
                path: base_dir.to_path_buf(),
                message: format!("extends chain too deep at '{}'", extends),
            });
        }
        let extends_path = resolve_extends(base_dir, &extends);
        let mut base = Self::load_single(&extends_path)?;
        let extends_dir = extends_path.parent().unwrap_or(base_dir).to_path_buf();
        base.compiler_options.config_dir = Some(extends_dir.clone());
        base.resolve(&extends_dir, depth + 1)?;
        self.merge_from(base);
        Ok(())
    }

    /// Merge another config into this one. Values set here win.
    fn merge_from(&mut self, other: TsConfig) {
        let own = &mut self.compiler_options;
        let base = other.compiler_options;
        own.target = own.target.take().or(base.target);
        own.module = own.module.take().or(base.module);
        own.module_resolution = own.module_resolution.take().or(base.module_resolution);
        own.strict = own.strict.or(base.strict);
        own.skip_lib_check = own.skip_lib_check.or(base.skip_lib_check);
        own.experimental_decorators = own.experimental_decorators.or(base.experimental_decorators);
        // `baseUrl` and `paths` stay relative to the config that declares them.
        if own.base_url.is_none() && own.paths.is_empty() {
            own.base_url = base.base_url;
            own.paths = base.paths;
            own.config_dir = base.config_dir;
        }
        if self.include.is_empty() {
            self.include = other.include;
        }
        if self.exclude.is_empty() {
            self.exclude = other.exclude;
        }

        let own = &mut self.vue_compiler_options;
        let base = other.vue_compiler_options;
        if own.extensions.is_empty() {
            own.extensions = base.extensions;
        }
        own.check_unknown_components = own.check_unknown_components.or(base.check_unknown_components);
        if own.component_libraries.is_empty() {
            own.component_libraries = base.component_libraries;
        }
        for (package, glob) in base.library_declarations {
            own.library_declarations.entry(package).or_insert(glob);
        }
    }
}

fn resolve_extends(base_dir: &Path, extends: &str) -> PathBuf {
    let with_json = |p: PathBuf| {
        if p.extension().is_some_and(|e| e == "json") {
            p
        } else {
            p.with_extension("json")
        }
    };
    if extends.starts_with('.') || Path::new(extends).is_absolute() {
        return with_json(base_dir.join(extends));
    }
    // A package specifier: look it up in node_modules up the tree.
    let mut dir = Some(base_dir);
    while let Some(current) = dir {
        let candidate = current.join("node_modules").join(extends);
        if candidate.is_dir() {
            return candidate.join("tsconfig.json");
        }
        let candidate = with_json(candidate);
        if candidate.exists() {
            return candidate;
        }
        dir = current.parent();
    }
    with_json(base_dir.join("node_modules").join(extends))
}

/// TypeScript compiler options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Target ECMAScript version.
    pub target: Option<String>,
    /// Module system.
    pub module: Option<String>,
    /// Module resolution strategy.
    pub module_resolution: Option<String>,
    /// Strict mode.
    pub strict: Option<bool>,
    /// Skip library checking.
    pub skip_lib_check: Option<bool>,
    /// Legacy decorators, which class components rely on.
    pub experimental_decorators: Option<bool>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Path aliases.
    #[serde(default)]
    pub paths: IndexMap<String, Vec<String>>,
    /// Directory `baseUrl` and `paths` are relative to.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

impl CompilerOptions {
    /// Check if using NodeNext module resolution.
    pub fn is_node_next(&self) -> bool {
        self.module_resolution
            .as_ref()
            .map(|m| m.eq_ignore_ascii_case("nodenext") || m.eq_ignore_ascii_case("node16"))
            .unwrap_or(false)
    }

    /// Check if strict mode is enabled.
    pub fn is_strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }

    /// The directory `paths` targets are resolved against.
    pub fn paths_base(&self) -> Option<PathBuf> {
        let dir = self.config_dir.as_deref()?;
        match &self.base_url {
            Some(base_url) => Some(dir.join(base_url)),
            None if !self.paths.is_empty() => Some(dir.to_path_buf()),
            None => None,
        }
    }
}

/// Component compiler options in tsconfig.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VueCompilerOptions {
    /// Warn about unregistered component tags.
    pub check_unknown_components: Option<bool>,
    /// Extensions to treat as component files.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Packages whose declarations contribute components, in precedence
    /// order.
    #[serde(default)]
    pub component_libraries: Vec<String>,
    /// Declaration globs per package, relative to the package root.
    #[serde(default)]
    pub library_declarations: IndexMap<String, String>,
}

impl VueCompilerOptions {
    /// Get file extensions to process.
    pub fn file_extensions(&self) -> Vec<&str> {
        if self.extensions.is_empty() {
            vec![".vue"]
        } else {
            self.extensions.iter().map(|s| s.as_str()).collect()
        }
    }
}

/// Remove JSON comments (// and /* */).
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(c);
            continue;
        }
        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for nc in chars.by_ref() {
                    if nc == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                while let Some(nc) = chars.next() {
                    if nc == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => result.push(c),
        }
    }

    result
}

/// Remove commas directly before `}` or `]`, outside strings.
fn remove_trailing_commas(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut pending_comma: Option<String> = None;
    let mut in_string = false;
    let mut escape_next = false;

    for c in json.chars() {
        if in_string {
            result.push(c);
            if escape_next {
                escape_next = false;
            } else if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if let Some(pending) = pending_comma.as_mut() {
            if c.is_whitespace() {
                pending.push(c);
                continue;
            }
            let pending = pending_comma.take().unwrap_or_default();
            if c == '}' || c == ']' {
                result.push_str(&pending[1..]);
            } else {
                result.push_str(&pending);
            }
        }
        match c {
            ',' => pending_comma = Some(String::from(",")),
            '"' => {
                in_string = true;
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    if let Some(pending) = pending_comma {
        result.push_str(&pending);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_remove_json_comments() {
        let input = r#"{
            // This is a comment
            "key": "value", /* inline comment */
            "key2": "value with // in string"
        }"#;
        let result = remove_json_comments(input);
        assert!(!result.contains("// This"));
        assert!(!result.contains("/* inline"));
        assert!(result.contains("// in string"));
    }

    #[test]
    fn test_remove_trailing_commas() {
        assert_eq!(remove_trailing_commas(r#"{"a": [1, 2,], "b": ",}",}"#), r#"{"a": [1, 2], "b": ",}"}"#);
    }

    #[test]
    fn test_parse_vue_compiler_options() {
        let config = TsConfig::parse(
            r#"{
                "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["src/*"] } },
                "vueCompilerOptions": {
                    "checkUnknownComponents": true,
                    "componentLibraries": ["ui-kit", "legacy-kit"],
                    "libraryDeclarations": { "ui-kit": "lib/**/*.d.ts" },
                },
            }"#,
        )
        .unwrap();
        let vue = &config.vue_compiler_options;
        assert_eq!(vue.check_unknown_components, Some(true));
        assert_eq!(vue.component_libraries, vec!["ui-kit", "legacy-kit"]);
        assert_eq!(vue.library_declarations["ui-kit"], "lib/**/*.d.ts");
        assert_eq!(config.compiler_options.paths["@/*"], vec!["src/*"]);
    }

    #[test]
    fn test_load_follows_extends() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(
            dir.path().join("config/base.json"),
            r#"{ "compilerOptions": { "strict": true, "baseUrl": "..", "paths": { "~/*": ["src/*"] } },
                 "vueCompilerOptions": { "componentLibraries": ["ui-kit"] } }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("tsconfig.json"),
            r#"{ "extends": "./config/base", "compilerOptions": { "strict": false } }"#,
        )
        .unwrap();

        let config = TsConfig::load(&dir.path().join("tsconfig.json")).unwrap();
        assert!(!config.compiler_options.is_strict());
        assert_eq!(config.vue_compiler_options.component_libraries, vec!["ui-kit"]);
        assert_eq!(
            config.compiler_options.paths_base(),
            Some(dir.path().join("config").join(".."))
        );
    }

    #[test]
    fn test_compiler_options() {
        let opts = CompilerOptions {
            module_resolution: Some("NodeNext".to_string()),
            strict: Some(true),
            ..Default::default()
        };
        assert!(opts.is_node_next());
        assert!(opts.is_strict());
    }
}
