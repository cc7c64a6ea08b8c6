//! Fixed file-selection tables.
//!
//! Which directories are pruned, which files count as text, and which
//! language tag a fenced block gets. The tables are plain data built once
//! by [`FileRules::default`] and handed to the scanner and assembler.

use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Directory names pruned from every snapshot.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "venv",
    "__pycache__",
    "node_modules",
    "lib",
    "site-packages",
    "dist",
    "build",
    "env",
    ".git",
    ".idea",
    ".vscode",
    ".svn",
    "vendor",
];

/// Extensions (lowercase, without the dot) treated as text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "html", "css", "json", "xml", "yaml", "yml", "sh", "bat", "ps1",
    "java", "c", "cpp", "h", "hpp", "cs", "php", "rb", "go", "rs", "ts", "jsx", "tsx", "vue",
    "scala", "kt", "groovy", "gradle", "sql", "gitignore", "env", "cfg", "ini", "toml", "csv",
];

/// Extension to fenced-block language tag.
pub const LANGUAGE_TAGS: &[(&str, &str)] = &[
    ("py", "python"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("html", "html"),
    ("css", "css"),
    ("java", "java"),
    ("cpp", "cpp"),
    ("c", "c"),
    ("rb", "ruby"),
    ("php", "php"),
    ("go", "go"),
    ("rs", "rust"),
    ("sql", "sql"),
];

/// Tag used when an extension has no entry in [`LANGUAGE_TAGS`].
pub const DEFAULT_LANGUAGE: &str = "text";

/// Dotfile holding project-wide scope notes. Always included.
pub const DIRECTIVE_FILE: &str = ".cursorrules";

/// Lockfile name that is never included.
pub const LOCKFILE_NAME: &str = "package-lock.json";

/// Suffix of environment files whose values get masked.
pub const ENV_SUFFIX: &str = ".env";

/// Case-insensitive set of directory names to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    /// Build a set from arbitrary names. Names are lowercased.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Whether a single directory name is excluded.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Whether an excluded name occurs anywhere in the directory part of
    /// `relative`, ignoring case.
    ///
    /// This is a substring test: `mylib/` matches `lib` and
    /// `src/environment/` matches `env` even though neither directory is
    /// pruned by name. The file name itself is not checked, so a root-level
    /// `.env` never matches.
    pub fn matches_path(&self, relative: &Path) -> bool {
        let dirs = match relative.parent() {
            Some(parent) => parent.to_string_lossy().to_lowercase(),
            None => return false,
        };
        !dirs.is_empty() && self.names.iter().any(|name| dirs.contains(name.as_str()))
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_DIRS)
    }
}

/// Verdict for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// Text file that goes into the snapshot.
    Included,
    /// Lockfile or file under an excluded directory. Counted.
    Ignored,
    /// Not recognised as text. Dropped without counting.
    NotText,
}

/// All lookup tables used by one run.
#[derive(Debug, Clone)]
pub struct FileRules {
    pub exclusions: ExclusionSet,
    text_extensions: HashSet<&'static str>,
    languages: HashMap<&'static str, &'static str>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            exclusions: ExclusionSet::default(),
            text_extensions: TEXT_EXTENSIONS.iter().copied().collect(),
            languages: LANGUAGE_TAGS.iter().copied().collect(),
        }
    }
}

impl FileRules {
    /// Default tables with a custom exclusion set.
    pub fn with_exclusions(exclusions: ExclusionSet) -> Self {
        Self {
            exclusions,
            ..Default::default()
        }
    }

    /// Classify a file by its path relative to the source root.
    ///
    /// The lockfile and excluded-directory checks run first, so a lockfile
    /// is ignored even though `.json` is a text extension.
    pub fn classify(&self, relative: &Path) -> FileClass {
        let name = file_name(relative);

        if name.trim().to_lowercase() == LOCKFILE_NAME || self.exclusions.matches_path(relative) {
            return FileClass::Ignored;
        }

        if self.is_text_file(&name) {
            FileClass::Included
        } else {
            FileClass::NotText
        }
    }

    /// Whether a bare file name is text.
    pub fn is_text_file(&self, name: &str) -> bool {
        if name == DIRECTIVE_FILE {
            return true;
        }
        extension(name).is_some_and(|ext| self.text_extensions.contains(ext.as_str()))
    }

    /// Language tag for the fenced block of `path`.
    pub fn language_for(&self, path: &Path) -> &'static str {
        extension(&file_name(path))
            .and_then(|ext| self.languages.get(ext.as_str()).copied())
            .unwrap_or(DEFAULT_LANGUAGE)
    }
}

/// Whether `path` names the project-directive dotfile.
pub fn is_directive_file(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == DIRECTIVE_FILE)
}

/// Whether `path` is an environment file whose values must be masked.
pub fn is_env_file(path: &Path) -> bool {
    file_name(path).ends_with(ENV_SUFFIX)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lowercase text after the last `.` of a file name.
///
/// Unlike [`Path::extension`], a leading dot counts: `.env` has the
/// extension `env`.
fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extension() {
        assert_eq!(extension("main.rs").as_deref(), Some("rs"));
        assert_eq!(extension("Archive.TAR.GZ").as_deref(), Some("gz"));
        assert_eq!(extension(".env").as_deref(), Some("env"));
        assert_eq!(extension(".gitignore").as_deref(), Some("gitignore"));
        assert_eq!(extension("Makefile"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn test_exclusion_set_case_insensitive() {
        let set = ExclusionSet::default();
        assert!(set.contains_name("node_modules"));
        assert!(set.contains_name("Node_Modules"));
        assert!(set.contains_name(".GIT"));
        assert!(!set.contains_name("src"));
        assert!(!set.contains_name("mylib"));
        assert!(DEFAULT_EXCLUDED_DIRS
            .iter()
            .all(|name| set.contains_name(&name.to_uppercase())));
    }

    #[test]
    fn test_exclusion_matches_any_ancestor() {
        let set = ExclusionSet::default();
        assert!(set.matches_path(Path::new("a/b/VENDOR/c/x.rs")));
        assert!(set.matches_path(Path::new("build/out.txt")));
        assert!(!set.matches_path(Path::new("src/app.py")));
        // File names are not checked
        assert!(!set.matches_path(Path::new("src/env")));
        assert!(!set.matches_path(Path::new(".env")));
        assert!(!set.matches_path(Path::new("library.rs")));
    }

    #[test]
    fn test_exclusion_matches_substrings_of_directories() {
        let set = ExclusionSet::default();
        assert!(set.matches_path(Path::new("src/library/x.rs")));
        assert!(set.matches_path(Path::new("src/environment/config.py")));
        assert!(set.matches_path(Path::new("mylib/util.py")));
        assert!(set.matches_path(Path::new("Builds/out.txt")));
        assert!(set.matches_path(Path::new(".github/workflows/ci.yml")));

        let rules = FileRules::default();
        assert_eq!(rules.classify(Path::new("mylib/util.py")), FileClass::Ignored);
        assert_eq!(rules.classify(Path::new(".env")), FileClass::Included);
    }

    #[test]
    fn test_custom_exclusions() {
        let rules = FileRules::with_exclusions(ExclusionSet::new(["Generated"]));
        assert_eq!(rules.classify(Path::new("generated/a.rs")), FileClass::Ignored);
        assert_eq!(rules.classify(Path::new("node_modules/a.js")), FileClass::Included);
    }

    #[test]
    fn test_classify_lockfile_wins() {
        let rules = FileRules::default();
        assert_eq!(rules.classify(Path::new("package-lock.json")), FileClass::Ignored);
        assert_eq!(rules.classify(Path::new("web/Package-Lock.JSON")), FileClass::Ignored);
        assert_eq!(rules.classify(Path::new(" package-lock.json ")), FileClass::Ignored);
        assert_eq!(rules.classify(Path::new("package.json")), FileClass::Included);
    }

    #[test]
    fn test_classify_text_and_binary() {
        let rules = FileRules::default();
        assert_eq!(rules.classify(Path::new("src/app.py")), FileClass::Included);
        assert_eq!(rules.classify(Path::new("README.MD")), FileClass::Included);
        assert_eq!(rules.classify(Path::new(".env")), FileClass::Included);
        assert_eq!(rules.classify(Path::new("logo.png")), FileClass::NotText);
        assert_eq!(rules.classify(Path::new("Makefile")), FileClass::NotText);
    }

    #[test]
    fn test_directive_file_only() {
        let rules = FileRules::default();
        assert_eq!(rules.classify(Path::new(".cursorrules")), FileClass::Included);
        assert_eq!(rules.classify(Path::new("docs/.cursorrules")), FileClass::Included);
        assert_eq!(rules.classify(Path::new(".prettierrc")), FileClass::NotText);
        assert!(is_directive_file(Path::new("a/.cursorrules")));
        assert!(!is_directive_file(Path::new("a/.cursorrules.md")));
    }

    #[test]
    fn test_language_for() {
        let rules = FileRules::default();
        assert_eq!(rules.language_for(Path::new("x/main.RS")), "rust");
        assert_eq!(rules.language_for(Path::new("app.py")), "python");
        assert_eq!(rules.language_for(Path::new("index.tsx")), "text");
        assert_eq!(rules.language_for(&PathBuf::from(".cursorrules")), "text");
    }

    #[test]
    fn test_is_env_file() {
        assert!(is_env_file(Path::new(".env")));
        assert!(is_env_file(Path::new("config/prod.env")));
        assert!(!is_env_file(Path::new(".env.local")));
        assert!(!is_env_file(Path::new("environment.ts")));
    }
}
