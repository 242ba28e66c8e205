//! Language configuration for judged submissions.
//!
//! Languages are declared in `files/languages.toml`, keyed by source file
//! extension, and deserialized into [`Language`] variants. Adding a language
//! means adding a table entry, not editing a branch in the runner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// How a submission becomes something the sandbox can run.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Language {
    /// Compiled ahead of time on the host; the binary is staged into the box.
    Native {
        compiler: PathBuf,
        args: Vec<String>,
        bin_name: String,
    },
    /// Staged as a script and run through its interpreter inside the box.
    Interpreted {
        interpreter: PathBuf,
        script_name: String,
        time_multiplier: u64,
        #[serde(default)]
        extra_dirs: Vec<String>,
        #[serde(default)]
        env: Vec<String>,
    },
}

impl Language {
    /// File name the program is staged under inside the box.
    pub fn sandbox_filename(&self) -> &str {
        match self {
            Language::Native { bin_name, .. } => bin_name,
            Language::Interpreted { script_name, .. } => script_name,
        }
    }

    /// Command line executed through `/bin/sh -c` inside the box.
    pub fn run_command(&self) -> String {
        match self {
            Language::Native { bin_name, .. } => format!("./{}", bin_name),
            Language::Interpreted {
                interpreter,
                script_name,
                ..
            } => format!("{} {}", interpreter.display(), script_name),
        }
    }

    /// Multiplier applied to the problem's reference time limit.
    pub fn time_multiplier(&self) -> u64 {
        match self {
            Language::Native { .. } => 1,
            Language::Interpreted {
                time_multiplier, ..
            } => *time_multiplier,
        }
    }

    /// System directories the box must expose for this language.
    pub fn sandbox_dirs(&self) -> &[String] {
        match self {
            Language::Native { .. } => &[],
            Language::Interpreted { extra_dirs, .. } => extra_dirs,
        }
    }

    /// `KEY=value` pairs set inside the box.
    pub fn sandbox_env(&self) -> &[String] {
        match self {
            Language::Native { .. } => &[],
            Language::Interpreted { env, .. } => env,
        }
    }

    pub fn needs_compile(&self) -> bool {
        matches!(self, Language::Native { .. })
    }
}

const BUILTIN_LANGUAGES: &str = include_str!("../files/languages.toml");

/// Supported languages keyed by lowercase source extension.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    languages: HashMap<String, Language>,
}

impl LanguageTable {
    /// Load the table embedded at build time.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml(BUILTIN_LANGUAGES)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let languages: HashMap<String, Language> =
            toml::from_str(content).context("invalid language table")?;
        Ok(Self { languages })
    }

    /// Look up the language for a source file by its extension.
    pub fn for_source(&self, path: &Path) -> Option<&Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.languages.get(&ext)
    }

    pub fn get(&self, extension: &str) -> Option<&Language> {
        self.languages.get(&extension.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_loads() {
        let table = LanguageTable::builtin().unwrap();
        assert!(table.get("cpp").is_some());
        assert!(table.get("py").is_some());
        assert!(table.get("rs").is_none());
    }

    #[test]
    fn cpp_is_native_with_fixed_invocation() {
        let table = LanguageTable::builtin().unwrap();
        let cpp = table.get("cpp").unwrap();
        assert!(cpp.needs_compile());
        assert_eq!(cpp.run_command(), "./program");
        assert_eq!(cpp.time_multiplier(), 1);
        assert!(cpp.sandbox_dirs().is_empty());

        let Language::Native { compiler, args, .. } = cpp else {
            panic!("cpp should be native");
        };
        assert_eq!(compiler, &PathBuf::from("/usr/bin/g++"));
        assert_eq!(args, &["-O2", "-std=c++17"]);
    }

    #[test]
    fn python_is_interpreted_with_doubled_limit() {
        let table = LanguageTable::builtin().unwrap();
        let py = table.get("py").unwrap();
        assert!(!py.needs_compile());
        assert_eq!(py.sandbox_filename(), "program.py");
        assert_eq!(py.run_command(), "/usr/bin/python3 program.py");
        assert_eq!(py.time_multiplier(), 2);
        assert!(!py.sandbox_dirs().is_empty());
        assert_eq!(py.sandbox_env(), ["HOME=/tmp"]);
    }

    #[test]
    fn lookup_by_source_path_ignores_case() {
        let table = LanguageTable::builtin().unwrap();
        assert!(table.for_source(Path::new("/tmp/42.cpp")).is_some());
        assert!(table.for_source(Path::new("/tmp/42.PY")).is_some());
        assert!(table.for_source(Path::new("/tmp/42.java")).is_none());
        assert!(table.for_source(Path::new("/tmp/noext")).is_none());
    }

    #[test]
    fn rejects_malformed_table() {
        assert!(LanguageTable::from_toml("[cpp]\nkind = \"unknown\"").is_err());
    }
}
