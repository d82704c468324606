//! `LanguagesDetection` plumbing provider: maps each changed blob hash to a
//! language name by file extension, falling back to a shebang-line sniff for
//! extension-less scripts (spec §4.1). Unknown extensions resolve to the
//! empty string, which `PlumbingSnapshot::language_for` surfaces as
//! "unknown" to callers.

use std::sync::Arc;

use history_core::ids::Hash;
use history_core::model::ChangeEntry;
use history_core::plumbing::LanguageProvider;
use history_core::types::FxHashMap;

use super::repo::RepoReader;

pub struct ExtensionLanguageProvider<R: RepoReader> {
    repo: Arc<R>,
}

impl<R: RepoReader> ExtensionLanguageProvider<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    fn detect(&self, path: &std::path::Path, blob: Hash) -> String {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if let Some(lang) = language_for_extension(ext) {
                return lang.to_string();
            }
        }
        self.repo
            .blob_bytes(blob)
            .and_then(|bytes| language_from_shebang(&bytes))
            .unwrap_or_default()
    }
}

impl<R: RepoReader> LanguageProvider for ExtensionLanguageProvider<R> {
    fn compute(&mut self, changes: &[ChangeEntry]) -> FxHashMap<Hash, String> {
        let mut out = FxHashMap::default();
        for change in changes {
            let (Some(path), Some(blob)) = (change.current_path(), change.language_key()) else {
                continue;
            };
            out.entry(blob).or_insert_with(|| self.detect(path, blob));
        }
        out
    }
}

fn language_for_extension(ext: &str) -> Option<&'static str> {
    Some(match ext.to_ascii_lowercase().as_str() {
        "rs" => "Rust",
        "go" => "Go",
        "py" | "pyi" => "Python",
        "js" | "mjs" | "cjs" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "jsx" => "JavaScript",
        "java" => "Java",
        "kt" | "kts" => "Kotlin",
        "cs" => "C#",
        "rb" => "Ruby",
        "php" => "PHP",
        "c" | "h" => "C",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "C++",
        "swift" => "Swift",
        "scala" => "Scala",
        "sh" | "bash" => "Shell",
        "md" | "markdown" => "Markdown",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "toml" => "TOML",
        "html" | "htm" => "HTML",
        "css" | "scss" | "sass" => "CSS",
        "sql" => "SQL",
        _ => return None,
    })
}

fn language_from_shebang(bytes: &[u8]) -> Option<String> {
    let first_line = bytes.split(|&b| b == b'\n').next()?;
    let text = std::str::from_utf8(first_line).ok()?;
    if !text.starts_with("#!") {
        return None;
    }
    let interpreter = text.rsplit('/').next().unwrap_or(text);
    let name = interpreter.split_whitespace().next()?;
    Some(match name {
        "python" | "python2" | "python3" => "Python",
        "ruby" => "Ruby",
        "bash" | "sh" | "dash" => "Shell",
        "node" => "JavaScript",
        _ => return None,
    })
    .map(str::to_string)
}
