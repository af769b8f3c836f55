//! 型名パターンによるアダプタの登録と検索
//!
//! 各アダプタは `^<namespace>::<TypeName>(<.*>)?$` のパターンで登録されます。
//! 登録は起動時に一度だけ行い、その後のレジストリは読み取り専用です。
//!
//! 登録の元は2通りあります。カタログ全体を登録する [`Registry::with_catalogue`] と、
//! ディレクトリ内の `<TypeName>_printer.<ext>` ファイルを走査して、カタログに対応が
//! あるものだけを登録する [`Registry::load_directory`] です。

use crate::adapter::AdapterSpec;
use crate::catalogue;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// 登録ファイル名の接尾辞
pub const FILE_SUFFIX: &str = "_printer";

/// 登録時のエラー
#[derive(Debug, Error)]
pub enum LoadError {
    /// ファイル名から型名を取り出せない
    #[error("{file}: {reason}", file = .file.display())]
    Malformed { file: PathBuf, reason: String },

    /// カタログに対応するアダプタがない
    #[error("{file}: no display adapter for '{type_name}'", file = .file.display())]
    MissingEntryPoint { file: PathBuf, type_name: String },

    /// パターンをコンパイルできない
    #[error("invalid pattern for '{type_name}': {source}")]
    Pattern {
        type_name: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// ディレクトリ読み込みの結果
#[derive(Debug, Default)]
pub struct LoadReport {
    /// 登録した型名
    pub registered: Vec<String>,
    /// 読み飛ばしたファイル
    pub skipped: Vec<LoadError>,
}

/// 型名パターンとアダプタの対応
#[derive(Debug, Clone)]
pub struct Binding {
    pub type_name: &'static str,
    pub pattern: Regex,
    pub spec: &'static AdapterSpec,
}

/// 登録パターンを作成する
///
/// # Examples
/// ```
/// use nozoki_core::registry::type_pattern;
///
/// let pattern = type_pattern("original", "treeMap").unwrap();
/// assert!(pattern.is_match("original::treeMap<int, std::string>"));
/// assert!(pattern.is_match("original::treeMap"));
/// assert!(!pattern.is_match("original::treeMapIterator<int>"));
/// ```
pub fn type_pattern(namespace: &str, type_name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        "^{}::{}(<.*>)?$",
        regex::escape(namespace),
        regex::escape(type_name)
    ))
}

/// ファイル名から型名を取り出す
///
/// `_printer` で終わらないファイルは対象外としてNoneを返します。
fn type_name_of(file: &Path) -> Option<Result<String, LoadError>> {
    let stem = file.file_stem()?.to_str()?;
    file.extension()?;
    let type_name = stem.strip_suffix(FILE_SUFFIX)?;

    let malformed = |reason: &str| LoadError::Malformed {
        file: file.to_path_buf(),
        reason: reason.to_string(),
    };

    let is_identifier = type_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    Some(match type_name.chars().next() {
        None => Err(malformed("empty type name")),
        Some(c) if c.is_ascii_digit() => Err(malformed("type name must start with a letter")),
        Some(_) if !is_identifier => Err(malformed("type name is not an identifier")),
        Some(_) => Ok(type_name.to_string()),
    })
}

/// アダプタのレジストリ
#[derive(Debug, Clone)]
pub struct Registry {
    namespace: String,
    bindings: Vec<Binding>,
}

impl Registry {
    /// 空のレジストリを作成する
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            bindings: Vec::new(),
        }
    }

    /// カタログ全体を登録したレジストリを作成する
    pub fn with_catalogue(namespace: impl Into<String>) -> Result<Self, LoadError> {
        let mut registry = Self::new(namespace);
        for type_name in catalogue::type_names() {
            registry.bind(type_name)?;
        }
        Ok(registry)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn is_bound(&self, type_name: &str) -> bool {
        self.bindings.iter().any(|b| b.type_name == type_name)
    }

    /// カタログの型を1つ登録する
    ///
    /// 既に登録済みなら何もしません。
    pub fn bind(&mut self, type_name: &str) -> Result<(), LoadError> {
        let spec = catalogue::find(type_name).ok_or_else(|| LoadError::MissingEntryPoint {
            file: PathBuf::from(type_name),
            type_name: type_name.to_string(),
        })?;
        self.bind_spec(spec)
    }

    fn bind_spec(&mut self, spec: &'static AdapterSpec) -> Result<(), LoadError> {
        if self.is_bound(spec.type_name) {
            debug!(type_name = spec.type_name, "already registered");
            return Ok(());
        }

        let pattern =
            type_pattern(&self.namespace, spec.type_name).map_err(|source| LoadError::Pattern {
                type_name: spec.type_name.to_string(),
                source,
            })?;
        self.bindings.push(Binding {
            type_name: spec.type_name,
            pattern,
            spec,
        });
        Ok(())
    }

    /// ディレクトリ内の登録ファイルを読み込む
    ///
    /// 存在しないディレクトリは警告して読み飛ばします。カタログに対応のないファイルや
    /// 名前が不正なファイルは `skipped` に記録し、残りの登録を続けます。
    pub fn load_directory(&mut self, dir: &Path) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "skipped non-existent directory");
            return Ok(report);
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        for file in files {
            let type_name = match type_name_of(&file) {
                None => continue,
                Some(Ok(name)) => name,
                Some(Err(e)) => {
                    warn!(error = %e, "skipped malformed file");
                    report.skipped.push(e);
                    continue;
                }
            };

            match catalogue::find(&type_name) {
                Some(spec) => {
                    self.bind_spec(spec)?;
                    info!(type_name = %type_name, "registered display adapter");
                    report.registered.push(type_name);
                }
                None => {
                    let e = LoadError::MissingEntryPoint { file, type_name };
                    warn!(error = %e, "skipped file");
                    report.skipped.push(e);
                }
            }
        }

        Ok(report)
    }

    /// 型名に対応するアダプタ仕様を探す
    pub fn lookup(&self, type_name: &str) -> Option<&'static AdapterSpec> {
        self.bindings
            .iter()
            .find(|b| b.pattern.is_match(type_name))
            .map(|b| b.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nozoki-registry-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_lookup_with_catalogue() {
        let registry = Registry::with_catalogue("original").unwrap();
        assert_eq!(
            registry.lookup("original::treeMap<int, int>").map(|s| s.type_name),
            Some("treeMap")
        );
        assert_eq!(
            registry.lookup("original::hashSet<std::string>").map(|s| s.type_name),
            Some("hashSet")
        );
        assert!(registry.lookup("std::map<int, int>").is_none());
        assert!(registry.lookup("original::treeMapNode<int, int>").is_none());
    }

    #[test]
    fn test_namespace_is_escaped() {
        let mut registry = Registry::new("my.lib");
        registry.bind("vector").unwrap();
        assert!(registry.lookup("my.lib::vector<int>").is_some());
        assert!(registry.lookup("myXlib::vector<int>").is_none());
    }

    #[test]
    fn test_bind_unknown_type() {
        let mut registry = Registry::new("original");
        assert!(matches!(
            registry.bind("list"),
            Err(LoadError::MissingEntryPoint { .. })
        ));
        registry.bind("chain").unwrap();
        registry.bind("chain").unwrap();
        assert_eq!(registry.bindings().len(), 1);
    }

    #[test]
    fn test_type_name_of() {
        assert_eq!(
            type_name_of(Path::new("core/treeMap_printer.py")).unwrap().unwrap(),
            "treeMap"
        );
        assert!(type_name_of(Path::new("utils.py")).is_none());
        assert!(type_name_of(Path::new("deque_printerr.py")).is_none());
        assert!(type_name_of(Path::new("treeMap_printer")).is_none());
        assert!(matches!(
            type_name_of(Path::new("_printer.py")),
            Some(Err(LoadError::Malformed { .. }))
        ));
        assert!(matches!(
            type_name_of(Path::new("tree-map_printer.py")),
            Some(Err(LoadError::Malformed { .. }))
        ));
    }

    #[test]
    fn test_load_directory() {
        let dir = scratch_dir("load");
        for name in [
            "treeMap_printer.py",
            "JSet_printer.py",
            "list_printer.py",
            "9lives_printer.py",
            "utils.py",
        ] {
            fs::write(dir.join(name), "").unwrap();
        }

        let mut registry = Registry::new("original");
        let report = registry.load_directory(&dir).unwrap();

        assert_eq!(report.registered, vec!["JSet", "treeMap"]);
        assert_eq!(report.skipped.len(), 2);
        assert!(report
            .skipped
            .iter()
            .any(|e| matches!(e, LoadError::MissingEntryPoint { type_name, .. } if type_name == "list")));
        assert!(registry.lookup("original::JSet<int>").is_some());
        assert!(registry.lookup("original::vector<int>").is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let mut registry = Registry::new("original");
        let report = registry
            .load_directory(Path::new("/nonexistent/nozoki/printers"))
            .unwrap();
        assert!(report.registered.is_empty());
        assert!(registry.bindings().is_empty());
    }
}
