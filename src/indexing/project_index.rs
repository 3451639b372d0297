//! Project-wide index: builds one [`FileIndex`] per discovered file, copying
//! each into a scratch directory first so the legacy-dialect upgrade step
//! never touches the user's original files.
//!
//! Grounded on the teacher's `SimpleIndexer`/`IndexTransaction` two-phase
//! build (copy-then-commit) in `indexing/simple.rs` and `indexing/transaction.rs`,
//! and on the original `pickle_inspector.indexer.index_project`'s use of a
//! `tempfile.TemporaryDirectory` scratch copy plus `lib2to3` upgrade.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::warn;

use crate::ast::loader::{AstLoader, enforce_safe_root};
use crate::cli::args::ScanVerbosity;
use crate::error::{AnalyzerError, Result};
use crate::indexing::file_index::{FileIndex, FunctionRecord};

/// Aggregates every file's [`FileIndex`] plus a short-name -> candidate list
/// lookup used for cross-file resolution in [`crate::resolve`].
pub struct ProjectIndex {
    pub files: HashMap<PathBuf, FileIndex>,
    pub function_map: HashMap<String, Vec<PathBuf>>,
}

/// What to do when a single file fails to discover, read, or parse.
pub enum ErrorPolicy {
    /// Abort the whole scan (the CLI default).
    Fatal,
    /// Print a notice and continue with the remaining files (`--skip-errors`).
    Skip,
}

fn detect_py2_print(source: &str) -> bool {
    source.lines().any(|line| {
        let t = line.trim_start();
        t.starts_with("print ") && !t.starts_with("print(")
    })
}

fn upgrade_legacy_dialect(scratch_path: &Path) -> Result<()> {
    let python3 = which_python3().ok_or_else(|| AnalyzerError::UpgradeFailure {
        path: scratch_path.to_path_buf(),
        reason: "python3 not found on PATH".into(),
    })?;
    let output = Command::new(python3)
        .args(["-m", "lib2to3", "-w", "-n"])
        .arg(scratch_path)
        .output()
        .map_err(|e| AnalyzerError::UpgradeFailure {
            path: scratch_path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(AnalyzerError::UpgradeFailure {
            path: scratch_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

fn which_python3() -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join("python3"))
        .find(|p| p.is_file())
}

/// Build the project index for `files`, all of which must already lie under
/// `root` (enforced per-file by [`enforce_safe_root`] before any read).
pub fn build_project_index(
    files: &[PathBuf],
    root: &Path,
    py2_support: bool,
    error_policy: ErrorPolicy,
    verbosity: ScanVerbosity,
) -> Result<ProjectIndex> {
    let mut loader = AstLoader::new()?;
    let scratch = tempfile::tempdir().map_err(|source| AnalyzerError::IoError {
        path: std::env::temp_dir(),
        source,
    })?;

    let mut index = ProjectIndex {
        files: HashMap::new(),
        function_map: HashMap::new(),
    };

    for original_path in files {
        match index_one_file(
            &mut loader,
            original_path,
            root,
            scratch.path(),
            py2_support,
            verbosity,
        ) {
            Ok(Some(file_index)) => {
                for name in file_index.functions.keys() {
                    index
                        .function_map
                        .entry(name.clone())
                        .or_default()
                        .push(original_path.clone());
                }
                index.files.insert(original_path.clone(), file_index);
            }
            Ok(None) => {
                // Legacy dialect detected without --py2-support: already warned.
            }
            Err(e) => match error_policy {
                ErrorPolicy::Skip => {
                    if !matches!(verbosity, ScanVerbosity::Quiet) {
                        eprintln!("[!] Skipped {}: {e}", original_path.display());
                    }
                }
                ErrorPolicy::Fatal => return Err(e),
            },
        }
    }

    Ok(index)
}

fn index_one_file(
    loader: &mut AstLoader,
    original_path: &Path,
    root: &Path,
    scratch_dir: &Path,
    py2_support: bool,
    verbosity: ScanVerbosity,
) -> Result<Option<FileIndex>> {
    enforce_safe_root(original_path, root)?;

    let bytes = std::fs::read(original_path).map_err(|source| AnalyzerError::IoError {
        path: original_path.to_path_buf(),
        source,
    })?;
    let code = String::from_utf8_lossy(&bytes).into_owned();

    let file_name = original_path
        .file_name()
        .ok_or_else(|| AnalyzerError::ParseFailure {
            path: original_path.to_path_buf(),
            reason: "path has no file name".into(),
        })?;
    let scratch_path = scratch_dir.join(file_name);
    std::fs::write(&scratch_path, &code).map_err(|source| AnalyzerError::IoError {
        path: scratch_path.clone(),
        source,
    })?;

    if detect_py2_print(&code) {
        if !py2_support {
            if !matches!(verbosity, ScanVerbosity::Quiet) {
                eprintln!(
                    "[!] Python 2 syntax detected in {}. Use --py2-support to scan it.",
                    original_path.display()
                );
            }
            return Ok(None);
        }
        upgrade_legacy_dialect(&scratch_path)?;
    }

    let upgraded = std::fs::read_to_string(&scratch_path).map_err(|source| AnalyzerError::IoError {
        path: scratch_path.clone(),
        source,
    })?;

    // Parse the (possibly upgraded) scratch copy, but report under the
    // original path so findings point back at the user's real file.
    let loaded = match loader.load_source(original_path, upgraded) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(target: "ast_loader", file = %original_path.display(), "{e}");
            return Err(e);
        }
    };

    Ok(Some(FileIndex::build(
        original_path.to_path_buf(),
        loaded.source,
        loaded.body,
    )))
}

impl ProjectIndex {
    /// All candidate [`FunctionRecord`]s for a bare short name, across every
    /// file, in discovery order.
    pub fn functions_named<'a>(&'a self, name: &str) -> Vec<&'a FunctionRecord> {
        self.function_map
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|path| self.files.get(path))
            .filter_map(|fi| fi.functions.get(name))
            .collect()
    }

    /// The file whose path ends with `module_path` (dots replaced with `/`,
    /// plus `.py`), mirroring the original resolver's suffix match against
    /// `f"{module_name.replace('.', '/')}.py"`.
    pub fn file_for_module<'a>(&'a self, module: &str) -> Option<&'a FileIndex> {
        let suffix = format!("{}.py", module.replace('.', "/"));
        self.files
            .values()
            .find(|fi| fi.path.to_string_lossy().ends_with(suffix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_py2_print_statement() {
        assert!(detect_py2_print("print \"hello\"\n"));
        assert!(!detect_py2_print("print(\"hello\")\n"));
    }
}
