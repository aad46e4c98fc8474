use std::path::{Path, PathBuf};
use uiml_evaluator::{ImportError, ImportResolver, ResolvedSource};

/// Filesystem import resolver: import paths resolve relative to the
/// importing file's directory.
pub struct FsResolver;

impl ImportResolver for FsResolver {
    fn resolve(&self, import_path: &str, from_path: &str) -> Result<ResolvedSource, ImportError> {
        let base = Path::new(from_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let candidate = base.join(import_path);

        let canonical = candidate
            .canonicalize()
            .map_err(|_| ImportError::NotFound(import_path.to_string()))?;

        let source = std::fs::read_to_string(&canonical).map_err(|e| ImportError::Unreadable {
            path: canonical.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(ResolvedSource {
            path: canonical.display().to_string(),
            source,
        })
    }
}
