//! Variable scopes and cross-file import resolution.
//!
//! The core has no knowledge of project layout: file lookup goes through the
//! [`ImportResolver`] interface the host provides. A [`ResolveSession`]
//! memoizes by resolved path so one resolution pass parses each distinct file
//! at most once, however deep or repetitive the import graph is.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};
use uiml_parser::{parse_partial, StyleDefinition, UIDocument};

/// Resolves an import path, relative to the importing file, to a canonical
/// path plus source text. Implemented by the host (filesystem, VFS, ...).
pub trait ImportResolver {
    fn resolve(&self, import_path: &str, from_path: &str) -> Result<ResolvedSource, ImportError>;
}

pub struct ResolvedSource {
    pub path: String,
    pub source: String,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("import not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {message}")]
    Unreadable { path: String, message: String },
}

/// A document indexed for reference lookup: local styles by name, import
/// aliases by name.
pub struct VariableScope {
    pub path: String,
    pub document: UIDocument,
}

impl VariableScope {
    pub fn new(document: UIDocument, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            document,
        }
    }

    pub fn style(&self, name: &str) -> Option<&StyleDefinition> {
        self.document.styles.get(name)
    }

    pub fn import_path(&self, alias: &str) -> Option<&str> {
        self.document.imports.get(alias).map(|s| s.as_str())
    }
}

/// One resolution pass. Caches both the route (importing file + import path →
/// canonical path) and the parsed, scoped document per canonical path, so
/// repeated references and diamond-shaped import graphs cost one parse per
/// file. This cache is the only state that outlives a single evaluate call.
pub struct ResolveSession<'r> {
    resolver: &'r dyn ImportResolver,
    routes: RefCell<HashMap<(String, String), Option<String>>>,
    documents: RefCell<HashMap<String, Rc<VariableScope>>>,
}

impl<'r> ResolveSession<'r> {
    pub fn new(resolver: &'r dyn ImportResolver) -> Self {
        Self {
            resolver,
            routes: RefCell::new(HashMap::new()),
            documents: RefCell::new(HashMap::new()),
        }
    }

    /// Pre-seed a document under its own path, so import cycles back to the
    /// entry file reuse it instead of re-parsing.
    pub fn preload(&self, scope: Rc<VariableScope>) {
        self.documents
            .borrow_mut()
            .insert(scope.path.clone(), scope);
    }

    /// Locate, parse and scope the document behind an import. Returns `None`
    /// (after logging) when the resolver fails; the caller falls back to the
    /// unresolved value.
    pub fn load(&self, import_path: &str, from_path: &str) -> Option<Rc<VariableScope>> {
        let route_key = (from_path.to_string(), import_path.to_string());
        if let Some(cached) = self.routes.borrow().get(&route_key) {
            return match cached {
                Some(path) => self.documents.borrow().get(path).cloned(),
                None => None,
            };
        }

        let resolved = match self.resolver.resolve(import_path, from_path) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(import = import_path, from = from_path, error = %e, "import resolution failed");
                self.routes.borrow_mut().insert(route_key, None);
                return None;
            }
        };

        self.routes
            .borrow_mut()
            .insert(route_key, Some(resolved.path.clone()));

        if let Some(existing) = self.documents.borrow().get(&resolved.path) {
            return Some(existing.clone());
        }

        debug!(path = %resolved.path, "parsing imported document");
        let (document, errors) = parse_partial(&resolved.source, &resolved.path);
        if !errors.is_empty() {
            warn!(
                path = %resolved.path,
                count = errors.len(),
                "imported document has parse errors; resolving best-effort"
            );
        }
        let scope = Rc::new(VariableScope::new(document, resolved.path.clone()));
        self.documents
            .borrow_mut()
            .insert(resolved.path, scope.clone());
        Some(scope)
    }
}
