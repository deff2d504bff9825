//! Source graph resolution: loading files, following imports, and
//! deduplicating sources already compiled in this run.

use crate::compiler::frontend::{ast::SyntaxTree, parse_source};
use crate::compiler::middle_end::walker::AstWalker;
use crate::error::{CompilerError, Result};
use crate::types::{RouteTable, TERA_EXTENSION};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Canonical paths already compiled during one compilation run
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    paths: HashSet<PathBuf>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path`; returns false if it was already present
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Counters collected while resolving one entrypoint
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    pub files_parsed: usize,
    pub imports_skipped: usize,
    pub source_bytes: u64,
}

/// Resolves an entrypoint and everything it imports into one route table.
///
/// One instance covers exactly one compilation; its `VisitedSet` is never
/// shared between runs.
#[derive(Debug)]
pub struct SourceGraph {
    visited: VisitedSet,
    stats: ResolveStats,
    import_extension: String,
    trace_trees: bool,
}

impl Default for SourceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceGraph {
    pub fn new() -> Self {
        Self {
            visited: VisitedSet::new(),
            stats: ResolveStats::default(),
            import_extension: TERA_EXTENSION.to_string(),
            trace_trees: false,
        }
    }

    pub fn with_options(options: &crate::CompilerOptions) -> Self {
        Self {
            import_extension: options.import_extension.clone(),
            trace_trees: options.debug_mode,
            ..Self::new()
        }
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    /// Compile the file at `entry` and all of its imports
    pub fn resolve(&mut self, entry: impl AsRef<Path>) -> Result<RouteTable> {
        let mut table = RouteTable::new();
        self.compile_file(entry.as_ref(), &mut table)?;
        Ok(table)
    }

    /// Compile in-memory source as if it lived at `path`. Imports resolve
    /// relative to `path`'s directory.
    pub fn resolve_source(&mut self, path: impl AsRef<Path>, source: &str) -> Result<RouteTable> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| absolute(path));
        self.visited.insert(canonical.clone());

        let mut table = RouteTable::new();
        self.compile_tree(&canonical, parse_source(source, &display)?, source.len(), &mut table)?;
        Ok(table)
    }

    fn compile_file(&mut self, path: &Path, table: &mut RouteTable) -> Result<()> {
        let canonical = fs::canonicalize(path).map_err(|e| CompilerError::io(path, e))?;
        self.visited.insert(canonical.clone());

        log::info!("Parsing file: {}", path.display());
        let source = fs::read_to_string(&canonical).map_err(|e| CompilerError::io(path, e))?;
        let tree = parse_source(&source, &path.display().to_string())?;

        self.compile_tree(&canonical, tree, source.len(), table)
    }

    fn compile_tree(
        &mut self,
        canonical: &Path,
        tree: SyntaxTree,
        source_len: usize,
        table: &mut RouteTable,
    ) -> Result<()> {
        self.stats.files_parsed += 1;
        self.stats.source_bytes += source_len as u64;
        if self.trace_trees {
            log::trace!("{}: {}", tree.file(), tree.to_sexp());
        }

        AstWalker::new(self, canonical).walk(&tree, tree.root(), table)
    }

    /// Follow an `import` found in `importer`. Files already visited in this
    /// run are skipped; anything else is compiled and its routes appended to
    /// `table` at the current position.
    pub(crate) fn import(
        &mut self,
        importer: &Path,
        import_path: &str,
        table: &mut RouteTable,
    ) -> Result<()> {
        let target = self.import_target(importer, import_path);
        let canonical = fs::canonicalize(&target).map_err(|e| CompilerError::io(&target, e))?;

        if self.visited.contains(&canonical) {
            log::warn!("Already parsed: {}", target.display());
            self.stats.imports_skipped += 1;
            return Ok(());
        }

        log::debug!("Importing {} from {}", import_path, importer.display());
        self.compile_file(&target, table)
    }

    /// Resolve `import_path` against the importing file's directory, adding
    /// the default extension when the path has none
    fn import_target(&self, importer: &Path, import_path: &str) -> PathBuf {
        let base_dir = importer.parent().unwrap_or(Path::new(""));
        let mut target = base_dir.join(import_path);
        if target.extension().is_none() && !self.import_extension.is_empty() {
            target.set_extension(&self.import_extension);
        }
        target
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn paths(table: &RouteTable) -> Vec<&str> {
        table.iter().map(|r| r.path()).collect()
    }

    #[test]
    fn test_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let main = create_test_file(
            &temp_dir,
            "main.tera",
            "route \"/a\" GET { text: \"a\" }\nroute \"/b\" POST { status: 201 }",
        );

        let mut graph = SourceGraph::new();
        let table = graph.resolve(&main).unwrap();
        assert_eq!(paths(&table), vec!["/a", "/b"]);
        assert_eq!(graph.stats().files_parsed, 1);
        assert_eq!(graph.visited().len(), 1);
    }

    #[test]
    fn test_import_merges_in_declaration_order() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "lib/users.tera", "route \"/users\" GET { json: { n: 1 } }");
        let main = create_test_file(
            &temp_dir,
            "main.tera",
            "route \"/before\" GET { text: \"b\" }\nimport \"lib/users.tera\"\nroute \"/after\" GET { text: \"a\" }",
        );

        let table = SourceGraph::new().resolve(&main).unwrap();
        assert_eq!(paths(&table), vec!["/before", "/users", "/after"]);
    }

    #[test]
    fn test_import_is_relative_to_importing_file() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "api/v1/items.tera", "route \"/items\" GET { text: \"i\" }");
        create_test_file(&temp_dir, "api/index.tera", "import \"v1/items.tera\"");
        let main = create_test_file(&temp_dir, "main.tera", "import \"api/index.tera\"");

        let table = SourceGraph::new().resolve(&main).unwrap();
        assert_eq!(paths(&table), vec!["/items"]);
    }

    #[test]
    fn test_import_without_extension() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "shared.tera", "route \"/shared\" GET { text: \"s\" }");
        let main = create_test_file(&temp_dir, "main.tera", "import \"shared\"");

        let table = SourceGraph::new().resolve(&main).unwrap();
        assert_eq!(paths(&table), vec!["/shared"]);
    }

    #[test]
    fn test_duplicate_import_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "shared.tera", "route \"/shared\" GET { text: \"s\" }");
        let once = create_test_file(&temp_dir, "once.tera", "import \"shared.tera\"");
        let twice = create_test_file(
            &temp_dir,
            "twice.tera",
            "import \"shared.tera\"\nimport \"./shared.tera\"",
        );

        let table_once = SourceGraph::new().resolve(&once).unwrap();
        let mut graph = SourceGraph::new();
        let table_twice = graph.resolve(&twice).unwrap();

        assert_eq!(table_once, table_twice);
        assert_eq!(graph.stats().imports_skipped, 1);
    }

    #[test]
    fn test_self_import_terminates() {
        let temp_dir = TempDir::new().unwrap();
        let main = create_test_file(
            &temp_dir,
            "main.tera",
            "import \"main.tera\"\nroute \"/self\" GET { text: \"s\" }",
        );

        let table = SourceGraph::new().resolve(&main).unwrap();
        assert_eq!(paths(&table), vec!["/self"]);
    }

    #[test]
    fn test_import_cycle_terminates() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "b.tera", "import \"a.tera\"\nroute \"/b\" GET {}");
        let a = create_test_file(&temp_dir, "a.tera", "import \"b.tera\"\nroute \"/a\" GET {}");

        let table = SourceGraph::new().resolve(&a).unwrap();
        assert_eq!(paths(&table), vec!["/b", "/a"]);
    }

    #[test]
    fn test_missing_import_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let main = create_test_file(
            &temp_dir,
            "main.tera",
            "route \"/a\" GET {}\nimport \"missing.tera\"",
        );

        match SourceGraph::new().resolve(&main).unwrap_err() {
            CompilerError::Io { path, .. } => assert!(path.ends_with("missing.tera")),
            other => panic!("Expected IO error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_in_import_reports_imported_file() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "bad.tera", "route \"/bad\" GET {\n  nope: 1\n}");
        let main = create_test_file(&temp_dir, "main.tera", "import \"bad.tera\"");

        match SourceGraph::new().resolve(&main).unwrap_err() {
            CompilerError::UnknownRouteKey { file, line, key } => {
                assert!(file.ends_with("bad.tera"));
                assert_eq!(line, 2);
                assert_eq!(key, "nope");
            }
            other => panic!("Expected unknown key error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_source_imports_relative_to_virtual_path() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "shared.tera", "route \"/shared\" GET {}");

        let table = SourceGraph::new()
            .resolve_source(
                temp_dir.path().join("virtual.tera"),
                "import \"shared.tera\"\nroute \"/own\" GET {}",
            )
            .unwrap();
        assert_eq!(paths(&table), vec!["/shared", "/own"]);
    }

    #[test]
    fn test_visited_set() {
        let mut visited = VisitedSet::new();
        assert!(visited.is_empty());
        assert!(visited.insert(PathBuf::from("/a.tera")));
        assert!(!visited.insert(PathBuf::from("/a.tera")));
        assert!(visited.contains(Path::new("/a.tera")));
        assert_eq!(visited.len(), 1);
    }
}
