// Directory provider source
//
// providers/
//   00-std/provider.yaml      { name: "Vigil Standard Provider", kind: std }
//   10-edge/provider.yaml     { name: "Edge checks", kind: std }

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use vigil_core::port::{LoadError, Provider, ProviderSource};

pub const MANIFEST_FILE: &str = "provider.yaml";

/// Parsed `provider.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderManifest {
    pub name: String,
    pub kind: String,
}

type CatalogFactory = Arc<dyn Fn(&ProviderManifest) -> Box<dyn Provider> + Send + Sync>;

/// Compiled-in provider implementations, addressable by kind
#[derive(Clone, Default)]
pub struct ProviderCatalog {
    factories: BTreeMap<String, CatalogFactory>,
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a provider implementation under `kind`
    pub fn with_kind<F, P>(mut self, kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ProviderManifest) -> P + Send + Sync + 'static,
        P: Provider + 'static,
    {
        self.factories.insert(
            kind.into(),
            Arc::new(move |manifest: &ProviderManifest| {
                Box::new(factory(manifest)) as Box<dyn Provider>
            }),
        );
        self
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn build(&self, manifest: &ProviderManifest) -> Option<Box<dyn Provider>> {
        self.factories.get(&manifest.kind).map(|factory| factory(manifest))
    }
}

impl fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCatalog")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Providers declared by subdirectories of `root`, loaded in name order
#[derive(Debug, Clone)]
pub struct DirectoryProviderSource {
    root: PathBuf,
    catalog: ProviderCatalog,
}

impl DirectoryProviderSource {
    pub fn new(root: impl Into<PathBuf>, catalog: ProviderCatalog) -> Self {
        Self {
            root: root.into(),
            catalog,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Provider directories, sorted by name; plain files are skipped
    fn provider_dirs(&self) -> Result<Vec<PathBuf>, LoadError> {
        let discovery = |reason: String| LoadError::Discovery {
            location: self.root.display().to_string(),
            reason,
        };

        let entries = std::fs::read_dir(&self.root).map_err(|e| discovery(e.to_string()))?;
        let mut dirs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| discovery(e.to_string()))?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn materialize(&self, dir: &Path) -> Result<Box<dyn Provider>, LoadError> {
        let manifest = read_manifest(dir)?;
        debug!(
            path = %dir.display(),
            name = %manifest.name,
            kind = %manifest.kind,
            "Provider manifest read"
        );

        self.catalog
            .build(&manifest)
            .ok_or_else(|| LoadError::Materialize {
                location: dir.display().to_string(),
                reason: format!(
                    "unknown provider kind {:?} (available: {})",
                    manifest.kind,
                    self.catalog.kinds().join(", ")
                ),
            })
    }
}

impl ProviderSource for DirectoryProviderSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn discover(&self) -> Result<Vec<Box<dyn Provider>>, LoadError> {
        let dirs = self.provider_dirs()?;
        info!(root = %self.root.display(), candidates = dirs.len(), "Scanning providers");

        dirs.iter().map(|dir| self.materialize(dir)).collect()
    }
}

/// Read and check `<dir>/provider.yaml`
pub fn read_manifest(dir: &Path) -> Result<ProviderManifest, LoadError> {
    let path = dir.join(MANIFEST_FILE);
    let location = dir.display().to_string();
    let materialize = |reason: String| LoadError::Materialize {
        location: location.clone(),
        reason,
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| materialize(format!("{}: {e}", path.display())))?;
    let document: Value = serde_yaml::from_str(&contents)
        .map_err(|e| materialize(format!("{}: {e}", path.display())))?;
    let Value::Mapping(fields) = document else {
        return Err(materialize(format!("{} must be a mapping", path.display())));
    };

    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => {
            return Err(LoadError::InvalidName {
                location: location.clone(),
            })
        }
    };

    let kind = match fields.get("kind") {
        Some(Value::String(kind)) => kind.clone(),
        None => {
            return Err(LoadError::InvalidShape {
                location: location.clone(),
                reason: "manifest does not declare a kind".to_string(),
            })
        }
        Some(_) => {
            return Err(LoadError::InvalidShape {
                location: location.clone(),
                reason: "kind must be a string".to_string(),
            })
        }
    };

    Ok(ProviderManifest { name, kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::port::{ProviderError, SetupContext, ShutdownContext};

    struct NamedProvider(String);

    impl Provider for NamedProvider {
        fn name(&self) -> &str {
            &self.0
        }

        fn setup(&self, _ctx: &mut SetupContext<'_>) -> Result<(), ProviderError> {
            Ok(())
        }

        fn shutdown(&self, _ctx: &ShutdownContext<'_>) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    fn catalog() -> ProviderCatalog {
        ProviderCatalog::new().with_kind("std", |m: &ProviderManifest| {
            NamedProvider(m.name.clone())
        })
    }

    fn write_provider(root: &Path, dir: &str, manifest: &str) {
        let dir = root.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
    }

    #[test]
    fn test_discovers_in_name_order() {
        let root = tempfile::tempdir().unwrap();
        write_provider(root.path(), "20-second", "name: second\nkind: std\n");
        write_provider(root.path(), "10-first", "name: first\nkind: std\n");
        std::fs::write(root.path().join("README"), "ignored").unwrap();

        let source = DirectoryProviderSource::new(root.path(), catalog());
        let names: Vec<String> = source
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();

        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let source = DirectoryProviderSource::new(root.path().join("nope"), catalog());
        assert!(matches!(
            source.discover().err().unwrap(),
            LoadError::Discovery { .. }
        ));
    }

    #[test]
    fn test_missing_manifest() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("empty")).unwrap();

        let source = DirectoryProviderSource::new(root.path(), catalog());
        assert!(matches!(
            source.discover().err().unwrap(),
            LoadError::Materialize { .. }
        ));
    }

    #[test]
    fn test_name_must_be_string() {
        let root = tempfile::tempdir().unwrap();
        write_provider(root.path(), "p", "name: [not, a, string]\nkind: std\n");

        let err = read_manifest(&root.path().join("p")).unwrap_err();
        assert!(matches!(err, LoadError::InvalidName { .. }));

        write_provider(root.path(), "q", "kind: std\n");
        let err = read_manifest(&root.path().join("q")).unwrap_err();
        assert!(matches!(err, LoadError::InvalidName { .. }));
    }

    #[test]
    fn test_kind_shape() {
        let root = tempfile::tempdir().unwrap();
        write_provider(root.path(), "p", "name: p\nkind: 7\n");
        assert!(matches!(
            read_manifest(&root.path().join("p")).unwrap_err(),
            LoadError::InvalidShape { .. }
        ));

        write_provider(root.path(), "q", "name: q\n");
        assert!(matches!(
            read_manifest(&root.path().join("q")).unwrap_err(),
            LoadError::InvalidShape { .. }
        ));
    }

    #[test]
    fn test_unknown_kind_aborts_discovery() {
        let root = tempfile::tempdir().unwrap();
        write_provider(root.path(), "a", "name: a\nkind: std\n");
        write_provider(root.path(), "b", "name: b\nkind: lua\n");

        let source = DirectoryProviderSource::new(root.path(), catalog());
        let err = source.discover().err().unwrap();
        assert!(err.to_string().contains("unknown provider kind \"lua\""));
    }

    #[test]
    fn test_unparseable_manifest() {
        let root = tempfile::tempdir().unwrap();
        write_provider(root.path(), "p", "name: [unterminated\n");
        assert!(matches!(
            read_manifest(&root.path().join("p")).unwrap_err(),
            LoadError::Materialize { .. }
        ));
    }
}
