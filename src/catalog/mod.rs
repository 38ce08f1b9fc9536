//! Furniture asset catalog
//!
//! Loads OBJ meshes for the furniture the palette offers and keeps
//! them as CPU-side geometry templates. Instancing a piece of
//! furniture clones a template's geometry into the scene.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::gfx::geometry::{vertex_normals, GeometryData};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load model '{key}' from {}: {source}", .path.display())]
    Load {
        key: String,
        path: PathBuf,
        source: tobj::LoadError,
    },
}

/// One entry in the catalog manifest: a stable key, the OBJ path, and
/// the scale the model is placed with by default.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub key: String,
    pub path: PathBuf,
    pub default_scale: f32,
}

impl CatalogEntry {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
            default_scale: 1.0,
        }
    }
}

/// Loaded template: the mesh geometry for one furniture type.
pub struct FurnitureTemplate {
    pub key: String,
    pub meshes: Vec<GeometryData>,
    pub default_scale: f32,
}

/// All loaded furniture templates, keyed by catalog key.
pub struct AssetCatalog {
    templates: HashMap<String, FurnitureTemplate>,
}

impl AssetCatalog {
    /// A catalog with no templates. Placement is unavailable until a
    /// real catalog is loaded.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Builds a catalog from already-loaded templates, bypassing disk.
    pub fn from_templates(templates: Vec<FurnitureTemplate>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|t| (t.key.clone(), t))
                .collect(),
        }
    }

    /// Loads every entry, failing on the first error. A partially
    /// loaded palette would silently offer furniture that cannot be
    /// placed, so loading is all-or-nothing.
    pub fn load(entries: &[CatalogEntry]) -> Result<Self, CatalogError> {
        let mut templates = HashMap::new();

        for entry in entries {
            let meshes = load_obj_geometry(&entry.path).map_err(|source| CatalogError::Load {
                key: entry.key.clone(),
                path: entry.path.clone(),
                source,
            })?;

            log::debug!(
                "loaded '{}' ({} meshes) from {}",
                entry.key,
                meshes.len(),
                entry.path.display()
            );

            templates.insert(
                entry.key.clone(),
                FurnitureTemplate {
                    key: entry.key.clone(),
                    meshes,
                    default_scale: entry.default_scale,
                },
            );
        }

        Ok(Self { templates })
    }

    pub fn get(&self, key: &str) -> Option<&FurnitureTemplate> {
        self.templates.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    pub fn default_scale(&self, key: &str) -> f32 {
        self.templates
            .get(key)
            .map(|t| t.default_scale)
            .unwrap_or(1.0)
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Catalog keys in sorted order, for a stable palette layout.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

fn load_obj_geometry(path: &Path) -> Result<Vec<GeometryData>, tobj::LoadError> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let mut geometries = Vec::with_capacity(models.len());
    for model in &models {
        let mesh = &model.mesh;

        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            vertex_normals(&positions, &mesh.indices)
                .into_iter()
                .flatten()
                .collect()
        };

        geometries.push(GeometryData::from_flat(
            &mesh.positions,
            &normals,
            mesh.indices.clone(),
        ));
    }

    Ok(geometries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 0.0 -1.0
f 1 2 3
";

    fn write_obj(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hearth-catalog-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_single_entry() {
        let dir = temp_dir("single");
        let path = write_obj(&dir, "sofa.obj", TRIANGLE_OBJ);

        let catalog = AssetCatalog::load(&[CatalogEntry::new("sofa", path)]).unwrap();
        let template = catalog.get("sofa").unwrap();
        assert_eq!(template.meshes.len(), 1);
        assert_eq!(template.meshes[0].vertices.len(), 3);
        // Normals computed since the OBJ carries none
        assert_eq!(template.meshes[0].normals.len(), 3);
    }

    #[test]
    fn test_missing_file_fails_whole_load() {
        let dir = temp_dir("missing");
        let good = write_obj(&dir, "bed.obj", TRIANGLE_OBJ);

        let entries = vec![
            CatalogEntry::new("bed", good),
            CatalogEntry::new("ghost", dir.join("ghost.obj")),
        ];

        let result = AssetCatalog::load(&entries);
        assert!(result.is_err());
        match result {
            Err(CatalogError::Load { key, .. }) => assert_eq!(key, "ghost"),
            Ok(_) => unreachable!(),
        }
    }

    #[test]
    fn test_keys_sorted() {
        let dir = temp_dir("keys");
        let a = write_obj(&dir, "a.obj", TRIANGLE_OBJ);
        let b = write_obj(&dir, "b.obj", TRIANGLE_OBJ);

        let catalog = AssetCatalog::load(&[
            CatalogEntry::new("wardrobe1", b),
            CatalogEntry::new("bed", a),
        ])
        .unwrap();

        assert_eq!(catalog.keys(), vec!["bed", "wardrobe1"]);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = AssetCatalog::empty();
        assert!(catalog.is_empty());
        assert!(!catalog.contains_key("sofa"));
        assert_eq!(catalog.default_scale("sofa"), 1.0);
    }
}
