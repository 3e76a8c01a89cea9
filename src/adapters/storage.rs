use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// What a data folder holds, by input kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataLayout {
    pub geojson: Vec<PathBuf>,
    pub csv: Vec<PathBuf>,
    pub tif: Vec<PathBuf>,
    /// Folders the run writes into that do not exist yet.
    pub missing_dirs: Vec<PathBuf>,
}

/// Inventory the top level of `root` and list the output folders that still need creating.
pub fn check_data_layout(root: &Path, required_dirs: &[&str]) -> Result<DataLayout> {
    let mut layout = DataLayout::default();

    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("geojson") => layout.geojson.push(path),
            Some("csv") => layout.csv.push(path),
            Some("tif") | Some("tiff") => layout.tif.push(path),
            _ => {}
        }
    }

    layout.geojson.sort();
    layout.csv.sort();
    layout.tif.sort();

    layout.missing_dirs = required_dirs
        .iter()
        .map(|dir| root.join(dir))
        .filter(|dir| !dir.is_dir())
        .collect();

    Ok(layout)
}
