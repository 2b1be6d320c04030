use crate::config::toml_config::TomlConfig;
use crate::core::catalog::{AnodeCatalog, AnodeFilter};
use crate::domain::model::Anode;
use crate::domain::ports::{CatalogSource, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}

/// Anode catalog stored as a JSON file.
pub struct FileCatalog<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> FileCatalog<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }
}

impl FileCatalog<LocalStorage> {
    /// Relative paths resolve against the working directory.
    pub fn local(path: impl Into<String>) -> Self {
        Self::new(LocalStorage::new(".".to_string()), path)
    }
}

#[async_trait]
impl<S: Storage> CatalogSource for FileCatalog<S> {
    async fn load_anodes(&self) -> Result<Vec<Anode>> {
        let bytes = self.storage.read_file(&self.path).await?;
        let catalog = AnodeCatalog::from_json(&bytes)?;
        tracing::debug!("Loaded {} anodes from {}", catalog.len(), self.path);
        Ok(catalog.into_anodes())
    }
}

/// Loads the catalog from the configured file, or from Supabase when no
/// file is set. Without either the catalog is empty and only quotes
/// without anodes can be priced.
pub async fn load_catalog(config: &TomlConfig) -> Result<AnodeCatalog> {
    let anodes = if let Some(path) = config.catalog_path() {
        FileCatalog::local(path).load_anodes().await?
    } else if config.supabase.is_some() {
        config.supabase_client()?.load_anodes().await?
    } else {
        tracing::warn!("No anode catalog configured");
        Vec::new()
    };
    Ok(AnodeCatalog::new(anodes))
}

/// Writes the filtered listing as CSV through `storage`. Returns the row count.
pub async fn export_csv<S: Storage>(
    storage: &S,
    path: &str,
    catalog: &AnodeCatalog,
    filter: &AnodeFilter,
) -> Result<usize> {
    let mut buffer = Vec::new();
    let count = catalog.write_csv(filter, &mut buffer)?;
    storage.write_file(path, &buffer).await?;
    tracing::info!("Exported {} anodes to {}", count, path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());

        storage.write_file("exports/anodes.csv", b"id\n").await.unwrap();
        let data = storage.read_file("exports/anodes.csv").await.unwrap();
        assert_eq!(data, b"id\n");
    }

    #[tokio::test]
    async fn test_file_catalog_reads_wrapped_json() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());
        storage
            .write_file(
                "anodes.json",
                br#"{"anodes": [{"boatzincs_id": "CMX-1", "sku": "CMX-1", "name": "Collar", "list_price": "$12.50", "category": "shaft_anodes"}]}"#,
            )
            .await
            .unwrap();

        let anodes = FileCatalog::new(storage, "anodes.json").load_anodes().await.unwrap();
        assert_eq!(anodes.len(), 1);
        assert_eq!(anodes[0].id, "CMX-1");
    }

    #[tokio::test]
    async fn test_export_csv_writes_through_storage() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());
        let catalog = AnodeCatalog::from_json(
            br#"[
                {"boatzincs_id": "CMX-1", "name": "Shaft Anode 1\"", "list_price": 12.5, "category": "shaft_anodes"},
                {"boatzincs_id": "HULL-6", "name": "Hull Plate", "list_price": 41, "category": "hull_anodes"}
            ]"#,
        )
        .unwrap();
        let filter = AnodeFilter {
            category: Some("hull".to_string()),
            ..Default::default()
        };

        let count = export_csv(&storage, "exports/hull.csv", &catalog, &filter)
            .await
            .unwrap();

        assert_eq!(count, 1);
        let bytes = storage.read_file("exports/hull.csv").await.unwrap();
        let written = String::from_utf8(bytes).unwrap();
        assert!(written.starts_with("id,sku,name"));
        assert!(written.contains("HULL-6"));
        assert!(!written.contains("CMX-1"));
    }

    #[tokio::test]
    async fn test_missing_catalog_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().to_string());
        let result = FileCatalog::new(storage, "missing.json").load_anodes().await;
        assert!(matches!(result, Err(crate::utils::error::QuoteError::IoError(_))));
    }
}
