use std::path::{Path, PathBuf};

use shuxue_algo::{Catalog, CatalogError};

/// 内置题库：两个主题区域、四个关卡
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
}

pub fn builtin_catalog() -> Result<Catalog, CatalogError> {
    Catalog::from_json(BUILTIN_CATALOG)
}

/// Load the catalog from `path`, or the built-in one when no path is set.
pub async fn load_catalog(path: Option<&Path>) -> Result<Catalog, SeedError> {
    let Some(path) = path else {
        return builtin_catalog().map_err(|source| SeedError::Invalid {
            path: PathBuf::from("<builtin>"),
            source,
        });
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let catalog = Catalog::from_json(&raw).map_err(|source| SeedError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        topics = catalog.topics().len(),
        questions = catalog.questions().len(),
        "catalog loaded"
    );
    Ok(catalog)
}
