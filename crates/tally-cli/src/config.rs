use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tally_catalog::{CatalogRecords, InMemoryCatalog};
use tally_session::SessionConfig;

/// Contents of `tally.toml`: a `[session]` table plus the catalog's
/// `[[methods]]` and `[[accounts]]`.
#[derive(Debug, Default, Deserialize)]
pub struct TallyFile {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(flatten)]
    pub catalog: CatalogRecords,
}

impl TallyFile {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid tally configuration")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn catalog(&self) -> anyhow::Result<InMemoryCatalog> {
        self.catalog
            .clone()
            .into_catalog()
            .context("catalog records are invalid")
    }
}
