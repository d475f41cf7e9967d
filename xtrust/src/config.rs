//! TOML configuration for the `evaluate` subcommand.
//!
//! ```toml
//! [names]
//! alt_name_types = ["dns", "uri"]
//!
//! [options]
//! max_chain_depth = 16
//!
//! [[candidate]]
//! anchors = ["root1-ca.crt"]
//! crls = ["inter1A1-v1.crl"]
//! max_depth = 4
//! trusted_names = ["foo.example.org"]
//! entity_ids = ["https://idp.example.org"]
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use xtrust_lib::{
    NameEvaluatorConfig, StaticResolver, ValidationCandidate, ValidationInformation,
    ValidationOptions,
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TrustConfig {
    #[serde(default)]
    pub names: NameEvaluatorConfig,
    #[serde(default)]
    pub options: ValidationOptions,
    #[serde(default, rename = "candidate")]
    pub candidates: Vec<CandidateConfig>,
    /// Directory that relative paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CandidateConfig {
    pub anchors: Vec<PathBuf>,
    #[serde(default)]
    pub crls: Vec<PathBuf>,
    pub max_depth: Option<u32>,
    pub trusted_names: Option<Vec<String>>,
    /// Restrict the candidate to these entity ids. Served to every lookup
    /// when absent.
    pub entity_ids: Option<Vec<String>>,
}

impl TrustConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&text, base_dir)
            .with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn parse(text: &str, base_dir: PathBuf) -> Result<Self> {
        let mut config: TrustConfig = toml::from_str(text)?;
        config.base_dir = base_dir;
        Ok(config)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Read every referenced anchor and CRL and build the resolver.
    pub fn build_resolver(&self) -> Result<StaticResolver> {
        let mut resolver = StaticResolver::new();
        for (idx, c) in self.candidates.iter().enumerate() {
            let mut anchors = Vec::new();
            for path in &c.anchors {
                let path = self.resolve_path(path);
                anchors.extend(crate::load_certificates(&path)?);
            }
            let mut crls = Vec::new();
            for path in &c.crls {
                let path = self.resolve_path(path);
                crls.extend(crate::load_crls(&path)?);
            }
            debug!(
                candidate = idx,
                anchors = anchors.len(),
                crls = crls.len(),
                "loaded candidate"
            );

            let mut info = ValidationInformation::new(anchors).with_crls(crls);
            info.max_path_depth = c.max_depth;
            let mut candidate = ValidationCandidate::new(info);
            if let Some(names) = &c.trusted_names {
                candidate = candidate.with_trusted_names(names.iter().cloned());
            }

            match &c.entity_ids {
                Some(ids) => resolver.add_for_entities(ids.iter().cloned(), candidate),
                None => resolver.add(candidate),
            };
        }
        Ok(resolver)
    }
}
