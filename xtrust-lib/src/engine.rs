//! The trust engine: resolver-driven path validation plus name matching.

use crate::names::{self, NameEvaluatorConfig, TrustedNameSet};
use crate::verify::{self, Credential, ValidationInformation, ValidationOptions};
use crate::TrustError;
use tracing::{debug, warn};

/// Lookup criteria passed to a [`ValidationInfoResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    /// Identifier of the entity (e.g. an issuer) whose trust configuration
    /// should be used. `None` selects only configuration that is not scoped
    /// to a particular entity.
    pub entity_id: Option<String>,
}

impl Criteria {
    pub fn for_entity(entity_id: impl Into<String>) -> Self {
        Criteria {
            entity_id: Some(entity_id.into()),
        }
    }
}

/// One trust configuration: anchors, CRLs and depth, plus the names a
/// credential validated against them must carry.
#[derive(Debug, Clone)]
pub struct ValidationCandidate {
    pub info: ValidationInformation,
    pub trusted_names: Option<TrustedNameSet>,
}

impl ValidationCandidate {
    pub fn new(info: ValidationInformation) -> Self {
        ValidationCandidate {
            info,
            trusted_names: None,
        }
    }

    pub fn with_trusted_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_names = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Supplies the ordered trust configurations for a lookup.
///
/// Each call must return a self-consistent snapshot; the engine does not
/// cache results between evaluations.
pub trait ValidationInfoResolver {
    fn resolve(&self, criteria: &Criteria) -> Result<Vec<ValidationCandidate>, TrustError>;
}

impl<R: ValidationInfoResolver + ?Sized> ValidationInfoResolver for &R {
    fn resolve(&self, criteria: &Criteria) -> Result<Vec<ValidationCandidate>, TrustError> {
        (**self).resolve(criteria)
    }
}

/// A fixed list of candidates.
///
/// Candidates added with [`StaticResolver::add`] are returned for every
/// lookup. Candidates added with [`StaticResolver::add_for_entities`] are
/// returned only when the criteria name one of their entity ids.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: Vec<(Option<Vec<String>>, ValidationCandidate)>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that always returns the one given candidate.
    pub fn single(candidate: ValidationCandidate) -> Self {
        let mut resolver = Self::new();
        resolver.add(candidate);
        resolver
    }

    pub fn add(&mut self, candidate: ValidationCandidate) -> &mut Self {
        self.entries.push((None, candidate));
        self
    }

    pub fn add_for_entities<I, S>(&mut self, entity_ids: I, candidate: ValidationCandidate) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = entity_ids.into_iter().map(Into::into).collect();
        self.entries.push((Some(ids), candidate));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ValidationInfoResolver for StaticResolver {
    fn resolve(&self, criteria: &Criteria) -> Result<Vec<ValidationCandidate>, TrustError> {
        Ok(self
            .entries
            .iter()
            .filter(|(ids, _)| match (ids, &criteria.entity_id) {
                (None, _) => true,
                (Some(ids), Some(id)) => ids.contains(id),
                (Some(_), None) => false,
            })
            .map(|(_, candidate)| candidate.clone())
            .collect())
    }
}

/// Combines a resolver, the path validator and the name matcher.
pub struct TrustEngine<R> {
    resolver: R,
    name_config: NameEvaluatorConfig,
    options: ValidationOptions,
}

impl<R: ValidationInfoResolver> TrustEngine<R> {
    pub fn new(resolver: R) -> Self {
        TrustEngine {
            resolver,
            name_config: NameEvaluatorConfig::default(),
            options: ValidationOptions::default(),
        }
    }

    pub fn with_name_config(mut self, config: NameEvaluatorConfig) -> Self {
        self.name_config = config;
        self
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn name_config(&self) -> &NameEvaluatorConfig {
        &self.name_config
    }

    /// Decide whether `credential` is trusted under `criteria`.
    ///
    /// Candidates are tried in resolver order; the first one whose path
    /// validation and name check both succeed makes the credential trusted.
    /// A candidate that fails either check is skipped. Resolver failures,
    /// a candidate without trust anchors, and undecodable alternative names
    /// are errors and end the evaluation.
    pub fn evaluate(&self, credential: &Credential, criteria: &Criteria) -> Result<bool, TrustError> {
        let candidates = self.resolver.resolve(criteria)?;
        debug!(
            entity_id = criteria.entity_id.as_deref().unwrap_or("-"),
            candidates = candidates.len(),
            "evaluating credential"
        );

        // A misconfigured candidate aborts evaluation even if an earlier
        // one would have succeeded.
        if let Some(idx) = candidates
            .iter()
            .position(|c| c.info.trust_anchors.is_empty())
        {
            warn!(candidate = idx, "resolved candidate has no trust anchors");
            return Err(TrustError::ProcessingError(format!(
                "validation candidate {} contains no trust anchors",
                idx
            )));
        }

        for (idx, candidate) in candidates.iter().enumerate() {
            if !verify::validate_with_options(&candidate.info, credential, &self.options)? {
                debug!(candidate = idx, "path validation failed");
                continue;
            }
            if !names::matches(
                &credential.entity_certificate,
                candidate.trusted_names.as_ref(),
                &self.name_config,
            )? {
                debug!(candidate = idx, "trusted name check failed");
                continue;
            }
            debug!(candidate = idx, "credential trusted");
            return Ok(true);
        }

        debug!("no candidate accepted the credential");
        Ok(false)
    }
}
