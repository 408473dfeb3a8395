//! Named source registry: the setup pass inserts placed models, the write
//! pass renders them for one transport code.

use super::sources::SourceModel;
use super::traits::DeckWriter;
use crate::domain::{SourceError, SourceResult, TargetCode};
use globset::{Glob, GlobMatcher};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    sources: BTreeMap<String, SourceModel>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the model key. A name can only be registered once.
    pub fn insert(&mut self, model: SourceModel) -> SourceResult<()> {
        let name = model.key().to_string();
        if self.sources.contains_key(&name) {
            return Err(SourceError::validation(
                "INPUT.DUPLICATE_SOURCE",
                format!("source '{}' is already registered", name),
            ));
        }
        info!(name = %name, kind = %model.kind(), "source registered");
        self.sources.insert(name, model);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SourceModel> {
        self.sources.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SourceModel> {
        self.sources.get_mut(name)
    }

    pub fn require(&self, name: &str) -> SourceResult<&SourceModel> {
        self.get(name).ok_or_else(|| {
            SourceError::configuration(
                "CONFIG.UNKNOWN_SOURCE",
                format!("no source registered as '{}'", name),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Registered names matching a shell glob, in name order.
    pub fn names_matching(&self, pattern: &str) -> SourceResult<Vec<&str>> {
        let matcher = compile(pattern)?;
        Ok(self.names().filter(|name| matcher.is_match(name)).collect())
    }

    /// Deck text for every source whose name matches `pattern`.
    pub fn write_matching(&self, code: TargetCode, pattern: &str) -> SourceResult<String> {
        let names = self.names_matching(pattern)?;
        let mut out = String::new();
        for name in &names {
            out.push_str(&self.require(name)?.write(code)?);
        }
        info!(code = %code, pattern, sources = names.len(), "deck written");
        Ok(out)
    }
}

impl DeckWriter for BuildContext {
    fn write_deck(&self, code: TargetCode) -> SourceResult<String> {
        self.write_matching(code, "*")
    }
}

fn compile(pattern: &str) -> SourceResult<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| {
            SourceError::configuration(
                "CONFIG.NAME_PATTERN",
                format!("invalid source name pattern '{}': {}", pattern, source),
            )
        })
}
