use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{CatalogNode, ItemNode};
use crate::recipe::ParseRecipe;

/// Errors that can occur while turning a raw payload into nodes.
///
/// Fatal to the pipeline run, with handling identical to
/// [`crate::feed::FetchError`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// No translator is registered under the recipe's declared tag.
    #[error("no translator registered for tag '{0}'")]
    MissingTranslator(String),
    /// Payload could not be interpreted by the translator.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// One parsed feed element: a category node or a playable item.
#[derive(Debug, Clone)]
pub enum ParsedNode {
    Category(CatalogNode),
    Item(ItemNode),
}

/// Context forwarded from the orchestrator into each parse.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Positional scalars some recipes require (parent playlist id for the
    /// root fetch, a data-type tag for sub-fetches).
    pub params: Vec<String>,
    /// The owning recipe-group's live flag. Not interpreted by the
    /// pipeline; translators may stamp it onto parsed items.
    pub live: bool,
}

impl ParseContext {
    pub fn new(params: Vec<String>, live: bool) -> Self {
        Self { params, live }
    }
}

/// A parsing implementation registered under a node-type tag.
///
/// Translators are pure: payload in, zero-or-more nodes out. An empty result
/// means the payload legitimately yielded nothing and is not an error.
pub trait Translator: Send + Sync {
    fn translate(&self, payload: &[u8], ctx: &ParseContext) -> Result<Vec<ParsedNode>, ParseError>;
}

/// Capability lookup from node-type tag to translator.
///
/// Missing tags surface as an explicit [`ParseError::MissingTranslator`];
/// there is no fallback.
#[derive(Default, Clone)]
pub struct TranslatorRegistry {
    translators: HashMap<String, Arc<dyn Translator>>,
}

impl TranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in translators
    /// (`json-categories`, `json-items`, `rss-items`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("json-categories", Arc::new(super::JsonCategoryTranslator));
        registry.register("json-items", Arc::new(super::JsonItemTranslator));
        registry.register("rss-items", Arc::new(super::RssItemTranslator));
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, translator: Arc<dyn Translator>) {
        self.translators.insert(tag.into(), translator);
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn Translator>> {
        self.translators.get(tag)
    }
}

/// Executes one parsing recipe against a raw payload via the registry.
#[derive(Clone)]
pub struct FeedParser {
    registry: TranslatorRegistry,
}

impl FeedParser {
    pub fn new(registry: TranslatorRegistry) -> Self {
        Self { registry }
    }

    /// Parse `payload` with the translator the recipe names.
    ///
    /// # Errors
    ///
    /// [`ParseError::MissingTranslator`] when the recipe's tag is not
    /// registered; whatever the translator reports otherwise.
    pub fn parse(
        &self,
        recipe: &ParseRecipe,
        payload: &[u8],
        ctx: &ParseContext,
    ) -> Result<Vec<ParsedNode>, ParseError> {
        let translator = self
            .registry
            .get(&recipe.translator)
            .ok_or_else(|| ParseError::MissingTranslator(recipe.translator.clone()))?;

        let nodes = translator.translate(payload, ctx)?;
        tracing::debug!(recipe = %recipe.name, translator = %recipe.translator, nodes = nodes.len(), "feed parsed");
        Ok(nodes)
    }
}
