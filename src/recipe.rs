//! Recipe configuration: externally defined descriptions of how to fetch and
//! parse each feed, grouped per category contribution.
//!
//! Recipes are read-only for the lifetime of a pipeline run. The pipeline
//! interprets exactly two things about them: a fetch recipe's URL template
//! and a parse recipe's translator tag. Everything else is the concern of
//! whatever produced the configuration (see [`crate::config`] for the TOML
//! loader).

use serde::{Deserialize, Serialize};

/// Substitutions applied to a fetch recipe's URL template.
#[derive(Debug, Clone, Default)]
pub struct FetchParams {
    /// Positional scalar some feeds require: a parent playlist id for the
    /// root fetch, or a category's data-type tag for sub-fetches.
    pub param: Option<String>,
    /// Page index for item continuation. Absent means first page.
    pub page: Option<u32>,
}

/// Named description of one feed retrieval.
///
/// The URL may contain `{param}` and `{page}` placeholders, substituted at
/// execution time from [`FetchParams`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRecipe {
    pub name: String,
    pub url: String,
}

impl FetchRecipe {
    /// Resolve the URL template. A missing `param` substitutes as empty; a
    /// missing `page` substitutes as page 1.
    pub fn resolve_url(&self, params: &FetchParams) -> String {
        self.url
            .replace("{param}", params.param.as_deref().unwrap_or(""))
            .replace("{page}", &params.page.unwrap_or(1).to_string())
    }
}

/// Named description of one feed parse: which translator turns the raw
/// payload into nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseRecipe {
    pub name: String,
    pub translator: String,
}

/// The fetch/parse pair needed to resolve one kind of feed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipePair {
    pub fetch: FetchRecipe,
    pub parse: ParseRecipe,
}

/// One category contribution: optional category recipes (absent means the
/// category is synthesized from `name`), required item recipes, and a live
/// flag forwarded untouched to the parse stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeGroup {
    /// Literal category name. Required when `category` is absent; when
    /// category recipes exist it is ignored by the pipeline.
    pub name: Option<String>,
    pub category: Option<RecipePair>,
    pub items: RecipePair,
    pub live: bool,
}

/// Ordered recipe-group list plus the parameter the root category fetch
/// uses in place of a parent data-type tag.
#[derive(Debug, Clone, Default)]
pub struct RecipeRegistry {
    groups: Vec<RecipeGroup>,
    root_parent_param: Option<String>,
}

impl RecipeRegistry {
    pub fn new(groups: Vec<RecipeGroup>, root_parent_param: Option<String>) -> Self {
        Self {
            groups,
            root_parent_param,
        }
    }

    pub fn groups(&self) -> &[RecipeGroup] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<&RecipeGroup> {
        self.groups.get(index)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn root_parent_param(&self) -> Option<&str> {
        self.root_parent_param.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch(url: &str) -> FetchRecipe {
        FetchRecipe {
            name: "f".into(),
            url: url.into(),
        }
    }

    #[test]
    fn test_resolve_url_substitutes_param_and_page() {
        let recipe = fetch("https://api.example.com/videos?playlist={param}&page={page}");
        let url = recipe.resolve_url(&FetchParams {
            param: Some("pl-1".into()),
            page: Some(3),
        });
        assert_eq!(url, "https://api.example.com/videos?playlist=pl-1&page=3");
    }

    #[test]
    fn test_resolve_url_defaults() {
        let recipe = fetch("https://api.example.com/videos?playlist={param}&page={page}");
        let url = recipe.resolve_url(&FetchParams::default());
        assert_eq!(url, "https://api.example.com/videos?playlist=&page=1");
    }

    #[test]
    fn test_resolve_url_without_placeholders_is_unchanged() {
        let recipe = fetch("https://api.example.com/featured.json");
        let url = recipe.resolve_url(&FetchParams {
            param: Some("ignored".into()),
            page: Some(9),
        });
        assert_eq!(url, "https://api.example.com/featured.json");
    }
}
