//! Feed retrieval and translation.
//!
//! Two halves with a strict boundary between them:
//!
//! - [`fetcher`] — executes data-retrieval recipes over a pluggable
//!   [`Transport`]; pure I/O, no parsing knowledge.
//! - [`parser`] — executes parsing recipes by dispatching the raw payload to
//!   a [`Translator`] looked up by node-type tag.
//!
//! Built-in translators cover JSON category/item feeds and RSS/Atom item
//! feeds; anything else registers its own implementation on the
//! [`TranslatorRegistry`].

mod fetcher;
mod parser;
mod translators;

pub use fetcher::{FeedFetcher, FetchError, HttpTransport, Transport};
pub use parser::{FeedParser, ParseContext, ParsedNode, ParseError, Translator, TranslatorRegistry};
pub use translators::{JsonCategoryTranslator, JsonItemTranslator, RssItemTranslator};
