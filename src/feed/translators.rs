//! Built-in translators: JSON category/item feeds and RSS/Atom item feeds.
//!
//! The JSON translators are deliberately schema-light. They pull out the
//! fields the catalog model names (`name`, `id`, `title`, `description`,
//! `tags`) and pass every other scalar field through as a node attribute, so
//! feed-specific metadata (data-type tags, item counts, layout hints)
//! survives without the pipeline knowing about it.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::catalog::{attr, AttributeValue, CatalogNode, ItemNode};

use super::parser::{ParseContext, ParseError, ParsedNode, Translator};

/// Derive a stable item id when the feed does not carry one.
///
/// Hash of the identifying parts, truncated to u64. Stable across runs for
/// the same entry.
fn stable_id(parts: &[&str]) -> u64 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    // Top bit cleared so the id stays comfortably inside every signed
    // representation consumers may use.
    u64::from_be_bytes(bytes) >> 1
}

fn scalar_attribute(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::Bool(b) => Some(AttributeValue::Bool(*b)),
        Value::Number(n) => n.as_i64().map(AttributeValue::Int),
        Value::String(s) => Some(AttributeValue::Str(s.clone())),
        _ => None,
    }
}

/// Accept either a bare JSON array or an object wrapping one under `key`.
fn entries<'a>(root: &'a Value, key: &str) -> Option<&'a [Value]> {
    match root {
        Value::Array(list) => Some(list),
        Value::Object(map) => match map.get(key) {
            Some(Value::Array(list)) => Some(list),
            _ => None,
        },
        _ => None,
    }
}

fn parse_json(payload: &[u8]) -> Result<Value, ParseError> {
    serde_json::from_slice(payload).map_err(|e| ParseError::Malformed(e.to_string()))
}

/// `json-categories`: JSON array of category objects.
///
/// Each object needs a `name`; all other scalar fields become attributes.
/// Objects without a name are skipped and counted, not fatal.
pub struct JsonCategoryTranslator;

impl Translator for JsonCategoryTranslator {
    fn translate(&self, payload: &[u8], _ctx: &ParseContext) -> Result<Vec<ParsedNode>, ParseError> {
        let root = parse_json(payload)?;
        let list = entries(&root, "categories")
            .ok_or_else(|| ParseError::Malformed("expected a JSON array of categories".into()))?;

        let mut nodes = Vec::new();
        let mut skipped = 0usize;
        for entry in list {
            let Some(map) = entry.as_object() else {
                skipped += 1;
                continue;
            };
            let Some(name) = map.get("name").and_then(Value::as_str) else {
                skipped += 1;
                continue;
            };
            let mut node = CatalogNode::new(name);
            for (key, value) in map {
                if key == "name" {
                    continue;
                }
                if let Some(attribute) = scalar_attribute(value) {
                    node.attributes.insert(key.clone(), attribute);
                }
            }
            nodes.push(ParsedNode::Category(node));
        }

        if skipped > 0 {
            tracing::warn!(skipped = skipped, "category entries without a name skipped");
        }
        Ok(nodes)
    }
}

/// `json-items`: JSON array of item objects.
///
/// `id` may be a non-negative number; entries without one get a stable
/// hash-derived id. The group's live flag is stamped onto every item.
pub struct JsonItemTranslator;

impl Translator for JsonItemTranslator {
    fn translate(&self, payload: &[u8], ctx: &ParseContext) -> Result<Vec<ParsedNode>, ParseError> {
        let root = parse_json(payload)?;
        let list = entries(&root, "items")
            .ok_or_else(|| ParseError::Malformed("expected a JSON array of items".into()))?;

        let mut nodes = Vec::new();
        let mut skipped = 0usize;
        for entry in list {
            let Some(map) = entry.as_object() else {
                skipped += 1;
                continue;
            };
            let title = map
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Untitled")
                .to_owned();
            let description = map
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let id = match map.get("id").and_then(Value::as_u64) {
                Some(id) => id,
                None => stable_id(&[&title, &description]),
            };

            let mut item = ItemNode::new(id, title);
            item.description = description;
            if let Some(tags) = map.get("tags").and_then(Value::as_array) {
                item.tags = tags
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect();
            }
            for (key, value) in map {
                if matches!(key.as_str(), "id" | "title" | "description" | "tags") {
                    continue;
                }
                if let Some(attribute) = scalar_attribute(value) {
                    item.attributes.insert(key.clone(), attribute);
                }
            }
            if ctx.live {
                item.set_attribute(attr::LIVE, true);
            }
            nodes.push(ParsedNode::Item(item));
        }

        if skipped > 0 {
            tracing::warn!(skipped = skipped, "malformed item entries skipped");
        }
        Ok(nodes)
    }
}

/// `rss-items`: RSS/Atom payload, one item per feed entry.
///
/// Entry id (or link/title as fallback material) becomes the item id;
/// categories become tags; the first link survives as a `url` attribute.
pub struct RssItemTranslator;

impl Translator for RssItemTranslator {
    fn translate(&self, payload: &[u8], ctx: &ParseContext) -> Result<Vec<ParsedNode>, ParseError> {
        let feed = feed_rs::parser::parse(payload)
            .map_err(|e| ParseError::Malformed(e.to_string()))?;

        let mut nodes = Vec::new();
        for entry in feed.entries {
            let url = entry.links.first().map(|l| l.href.clone());
            let title = entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string());
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            let id = if entry.id.trim().is_empty() {
                stable_id(&[url.as_deref().unwrap_or(""), &title])
            } else {
                stable_id(&[entry.id.trim()])
            };

            let mut item = ItemNode::new(id, title);
            item.description = summary;
            item.tags = entry
                .categories
                .into_iter()
                .map(|c| c.term)
                .filter(|t| !t.is_empty())
                .collect();
            if let Some(url) = url {
                item.set_attribute("url", url);
            }
            if ctx.live {
                item.set_attribute(attr::LIVE, true);
            }
            nodes.push(ParsedNode::Item(item));
        }
        Ok(nodes)
    }
}
