use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Well-known attribute keys carried by feed metadata.
///
/// Translators and the pipeline agree on these names; everything else in the
/// attribute maps is opaque feed data passed through for consumers.
pub mod attr {
    /// Feed data-type tag, forwarded as the fetch/parse parameter for a
    /// category's item and sub-category feeds.
    pub const DATA_TYPE: &str = "dataType";
    /// Set on items parsed from a live feed.
    pub const LIVE: &str = "live";
    /// Next page index for item continuation; negative once exhausted.
    pub const NEXT_PAGE: &str = "nextPage";
    /// Total item count the feed reports for a category.
    pub const ITEM_COUNT: &str = "itemCount";
    /// Thumbnail layout hint for row rendering ("poster", "landscape", ...).
    pub const THUMBNAIL_LAYOUT: &str = "thumbnailLayout";
    /// Index of the recipe group that contributed a category. Written by the
    /// orchestrator so the continuation flow can re-resolve item recipes.
    pub const SOURCE_GROUP: &str = "sourceGroup";
}

/// A single attribute value: feeds carry strings, counts, and flags.
///
/// Untagged so TOML/JSON scalars map directly onto the natural variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Str(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Str(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// A playable item inside a category.
///
/// `id` is the caller-domain stable key. Uniqueness across categories is NOT
/// enforced: the same item may legitimately appear in several categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemNode {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
}

impl ItemNode {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            tags: BTreeSet::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }
}

/// A category node: named, with ordered sub-categories and items plus a
/// string-keyed attribute map of feed metadata.
///
/// Sibling names are unique — [`CatalogNode::merge_child`] is the only way
/// the pipeline attaches children, and it coalesces same-named nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogNode {
    pub name: String,
    #[serde(default)]
    pub children: Vec<CatalogNode>,
    #[serde(default)]
    pub items: Vec<ItemNode>,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
}

impl CatalogNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            items: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// True when the node holds no children and no items. Empty nodes are
    /// pruned from a finished tree.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.items.is_empty()
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttributeValue::as_str)
    }

    pub fn attr_int(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).and_then(AttributeValue::as_int)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(AttributeValue::as_bool)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn add_item(&mut self, item: ItemNode) {
        self.items.push(item);
    }

    /// Direct-child lookup by name (the sibling merge key).
    pub fn child_by_name(&self, name: &str) -> Option<&CatalogNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_by_name_mut(&mut self, name: &str) -> Option<&mut CatalogNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Attach `incoming` as a child, coalescing with an existing same-named
    /// sibling: the existing node is reused, the incoming node's items and
    /// children are appended/merged after what is already there, and scalar
    /// attributes follow first-write-wins. Returns the child's index.
    pub fn merge_child(&mut self, incoming: CatalogNode) -> usize {
        match self.children.iter().position(|c| c.name == incoming.name) {
            Some(idx) => {
                self.children[idx].absorb(incoming);
                idx
            }
            None => {
                self.children.push(incoming);
                self.children.len() - 1
            }
        }
    }

    /// Fold another node's contents into this one. Attribute keys already
    /// present are kept (first write wins); items append in arrival order;
    /// children merge by name recursively.
    fn absorb(&mut self, other: CatalogNode) {
        for (key, value) in other.attributes {
            self.attributes.entry(key).or_insert(value);
        }
        self.items.extend(other.items);
        for child in other.children {
            self.merge_child(child);
        }
    }

    /// Deep search for a category by name, this node included.
    ///
    /// Walks with an explicit stack: nesting depth is configuration-driven,
    /// so the traversal must not ride the call stack.
    pub fn find_category(&self, name: &str) -> Option<&CatalogNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.name == name {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    pub fn find_category_mut(&mut self, name: &str) -> Option<&mut CatalogNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.name == name {
                return Some(node);
            }
            stack.extend(node.children.iter_mut());
        }
        None
    }

    /// Deep search for an item by id anywhere under this node. Returns the
    /// first match in discovery order; duplicate ids across categories are
    /// permitted.
    pub fn find_item(&self, id: u64) -> Option<&ItemNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(item) = node.items.iter().find(|i| i.id == id) {
                return Some(item);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    /// Remove every descendant that ends up with zero children and zero
    /// items. Idempotent.
    pub fn prune_empty(&mut self) {
        for child in &mut self.children {
            child.prune_empty();
        }
        self.children.retain(|c| !c.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: u64, title: &str) -> ItemNode {
        ItemNode::new(id, title)
    }

    #[test]
    fn test_attribute_value_accessors() {
        assert_eq!(AttributeValue::from("poster").as_str(), Some("poster"));
        assert_eq!(AttributeValue::from(7i64).as_int(), Some(7));
        assert_eq!(AttributeValue::from(true).as_bool(), Some(true));
        assert_eq!(AttributeValue::from(7i64).as_str(), None);
        assert_eq!(AttributeValue::from("x").as_bool(), None);
    }

    #[test]
    fn test_merge_child_new_sibling_appends() {
        let mut root = CatalogNode::new("Root");
        root.merge_child(CatalogNode::new("Movies"));
        root.merge_child(CatalogNode::new("Shows"));

        let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Movies", "Shows"]);
    }

    #[test]
    fn test_merge_child_same_name_coalesces() {
        let mut root = CatalogNode::new("Root");

        let mut first = CatalogNode::new("Featured");
        first.add_item(item(1, "A"));
        root.merge_child(first);

        let mut second = CatalogNode::new("Featured");
        second.add_item(item(2, "B"));
        root.merge_child(second);

        assert_eq!(root.children.len(), 1);
        let featured = root.child_by_name("Featured").unwrap();
        let ids: Vec<u64> = featured.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_merge_child_attributes_first_write_wins() {
        let mut root = CatalogNode::new("Root");

        let mut first = CatalogNode::new("Featured");
        first.set_attribute(attr::THUMBNAIL_LAYOUT, "poster");
        first.add_item(item(1, "A"));
        root.merge_child(first);

        let mut second = CatalogNode::new("Featured");
        second.set_attribute(attr::THUMBNAIL_LAYOUT, "landscape");
        second.set_attribute(attr::DATA_TYPE, "pl-2");
        root.merge_child(second);

        let featured = root.child_by_name("Featured").unwrap();
        assert_eq!(featured.attr_str(attr::THUMBNAIL_LAYOUT), Some("poster"));
        // Keys the first contribution never set are filled in.
        assert_eq!(featured.attr_str(attr::DATA_TYPE), Some("pl-2"));
    }

    #[test]
    fn test_merge_child_merges_grandchildren_by_name() {
        let mut root = CatalogNode::new("Root");

        let mut first = CatalogNode::new("Sports");
        first.merge_child({
            let mut n = CatalogNode::new("Football");
            n.add_item(item(1, "Match"));
            n
        });
        root.merge_child(first);

        let mut second = CatalogNode::new("Sports");
        second.merge_child({
            let mut n = CatalogNode::new("Football");
            n.add_item(item(2, "Replay"));
            n
        });
        root.merge_child(second);

        let football = root
            .child_by_name("Sports")
            .and_then(|s| s.child_by_name("Football"))
            .unwrap();
        assert_eq!(football.items.len(), 2);
    }

    #[test]
    fn test_find_category_deep() {
        let mut root = CatalogNode::new("Root");
        let mut sports = CatalogNode::new("Sports");
        sports.merge_child(CatalogNode::new("Football"));
        root.merge_child(sports);

        assert!(root.find_category("Football").is_some());
        assert!(root.find_category("Basketball").is_none());
        assert_eq!(root.find_category("Root").map(|n| n.name.as_str()), Some("Root"));
    }

    #[test]
    fn test_find_category_mut_allows_in_place_edit() {
        let mut root = CatalogNode::new("Root");
        let mut sports = CatalogNode::new("Sports");
        sports.merge_child(CatalogNode::new("Football"));
        root.merge_child(sports);

        root.find_category_mut("Football")
            .unwrap()
            .add_item(item(9, "Goal"));
        assert_eq!(root.find_category("Football").unwrap().items.len(), 1);
    }

    #[test]
    fn test_find_item_across_categories() {
        let mut root = CatalogNode::new("Root");
        let mut movies = CatalogNode::new("Movies");
        movies.add_item(item(42, "Heat"));
        root.merge_child(movies);

        assert_eq!(root.find_item(42).map(|i| i.title.as_str()), Some("Heat"));
        assert!(root.find_item(43).is_none());
    }

    #[test]
    fn test_duplicate_item_ids_permitted() {
        let mut root = CatalogNode::new("Root");
        let mut a = CatalogNode::new("A");
        a.add_item(item(1, "Shared"));
        let mut b = CatalogNode::new("B");
        b.add_item(item(1, "Shared"));
        root.merge_child(a);
        root.merge_child(b);

        assert_eq!(root.children[0].items[0].id, root.children[1].items[0].id);
    }

    #[test]
    fn test_prune_empty_removes_empty_branches() {
        let mut root = CatalogNode::new("Root");
        let mut keep = CatalogNode::new("Keep");
        keep.add_item(item(1, "A"));
        root.merge_child(keep);
        root.merge_child(CatalogNode::new("Drop"));

        let mut nested = CatalogNode::new("Outer");
        nested.merge_child(CatalogNode::new("InnerEmpty"));
        root.merge_child(nested);

        root.prune_empty();

        let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Keep"]);
    }

    #[test]
    fn test_prune_keeps_category_whose_only_content_is_a_full_child() {
        let mut root = CatalogNode::new("Root");
        let mut outer = CatalogNode::new("Outer");
        let mut inner = CatalogNode::new("Inner");
        inner.add_item(item(1, "A"));
        outer.merge_child(inner);
        root.merge_child(outer);

        root.prune_empty();
        assert!(root.find_category("Outer").is_some());
        assert!(root.find_category("Inner").is_some());
    }
}
