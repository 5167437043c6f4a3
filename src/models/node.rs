//! Raw parser tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered field map of a [`RawNode::Map`].
pub type Fields = IndexMap<String, RawNode>;

/// A node of the tree produced by the XML parser.
///
/// Serializes untagged, so a tree renders as plain JSON strings, arrays and
/// objects. Map fields keep document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNode {
    Scalar(String),
    List(Vec<RawNode>),
    Map(Fields),
}

impl RawNode {
    /// Borrow the text of a scalar node.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawNode::Scalar(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RawNode]> {
        match self {
            RawNode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            RawNode::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a field of a map node.
    pub fn get(&self, key: &str) -> Option<&RawNode> {
        self.as_map().and_then(|fields| fields.get(key))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, RawNode::Scalar(_))
    }

    /// True for the parser's "no content" markers: `""` and `{}`.
    pub fn is_blank(&self) -> bool {
        match self {
            RawNode::Scalar(text) => text.is_empty(),
            RawNode::Map(fields) => fields.is_empty(),
            RawNode::List(_) => false,
        }
    }
}

impl From<&str> for RawNode {
    fn from(text: &str) -> Self {
        RawNode::Scalar(text.to_string())
    }
}

impl From<String> for RawNode {
    fn from(text: String) -> Self {
        RawNode::Scalar(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_from_plain_json() {
        let node: RawNode =
            serde_json::from_value(json!({ "a": "x", "b": ["y", { "c": "z" }] })).unwrap();

        assert_eq!(node.get("a").and_then(RawNode::as_str), Some("x"));
        let b = node.get("b").and_then(RawNode::as_list).unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].get("c").and_then(RawNode::as_str), Some("z"));
    }

    #[test]
    fn map_preserves_insertion_order() {
        let node: RawNode = serde_json::from_str(r#"{ "zeta": "1", "alpha": "2", "mid": "3" }"#).unwrap();
        let keys: Vec<&str> = node.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn blank_markers() {
        assert!(RawNode::from("").is_blank());
        assert!(RawNode::Map(Fields::new()).is_blank());
        assert!(!RawNode::List(vec![]).is_blank());
        assert!(!RawNode::from("x").is_blank());
    }
}
