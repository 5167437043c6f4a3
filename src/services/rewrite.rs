// src/services/rewrite.rs

//! Generic tree rewrites used by the normalizer.
//!
//! Every operation takes its input by value and returns the rewritten node,
//! so a raw tree can be normalized more than once without aliasing.
//!
//! - [`unwind`]: hoist the attribute container into its parent (recursive)
//! - [`open_array`]: unwrap a one-element list one level
//! - [`promote`]: flatten `outer.inner.{child}` into `outer: [child, ...]`
//! - [`collapse_singletons`]: `["text"]` becomes `"text"` (shallow)
//! - [`rename`]: shallow key renaming

use crate::error::{AppError, Result};
use crate::models::{CollisionPolicy, Fields, RawNode};

/// An attribute that could not be hoisted because its parent already had a
/// field of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCollision {
    pub field: String,
    /// Value of the existing field, which wins
    pub kept: RawNode,
    /// Attribute value that was dropped
    pub discarded: RawNode,
}

/// Result of [`unwind`].
#[derive(Debug, Clone, PartialEq)]
pub struct Unwound {
    pub node: RawNode,
    pub collisions: Vec<FieldCollision>,
}

/// Merge every attribute container under `attribute_key` into its parent map,
/// depth first.
///
/// An attribute is hoisted only when the parent has no field of that name;
/// otherwise the field keeps its value and the collision is logged and
/// returned. The container itself never survives.
pub fn unwind(node: RawNode, attribute_key: &str) -> Unwound {
    let mut collisions = Vec::new();
    let node = unwind_node(node, attribute_key, &mut collisions);
    Unwound { node, collisions }
}

fn unwind_node(node: RawNode, attribute_key: &str, collisions: &mut Vec<FieldCollision>) -> RawNode {
    match node {
        RawNode::Scalar(_) => node,
        RawNode::List(items) => RawNode::List(
            items
                .into_iter()
                .map(|item| unwind_node(item, attribute_key, collisions))
                .collect(),
        ),
        RawNode::Map(mut fields) => {
            if let Some(container) = fields.shift_remove(attribute_key) {
                hoist(&mut fields, container, attribute_key, collisions);
            }
            RawNode::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, unwind_node(value, attribute_key, collisions)))
                    .collect(),
            )
        }
    }
}

fn hoist(
    fields: &mut Fields,
    container: RawNode,
    attribute_key: &str,
    collisions: &mut Vec<FieldCollision>,
) {
    let attributes = match container {
        RawNode::Map(attributes) => attributes,
        other => {
            log::warn!("Dropping non-map attribute container '{attribute_key}': {other:?}");
            return;
        }
    };

    for (name, value) in attributes {
        match fields.get(&name) {
            Some(existing) => {
                log::warn!(
                    "Attribute '{name}' collides with an existing field; keeping the field value"
                );
                collisions.push(FieldCollision {
                    field: name,
                    kept: existing.clone(),
                    discarded: value,
                });
            }
            None => {
                fields.insert(name, value);
            }
        }
    }
}

/// Replace `fields[key]` with its only element when it is a one-element list.
pub fn open_array(mut fields: Fields, key: &str) -> Fields {
    let single = match fields.get_mut(key) {
        Some(RawNode::List(items)) if items.len() == 1 => items.pop(),
        _ => None,
    };
    if let Some(node) = single {
        fields.insert(key.to_string(), node);
    }
    fields
}

/// Turn `fields[outer][inner]` into a flat list stored at `fields[outer]`,
/// running `transform` over each element in collection order.
///
/// A missing `outer` is a structural error. A missing, empty-string or
/// empty-map `inner` yields an empty list. Anything else under `outer` is
/// discarded.
pub fn promote<F>(mut fields: Fields, outer: &str, inner: &str, mut transform: F) -> Result<Fields>
where
    F: FnMut(RawNode) -> Result<RawNode>,
{
    let container = fields
        .get_mut(outer)
        .ok_or_else(|| AppError::structural(outer))?;

    let collection = match container {
        RawNode::Map(children) => children.shift_remove(inner),
        _ => None,
    };

    let elements = match collection {
        None => Vec::new(),
        Some(node) if node.is_blank() => Vec::new(),
        Some(RawNode::List(items)) => items,
        Some(RawNode::Map(keyed)) => keyed.into_values().collect(),
        Some(single) => vec![single],
    };

    let promoted = elements
        .into_iter()
        .map(&mut transform)
        .collect::<Result<Vec<_>>>()?;

    *container = RawNode::List(promoted);
    Ok(fields)
}

/// Replace every one-element list holding a single string with that string.
pub fn collapse_singletons(fields: Fields) -> Fields {
    fields
        .into_iter()
        .map(|(key, value)| (key, collapse_singleton(value)))
        .collect()
}

fn collapse_singleton(node: RawNode) -> RawNode {
    match node {
        RawNode::List(mut items) if items.len() == 1 && items[0].is_scalar() => items.remove(0),
        other => other,
    }
}

/// Rename fields per `(old, new)` pairs, keeping each field's position.
///
/// Only the given node is touched. When `new` is already populated the
/// outcome follows `policy`.
pub fn rename(mut fields: Fields, mapping: &[(&str, &str)], policy: CollisionPolicy) -> Result<Fields> {
    for &(old, new) in mapping {
        if old == new {
            continue;
        }
        let Some(index) = fields.get_index_of(old) else {
            continue;
        };

        if fields.contains_key(new) {
            match policy {
                CollisionPolicy::Error => return Err(AppError::field_collision(new, old)),
                CollisionPolicy::KeepExisting => {
                    log::warn!("Rename '{old}' -> '{new}' collides; keeping existing '{new}'");
                    fields.shift_remove_index(index);
                }
                CollisionPolicy::Overwrite => {
                    log::warn!("Rename '{old}' -> '{new}' collides; overwriting '{new}'");
                    if let Some((_, value)) = fields.shift_remove_index(index) {
                        fields.insert(new.to_string(), value);
                    }
                }
            }
            continue;
        }

        if let Some((_, value)) = fields.shift_remove_index(index) {
            fields.shift_insert(index, new.to_string(), value);
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> RawNode {
        serde_json::from_value(value).unwrap()
    }

    fn fields(value: serde_json::Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    fn keys(fields: &Fields) -> Vec<&str> {
        fields.keys().map(String::as_str).collect()
    }

    fn identity(node: RawNode) -> Result<RawNode> {
        Ok(node)
    }

    // --- unwind ---

    #[test]
    fn unwind_hoists_attributes() {
        let unwound = unwind(node(json!({ "$": { "id": "7" }, "name": "x" })), "$");
        assert_eq!(unwound.node, node(json!({ "id": "7", "name": "x" })));
        assert!(unwound.collisions.is_empty());
    }

    #[test]
    fn unwind_keeps_existing_field_on_collision() {
        let unwound = unwind(
            node(json!({ "$": { "name": "attr-value" }, "name": "field-value" })),
            "$",
        );

        assert_eq!(unwound.node, node(json!({ "name": "field-value" })));
        assert_eq!(unwound.collisions.len(), 1);
        assert_eq!(unwound.collisions[0].field, "name");
        assert_eq!(unwound.collisions[0].kept, RawNode::from("field-value"));
        assert_eq!(unwound.collisions[0].discarded, RawNode::from("attr-value"));
    }

    #[test]
    fn unwind_recurses_through_lists_and_maps() {
        let raw = node(json!({
            "courses": {
                "$": { "term": "FA14" },
                "course": [
                    { "$": { "subject": "CS" }, "course_title": ["Intro"] },
                    { "$": { "subject": "MATH" } }
                ]
            }
        }));

        let unwound = unwind(raw, "$");
        assert_eq!(
            unwound.node,
            node(json!({
                "courses": {
                    "term": "FA14",
                    "course": [
                        { "subject": "CS", "course_title": ["Intro"] },
                        { "subject": "MATH" }
                    ]
                }
            }))
        );
    }

    #[test]
    fn unwind_leaves_scalars_alone() {
        let unwound = unwind(RawNode::from("text"), "$");
        assert_eq!(unwound.node, RawNode::from("text"));
    }

    #[test]
    fn unwind_honors_custom_attribute_key() {
        let unwound = unwind(node(json!({ "@": { "id": "1" }, "$": "kept" })), "@");
        assert_eq!(unwound.node, node(json!({ "$": "kept", "id": "1" })));
    }

    // --- open_array ---

    #[test]
    fn open_array_unwraps_single_element() {
        let opened = open_array(fields(json!({ "sections": [{ "section": [] }] })), "sections");
        assert_eq!(opened, fields(json!({ "sections": { "section": [] } })));
    }

    #[test]
    fn open_array_ignores_other_shapes() {
        let input = fields(json!({
            "many": ["a", "b"],
            "empty": [],
            "map": { "x": "y" }
        }));
        let mut out = input.clone();
        for key in ["many", "empty", "map", "absent"] {
            out = open_array(out, key);
        }
        assert_eq!(out, input);
    }

    // --- promote ---

    #[test]
    fn promote_flattens_list_in_order() {
        let input = fields(json!({
            "sections": { "section": [{ "id": "1" }, { "id": "2" }, { "id": "3" }] }
        }));
        let out = promote(input, "sections", "section", identity).unwrap();

        let ids: Vec<_> = out["sections"]
            .as_list()
            .unwrap()
            .iter()
            .map(|s| s.get("id").and_then(RawNode::as_str).unwrap())
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn promote_iterates_keyed_collection_in_insertion_order() {
        let input: Fields =
            serde_json::from_str(r#"{ "subjects": { "subject": { "1": "b", "0": "a", "10": "c" } } }"#)
                .unwrap();
        let out = promote(input, "subjects", "subject", identity).unwrap();
        assert_eq!(out["subjects"], node(json!(["b", "a", "c"])));
    }

    #[test]
    fn promote_treats_blank_inner_as_empty() {
        for inner in [json!(""), json!({})] {
            let input = fields(json!({ "notes": { "note": inner } }));
            let out = promote(input, "notes", "note", identity).unwrap();
            assert_eq!(out["notes"], RawNode::List(vec![]));
        }
    }

    #[test]
    fn promote_treats_missing_inner_as_empty() {
        let out = promote(fields(json!({ "notes": "" })), "notes", "note", identity).unwrap();
        assert_eq!(out["notes"], RawNode::List(vec![]));
    }

    #[test]
    fn promote_discards_siblings_of_inner() {
        let input = fields(json!({ "topics": { "topic": ["t"], "count": "1" } }));
        let out = promote(input, "topics", "topic", identity).unwrap();
        assert_eq!(out["topics"], node(json!(["t"])));
    }

    #[test]
    fn promote_fails_on_missing_outer() {
        let err = promote(fields(json!({ "title": "x" })), "sections", "section", identity)
            .unwrap_err();
        assert!(matches!(err, AppError::Structural { context } if context == "sections"));
    }

    #[test]
    fn promote_applies_transform_to_each_element() {
        let input = fields(json!({ "crosslists": { "course": [["a"], ["b"]] } }));
        let out = promote(input, "crosslists", "course", |n| {
            Ok(match n {
                RawNode::List(mut items) => items.remove(0),
                other => other,
            })
        })
        .unwrap();
        assert_eq!(out["crosslists"], node(json!(["a", "b"])));
    }

    #[test]
    fn promote_propagates_transform_error() {
        let input = fields(json!({ "courses": { "course": [{}] } }));
        let result = promote(input, "courses", "course", |_| Err(AppError::structural("sections")));
        assert!(result.is_err());
    }

    // --- collapse_singletons ---

    #[test]
    fn collapse_only_touches_single_string_lists() {
        let out = collapse_singletons(fields(json!({
            "title": ["Introductory Biology"],
            "pair": ["A", "B"],
            "notes": [{ "note": "x" }],
            "empty": [],
            "plain": "kept"
        })));

        assert_eq!(
            out,
            fields(json!({
                "title": "Introductory Biology",
                "pair": ["A", "B"],
                "notes": [{ "note": "x" }],
                "empty": [],
                "plain": "kept"
            }))
        );
    }

    #[test]
    fn collapse_is_shallow() {
        let out = collapse_singletons(fields(json!({ "meeting": { "room": ["101"] } })));
        assert_eq!(out["meeting"], node(json!({ "room": ["101"] })));
    }

    // --- rename ---

    #[test]
    fn rename_preserves_position() {
        let input: Fields =
            serde_json::from_str(r#"{ "subject": "CS", "catalog_nbr": "1110", "units": "4" }"#)
                .unwrap();
        let out = rename(
            input,
            &[("subject", "subject_key"), ("catalog_nbr", "catalog_number")],
            CollisionPolicy::Error,
        )
        .unwrap();

        assert_eq!(keys(&out), ["subject_key", "catalog_number", "units"]);
        assert_eq!(out["subject_key"], RawNode::from("CS"));
    }

    #[test]
    fn rename_skips_absent_fields() {
        let input = fields(json!({ "units": "4" }));
        let out = rename(input.clone(), &[("subject", "subject_key")], CollisionPolicy::Error).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn rename_is_shallow() {
        let input = fields(json!({ "meeting": { "facility_ldescr": "Statler" } }));
        let out = rename(
            input.clone(),
            &[("facility_ldescr", "facility_description")],
            CollisionPolicy::Error,
        )
        .unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn rename_collision_policies() {
        let input = fields(json!({ "subject": "new", "subject_key": "old" }));
        let mapping = [("subject", "subject_key")];

        let err = rename(input.clone(), &mapping, CollisionPolicy::Error).unwrap_err();
        assert!(matches!(err, AppError::FieldCollision { .. }));

        let kept = rename(input.clone(), &mapping, CollisionPolicy::KeepExisting).unwrap();
        assert_eq!(kept, fields(json!({ "subject_key": "old" })));

        let overwritten = rename(input, &mapping, CollisionPolicy::Overwrite).unwrap();
        assert_eq!(overwritten, fields(json!({ "subject_key": "new" })));
    }
}
