// src/services/normalize.rs

//! Roster schema normalizer.
//!
//! Turns the parser's raw tree into one of the two canonical documents. The
//! pass is linear: unwind attributes across the whole tree, pick the variant
//! from the top-level `subjects` field, then rewrite each level in a fixed
//! order (crosslists, sections, topics; inside a section meeting before
//! notes).

use crate::error::{AppError, Result};
use crate::models::{
    CollisionPolicy, Config, CourseListDocument, Document, Fields, IndexDocument, RawNode,
};
use crate::services::rewrite::{collapse_singletons, open_array, promote, rename, unwind};

const SUBJECT_RENAMES: &[(&str, &str)] = &[("subject", "key"), ("subject_ldescr", "name")];

const COURSE_RENAMES: &[(&str, &str)] = &[
    ("course_title", "title"),
    ("grading_basis_sdescr", "grading_basis"),
    ("subject", "subject_key"),
    ("catalog_nbr", "catalog_number"),
    ("class_descr", "class_description"),
];

const CROSSLIST_RENAMES: &[(&str, &str)] =
    &[("catalog_nbr", "catalog_number"), ("subject", "subject_key")];

const SECTION_RENAMES: &[(&str, &str)] = &[
    ("catalog_nbr", "catalog_number"),
    ("consent_ldescr", "consent_description"),
    ("subject", "subject_key"),
];

const MEETING_RENAMES: &[(&str, &str)] = &[
    ("facility_ldescr", "facility_description"),
    ("meeting_pattern_sdescr", "meeting_pattern"),
];

/// Fields copied from `courses` to the top of a course list.
const COURSE_LIST_HEADER: [&str; 3] = ["term", "date_load", "datetime_load"];

/// Converts raw roster trees into canonical documents.
#[derive(Debug, Clone)]
pub struct Normalizer {
    attribute_key: String,
    link_base: String,
    collisions: CollisionPolicy,
}

impl Normalizer {
    /// Create a normalizer from the application configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            attribute_key: config.normalize.attribute_key.clone(),
            link_base: config.roster.link_base.clone(),
            collisions: config.normalize.rename_collisions,
        }
    }

    /// Normalize one full document.
    ///
    /// Attribute collisions are logged and recovered; everything else that
    /// goes wrong fails the whole document.
    pub fn normalize(&self, raw: RawNode) -> Result<Document> {
        let unwound = unwind(raw, &self.attribute_key);
        if !unwound.collisions.is_empty() {
            log::debug!(
                "Unwinding kept {} existing field(s) over colliding attributes",
                unwound.collisions.len()
            );
        }

        let root = match unwound.node {
            RawNode::Map(fields) => fields,
            _ => return Err(AppError::structural("document root")),
        };

        if root.contains_key("subjects") {
            let fields = self.remap_index(root)?;
            Ok(Document::Index(IndexDocument::from_fields(fields)?))
        } else {
            let fields = self.remap_courses(root)?;
            Ok(Document::CourseList(CourseListDocument::from_fields(fields)?))
        }
    }

    fn rename(&self, fields: Fields, mapping: &[(&str, &str)]) -> Result<Fields> {
        rename(fields, mapping, self.collisions)
    }

    // --- Index page ---

    fn remap_index(&self, mut root: Fields) -> Result<Fields> {
        collapse_container(&mut root, "subjects");
        if let Some(term) = root.get("subjects").and_then(|s| s.get("term")).cloned() {
            root.insert("term".to_string(), term);
        }
        promote(root, "subjects", "subject", |subject| {
            self.remap_subject(subject)
        })
    }

    fn remap_subject(&self, subject: RawNode) -> Result<RawNode> {
        with_fields(subject, |fields| {
            let mut fields = self.rename(collapse_singletons(fields), SUBJECT_RENAMES)?;
            fields.shift_remove("xml");

            if let Some(key) = fields.get("key").and_then(RawNode::as_str) {
                let link = format!("{}{}", self.link_base, key);
                fields.insert("json".to_string(), RawNode::Scalar(link));
            }
            Ok(fields)
        })
    }

    // --- Course list ---

    fn remap_courses(&self, mut root: Fields) -> Result<Fields> {
        collapse_container(&mut root, "courses");
        let header: Vec<(String, RawNode)> = match root.get("courses") {
            Some(courses) => COURSE_LIST_HEADER
                .iter()
                .filter_map(|&key| courses.get(key).map(|v| (key.to_string(), v.clone())))
                .collect(),
            None => Vec::new(),
        };
        root.extend(header);

        promote(root, "courses", "course", |course| self.remap_course(course))
    }

    fn remap_course(&self, course: RawNode) -> Result<RawNode> {
        with_fields(course, |fields| {
            let fields = self.rename(collapse_singletons(fields), COURSE_RENAMES)?;

            let fields = open_array(fields, "crosslists");
            let fields = promote(fields, "crosslists", "course", |crosslist| {
                with_fields(crosslist, |fields| {
                    self.rename(collapse_singletons(fields), CROSSLIST_RENAMES)
                })
            })?;

            let fields = open_array(fields, "sections");
            let fields = promote(fields, "sections", "section", |section| {
                self.remap_section(section)
            })?;

            let fields = open_array(fields, "topics");
            promote(fields, "topics", "topic", Ok)
        })
    }

    fn remap_section(&self, section: RawNode) -> Result<RawNode> {
        with_fields(section, |fields| {
            let fields = open_array(collapse_singletons(fields), "meeting");
            let mut fields = self.rename(fields, SECTION_RENAMES)?;

            if let Some(meeting) = fields.shift_remove("meeting") {
                let meeting = match meeting {
                    RawNode::List(meetings) => RawNode::List(
                        meetings
                            .into_iter()
                            .map(|m| self.remap_meeting(m))
                            .collect::<Result<_>>()?,
                    ),
                    meeting => self.remap_meeting(meeting)?,
                };
                fields.insert("meeting".to_string(), meeting);
            }

            let fields = open_array(fields, "notes");
            promote(fields, "notes", "note", Ok)
        })
    }

    fn remap_meeting(&self, meeting: RawNode) -> Result<RawNode> {
        with_fields(meeting, |fields| {
            let fields = self.rename(collapse_singletons(fields), MEETING_RENAMES)?;
            if !fields.contains_key("instructors") {
                return Ok(fields);
            }
            let fields = open_array(fields, "instructors");
            promote(fields, "instructors", "instructor", Ok)
        })
    }
}

/// Collapse text-only children of a page container so header fields read the
/// same whether the XML carried them as attributes or as child elements.
fn collapse_container(root: &mut Fields, key: &str) {
    if let Some(RawNode::Map(fields)) = root.get_mut(key) {
        *fields = collapse_singletons(std::mem::take(fields));
    }
}

/// Apply `f` to a map node; any other node passes through unchanged.
fn with_fields<F>(node: RawNode, f: F) -> Result<RawNode>
where
    F: FnOnce(Fields) -> Result<Fields>,
{
    match node {
        RawNode::Map(fields) => f(fields).map(RawNode::Map),
        other => Ok(other),
    }
}
