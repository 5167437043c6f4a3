//! Canonical roster documents.
//!
//! The normalizer rewrites the raw tree in place-free passes and then lifts
//! the result into these records. Plural fields are plain `Vec`s, so every
//! list a client reads is an array regardless of how many elements the XML
//! carried. Fields the pipeline does not rename stay in the flattened
//! `fields` map of each record.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Fields, RawNode};

/// Instructor record; passed through after attribute unwinding.
pub type Instructor = RawNode;

/// Section note; passed through after attribute unwinding.
pub type Note = RawNode;

/// Course topic; passed through after attribute unwinding.
pub type Topic = RawNode;

/// A normalized roster page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    /// Subject index for a term
    Index(IndexDocument),
    /// Courses of one subject
    CourseList(CourseListDocument),
}

impl Document {
    pub fn term(&self) -> Option<&str> {
        match self {
            Document::Index(index) => Some(&index.term),
            Document::CourseList(list) => list.term.as_deref(),
        }
    }

    /// Number of top-level records (subjects or courses).
    pub fn len(&self) -> usize {
        match self {
            Document::Index(index) => index.subjects.len(),
            Document::CourseList(list) => list.courses.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Subject index page: `{ term, subjects }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDocument {
    pub term: String,
    pub subjects: Vec<SubjectRef>,
}

/// One subject on the index page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectRef {
    /// Subject code (e.g. "CS")
    pub key: String,

    /// Long subject name
    pub name: String,

    /// Link to this subject's course list
    pub json: String,

    #[serde(flatten)]
    pub fields: Fields,
}

/// Per-subject course list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseListDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_load: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime_load: Option<String>,

    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    #[serde(flatten)]
    pub fields: Fields,
    pub crosslists: Vec<CrossListing>,
    pub sections: Vec<Section>,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossListing {
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    #[serde(flatten)]
    pub fields: Fields,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<Meeting>,

    /// Meetings after the first, for sections that meet on several patterns
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_meetings: Vec<Meeting>,

    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meeting {
    #[serde(flatten)]
    pub fields: Fields,
    pub instructors: Vec<Instructor>,
}

fn text<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(RawNode::as_str)
}

impl Course {
    pub fn title(&self) -> Option<&str> {
        text(&self.fields, "title")
    }

    pub fn subject_key(&self) -> Option<&str> {
        text(&self.fields, "subject_key")
    }

    pub fn catalog_number(&self) -> Option<&str> {
        text(&self.fields, "catalog_number")
    }

    pub fn grading_basis(&self) -> Option<&str> {
        text(&self.fields, "grading_basis")
    }

    pub fn class_description(&self) -> Option<&str> {
        text(&self.fields, "class_description")
    }
}

impl CrossListing {
    pub fn subject_key(&self) -> Option<&str> {
        text(&self.fields, "subject_key")
    }

    pub fn catalog_number(&self) -> Option<&str> {
        text(&self.fields, "catalog_number")
    }
}

impl Section {
    pub fn catalog_number(&self) -> Option<&str> {
        text(&self.fields, "catalog_number")
    }

    pub fn consent_description(&self) -> Option<&str> {
        text(&self.fields, "consent_description")
    }

    pub fn subject_key(&self) -> Option<&str> {
        text(&self.fields, "subject_key")
    }

    /// All meetings, first one included.
    pub fn meetings(&self) -> impl Iterator<Item = &Meeting> {
        self.meeting.iter().chain(self.additional_meetings.iter())
    }
}

impl Meeting {
    pub fn facility_description(&self) -> Option<&str> {
        text(&self.fields, "facility_description")
    }

    pub fn meeting_pattern(&self) -> Option<&str> {
        text(&self.fields, "meeting_pattern")
    }
}

// --- Lifting rewritten trees into records ---

fn into_fields(node: RawNode, context: &str) -> Result<Fields> {
    match node {
        RawNode::Map(fields) => Ok(fields),
        _ => Err(AppError::structural(context)),
    }
}

fn take_list(fields: &mut Fields, key: &str) -> Result<Vec<RawNode>> {
    match fields.shift_remove(key) {
        Some(RawNode::List(items)) => Ok(items),
        _ => Err(AppError::structural(key)),
    }
}

fn take_text(fields: &mut Fields, key: &str) -> Result<String> {
    take_optional_text(fields, key).ok_or_else(|| AppError::structural(key))
}

fn take_optional_text(fields: &mut Fields, key: &str) -> Option<String> {
    match fields.shift_remove(key) {
        Some(RawNode::Scalar(text)) => Some(text),
        _ => None,
    }
}

impl IndexDocument {
    pub(crate) fn from_fields(mut fields: Fields) -> Result<Self> {
        let term = take_text(&mut fields, "term")?;
        let subjects = take_list(&mut fields, "subjects")?
            .into_iter()
            .map(SubjectRef::from_node)
            .collect::<Result<_>>()?;
        Ok(Self { term, subjects })
    }
}

impl SubjectRef {
    fn from_node(node: RawNode) -> Result<Self> {
        let mut fields = into_fields(node, "subject")?;
        Ok(Self {
            key: take_text(&mut fields, "key")?,
            name: take_text(&mut fields, "name")?,
            json: take_text(&mut fields, "json")?,
            fields,
        })
    }
}

impl CourseListDocument {
    pub(crate) fn from_fields(mut fields: Fields) -> Result<Self> {
        Ok(Self {
            term: take_optional_text(&mut fields, "term"),
            date_load: take_optional_text(&mut fields, "date_load"),
            datetime_load: take_optional_text(&mut fields, "datetime_load"),
            courses: take_list(&mut fields, "courses")?
                .into_iter()
                .map(Course::from_node)
                .collect::<Result<_>>()?,
        })
    }
}

impl Course {
    fn from_node(node: RawNode) -> Result<Self> {
        let mut fields = into_fields(node, "course")?;
        let crosslists = take_list(&mut fields, "crosslists")?
            .into_iter()
            .map(|node| {
                into_fields(node, "crosslist course").map(|fields| CrossListing { fields })
            })
            .collect::<Result<_>>()?;
        let sections = take_list(&mut fields, "sections")?
            .into_iter()
            .map(Section::from_node)
            .collect::<Result<_>>()?;
        let topics = take_list(&mut fields, "topics")?;

        Ok(Self {
            fields,
            crosslists,
            sections,
            topics,
        })
    }
}

impl Section {
    fn from_node(node: RawNode) -> Result<Self> {
        let mut fields = into_fields(node, "section")?;

        let mut meetings = match fields.shift_remove("meeting") {
            None => Vec::new(),
            Some(meeting) if meeting.is_blank() => Vec::new(),
            Some(RawNode::List(items)) => items
                .into_iter()
                .map(Meeting::from_node)
                .collect::<Result<Vec<_>>>()?,
            Some(meeting) => vec![Meeting::from_node(meeting)?],
        }
        .into_iter();

        let meeting = meetings.next();
        let additional_meetings = meetings.collect();
        let notes = take_list(&mut fields, "notes")?;

        Ok(Self {
            fields,
            meeting,
            additional_meetings,
            notes,
        })
    }
}

impl Meeting {
    fn from_node(node: RawNode) -> Result<Self> {
        let mut fields = into_fields(node, "meeting")?;
        let instructors = if fields.contains_key("instructors") {
            take_list(&mut fields, "instructors")?
        } else {
            Vec::new()
        };
        Ok(Self {
            fields,
            instructors,
        })
    }
}
