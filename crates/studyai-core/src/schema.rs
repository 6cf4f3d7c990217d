//! Artifact schemas and the schema validator.
//!
//! Each generated artifact kind has a static [`Schema`]: an ordered list of
//! required fields with a type and semantic constraints. [`Schema::validate`]
//! checks a decoded JSON value against it and reports the first violation.
//! The same schema renders a JSON Schema document for schema-constrained
//! decoding and drives the field list in prompts.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The literal blank in a fill-in-the-blank question: five underscores.
pub const BLANK_MARKER: &str = "_____";

/// Number of options in a multiple-choice question.
pub const MCQ_OPTION_COUNT: usize = 4;

// ============================================================================
// ArtifactKind
// ============================================================================

/// The kinds of artifact the generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Multiple-choice question.
    Mcq,
    /// Fill-in-the-blank question.
    FillBlank,
    /// Content summary.
    Summary,
    /// Set of flashcards.
    FlashcardSet,
}

impl ArtifactKind {
    /// Returns the schema for this kind.
    #[must_use]
    pub fn schema(self) -> &'static Schema {
        match self {
            Self::Mcq => &MCQ_SCHEMA,
            Self::FillBlank => &FILL_BLANK_SCHEMA,
            Self::Summary => &SUMMARY_SCHEMA,
            Self::FlashcardSet => &FLASHCARD_SET_SCHEMA,
        }
    }

    /// Machine name, used as the JSON Schema name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::FillBlank => "fill_blank",
            Self::Summary => "summary",
            Self::FlashcardSet => "flashcard_set",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mcq => write!(f, "multiple-choice question"),
            Self::FillBlank => write!(f, "fill-in-the-blank question"),
            Self::Summary => write!(f, "summary"),
            Self::FlashcardSet => write!(f, "flashcard set"),
        }
    }
}

// ============================================================================
// Schema definition types
// ============================================================================

/// Shape of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A JSON string.
    Text,
    /// An array of JSON strings.
    TextList,
    /// An array of objects, each matching the nested fields.
    RecordList(&'static [FieldSpec]),
}

/// A semantic constraint on a field, checked after its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Text must not be blank; a list must have at least one item and no
    /// blank text items.
    NonEmpty,
    /// A list must have exactly this many items.
    ExactCount(usize),
    /// Text items of a list must be pairwise different.
    DistinctItems,
    /// Text must equal one item of the named sibling list field.
    MemberOf(&'static str),
    /// Text must contain the given marker.
    ContainsMarker(&'static str),
}

/// One required field of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON key.
    pub name: &'static str,
    /// Expected value shape.
    pub field_type: FieldType,
    /// Human description, repeated in prompts and JSON Schema.
    pub description: &'static str,
    /// Constraints, checked in order.
    pub constraints: &'static [Constraint],
}

/// The expected shape of one artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// The artifact this schema describes.
    pub kind: ArtifactKind,
    /// Required fields, checked in order.
    pub fields: &'static [FieldSpec],
}

// ============================================================================
// Schemas
// ============================================================================

/// Multiple-choice question schema.
pub static MCQ_SCHEMA: Schema = Schema {
    kind: ArtifactKind::Mcq,
    fields: &[
        FieldSpec {
            name: "question",
            field_type: FieldType::Text,
            description: "A clear, specific question",
            constraints: &[Constraint::NonEmpty],
        },
        FieldSpec {
            name: "options",
            field_type: FieldType::TextList,
            description: "An array of exactly 4 possible answers",
            constraints: &[
                Constraint::ExactCount(MCQ_OPTION_COUNT),
                Constraint::NonEmpty,
                Constraint::DistinctItems,
            ],
        },
        FieldSpec {
            name: "correct_answer",
            field_type: FieldType::Text,
            description: "One of the options, copied exactly, that is the correct answer",
            constraints: &[Constraint::NonEmpty, Constraint::MemberOf("options")],
        },
        FieldSpec {
            name: "explanation",
            field_type: FieldType::Text,
            description: "A detailed explanation of why the answer is correct",
            constraints: &[],
        },
    ],
};

/// Fill-in-the-blank question schema.
pub static FILL_BLANK_SCHEMA: Schema = Schema {
    kind: ArtifactKind::FillBlank,
    fields: &[
        FieldSpec {
            name: "question",
            field_type: FieldType::Text,
            description: "A sentence with '_____' (5 underscores) marking where the blank should be",
            constraints: &[Constraint::NonEmpty, Constraint::ContainsMarker(BLANK_MARKER)],
        },
        FieldSpec {
            name: "answer",
            field_type: FieldType::Text,
            description: "The correct word or phrase that belongs in the blank",
            constraints: &[Constraint::NonEmpty],
        },
        FieldSpec {
            name: "explanation",
            field_type: FieldType::Text,
            description: "A detailed explanation of why the answer is correct",
            constraints: &[],
        },
    ],
};

/// Summary schema.
pub static SUMMARY_SCHEMA: Schema = Schema {
    kind: ArtifactKind::Summary,
    fields: &[
        FieldSpec {
            name: "main_idea",
            field_type: FieldType::Text,
            description: "The core message or central theme of the content",
            constraints: &[Constraint::NonEmpty],
        },
        FieldSpec {
            name: "key_points",
            field_type: FieldType::TextList,
            description: "List of the most important takeaways and details, in reading order",
            constraints: &[],
        },
    ],
};

const FLASHCARD_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "front",
        field_type: FieldType::Text,
        description: "The question or concept on the front of the flashcard",
        constraints: &[Constraint::NonEmpty],
    },
    FieldSpec {
        name: "back",
        field_type: FieldType::Text,
        description: "The answer or explanation on the back of the flashcard",
        constraints: &[Constraint::NonEmpty],
    },
];

/// Flashcard set schema.
pub static FLASHCARD_SET_SCHEMA: Schema = Schema {
    kind: ArtifactKind::FlashcardSet,
    fields: &[FieldSpec {
        name: "flashcards",
        field_type: FieldType::RecordList(FLASHCARD_FIELDS),
        description: "A collection of study flashcards",
        constraints: &[],
    }],
};

// ============================================================================
// Validation
// ============================================================================

/// The first constraint a candidate value violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    /// The value is not a JSON object.
    #[error("expected a JSON object")]
    NotAnObject,

    /// A required field is absent.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Field path.
        field: String,
    },

    /// A field has the wrong JSON type.
    #[error("field '{field}' must be {expected}")]
    WrongType {
        /// Field path.
        field: String,
        /// Description of the expected type.
        expected: &'static str,
    },

    /// A field is blank or an empty list.
    #[error("field '{field}' must not be empty")]
    Empty {
        /// Field path.
        field: String,
    },

    /// A list has the wrong number of items.
    #[error("field '{field}' must have exactly {expected} items, found {actual}")]
    WrongCount {
        /// Field path.
        field: String,
        /// Required count.
        expected: usize,
        /// Actual count.
        actual: usize,
    },

    /// A list contains the same item twice.
    #[error("field '{field}' contains duplicate item '{item}'")]
    DuplicateItem {
        /// Field path.
        field: String,
        /// The repeated item.
        item: String,
    },

    /// A value is not one of the items of a sibling list.
    #[error("field '{field}' value '{value}' is not one of '{of}'")]
    NotAMember {
        /// Field path.
        field: String,
        /// The offending value.
        value: String,
        /// The sibling list field.
        of: &'static str,
    },

    /// A text lacks a required marker.
    #[error("field '{field}' must contain '{marker}'")]
    MissingMarker {
        /// Field path.
        field: String,
        /// The required marker.
        marker: &'static str,
    },
}

impl Schema {
    /// Checks `value` against this schema.
    ///
    /// Fields are checked in declaration order: presence, then type, then
    /// each constraint. The input is never modified.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaViolation`] found.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        let object = value.as_object().ok_or(SchemaViolation::NotAnObject)?;
        check_fields(self.fields, object, "")
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Renders this schema as a JSON Schema document.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        object_schema(self.fields)
    }
}

fn check_fields(
    fields: &[FieldSpec],
    object: &Map<String, Value>,
    prefix: &str,
) -> Result<(), SchemaViolation> {
    for spec in fields {
        let path = format!("{prefix}{}", spec.name);
        let value = object
            .get(spec.name)
            .ok_or_else(|| SchemaViolation::MissingField {
                field: path.clone(),
            })?;

        check_shape(spec.field_type, value, &path)?;
        for constraint in spec.constraints {
            check_constraint(*constraint, value, object, &path)?;
        }
    }
    Ok(())
}

fn check_shape(field_type: FieldType, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    let wrong_type = |field: &str, expected| SchemaViolation::WrongType {
        field: field.to_string(),
        expected,
    };

    match field_type {
        FieldType::Text => {
            if value.is_string() {
                Ok(())
            } else {
                Err(wrong_type(path, "a string"))
            }
        }
        FieldType::TextList => {
            let items = value
                .as_array()
                .ok_or_else(|| wrong_type(path, "an array of strings"))?;
            match items.iter().position(|item| !item.is_string()) {
                Some(i) => Err(wrong_type(&format!("{path}[{i}]"), "a string")),
                None => Ok(()),
            }
        }
        FieldType::RecordList(fields) => {
            let items = value
                .as_array()
                .ok_or_else(|| wrong_type(path, "an array of objects"))?;
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                let record = item
                    .as_object()
                    .ok_or_else(|| wrong_type(&item_path, "an object"))?;
                check_fields(fields, record, &format!("{item_path}."))?;
            }
            Ok(())
        }
    }
}

fn check_constraint(
    constraint: Constraint,
    value: &Value,
    object: &Map<String, Value>,
    path: &str,
) -> Result<(), SchemaViolation> {
    match constraint {
        Constraint::NonEmpty => match value {
            Value::String(s) if s.trim().is_empty() => Err(SchemaViolation::Empty {
                field: path.to_string(),
            }),
            Value::Array(items) if items.is_empty() => Err(SchemaViolation::Empty {
                field: path.to_string(),
            }),
            Value::Array(items) => {
                let blank = items
                    .iter()
                    .position(|item| item.as_str().is_some_and(|s| s.trim().is_empty()));
                match blank {
                    Some(i) => Err(SchemaViolation::Empty {
                        field: format!("{path}[{i}]"),
                    }),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        },
        Constraint::ExactCount(expected) => {
            let actual = value.as_array().map_or(0, Vec::len);
            if actual == expected {
                Ok(())
            } else {
                Err(SchemaViolation::WrongCount {
                    field: path.to_string(),
                    expected,
                    actual,
                })
            }
        }
        Constraint::DistinctItems => {
            let items = text_items(value);
            for (i, item) in items.iter().enumerate() {
                if items[..i].contains(item) {
                    return Err(SchemaViolation::DuplicateItem {
                        field: path.to_string(),
                        item: (*item).to_string(),
                    });
                }
            }
            Ok(())
        }
        Constraint::MemberOf(other) => {
            let text = value.as_str().unwrap_or_default();
            let members = object.get(other).map(text_items).unwrap_or_default();
            if members.contains(&text) {
                Ok(())
            } else {
                Err(SchemaViolation::NotAMember {
                    field: path.to_string(),
                    value: text.to_string(),
                    of: other,
                })
            }
        }
        Constraint::ContainsMarker(marker) => {
            if value.as_str().is_some_and(|s| s.contains(marker)) {
                Ok(())
            } else {
                Err(SchemaViolation::MissingMarker {
                    field: path.to_string(),
                    marker,
                })
            }
        }
    }
}

fn text_items(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn object_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    for spec in fields {
        properties.insert(spec.name.to_string(), field_schema(spec));
    }
    let required: Vec<&str> = fields.iter().map(|f| f.name).collect();

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn field_schema(spec: &FieldSpec) -> Value {
    let mut schema = match spec.field_type {
        FieldType::Text => serde_json::json!({ "type": "string" }),
        FieldType::TextList => serde_json::json!({
            "type": "array",
            "items": { "type": "string" },
        }),
        FieldType::RecordList(fields) => serde_json::json!({
            "type": "array",
            "items": object_schema(fields),
        }),
    };

    if let Some(map) = schema.as_object_mut() {
        map.insert("description".to_string(), Value::from(spec.description));
        for constraint in spec.constraints {
            if let Constraint::ExactCount(n) = constraint {
                map.insert("minItems".to_string(), Value::from(*n));
                map.insert("maxItems".to_string(), Value::from(*n));
            }
        }
    }
    schema
}

// ============================================================================
// Typed artifacts
// ============================================================================

/// A typed artifact that can be decoded from validated JSON.
pub trait Artifact: DeserializeOwned + Serialize + Send + fmt::Debug {
    /// The artifact kind.
    const KIND: ArtifactKind;

    /// The schema values must satisfy before decoding.
    fn schema() -> &'static Schema {
        Self::KIND.schema()
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    /// Question text.
    pub question: String,
    /// Exactly four distinct options.
    pub options: Vec<String>,
    /// The correct option, as literal text.
    pub correct_answer: String,
    /// Why the answer is correct.
    pub explanation: String,
}

impl Artifact for McqQuestion {
    const KIND: ArtifactKind = ArtifactKind::Mcq;
}

/// A fill-in-the-blank question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillBlankQuestion {
    /// Sentence containing [`BLANK_MARKER`].
    pub question: String,
    /// The word or phrase for the blank.
    pub answer: String,
    /// Why the answer is correct.
    pub explanation: String,
}

impl Artifact for FillBlankQuestion {
    const KIND: ArtifactKind = ArtifactKind::FillBlank;
}

/// A content summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Central theme.
    pub main_idea: String,
    /// Takeaways in display order.
    pub key_points: Vec<String>,
}

impl Artifact for Summary {
    const KIND: ArtifactKind = ArtifactKind::Summary;
}

/// One flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Question or concept.
    pub front: String,
    /// Answer or explanation.
    pub back: String,
}

/// An ordered set of flashcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSet {
    /// The cards, in display order.
    pub flashcards: Vec<Flashcard>,
}

impl Artifact for FlashcardSet {
    const KIND: ArtifactKind = ArtifactKind::FlashcardSet;
}
