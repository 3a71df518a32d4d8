//! Entity and association domain model.
//!
//! # Responsibility
//! - Map each entity kind to its storage table.
//! - Map each association kind to its link table and link column.
//! - Provide name normalization shared by every write path.
//!
//! # Invariants
//! - `AssociationKind` is closed: the four tags `verb|attribute|state|routine`
//!   are the only accepted wire values.
//! - Association sets inside `ObjectRecord` are ordered by entity id.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-generated identifier shared by all entity kinds.
pub type EntityId = i64;

/// One of the five entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Object,
    Verb,
    Attribute,
    State,
    Routine,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Object,
        EntityKind::Verb,
        EntityKind::Attribute,
        EntityKind::State,
        EntityKind::Routine,
    ];

    /// Storage table, also used as the HTTP collection segment.
    pub fn table(self) -> &'static str {
        match self {
            Self::Object => "objects",
            Self::Verb => "verbs",
            Self::Attribute => "attributes",
            Self::State => "states",
            Self::Routine => "routines",
        }
    }

    /// Capitalized label used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Verb => "Verb",
            Self::Attribute => "Attribute",
            Self::State => "State",
            Self::Routine => "Routine",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of entity an object can be linked to.
///
/// Each variant owns one link table `object_<kind>s(object_id, <kind>_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    Verb,
    Attribute,
    State,
    Routine,
}

impl AssociationKind {
    pub const ALL: [AssociationKind; 4] = [
        AssociationKind::Verb,
        AssociationKind::Attribute,
        AssociationKind::State,
        AssociationKind::Routine,
    ];

    /// Wire tag accepted in `{"type": ...}` payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verb => "verb",
            Self::Attribute => "attribute",
            Self::State => "state",
            Self::Routine => "routine",
        }
    }

    /// Entity collection holding the link targets.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            Self::Verb => EntityKind::Verb,
            Self::Attribute => EntityKind::Attribute,
            Self::State => EntityKind::State,
            Self::Routine => EntityKind::Routine,
        }
    }

    pub fn link_table(self) -> &'static str {
        match self {
            Self::Verb => "object_verbs",
            Self::Attribute => "object_attributes",
            Self::State => "object_states",
            Self::Routine => "object_routines",
        }
    }

    pub fn link_column(self) -> &'static str {
        match self {
            Self::Verb => "verb_id",
            Self::Attribute => "attribute_id",
            Self::State => "state_id",
            Self::Routine => "routine_id",
        }
    }
}

impl Display for AssociationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssociationKind {
    type Err = UnknownAssociationKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "verb" => Ok(Self::Verb),
            "attribute" => Ok(Self::Attribute),
            "state" => Ok(Self::State),
            "routine" => Ok(Self::Routine),
            other => Err(UnknownAssociationKind(other.to_string())),
        }
    }
}

/// Raised when a wire tag does not name one of the four association kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAssociationKind(pub String);

impl Display for UnknownAssociationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid association type `{}`; expected verb|attribute|state|routine",
            self.0
        )
    }
}

impl Error for UnknownAssociationKind {}

/// Leaf record shape shared by every entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
}

/// Object read model including its four association sets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub id: EntityId,
    pub name: String,
    pub verbs: Vec<Entity>,
    pub attributes: Vec<Entity>,
    pub states: Vec<Entity>,
    pub routines: Vec<Entity>,
}

impl ObjectRecord {
    /// Creates a record with empty association sets.
    pub fn bare(entity: Entity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            ..Self::default()
        }
    }

    /// Returns the association set for `kind`.
    pub fn associations(&self, kind: AssociationKind) -> &[Entity] {
        match kind {
            AssociationKind::Verb => &self.verbs,
            AssociationKind::Attribute => &self.attributes,
            AssociationKind::State => &self.states,
            AssociationKind::Routine => &self.routines,
        }
    }

    pub fn associations_mut(&mut self, kind: AssociationKind) -> &mut Vec<Entity> {
        match kind {
            AssociationKind::Verb => &mut self.verbs,
            AssociationKind::Attribute => &mut self.attributes,
            AssociationKind::State => &mut self.states,
            AssociationKind::Routine => &mut self.routines,
        }
    }

    pub fn is_associated(&self, kind: AssociationKind, target_id: EntityId) -> bool {
        self.associations(kind)
            .iter()
            .any(|entity| entity.id == target_id)
    }
}

/// Validation failures for entity names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    /// Name is empty after trimming whitespace.
    Blank,
}

impl Display for NameValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "name must not be blank"),
        }
    }
}

impl Error for NameValidationError {}

/// Trims `name` and rejects blank values.
pub fn normalize_name(name: &str) -> Result<String, NameValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NameValidationError::Blank);
    }
    Ok(trimmed.to_string())
}
