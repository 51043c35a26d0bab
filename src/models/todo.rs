use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::ParseValueError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// UUID to identify the todo
    pub id: Uuid,
    /// The project owning this todo, never reassigned
    pub project_id: Uuid,
    /// Title of the todo
    pub title: String,
    /// Description of the todo, may be empty
    #[serde(default)]
    pub description: String,
    /// Whether the todo is done
    #[serde(default)]
    pub completed: bool,
    /// Priority of the todo
    #[serde(default)]
    pub priority: Priority,
    /// Optional deadline
    #[serde(default, deserialize_with = "deser_deadline")]
    pub deadline: Option<Date>,
    /// Tags of the todo, in insertion order
    #[serde(default)]
    pub tags: Vec<String>,
    /// Manual order among the todos of the same project
    pub position: u32,
    /// When the todo was created
    pub created_at: Timestamp,
    /// When any field of the todo last changed
    pub updated_at: Timestamp,
}

/// Reads a deadline stored either as a calendar date (`2025-03-01`) or as a full
/// timestamp (`2025-03-01T00:00:00.000Z`). Timestamps keep their UTC date.
fn parse_stored_deadline(value: &str) -> Result<Date, jiff::Error> {
    match value.parse::<Timestamp>() {
        Ok(timestamp) => Ok(timestamp.to_zoned(TimeZone::UTC).date()),
        Err(_) => value.parse::<Date>(),
    }
}

fn deser_deadline<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|value| parse_stored_deadline(&value).map_err(serde::de::Error::custom))
        .transpose()
}

impl Todo {
    /// A todo is overdue when it is still open and its deadline lies before `today`
    pub fn is_overdue(&self, today: Date) -> bool {
        !self.completed && self.deadline.is_some_and(|deadline| deadline < today)
    }

    pub(crate) fn apply(&mut self, changes: TodoChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(deadline) = changes.deadline {
            self.deadline = deadline;
        }
        if let Some(tags) = changes.tags {
            self.tags = tags;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
    }
}

/// Fields supplied when creating a todo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub deadline: Option<Date>,
    pub tags: Vec<String>,
}

/// Partial update of a todo. `None` leaves the field untouched.
///
/// Identity fields (`id`, `project_id`, `created_at`) are not representable here,
/// so an update can never reassign them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the deadline
    pub deadline: Option<Option<Date>>,
    pub tags: Option<Vec<String>>,
    pub completed: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const NAMES: &'static [&'static str] = &["high", "medium", "low"];

    /// Ordinal used for sorting: high < medium < low
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(ParseValueError {
                kind: "priority",
                value: s.to_string(),
                expected: Priority::NAMES,
            }),
        }
    }
}
