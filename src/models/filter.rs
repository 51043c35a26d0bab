use std::fmt;
use std::str::FromStr;

use crate::models::{ParseValueError, todo::Priority};

/// Criteria used to derive the visible todo list of the active project.
///
/// This is view state: it is owned by the application context and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub status: StatusFilter,
    /// `None` keeps every priority
    pub priority: Option<Priority>,
    /// Empty keeps every tag
    pub tag: String,
    /// Case-insensitive substring matched against title and description
    pub search: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            priority: None,
            tag: String::new(),
            search: String::new(),
            sort_field: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl FilterSpec {
    /// Switches to manual ordering, as done after a drag reorder
    pub fn use_manual_order(&mut self) {
        self.sort_field = SortField::Position;
        self.sort_order = SortOrder::Asc;
    }

    pub fn is_manual_order(&self) -> bool {
        self.sort_field == SortField::Position && self.sort_order == SortOrder::Asc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Position,
    #[default]
    CreatedAt,
    UpdatedAt,
    Priority,
    Deadline,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl StatusFilter {
    pub const NAMES: &'static [&'static str] = &["all", "active", "completed"];
}

impl SortField {
    pub const NAMES: &'static [&'static str] = &[
        "position",
        "createdAt",
        "updatedAt",
        "priority",
        "deadline",
        "title",
    ];
}

impl SortOrder {
    pub const NAMES: &'static [&'static str] = &["asc", "desc"];
}

impl FromStr for StatusFilter {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            _ => Err(ParseValueError {
                kind: "status",
                value: s.to_string(),
                expected: StatusFilter::NAMES,
            }),
        }
    }
}

impl FromStr for SortField {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both the camelCase literals and kebab-case spellings from the shell
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "position" => Ok(SortField::Position),
            "createdat" | "created" => Ok(SortField::CreatedAt),
            "updatedat" | "updated" => Ok(SortField::UpdatedAt),
            "priority" => Ok(SortField::Priority),
            "deadline" => Ok(SortField::Deadline),
            "title" => Ok(SortField::Title),
            _ => Err(ParseValueError {
                kind: "sort field",
                value: s.to_string(),
                expected: SortField::NAMES,
            }),
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ParseValueError {
                kind: "sort order",
                value: s.to_string(),
                expected: SortOrder::NAMES,
            }),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::Position => "position",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::Priority => "priority",
            SortField::Deadline => "deadline",
            SortField::Title => "title",
        };
        f.write_str(name)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_sort_newest_first() {
        let filters = FilterSpec::default();
        assert_eq!(filters.status, StatusFilter::All);
        assert_eq!(filters.priority, None);
        assert_eq!(filters.sort_field, SortField::CreatedAt);
        assert_eq!(filters.sort_order, SortOrder::Desc);
        assert!(!filters.is_manual_order());
    }

    #[test]
    fn test_use_manual_order() {
        let mut filters = FilterSpec {
            sort_field: SortField::Title,
            ..FilterSpec::default()
        };
        filters.use_manual_order();
        assert!(filters.is_manual_order());
    }

    #[test]
    fn test_sort_field_parses_literals_and_shell_spellings() {
        assert_eq!("createdAt".parse::<SortField>().unwrap(), SortField::CreatedAt);
        assert_eq!("updated-at".parse::<SortField>().unwrap(), SortField::UpdatedAt);
        assert!("size".parse::<SortField>().is_err());
        assert_eq!(SortField::CreatedAt.to_string(), "createdAt");
    }
}
