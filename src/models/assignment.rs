// src/models/assignment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Represents the 'assignments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub instructor_id: i64,
    pub name: String,

    pub due_at: Option<DateTime<Utc>>,
    pub assign_at: Option<DateTime<Utc>>,
    pub open_at: Option<DateTime<Utc>>,
    pub close_at: Option<DateTime<Utc>>,

    /// Sum of the blocks' point totals.
    pub total_points: f64,
    pub num_blocks: i32,

    /// Manual overrides. `None` means the flag follows the schedule.
    pub is_open: Option<bool>,
    pub is_assigned: Option<bool>,

    pub created_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Visible to students once assigned, either by override or once `assign_at` has passed.
    pub fn is_assigned_at(&self, now: DateTime<Utc>) -> bool {
        match self.is_assigned {
            Some(flag) => flag,
            None => self.assign_at.is_none_or(|at| at <= now),
        }
    }

    /// Accepting attempts: override wins, otherwise `open_at <= now < close_at`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        match self.is_open {
            Some(flag) => flag,
            None => {
                self.open_at.is_none_or(|at| at <= now) && self.close_at.is_none_or(|at| now < at)
            }
        }
    }
}

/// Tri-state setting for the open/assigned flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSetting {
    On,
    Off,
    /// Drop the override and derive the flag from the schedule.
    Schedule,
}

impl FlagSetting {
    pub fn as_override(self) -> Option<bool> {
        match self {
            FlagSetting::On => Some(true),
            FlagSetting::Off => Some(false),
            FlagSetting::Schedule => None,
        }
    }
}

/// DTO for creating an assignment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_window))]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub assign_at: Option<DateTime<Utc>>,
    pub open_at: Option<DateTime<Utc>>,
    pub close_at: Option<DateTime<Utc>>,
    pub is_open: Option<FlagSetting>,
    pub is_assigned: Option<FlagSetting>,
}

fn validate_window(req: &CreateAssignmentRequest) -> Result<(), ValidationError> {
    check_window(req.open_at, req.close_at)
}

pub fn check_window(
    open_at: Option<DateTime<Utc>>,
    close_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if let (Some(open), Some(close)) = (open_at, close_at) {
        if close <= open {
            return Err(ValidationError::new("close_at_must_follow_open_at"));
        }
    }
    Ok(())
}

/// Reads a present field as `Some(value)`, so an explicit `null` becomes `Some(None)`.
/// Paired with `#[serde(default)]`, an absent field stays `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// DTO for patching an assignment.
/// Absent fields are left unchanged; `null` clears a schedule timestamp.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAssignmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub due_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub assign_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub open_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub close_at: Option<Option<DateTime<Utc>>>,
    pub is_open: Option<FlagSetting>,
    pub is_assigned: Option<FlagSetting>,
}

impl UpdateAssignmentRequest {
    /// Folds the patch into an existing assignment.
    pub fn apply_to(&self, assignment: &mut Assignment) {
        if let Some(name) = &self.name {
            assignment.name = name.clone();
        }
        if let Some(due_at) = self.due_at {
            assignment.due_at = due_at;
        }
        if let Some(assign_at) = self.assign_at {
            assignment.assign_at = assign_at;
        }
        if let Some(open_at) = self.open_at {
            assignment.open_at = open_at;
        }
        if let Some(close_at) = self.close_at {
            assignment.close_at = close_at;
        }
        if let Some(flag) = self.is_open {
            assignment.is_open = flag.as_override();
        }
        if let Some(flag) = self.is_assigned {
            assignment.is_assigned = flag.as_override();
        }
    }
}

/// Insert payload handed to the record store.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub assign_at: Option<DateTime<Utc>>,
    pub open_at: Option<DateTime<Utc>>,
    pub close_at: Option<DateTime<Utc>>,
    pub is_open: Option<bool>,
    pub is_assigned: Option<bool>,
}

impl From<CreateAssignmentRequest> for NewAssignment {
    fn from(req: CreateAssignmentRequest) -> Self {
        Self {
            name: req.name,
            due_at: req.due_at,
            assign_at: req.assign_at,
            open_at: req.open_at,
            close_at: req.close_at,
            is_open: req.is_open.and_then(FlagSetting::as_override),
            is_assigned: req.is_assigned.and_then(FlagSetting::as_override),
        }
    }
}
