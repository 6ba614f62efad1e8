// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Represents the 'student_submissions' table in the database.
/// One row per (student, assignment), created lazily on first access.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct StudentSubmission {
    pub submission_id: i64,
    pub student_id: i64,
    pub assignment_id: i64,

    /// 0-based index into the assignment's blocks ordered by block number.
    pub current_block: i32,
    /// 0..=3
    pub current_version: i32,
    pub blocks_complete: i32,
    pub finished: bool,

    /// Best percent per completed block, in completion order.
    pub block_scores: Vec<f64>,

    pub updated_at: Option<DateTime<Utc>>,
}

/// One graded attempt at a (block, version).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSubmission {
    pub id: i64,
    pub submission_id: i64,
    pub student_id: i64,
    pub block_id: i64,
    pub block_version: i32,

    /// Raw answers as submitted, one slot per question.
    pub answers: Vec<Value>,
    /// Awarded points per question.
    pub grade: Vec<f64>,
    /// Percentage of the block's points earned.
    pub score: f64,

    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload handed to the record store.
#[derive(Debug, Clone)]
pub struct NewBlockSubmission {
    pub submission_id: i64,
    pub student_id: i64,
    pub block_id: i64,
    pub block_version: i32,
    pub answers: Vec<Value>,
    pub grade: Vec<f64>,
    pub score: f64,
}

/// DTO for submitting answers to the current block.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswersRequest {
    /// One slot per question; numbers and strings are both accepted.
    pub answers: Vec<Value>,
}
