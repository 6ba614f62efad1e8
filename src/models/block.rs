// src/models/block.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'question_blocks' table in the database.
///
/// Block numbers within an assignment are contiguous and start at 1.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionBlock {
    pub block_id: i64,
    pub assignment_id: i64,
    pub block_number: i32,

    /// Ordered question references.
    pub question_ids: Vec<i64>,

    /// Points required to master the block (not a percentage).
    pub mastery_threshold: f64,

    /// Sum of the referenced questions' points.
    pub total_points: f64,
}

impl QuestionBlock {
    /// Mastery threshold as a percentage of the block's points.
    /// A block worth nothing has a 0% threshold and is passed by any attempt.
    pub fn threshold_percent(&self) -> f64 {
        if self.total_points == 0.0 {
            0.0
        } else {
            self.mastery_threshold / self.total_points * 100.0
        }
    }
}

/// DTO for appending a block to an assignment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBlockRequest {
    #[validate(length(min = 1, max = 50))]
    pub question_ids: Vec<i64>,
    #[validate(range(min = 0.0))]
    pub mastery_threshold: f64,
}

/// Insert payload handed to the record store. The store assigns the block number.
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub assignment_id: i64,
    pub question_ids: Vec<i64>,
    pub mastery_threshold: f64,
    pub total_points: f64,
}
