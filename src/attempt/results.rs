// src/attempt/results.rs

use serde::{Deserialize, Serialize};

use crate::models::{block::QuestionBlock, submission::StudentSubmission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockResult {
    pub block_number: i32,
    /// Best percent achieved on the block.
    pub score: f64,
    pub points_earned: f64,
    pub total_points: f64,
}

/// Read-only summary of a student's progress through an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResults {
    pub assignment_id: i64,
    pub finished: bool,
    pub blocks_complete: i32,
    pub block_scores: Vec<f64>,
    pub blocks: Vec<BlockResult>,
    pub points_earned: f64,
    pub total_points: f64,
}

/// Pairs recorded block scores with blocks in order.
pub fn summarize(submission: &StudentSubmission, blocks: &[QuestionBlock]) -> AttemptResults {
    let results: Vec<BlockResult> = submission
        .block_scores
        .iter()
        .zip(blocks)
        .map(|(&score, block)| BlockResult {
            block_number: block.block_number,
            score,
            points_earned: score / 100.0 * block.total_points,
            total_points: block.total_points,
        })
        .collect();

    AttemptResults {
        assignment_id: submission.assignment_id,
        finished: submission.finished,
        blocks_complete: submission.blocks_complete,
        block_scores: submission.block_scores.clone(),
        points_earned: results.iter().map(|r| r.points_earned).sum(),
        total_points: blocks.iter().map(|b| b.total_points).sum(),
        blocks: results,
    }
}
