// src/attempt/progression.rs

//! Mastery progression: retry another version, move to the next block, or finish.

use serde::{Deserialize, Serialize};

use crate::models::{
    question::VERSION_COUNT,
    submission::{BlockSubmission, StudentSubmission},
};

/// What to do after a graded attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Below threshold with versions left: same block, next version.
    Retry,
    /// Block done (mastered or out of versions), more blocks follow.
    NextBlock,
    /// Block done and it was the last one.
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Retry { version: i32 },
    /// `mastered` is false when the student ran out of versions.
    Complete { mastered: bool },
}

pub fn next_step(current_version: i32, percent: f64, threshold_percent: f64) -> Step {
    if percent >= threshold_percent {
        return Step::Complete { mastered: true };
    }
    if ((current_version + 1) as usize) < VERSION_COUNT {
        Step::Retry {
            version: current_version + 1,
        }
    } else {
        Step::Complete { mastered: false }
    }
}

pub fn is_last_block(current_block: i32, block_count: usize) -> bool {
    (current_block + 1) as usize >= block_count
}

/// Preview of what `advance` will do, shown alongside feedback.
pub fn preview(
    submission: &StudentSubmission,
    percent: f64,
    threshold_percent: f64,
    block_count: usize,
) -> NextAction {
    match next_step(submission.current_version, percent, threshold_percent) {
        Step::Retry { .. } => NextAction::Retry,
        Step::Complete { .. } if is_last_block(submission.current_block, block_count) => {
            NextAction::Finish
        }
        Step::Complete { .. } => NextAction::NextBlock,
    }
}

/// Highest score across every graded version of a block.
pub fn best_score(attempts: &[BlockSubmission]) -> f64 {
    attempts.iter().map(|a| a.score).fold(0.0, f64::max)
}

/// Moves to the next version of the current block.
pub fn retry(submission: &mut StudentSubmission, version: i32) {
    debug_assert!(version > submission.current_version);
    submission.current_version = version;
}

/// Records the block's best score and moves past it.
/// Returns `NextAction::Finish` when the assignment is complete.
pub fn complete_block(
    submission: &mut StudentSubmission,
    best: f64,
    block_count: usize,
) -> NextAction {
    submission.block_scores.push(best);
    submission.blocks_complete += 1;

    if is_last_block(submission.current_block, block_count) {
        submission.finished = true;
        NextAction::Finish
    } else {
        submission.current_block += 1;
        submission.current_version = 0;
        NextAction::NextBlock
    }
}
