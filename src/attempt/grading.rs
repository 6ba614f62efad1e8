// src/attempt/grading.rs

//! Answer grading for one block attempt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::question::{AnswerKind, Question};

/// Result of checking a single answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeOutcome {
    Correct,
    Incorrect,
    /// Free-response answer was not a number. Graded as zero.
    InvalidInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionGrade {
    pub awarded: f64,
    pub outcome: GradeOutcome,
}

impl QuestionGrade {
    fn correct(points: f64) -> Self {
        Self {
            awarded: points,
            outcome: GradeOutcome::Correct,
        }
    }

    fn with_outcome(outcome: GradeOutcome) -> Self {
        Self {
            awarded: 0.0,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockGrade {
    pub grades: Vec<QuestionGrade>,
    pub points_earned: f64,
    pub points_possible: f64,
    pub percent: f64,
}

impl BlockGrade {
    pub fn awarded(&self) -> Vec<f64> {
        self.grades.iter().map(|g| g.awarded).collect()
    }
}

/// String form used for multiple-choice comparison: `1` and `"1"` both become `"1"`.
pub fn normalize_answer(answer: &Value) -> String {
    match answer {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads a free-response answer as a finite number.
pub fn parse_numeric(answer: &Value) -> Option<f64> {
    let value = match answer {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Exclusive bounds: an answer exactly at `solution ± margin` is not accepted.
pub fn within_margin(answer: f64, solution: f64, margin: f64) -> bool {
    solution - margin < answer && answer < solution + margin
}

pub fn percent(points_earned: f64, points_possible: f64) -> f64 {
    if points_possible == 0.0 {
        0.0
    } else {
        points_earned / points_possible * 100.0
    }
}

pub fn grade_question(question: &Question, version: usize, answer: &Value) -> QuestionGrade {
    let content = question.version(version);

    match content.answer_kind() {
        AnswerKind::MultipleChoice { .. } => {
            if normalize_answer(answer) == content.solution.trim() {
                QuestionGrade::correct(question.points)
            } else {
                QuestionGrade::with_outcome(GradeOutcome::Incorrect)
            }
        }
        AnswerKind::Numeric { margin } => {
            let Some(value) = parse_numeric(answer) else {
                return QuestionGrade::with_outcome(GradeOutcome::InvalidInput);
            };
            let Ok(solution) = content.solution.trim().parse::<f64>() else {
                tracing::warn!(
                    question_id = question.question_id,
                    version,
                    "Stored solution is not numeric; grading as incorrect"
                );
                return QuestionGrade::with_outcome(GradeOutcome::Incorrect);
            };
            if within_margin(value, solution, margin) {
                QuestionGrade::correct(question.points)
            } else {
                QuestionGrade::with_outcome(GradeOutcome::Incorrect)
            }
        }
    }
}

/// Grades answers positionally against the block's questions.
/// A missing answer slot is graded like an empty one.
pub fn grade_block(questions: &[Question], version: usize, answers: &[Value]) -> BlockGrade {
    let grades: Vec<QuestionGrade> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| grade_question(q, version, answers.get(i).unwrap_or(&Value::Null)))
        .collect();

    let points_earned = grades.iter().map(|g| g.awarded).sum();
    let points_possible = questions.iter().map(|q| q.points).sum();

    BlockGrade {
        percent: percent(points_earned, points_possible),
        grades,
        points_earned,
        points_possible,
    }
}
