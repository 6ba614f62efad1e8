// src/store/mod.rs

//! Record store seam.
//!
//! Handlers and the attempt controller only talk to persistence through
//! [`RecordStore`]. `PgStore` backs the running server; `MemoryStore` keeps
//! the same contract in-process for tests and local runs.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::models::{
    assignment::{Assignment, NewAssignment},
    block::{NewBlock, QuestionBlock},
    question::{NewQuestion, Question},
    submission::{BlockSubmission, NewBlockSubmission, StudentSubmission},
    user::{NewUser, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A single-row fetch matched nothing. Carries the entity name.
    NotFound(&'static str),
    /// A unique key or foreign key was violated, or the change would break existing progress.
    Conflict(String),
    /// Anything else from the backend (network, permissions, bad data).
    Database(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "{} not found", what),
            StoreError::Conflict(msg) => write!(f, "conflict: {}", msg),
            StoreError::Database(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row"),
            sqlx::Error::Database(db)
                if db.is_unique_violation() || db.is_foreign_key_violation() =>
            {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    // users
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    // questions
    async fn insert_question(
        &self,
        instructor_id: i64,
        question: NewQuestion,
    ) -> Result<Question, StoreError>;
    async fn get_question(&self, question_id: i64) -> Result<Question, StoreError>;
    async fn list_questions(&self, instructor_id: i64) -> Result<Vec<Question>, StoreError>;
    /// Fetches questions by id. Missing ids are skipped; order is unspecified.
    async fn fetch_questions(&self, ids: &[i64]) -> Result<Vec<Question>, StoreError>;

    // assignments
    async fn insert_assignment(
        &self,
        instructor_id: i64,
        assignment: NewAssignment,
    ) -> Result<Assignment, StoreError>;
    async fn get_assignment(&self, assignment_id: i64) -> Result<Assignment, StoreError>;
    async fn list_assignments_by_instructor(
        &self,
        instructor_id: i64,
    ) -> Result<Vec<Assignment>, StoreError>;
    async fn list_assignments(&self) -> Result<Vec<Assignment>, StoreError>;
    /// Persists name, schedule and override flags. Totals are maintained by block operations.
    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), StoreError>;

    // blocks
    /// Appends a block with the next block number and refreshes the assignment totals.
    async fn insert_block(&self, block: NewBlock) -> Result<QuestionBlock, StoreError>;
    /// Ordered by block number.
    async fn list_blocks(&self, assignment_id: i64) -> Result<Vec<QuestionBlock>, StoreError>;
    /// Removes a block, renumbers the later ones and refreshes the assignment totals.
    /// Fails with `StoreError::Conflict` once any student has a submission for the assignment,
    /// since stored block indexes and scores are positional.
    async fn delete_block(&self, assignment_id: i64, block_id: i64) -> Result<(), StoreError>;

    // student submissions
    /// Single-row fetch: `StoreError::NotFound` when the student has not started yet.
    async fn get_submission(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentSubmission, StoreError>;
    async fn insert_submission(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentSubmission, StoreError>;
    /// Persists the progression pointers, block scores and finished flag.
    async fn update_submission(&self, submission: &StudentSubmission) -> Result<(), StoreError>;
    async fn list_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<StudentSubmission>, StoreError>;

    // block submissions
    /// Fails with `StoreError::Conflict` if the (submission, block, version) was already graded.
    async fn insert_block_submission(
        &self,
        attempt: NewBlockSubmission,
    ) -> Result<BlockSubmission, StoreError>;
    async fn find_block_submission(
        &self,
        submission_id: i64,
        block_id: i64,
        version: i32,
    ) -> Result<Option<BlockSubmission>, StoreError>;
    async fn list_block_submissions(
        &self,
        submission_id: i64,
        block_id: i64,
    ) -> Result<Vec<BlockSubmission>, StoreError>;
}
