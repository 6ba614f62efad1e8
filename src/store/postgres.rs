// src/store/postgres.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool, types::Json};

use super::{RecordStore, StoreError};
use crate::models::{
    assignment::{Assignment, NewAssignment},
    block::{NewBlock, QuestionBlock},
    question::{NewQuestion, Question},
    submission::{BlockSubmission, NewBlockSubmission, StudentSubmission},
    user::{NewUser, User},
};

const QUESTION_COLUMNS: &str = r#"
    question_id, instructor_id, points,
    question_body, solutions, feedback,
    question_image, feedback_images, feedback_videos,
    mcq_options, frq_err_marg, created_at
"#;

const ASSIGNMENT_COLUMNS: &str = r#"
    id, instructor_id, name, due_at, assign_at, open_at, close_at,
    total_points, num_blocks, is_open, is_assigned, created_at
"#;

const SUBMISSION_COLUMNS: &str = r#"
    submission_id, student_id, assignment_id, current_block, current_version,
    blocks_complete, finished, block_scores, updated_at
"#;

const BLOCK_SUBMISSION_COLUMNS: &str = r#"
    id, submission_id, student_id, block_id, block_version, answers, grade, score, created_at
"#;

/// Row shape of 'questions'. Per-version arrays are stored as JSONB.
#[derive(FromRow)]
struct QuestionRow {
    question_id: i64,
    instructor_id: i64,
    points: f64,
    question_body: Json<Vec<String>>,
    solutions: Json<Vec<String>>,
    feedback: Json<Vec<String>>,
    question_image: Json<Vec<Option<String>>>,
    feedback_images: Json<Vec<Option<String>>>,
    feedback_videos: Json<Vec<Option<String>>>,
    mcq_options: Json<Vec<Vec<String>>>,
    frq_err_marg: Json<Vec<Option<f64>>>,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            question_id: row.question_id,
            instructor_id: row.instructor_id,
            points: row.points,
            question_body: row.question_body.0,
            solutions: row.solutions.0,
            feedback: row.feedback.0,
            question_image: row.question_image.0,
            feedback_images: row.feedback_images.0,
            feedback_videos: row.feedback_videos.0,
            mcq_options: row.mcq_options.0,
            frq_err_marg: row.frq_err_marg.0,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct BlockSubmissionRow {
    id: i64,
    submission_id: i64,
    student_id: i64,
    block_id: i64,
    block_version: i32,
    answers: Json<Vec<Value>>,
    grade: Vec<f64>,
    score: f64,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<BlockSubmissionRow> for BlockSubmission {
    fn from(row: BlockSubmissionRow) -> Self {
        Self {
            id: row.id,
            submission_id: row.submission_id,
            student_id: row.student_id,
            block_id: row.block_id,
            block_version: row.block_version,
            answers: row.answers.0,
            grade: row.grade,
            score: row.score,
            created_at: row.created_at,
        }
    }
}

/// Postgres-backed record store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Recomputes `num_blocks` and `total_points` for an assignment.
async fn refresh_assignment_totals(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    assignment_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE assignments SET
            num_blocks = (SELECT COUNT(*) FROM question_blocks WHERE assignment_id = $1),
            total_points = (SELECT COALESCE(SUM(total_points), 0) FROM question_blocks WHERE assignment_id = $1)
        WHERE id = $1
        "#,
    )
    .bind(assignment_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn not_found(what: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| match e {
        sqlx::Error::RowNotFound => StoreError::NotFound(what),
        other => StoreError::from(other),
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_question(
        &self,
        instructor_id: i64,
        question: NewQuestion,
    ) -> Result<Question, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO questions (
                instructor_id, points, question_body, solutions, feedback,
                question_image, feedback_images, feedback_videos, mcq_options, frq_err_marg
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            QUESTION_COLUMNS
        );
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(instructor_id)
            .bind(question.points)
            .bind(Json(question.question_body))
            .bind(Json(question.solutions))
            .bind(Json(question.feedback))
            .bind(Json(question.question_image))
            .bind(Json(question.feedback_images))
            .bind(Json(question.feedback_videos))
            .bind(Json(question.mcq_options))
            .bind(Json(question.frq_err_marg))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_question(&self, question_id: i64) -> Result<Question, StoreError> {
        let sql = format!("SELECT {} FROM questions WHERE question_id = $1", QUESTION_COLUMNS);
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(question_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found("Question"))?;
        Ok(row.into())
    }

    async fn list_questions(&self, instructor_id: i64) -> Result<Vec<Question>, StoreError> {
        let sql = format!(
            "SELECT {} FROM questions WHERE instructor_id = $1 ORDER BY question_id DESC",
            QUESTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(instructor_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn fetch_questions(&self, ids: &[i64]) -> Result<Vec<Question>, StoreError> {
        let sql = format!(
            "SELECT {} FROM questions WHERE question_id = ANY($1)",
            QUESTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn insert_assignment(
        &self,
        instructor_id: i64,
        assignment: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO assignments
                (instructor_id, name, due_at, assign_at, open_at, close_at, is_open, is_assigned)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Assignment>(&sql)
            .bind(instructor_id)
            .bind(&assignment.name)
            .bind(assignment.due_at)
            .bind(assignment.assign_at)
            .bind(assignment.open_at)
            .bind(assignment.close_at)
            .bind(assignment.is_open)
            .bind(assignment.is_assigned)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_assignment(&self, assignment_id: i64) -> Result<Assignment, StoreError> {
        let sql = format!("SELECT {} FROM assignments WHERE id = $1", ASSIGNMENT_COLUMNS);
        sqlx::query_as::<_, Assignment>(&sql)
            .bind(assignment_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found("Assignment"))
    }

    async fn list_assignments_by_instructor(
        &self,
        instructor_id: i64,
    ) -> Result<Vec<Assignment>, StoreError> {
        let sql = format!(
            "SELECT {} FROM assignments WHERE instructor_id = $1 ORDER BY id DESC",
            ASSIGNMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Assignment>(&sql)
            .bind(instructor_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>, StoreError> {
        let sql = format!("SELECT {} FROM assignments ORDER BY id DESC", ASSIGNMENT_COLUMNS);
        let rows = sqlx::query_as::<_, Assignment>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE assignments SET
                name = $2, due_at = $3, assign_at = $4, open_at = $5, close_at = $6,
                is_open = $7, is_assigned = $8
            WHERE id = $1
            "#,
        )
        .bind(assignment.id)
        .bind(&assignment.name)
        .bind(assignment.due_at)
        .bind(assignment.assign_at)
        .bind(assignment.open_at)
        .bind(assignment.close_at)
        .bind(assignment.is_open)
        .bind(assignment.is_assigned)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Assignment"));
        }
        Ok(())
    }

    async fn insert_block(&self, block: NewBlock) -> Result<QuestionBlock, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serialize block appends per assignment.
        sqlx::query("SELECT id FROM assignments WHERE id = $1 FOR UPDATE")
            .bind(block.assignment_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(not_found("Assignment"))?;

        let row = sqlx::query_as::<_, QuestionBlock>(
            r#"
            INSERT INTO question_blocks
                (assignment_id, block_number, question_ids, mastery_threshold, total_points)
            VALUES (
                $1,
                (SELECT COALESCE(MAX(block_number), 0) + 1 FROM question_blocks WHERE assignment_id = $1),
                $2, $3, $4
            )
            RETURNING block_id, assignment_id, block_number, question_ids, mastery_threshold, total_points
            "#,
        )
        .bind(block.assignment_id)
        .bind(&block.question_ids)
        .bind(block.mastery_threshold)
        .bind(block.total_points)
        .fetch_one(&mut *tx)
        .await?;

        refresh_assignment_totals(&mut tx, block.assignment_id).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_blocks(&self, assignment_id: i64) -> Result<Vec<QuestionBlock>, StoreError> {
        let rows = sqlx::query_as::<_, QuestionBlock>(
            r#"
            SELECT block_id, assignment_id, block_number, question_ids, mastery_threshold, total_points
            FROM question_blocks
            WHERE assignment_id = $1
            ORDER BY block_number
            "#,
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_block(&self, assignment_id: i64, block_id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Held until commit; `insert_submission` takes a share lock on the same row.
        sqlx::query("SELECT id FROM assignments WHERE id = $1 FOR UPDATE")
            .bind(assignment_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(not_found("Assignment"))?;

        let (started,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM student_submissions WHERE assignment_id = $1)",
        )
        .bind(assignment_id)
        .fetch_one(&mut *tx)
        .await?;
        if started {
            return Err(StoreError::Conflict(
                "students have already started this assignment".to_string(),
            ));
        }

        let removed: (i32,) = sqlx::query_as(
            "DELETE FROM question_blocks WHERE block_id = $1 AND assignment_id = $2 RETURNING block_number",
        )
        .bind(block_id)
        .bind(assignment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(not_found("Block"))?;

        sqlx::query(
            r#"
            UPDATE question_blocks SET block_number = block_number - 1
            WHERE assignment_id = $1 AND block_number > $2
            "#,
        )
        .bind(assignment_id)
        .bind(removed.0)
        .execute(&mut *tx)
        .await?;

        refresh_assignment_totals(&mut tx, assignment_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_submission(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentSubmission, StoreError> {
        let sql = format!(
            "SELECT {} FROM student_submissions WHERE student_id = $1 AND assignment_id = $2",
            SUBMISSION_COLUMNS
        );
        sqlx::query_as::<_, StudentSubmission>(&sql)
            .bind(student_id)
            .bind(assignment_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found("Submission"))
    }

    async fn insert_submission(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentSubmission, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO student_submissions (student_id, assignment_id)
            VALUES ($1, $2)
            RETURNING {}
            "#,
            SUBMISSION_COLUMNS
        );
        let mut tx = self.pool.begin().await?;

        // Blocks cannot be removed while a submission is being created.
        sqlx::query("SELECT id FROM assignments WHERE id = $1 FOR SHARE")
            .bind(assignment_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(not_found("Assignment"))?;

        let row = sqlx::query_as::<_, StudentSubmission>(&sql)
            .bind(student_id)
            .bind(assignment_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn update_submission(&self, submission: &StudentSubmission) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE student_submissions SET
                current_block = $2,
                current_version = $3,
                blocks_complete = $4,
                finished = $5,
                block_scores = $6,
                updated_at = NOW()
            WHERE submission_id = $1
            "#,
        )
        .bind(submission.submission_id)
        .bind(submission.current_block)
        .bind(submission.current_version)
        .bind(submission.blocks_complete)
        .bind(submission.finished)
        .bind(&submission.block_scores)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Submission"));
        }
        Ok(())
    }

    async fn list_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<StudentSubmission>, StoreError> {
        let sql = format!(
            "SELECT {} FROM student_submissions WHERE assignment_id = $1 ORDER BY student_id",
            SUBMISSION_COLUMNS
        );
        let rows = sqlx::query_as::<_, StudentSubmission>(&sql)
            .bind(assignment_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_block_submission(
        &self,
        attempt: NewBlockSubmission,
    ) -> Result<BlockSubmission, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO block_submissions
                (submission_id, student_id, block_id, block_version, answers, grade, score)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BLOCK_SUBMISSION_COLUMNS
        );
        let row = sqlx::query_as::<_, BlockSubmissionRow>(&sql)
            .bind(attempt.submission_id)
            .bind(attempt.student_id)
            .bind(attempt.block_id)
            .bind(attempt.block_version)
            .bind(Json(attempt.answers))
            .bind(&attempt.grade)
            .bind(attempt.score)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_block_submission(
        &self,
        submission_id: i64,
        block_id: i64,
        version: i32,
    ) -> Result<Option<BlockSubmission>, StoreError> {
        let sql = format!(
            r#"
            SELECT {} FROM block_submissions
            WHERE submission_id = $1 AND block_id = $2 AND block_version = $3
            "#,
            BLOCK_SUBMISSION_COLUMNS
        );
        let row = sqlx::query_as::<_, BlockSubmissionRow>(&sql)
            .bind(submission_id)
            .bind(block_id)
            .bind(version)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(BlockSubmission::from))
    }

    async fn list_block_submissions(
        &self,
        submission_id: i64,
        block_id: i64,
    ) -> Result<Vec<BlockSubmission>, StoreError> {
        let sql = format!(
            r#"
            SELECT {} FROM block_submissions
            WHERE submission_id = $1 AND block_id = $2
            ORDER BY block_version
            "#,
            BLOCK_SUBMISSION_COLUMNS
        );
        let rows = sqlx::query_as::<_, BlockSubmissionRow>(&sql)
            .bind(submission_id)
            .bind(block_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BlockSubmission::from).collect())
    }
}
