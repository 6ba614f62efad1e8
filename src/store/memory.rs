// src/store/memory.rs

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{RecordStore, StoreError};
use crate::models::{
    assignment::{Assignment, NewAssignment},
    block::{NewBlock, QuestionBlock},
    question::{NewQuestion, Question},
    submission::{BlockSubmission, NewBlockSubmission, StudentSubmission},
    user::{NewUser, User},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    questions: Vec<Question>,
    assignments: Vec<Assignment>,
    blocks: Vec<QuestionBlock>,
    submissions: Vec<StudentSubmission>,
    block_submissions: Vec<BlockSubmission>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn refresh_assignment_totals(&mut self, assignment_id: i64) {
        let (count, total) = self
            .blocks
            .iter()
            .filter(|b| b.assignment_id == assignment_id)
            .fold((0, 0.0), |(n, sum), b| (n + 1, sum + b.total_points));

        if let Some(a) = self.assignments.iter_mut().find(|a| a.id == assignment_id) {
            a.num_blocks = count;
            a.total_points = total;
        }
    }
}

/// In-process record store with the same semantics as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.lock()?;
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        let row = User {
            id: t.next_id(),
            username: user.username,
            password: user.password_hash,
            role: user.role,
            created_at: Some(Utc::now()),
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let t = self.lock()?;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_question(
        &self,
        instructor_id: i64,
        question: NewQuestion,
    ) -> Result<Question, StoreError> {
        let mut t = self.lock()?;
        let row = Question {
            question_id: t.next_id(),
            instructor_id,
            points: question.points,
            question_body: question.question_body,
            solutions: question.solutions,
            feedback: question.feedback,
            question_image: question.question_image,
            feedback_images: question.feedback_images,
            feedback_videos: question.feedback_videos,
            mcq_options: question.mcq_options,
            frq_err_marg: question.frq_err_marg,
            created_at: Some(Utc::now()),
        };
        t.questions.push(row.clone());
        Ok(row)
    }

    async fn get_question(&self, question_id: i64) -> Result<Question, StoreError> {
        let t = self.lock()?;
        t.questions
            .iter()
            .find(|q| q.question_id == question_id)
            .cloned()
            .ok_or(StoreError::NotFound("Question"))
    }

    async fn list_questions(&self, instructor_id: i64) -> Result<Vec<Question>, StoreError> {
        let t = self.lock()?;
        Ok(t.questions
            .iter()
            .filter(|q| q.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    async fn fetch_questions(&self, ids: &[i64]) -> Result<Vec<Question>, StoreError> {
        let t = self.lock()?;
        Ok(t.questions
            .iter()
            .filter(|q| ids.contains(&q.question_id))
            .cloned()
            .collect())
    }

    async fn insert_assignment(
        &self,
        instructor_id: i64,
        assignment: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        let mut t = self.lock()?;
        let row = Assignment {
            id: t.next_id(),
            instructor_id,
            name: assignment.name,
            due_at: assignment.due_at,
            assign_at: assignment.assign_at,
            open_at: assignment.open_at,
            close_at: assignment.close_at,
            total_points: 0.0,
            num_blocks: 0,
            is_open: assignment.is_open,
            is_assigned: assignment.is_assigned,
            created_at: Some(Utc::now()),
        };
        t.assignments.push(row.clone());
        Ok(row)
    }

    async fn get_assignment(&self, assignment_id: i64) -> Result<Assignment, StoreError> {
        let t = self.lock()?;
        t.assignments
            .iter()
            .find(|a| a.id == assignment_id)
            .cloned()
            .ok_or(StoreError::NotFound("Assignment"))
    }

    async fn list_assignments_by_instructor(
        &self,
        instructor_id: i64,
    ) -> Result<Vec<Assignment>, StoreError> {
        let t = self.lock()?;
        Ok(t.assignments
            .iter()
            .filter(|a| a.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>, StoreError> {
        let t = self.lock()?;
        Ok(t.assignments.clone())
    }

    async fn update_assignment(&self, assignment: &Assignment) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        let row = t
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment.id)
            .ok_or(StoreError::NotFound("Assignment"))?;
        row.name = assignment.name.clone();
        row.due_at = assignment.due_at;
        row.assign_at = assignment.assign_at;
        row.open_at = assignment.open_at;
        row.close_at = assignment.close_at;
        row.is_open = assignment.is_open;
        row.is_assigned = assignment.is_assigned;
        Ok(())
    }

    async fn insert_block(&self, block: NewBlock) -> Result<QuestionBlock, StoreError> {
        let mut t = self.lock()?;
        if !t.assignments.iter().any(|a| a.id == block.assignment_id) {
            return Err(StoreError::NotFound("Assignment"));
        }
        let block_number = t
            .blocks
            .iter()
            .filter(|b| b.assignment_id == block.assignment_id)
            .count() as i32
            + 1;
        let row = QuestionBlock {
            block_id: t.next_id(),
            assignment_id: block.assignment_id,
            block_number,
            question_ids: block.question_ids,
            mastery_threshold: block.mastery_threshold,
            total_points: block.total_points,
        };
        t.blocks.push(row.clone());
        t.refresh_assignment_totals(block.assignment_id);
        Ok(row)
    }

    async fn list_blocks(&self, assignment_id: i64) -> Result<Vec<QuestionBlock>, StoreError> {
        let t = self.lock()?;
        let mut blocks: Vec<QuestionBlock> = t
            .blocks
            .iter()
            .filter(|b| b.assignment_id == assignment_id)
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.block_number);
        Ok(blocks)
    }

    async fn delete_block(&self, assignment_id: i64, block_id: i64) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        if t.submissions.iter().any(|s| s.assignment_id == assignment_id) {
            return Err(StoreError::Conflict(
                "students have already started this assignment".to_string(),
            ));
        }
        let position = t
            .blocks
            .iter()
            .position(|b| b.block_id == block_id && b.assignment_id == assignment_id)
            .ok_or(StoreError::NotFound("Block"))?;
        let removed = t.blocks.remove(position);

        for b in t.blocks.iter_mut() {
            if b.assignment_id == assignment_id && b.block_number > removed.block_number {
                b.block_number -= 1;
            }
        }
        t.refresh_assignment_totals(assignment_id);
        Ok(())
    }

    async fn get_submission(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentSubmission, StoreError> {
        let t = self.lock()?;
        let mut matches = t
            .submissions
            .iter()
            .filter(|s| s.student_id == student_id && s.assignment_id == assignment_id);
        match (matches.next(), matches.next()) {
            (Some(row), None) => Ok(row.clone()),
            (None, _) => Err(StoreError::NotFound("Submission")),
            (Some(_), Some(_)) => Err(StoreError::Database(
                "multiple submissions for one student and assignment".to_string(),
            )),
        }
    }

    async fn insert_submission(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentSubmission, StoreError> {
        let mut t = self.lock()?;
        if t
            .submissions
            .iter()
            .any(|s| s.student_id == student_id && s.assignment_id == assignment_id)
        {
            return Err(StoreError::Conflict("submission already exists".to_string()));
        }
        let row = StudentSubmission {
            submission_id: t.next_id(),
            student_id,
            assignment_id,
            current_block: 0,
            current_version: 0,
            blocks_complete: 0,
            finished: false,
            block_scores: Vec::new(),
            updated_at: Some(Utc::now()),
        };
        t.submissions.push(row.clone());
        Ok(row)
    }

    async fn update_submission(&self, submission: &StudentSubmission) -> Result<(), StoreError> {
        let mut t = self.lock()?;
        let row = t
            .submissions
            .iter_mut()
            .find(|s| s.submission_id == submission.submission_id)
            .ok_or(StoreError::NotFound("Submission"))?;
        row.current_block = submission.current_block;
        row.current_version = submission.current_version;
        row.blocks_complete = submission.blocks_complete;
        row.finished = submission.finished;
        row.block_scores = submission.block_scores.clone();
        row.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn list_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<StudentSubmission>, StoreError> {
        let t = self.lock()?;
        Ok(t.submissions
            .iter()
            .filter(|s| s.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn insert_block_submission(
        &self,
        attempt: NewBlockSubmission,
    ) -> Result<BlockSubmission, StoreError> {
        let mut t = self.lock()?;
        if t.block_submissions.iter().any(|b| {
            b.submission_id == attempt.submission_id
                && b.block_id == attempt.block_id
                && b.block_version == attempt.block_version
        }) {
            return Err(StoreError::Conflict(
                "this block version was already graded".to_string(),
            ));
        }
        let row = BlockSubmission {
            id: t.next_id(),
            submission_id: attempt.submission_id,
            student_id: attempt.student_id,
            block_id: attempt.block_id,
            block_version: attempt.block_version,
            answers: attempt.answers,
            grade: attempt.grade,
            score: attempt.score,
            created_at: Some(Utc::now()),
        };
        t.block_submissions.push(row.clone());
        Ok(row)
    }

    async fn find_block_submission(
        &self,
        submission_id: i64,
        block_id: i64,
        version: i32,
    ) -> Result<Option<BlockSubmission>, StoreError> {
        let t = self.lock()?;
        Ok(t.block_submissions
            .iter()
            .find(|b| {
                b.submission_id == submission_id
                    && b.block_id == block_id
                    && b.block_version == version
            })
            .cloned())
    }

    async fn list_block_submissions(
        &self,
        submission_id: i64,
        block_id: i64,
    ) -> Result<Vec<BlockSubmission>, StoreError> {
        let t = self.lock()?;
        Ok(t.block_submissions
            .iter()
            .filter(|b| b.submission_id == submission_id && b.block_id == block_id)
            .cloned()
            .collect())
    }
}
