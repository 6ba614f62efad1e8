// src/attempt/controller.rs

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    content::{self, FeedbackView, QuestionView},
    grading,
    progression::{self, NextAction, Step},
    results::{self, AttemptResults},
};
use crate::{
    error::AppError,
    media::MediaStore,
    models::{
        assignment::Assignment,
        block::QuestionBlock,
        question::Question,
        submission::{BlockSubmission, NewBlockSubmission, StudentSubmission},
    },
    store::{RecordStore, StoreError},
};

/// Where a student stands inside an assignment, rebuilt from the record store
/// on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSession {
    pub assignment_id: i64,
    pub submission_id: i64,
    /// 0-based index of the current block.
    pub current_block: i32,
    pub block_number: i32,
    pub block_count: usize,
    pub current_version: i32,
    pub questions: Vec<QuestionView>,
    /// One slot per question. Holds the graded answers while feedback is shown.
    pub user_answers: Vec<Value>,
    /// True once the current version is graded and waiting for `advance`.
    pub showing_feedback: bool,
    pub percent: Option<f64>,
    pub threshold_percent: f64,
    pub next_action: Option<NextAction>,
    pub feedback: Vec<FeedbackView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptView {
    InProgress(AttemptSession),
    /// Nothing left to attempt; the caller should show results.
    Finished(AttemptResults),
}

/// Logs a store failure and converts it for the HTTP layer.
fn store_failure(operation: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |err| {
        if let StoreError::Database(_) = err {
            tracing::error!(error = %err, "{}", operation);
        }
        AppError::from(err)
    }
}

/// Drives one student through an assignment's blocks and versions.
pub struct AttemptController<'a> {
    store: &'a dyn RecordStore,
    media: &'a dyn MediaStore,
    bucket: &'a str,
    url_ttl: Duration,
}

impl<'a> AttemptController<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        media: &'a dyn MediaStore,
        bucket: &'a str,
        url_ttl: Duration,
    ) -> Self {
        Self {
            store,
            media,
            bucket,
            url_ttl,
        }
    }

    /// Fetch-or-create the submission and return the current position.
    /// A finished submission goes straight to results.
    pub async fn start(&self, student_id: i64, assignment_id: i64) -> Result<AttemptView, AppError> {
        let assignment = self.visible_assignment(assignment_id).await?;

        let existing = match self.store.get_submission(student_id, assignment_id).await {
            Ok(submission) => Some(submission),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(store_failure("Failed to load submission")(e)),
        };

        if let Some(submission) = &existing {
            if submission.finished {
                return self.finished_view(submission).await;
            }
        }

        if !assignment.is_open_at(Utc::now()) {
            return Err(AppError::Forbidden("Assignment is not open".to_string()));
        }

        let submission = match existing {
            Some(submission) => submission,
            None => self.create_submission(student_id, assignment_id).await?,
        };

        self.current_view(submission).await
    }

    /// Grades answers for the current (block, version) and records the attempt.
    pub async fn submit(
        &self,
        student_id: i64,
        assignment_id: i64,
        answers: Vec<Value>,
    ) -> Result<AttemptView, AppError> {
        let assignment = self.visible_assignment(assignment_id).await?;
        let submission = self
            .store
            .get_submission(student_id, assignment_id)
            .await
            .map_err(store_failure("Failed to load submission"))?;

        if submission.finished {
            return Err(AppError::Conflict("Assignment already finished".to_string()));
        }
        if !assignment.is_open_at(Utc::now()) {
            return Err(AppError::Forbidden("Assignment is not open".to_string()));
        }

        let blocks = self.blocks(assignment_id).await?;
        let Some(block) = blocks.get(submission.current_block as usize) else {
            return self.finish_out_of_range(submission).await;
        };

        let already_graded = self
            .store
            .find_block_submission(
                submission.submission_id,
                block.block_id,
                submission.current_version,
            )
            .await
            .map_err(store_failure("Failed to check block submission"))?;
        if already_graded.is_some() {
            return Err(AppError::Conflict(
                "This version is already graded; advance to continue".to_string(),
            ));
        }

        let questions = self.block_questions(block).await?;
        if answers.len() > questions.len() {
            return Err(AppError::BadRequest(format!(
                "Expected at most {} answers, got {}",
                questions.len(),
                answers.len()
            )));
        }

        let version = submission.current_version as usize;
        let grade = grading::grade_block(&questions, version, &answers);

        let attempt = self
            .store
            .insert_block_submission(NewBlockSubmission {
                submission_id: submission.submission_id,
                student_id,
                block_id: block.block_id,
                block_version: submission.current_version,
                answers,
                grade: grade.awarded(),
                score: grade.percent,
            })
            .await
            .map_err(store_failure("Failed to save block submission"))?;

        tracing::info!(
            submission_id = submission.submission_id,
            block_id = block.block_id,
            version,
            percent = grade.percent,
            "Graded block attempt"
        );

        let session = self
            .build_session(&submission, block, blocks.len(), &questions, Some(&attempt))
            .await;
        Ok(AttemptView::InProgress(session))
    }

    /// Applies the pending decision after feedback: retry, next block, or finish.
    pub async fn advance(&self, student_id: i64, assignment_id: i64) -> Result<AttemptView, AppError> {
        self.visible_assignment(assignment_id).await?;
        let mut submission = self
            .store
            .get_submission(student_id, assignment_id)
            .await
            .map_err(store_failure("Failed to load submission"))?;

        if submission.finished {
            return self.finished_view(&submission).await;
        }

        let blocks = self.blocks(assignment_id).await?;
        let Some(block) = blocks.get(submission.current_block as usize) else {
            return self.finish_out_of_range(submission).await;
        };

        let graded = self
            .store
            .find_block_submission(
                submission.submission_id,
                block.block_id,
                submission.current_version,
            )
            .await
            .map_err(store_failure("Failed to check block submission"))?
            .ok_or_else(|| {
                AppError::Conflict("Submit the current block before advancing".to_string())
            })?;

        match progression::next_step(
            submission.current_version,
            graded.score,
            block.threshold_percent(),
        ) {
            Step::Retry { version } => {
                progression::retry(&mut submission, version);
                self.persist(&submission).await?;
                tracing::info!(
                    submission_id = submission.submission_id,
                    version,
                    "Retrying block with next version"
                );
                self.view_for(submission, &blocks).await
            }
            Step::Complete { mastered } => {
                let attempts = self
                    .store
                    .list_block_submissions(submission.submission_id, block.block_id)
                    .await
                    .map_err(store_failure("Failed to load block attempts"))?;
                let best = progression::best_score(&attempts);
                let action = progression::complete_block(&mut submission, best, blocks.len());
                self.persist(&submission).await?;

                tracing::info!(
                    submission_id = submission.submission_id,
                    block_id = block.block_id,
                    mastered,
                    best,
                    "Block complete"
                );

                match action {
                    NextAction::Finish => Ok(AttemptView::Finished(results::summarize(
                        &submission,
                        &blocks,
                    ))),
                    _ => self.view_for(submission, &blocks).await,
                }
            }
        }
    }

    /// Results for a student's submission, finished or not.
    pub async fn results(&self, student_id: i64, assignment_id: i64) -> Result<AttemptResults, AppError> {
        self.visible_assignment(assignment_id).await?;
        let submission = self
            .store
            .get_submission(student_id, assignment_id)
            .await
            .map_err(store_failure("Failed to load submission"))?;
        let blocks = self.blocks(assignment_id).await?;
        Ok(results::summarize(&submission, &blocks))
    }

    async fn visible_assignment(&self, assignment_id: i64) -> Result<Assignment, AppError> {
        let assignment = self
            .store
            .get_assignment(assignment_id)
            .await
            .map_err(store_failure("Failed to load assignment"))?;
        if !assignment.is_assigned_at(Utc::now()) {
            return Err(AppError::NotFound("Assignment not found".to_string()));
        }
        Ok(assignment)
    }

    async fn create_submission(
        &self,
        student_id: i64,
        assignment_id: i64,
    ) -> Result<StudentSubmission, AppError> {
        match self.store.insert_submission(student_id, assignment_id).await {
            Ok(submission) => {
                tracing::info!(student_id, assignment_id, "Created student submission");
                Ok(submission)
            }
            // Another request created it first.
            Err(StoreError::Conflict(_)) => self
                .store
                .get_submission(student_id, assignment_id)
                .await
                .map_err(store_failure("Failed to load submission")),
            Err(e) => Err(store_failure("Failed to create submission")(e)),
        }
    }

    async fn blocks(&self, assignment_id: i64) -> Result<Vec<QuestionBlock>, AppError> {
        self.store
            .list_blocks(assignment_id)
            .await
            .map_err(store_failure("Failed to load question blocks"))
    }

    async fn block_questions(&self, block: &QuestionBlock) -> Result<Vec<Question>, AppError> {
        let fetched = self
            .store
            .fetch_questions(&block.question_ids)
            .await
            .map_err(store_failure("Failed to load block questions"))?;
        Ok(content::order_questions(&block.question_ids, fetched))
    }

    async fn persist(&self, submission: &StudentSubmission) -> Result<(), AppError> {
        self.store
            .update_submission(submission)
            .await
            .map_err(store_failure("Failed to save submission progress"))
    }

    async fn finished_view(&self, submission: &StudentSubmission) -> Result<AttemptView, AppError> {
        let blocks = self.blocks(submission.assignment_id).await?;
        Ok(AttemptView::Finished(results::summarize(submission, &blocks)))
    }

    /// The pointer ran past the last block (blocks were removed); close the submission.
    async fn finish_out_of_range(
        &self,
        mut submission: StudentSubmission,
    ) -> Result<AttemptView, AppError> {
        let blocks = self.blocks(submission.assignment_id).await?;
        if blocks.is_empty() {
            return Err(AppError::Conflict(
                "Assignment has no question blocks".to_string(),
            ));
        }
        submission.finished = true;
        self.persist(&submission).await?;
        Ok(AttemptView::Finished(results::summarize(&submission, &blocks)))
    }

    async fn current_view(&self, submission: StudentSubmission) -> Result<AttemptView, AppError> {
        let blocks = self.blocks(submission.assignment_id).await?;
        self.view_for(submission, &blocks).await
    }

    async fn view_for(
        &self,
        submission: StudentSubmission,
        blocks: &[QuestionBlock],
    ) -> Result<AttemptView, AppError> {
        let Some(block) = blocks.get(submission.current_block as usize) else {
            return self.finish_out_of_range(submission).await;
        };

        let questions = self.block_questions(block).await?;
        let graded = self
            .store
            .find_block_submission(
                submission.submission_id,
                block.block_id,
                submission.current_version,
            )
            .await
            .map_err(store_failure("Failed to check block submission"))?;

        let session = self
            .build_session(&submission, block, blocks.len(), &questions, graded.as_ref())
            .await;
        Ok(AttemptView::InProgress(session))
    }

    async fn build_session(
        &self,
        submission: &StudentSubmission,
        block: &QuestionBlock,
        block_count: usize,
        questions: &[Question],
        graded: Option<&BlockSubmission>,
    ) -> AttemptSession {
        let version = submission.current_version as usize;
        let media =
            content::resolve_block_media(self.media, self.bucket, self.url_ttl, questions).await;
        let threshold_percent = block.threshold_percent();

        let views = questions
            .iter()
            .zip(&media)
            .map(|(q, m)| content::question_view(q, version, m))
            .collect();

        let (user_answers, percent, next_action, feedback) = match graded {
            Some(attempt) => {
                let regraded = grading::grade_block(questions, version, &attempt.answers);
                let feedback = questions
                    .iter()
                    .zip(&media)
                    .zip(&regraded.grades)
                    .map(|((q, m), g)| content::feedback_view(q, version, m, g))
                    .collect();
                let mut answers = attempt.answers.clone();
                answers.resize(questions.len(), Value::Null);
                let next = progression::preview(submission, attempt.score, threshold_percent, block_count);
                (answers, Some(attempt.score), Some(next), feedback)
            }
            None => (vec![Value::Null; questions.len()], None, None, Vec::new()),
        };

        AttemptSession {
            assignment_id: submission.assignment_id,
            submission_id: submission.submission_id,
            current_block: submission.current_block,
            block_number: block.block_number,
            block_count,
            current_version: submission.current_version,
            questions: views,
            user_answers,
            showing_feedback: graded.is_some(),
            percent,
            threshold_percent,
            next_action,
            feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        media::DisabledMediaStore,
        models::{assignment::NewAssignment, block::NewBlock, question::NewQuestion},
        store::MemoryStore,
    };
    use serde_json::json;

    const STUDENT: i64 = 500;

    struct Fixture {
        store: MemoryStore,
        media: DisabledMediaStore,
    }

    impl Fixture {
        fn controller(&self) -> AttemptController<'_> {
            AttemptController::new(&self.store, &self.media, "media", Duration::from_secs(60))
        }
    }

    /// Numeric question worth `points`; version v has solution `v + 1` and margin 0.5.
    fn numeric_question(points: f64) -> NewQuestion {
        NewQuestion {
            points,
            question_body: (0..4).map(|v| format!("What is {} + 0?", v + 1)).collect(),
            solutions: (0..4).map(|v| (v + 1).to_string()).collect(),
            feedback: vec!["Check your arithmetic".to_string(); 4],
            question_image: vec![],
            feedback_images: vec![],
            feedback_videos: vec![],
            mcq_options: vec![],
            frq_err_marg: vec![Some(0.5); 4],
        }
    }

    /// Builds an open assignment whose blocks each hold two 5-point questions.
    async fn fixture(thresholds: &[f64]) -> (Fixture, i64) {
        let store = MemoryStore::new();
        let assignment = store
            .insert_assignment(
                1,
                NewAssignment {
                    name: "Mastery".to_string(),
                    due_at: None,
                    assign_at: None,
                    open_at: None,
                    close_at: None,
                    is_open: Some(true),
                    is_assigned: Some(true),
                },
            )
            .await
            .unwrap();

        for &threshold in thresholds {
            let a = store.insert_question(1, numeric_question(5.0)).await.unwrap();
            let b = store.insert_question(1, numeric_question(5.0)).await.unwrap();
            store
                .insert_block(NewBlock {
                    assignment_id: assignment.id,
                    question_ids: vec![a.question_id, b.question_id],
                    mastery_threshold: threshold,
                    total_points: 10.0,
                })
                .await
                .unwrap();
        }

        (
            Fixture {
                store,
                media: DisabledMediaStore,
            },
            assignment.id,
        )
    }

    fn in_progress(view: AttemptView) -> AttemptSession {
        match view {
            AttemptView::InProgress(session) => session,
            AttemptView::Finished(_) => panic!("expected an in-progress session"),
        }
    }

    /// Answers for version `v`: correct for the first `correct` questions, wrong after.
    fn answers(version: i32, correct: usize) -> Vec<Value> {
        (0..2)
            .map(|i| {
                if i < correct {
                    json!(version + 1)
                } else {
                    json!(-100)
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn start_creates_submission_with_defaults() {
        let (fx, assignment_id) = fixture(&[6.0]).await;
        let session = in_progress(fx.controller().start(STUDENT, assignment_id).await.unwrap());

        assert_eq!(session.current_block, 0);
        assert_eq!(session.current_version, 0);
        assert!(!session.showing_feedback);
        assert_eq!(session.threshold_percent, 60.0);
        assert_eq!(session.questions.len(), 2);
        assert_eq!(session.user_answers, vec![Value::Null, Value::Null]);

        let stored = fx.store.get_submission(STUDENT, assignment_id).await.unwrap();
        assert_eq!(stored.blocks_complete, 0);
        assert!(!stored.finished);
    }

    #[tokio::test]
    async fn failing_retries_then_passing_advances_with_best_score() {
        // One block of 5 + 3 + 2 points needing 6/10, followed by a second block.
        let (fx, assignment_id) = fixture(&[]).await;
        let mut ids = Vec::new();
        for points in [5.0, 3.0, 2.0] {
            let q = fx.store.insert_question(1, numeric_question(points)).await.unwrap();
            ids.push(q.question_id);
        }
        fx.store
            .insert_block(NewBlock {
                assignment_id,
                question_ids: ids,
                mastery_threshold: 6.0,
                total_points: 10.0,
            })
            .await
            .unwrap();
        let extra = fx.store.insert_question(1, numeric_question(5.0)).await.unwrap();
        fx.store
            .insert_block(NewBlock {
                assignment_id,
                question_ids: vec![extra.question_id],
                mastery_threshold: 5.0,
                total_points: 5.0,
            })
            .await
            .unwrap();

        let ctl = fx.controller();
        ctl.start(STUDENT, assignment_id).await.unwrap();

        // 5/10 on version 0
        let graded = in_progress(
            ctl.submit(STUDENT, assignment_id, vec![json!(1), json!(-1), json!(-1)])
                .await
                .unwrap(),
        );
        assert!(graded.showing_feedback);
        assert_eq!(graded.percent, Some(50.0));
        assert_eq!(graded.next_action, Some(NextAction::Retry));

        let retry = in_progress(ctl.advance(STUDENT, assignment_id).await.unwrap());
        assert_eq!(retry.current_block, 0);
        assert_eq!(retry.current_version, 1);
        assert!(!retry.showing_feedback);
        let stored = fx.store.get_submission(STUDENT, assignment_id).await.unwrap();
        assert_eq!(stored.blocks_complete, 0);

        // 8/10 on version 1 (>= 60%)
        let graded = in_progress(
            ctl.submit(STUDENT, assignment_id, vec![json!(2), json!(2), json!(-1)])
                .await
                .unwrap(),
        );
        assert_eq!(graded.percent, Some(80.0));
        assert_eq!(graded.next_action, Some(NextAction::NextBlock));

        let next = in_progress(ctl.advance(STUDENT, assignment_id).await.unwrap());
        assert_eq!(next.current_block, 1);
        assert_eq!(next.current_version, 0);

        let stored = fx.store.get_submission(STUDENT, assignment_id).await.unwrap();
        assert_eq!(stored.blocks_complete, 1);
        assert_eq!(stored.block_scores, vec![80.0]);
    }

    #[tokio::test]
    async fn started_assignment_keeps_its_blocks() {
        let (fx, assignment_id) = fixture(&[0.0, 0.0, 0.0]).await;
        let ctl = fx.controller();
        ctl.start(STUDENT, assignment_id).await.unwrap();
        ctl.submit(STUDENT, assignment_id, answers(0, 2)).await.unwrap();
        let second = in_progress(ctl.advance(STUDENT, assignment_id).await.unwrap());
        assert_eq!(second.current_block, 1);

        let blocks = fx.store.list_blocks(assignment_id).await.unwrap();
        let err = fx
            .store
            .delete_block(assignment_id, blocks[0].block_id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Still on the same block, and block 1 keeps its score.
        let resumed = in_progress(ctl.start(STUDENT, assignment_id).await.unwrap());
        assert_eq!(resumed.current_block, 1);
        assert_eq!(resumed.block_number, blocks[1].block_number);
        assert_eq!(resumed.questions[0].question_id, blocks[1].question_ids[0]);

        let results = ctl.results(STUDENT, assignment_id).await.unwrap();
        assert_eq!(results.blocks.len(), 1);
        assert_eq!(results.blocks[0].block_number, 1);
        assert_eq!(results.blocks[0].score, 100.0);
    }

    #[tokio::test]
    async fn fourth_failure_forces_the_next_block() {
        let (fx, assignment_id) = fixture(&[10.0, 10.0]).await;
        let ctl = fx.controller();
        ctl.start(STUDENT, assignment_id).await.unwrap();

        for version in 0..3 {
            ctl.submit(STUDENT, assignment_id, answers(version, if version == 1 { 1 } else { 0 }))
                .await
                .unwrap();
            let session = in_progress(ctl.advance(STUDENT, assignment_id).await.unwrap());
            assert_eq!(session.current_version, version + 1);
            assert_eq!(session.current_block, 0);
        }

        let graded = in_progress(ctl.submit(STUDENT, assignment_id, answers(3, 0)).await.unwrap());
        assert_eq!(graded.current_version, 3);
        assert_eq!(graded.next_action, Some(NextAction::NextBlock));

        let next = in_progress(ctl.advance(STUDENT, assignment_id).await.unwrap());
        assert_eq!(next.current_block, 1);
        assert_eq!(next.current_version, 0);

        let stored = fx.store.get_submission(STUDENT, assignment_id).await.unwrap();
        assert_eq!(stored.blocks_complete, 1);
        assert_eq!(stored.block_scores, vec![50.0]);
    }

    #[tokio::test]
    async fn last_block_finishes_and_stays_finished() {
        let (fx, assignment_id) = fixture(&[0.0]).await;
        let ctl = fx.controller();
        ctl.start(STUDENT, assignment_id).await.unwrap();

        ctl.submit(STUDENT, assignment_id, vec![json!("abc"), json!(2)])
            .await
            .unwrap();
        let done = ctl.advance(STUDENT, assignment_id).await.unwrap();
        let AttemptView::Finished(results) = done else {
            panic!("expected results after the last block");
        };
        assert!(results.finished);
        assert_eq!(results.block_scores, vec![0.0]);

        let before = fx.store.get_submission(STUDENT, assignment_id).await.unwrap();

        assert!(matches!(
            ctl.advance(STUDENT, assignment_id).await.unwrap(),
            AttemptView::Finished(_)
        ));
        assert!(matches!(
            ctl.start(STUDENT, assignment_id).await.unwrap(),
            AttemptView::Finished(_)
        ));
        assert!(matches!(
            ctl.submit(STUDENT, assignment_id, answers(0, 2)).await,
            Err(AppError::Conflict(_))
        ));

        let after = fx.store.get_submission(STUDENT, assignment_id).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn invalid_numeric_answer_is_graded_zero() {
        let (fx, assignment_id) = fixture(&[6.0]).await;
        let ctl = fx.controller();
        ctl.start(STUDENT, assignment_id).await.unwrap();

        let graded = in_progress(
            ctl.submit(STUDENT, assignment_id, vec![json!("abc"), json!("1")])
                .await
                .unwrap(),
        );
        assert_eq!(graded.percent, Some(50.0));
        assert_eq!(graded.feedback[0].outcome, grading::GradeOutcome::InvalidInput);
        assert_eq!(graded.feedback[1].outcome, grading::GradeOutcome::Correct);
    }

    #[tokio::test]
    async fn resubmitting_a_graded_version_conflicts() {
        let (fx, assignment_id) = fixture(&[6.0]).await;
        let ctl = fx.controller();
        ctl.start(STUDENT, assignment_id).await.unwrap();
        ctl.submit(STUDENT, assignment_id, answers(0, 0)).await.unwrap();

        let again = ctl.submit(STUDENT, assignment_id, answers(0, 2)).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        // Reloading keeps the feedback state.
        let session = in_progress(ctl.start(STUDENT, assignment_id).await.unwrap());
        assert!(session.showing_feedback);
        assert_eq!(session.percent, Some(0.0));
    }

    #[tokio::test]
    async fn advance_requires_a_graded_attempt() {
        let (fx, assignment_id) = fixture(&[6.0]).await;
        let ctl = fx.controller();
        ctl.start(STUDENT, assignment_id).await.unwrap();

        let result = ctl.advance(STUDENT, assignment_id).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn closed_assignment_rejects_new_attempts() {
        let (fx, assignment_id) = fixture(&[6.0]).await;
        let mut assignment = fx.store.get_assignment(assignment_id).await.unwrap();
        assignment.is_open = Some(false);
        fx.store.update_assignment(&assignment).await.unwrap();

        let result = fx.controller().start(STUDENT, assignment_id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(fx.store.get_submission(STUDENT, assignment_id).await.is_err());
    }

    #[tokio::test]
    async fn zero_point_block_always_passes() {
        let (fx, assignment_id) = fixture(&[]).await;
        let q = fx.store.insert_question(1, numeric_question(0.0)).await.unwrap();
        fx.store
            .insert_block(NewBlock {
                assignment_id,
                question_ids: vec![q.question_id],
                mastery_threshold: 0.0,
                total_points: 0.0,
            })
            .await
            .unwrap();
        let ctl = fx.controller();
        let session = in_progress(ctl.start(STUDENT, assignment_id).await.unwrap());
        assert_eq!(session.threshold_percent, 0.0);

        let graded = in_progress(ctl.submit(STUDENT, assignment_id, vec![json!(-3)]).await.unwrap());
        assert_eq!(graded.percent, Some(0.0));
        assert_eq!(graded.next_action, Some(NextAction::Finish));
    }
}
