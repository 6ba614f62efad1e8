// src/attempt/content.rs

//! Shapes block questions into the student-facing view of one version.

use std::{collections::HashMap, time::Duration};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use url::Url;

use super::grading::{GradeOutcome, QuestionGrade};
use crate::{
    media::MediaStore,
    models::question::{AnswerKind, Question, VERSION_COUNT},
};

/// Signed URLs for every version of one question, aligned by version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionMedia {
    pub image: [Option<String>; VERSION_COUNT],
    pub feedback_image: [Option<String>; VERSION_COUNT],
    pub feedback_video: [Option<String>; VERSION_COUNT],
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Image,
    FeedbackImage,
    FeedbackVideo,
}

impl QuestionMedia {
    fn slot_mut(&mut self, slot: Slot) -> &mut [Option<String>; VERSION_COUNT] {
        match slot {
            Slot::Image => &mut self.image,
            Slot::FeedbackImage => &mut self.feedback_image,
            Slot::FeedbackVideo => &mut self.feedback_video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqOption {
    /// Index to submit as the answer.
    pub index: usize,
    pub text: String,
}

/// One question as a student sees it. Solutions are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub question_id: i64,
    pub points: f64,
    pub body: String,
    pub image_url: Option<String>,
    /// Present for multiple-choice versions; blank options are dropped but keep their index.
    pub options: Option<Vec<McqOption>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackView {
    pub question_id: i64,
    pub awarded: f64,
    pub outcome: GradeOutcome,
    pub feedback: String,
    pub feedback_image_url: Option<String>,
    pub feedback_video_url: Option<String>,
}

/// Absolute http(s) links are served as-is rather than signed.
fn is_external(path: &str) -> bool {
    Url::parse(path)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

async fn resolve_path(
    media: &dyn MediaStore,
    bucket: &str,
    path: &str,
    ttl: Duration,
) -> Option<String> {
    if is_external(path) {
        return Some(path.to_string());
    }
    media.create_signed_url(bucket, path, ttl).await
}

/// Resolves every version's media paths for a batch of questions concurrently.
/// Blank paths and signing failures both come back as `None`.
pub async fn resolve_block_media(
    media: &dyn MediaStore,
    bucket: &str,
    ttl: Duration,
    questions: &[Question],
) -> Vec<QuestionMedia> {
    let mut jobs: Vec<(usize, usize, Slot, &str)> = Vec::new();
    for (qi, question) in questions.iter().enumerate() {
        for version in 0..VERSION_COUNT {
            let content = question.version(version);
            let slots = [
                (Slot::Image, content.image),
                (Slot::FeedbackImage, content.feedback_image),
                (Slot::FeedbackVideo, content.feedback_video),
            ];
            for (slot, path) in slots {
                if let Some(path) = path {
                    jobs.push((qi, version, slot, path));
                }
            }
        }
    }

    let urls = join_all(
        jobs.iter()
            .map(|&(_, _, _, path)| resolve_path(media, bucket, path, ttl)),
    )
    .await;

    let mut resolved = vec![QuestionMedia::default(); questions.len()];
    for ((qi, version, slot, _), url) in jobs.into_iter().zip(urls) {
        resolved[qi].slot_mut(slot)[version] = url;
    }
    resolved
}

/// Puts fetched questions back into the block's order.
/// Ids that no longer resolve to a question are skipped.
pub fn order_questions(ids: &[i64], fetched: Vec<Question>) -> Vec<Question> {
    let mut by_id: HashMap<i64, Question> =
        fetched.into_iter().map(|q| (q.question_id, q)).collect();

    ids.iter()
        .filter_map(|id| {
            let question = by_id.remove(id);
            if question.is_none() {
                tracing::warn!(question_id = id, "Block references a missing question");
            }
            question
        })
        .collect()
}

pub fn question_view(question: &Question, version: usize, media: &QuestionMedia) -> QuestionView {
    let content = question.version(version);

    let options = match content.answer_kind() {
        AnswerKind::MultipleChoice { options } => Some(
            options
                .iter()
                .enumerate()
                .filter(|(_, text)| !text.trim().is_empty())
                .map(|(index, text)| McqOption {
                    index,
                    text: text.clone(),
                })
                .collect(),
        ),
        AnswerKind::Numeric { .. } => None,
    };

    QuestionView {
        question_id: question.question_id,
        points: question.points,
        body: content.body.to_string(),
        image_url: media.image[version].clone(),
        options,
    }
}

pub fn feedback_view(
    question: &Question,
    version: usize,
    media: &QuestionMedia,
    grade: &QuestionGrade,
) -> FeedbackView {
    let content = question.version(version);
    FeedbackView {
        question_id: question.question_id,
        awarded: grade.awarded,
        outcome: grade.outcome,
        feedback: content.feedback.to_string(),
        feedback_image_url: media.feedback_image[version].clone(),
        feedback_video_url: media.feedback_video[version].clone(),
    }
}
