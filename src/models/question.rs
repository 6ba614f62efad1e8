// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Every question carries exactly this many parallel versions.
pub const VERSION_COUNT: usize = 4;

/// A question with its 4 versions.
///
/// All per-version vectors are aligned by index. Optional vectors are either
/// empty (not used by any version) or `VERSION_COUNT` long; a `None` or blank
/// entry means "not applicable for this version".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question_id: i64,
    pub instructor_id: i64,
    pub points: f64,

    pub question_body: Vec<String>,
    pub solutions: Vec<String>,
    pub feedback: Vec<String>,

    #[serde(default)]
    pub question_image: Vec<Option<String>>,
    #[serde(default)]
    pub feedback_images: Vec<Option<String>>,
    #[serde(default)]
    pub feedback_videos: Vec<Option<String>>,
    #[serde(default)]
    pub mcq_options: Vec<Vec<String>>,
    #[serde(default)]
    pub frq_err_marg: Vec<Option<f64>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// How an answer to one version is checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnswerKind<'a> {
    /// Free response compared numerically within `margin`.
    Numeric { margin: f64 },
    /// Option index compared as a string against the stored solution.
    MultipleChoice { options: &'a [String] },
}

/// Borrowed view of a single version of a question.
#[derive(Debug, Clone, Copy)]
pub struct VersionContent<'a> {
    pub version: usize,
    pub body: &'a str,
    pub solution: &'a str,
    pub feedback: &'a str,
    pub image: Option<&'a str>,
    pub feedback_image: Option<&'a str>,
    pub feedback_video: Option<&'a str>,
    pub options: &'a [String],
    pub margin: Option<f64>,
}

impl<'a> VersionContent<'a> {
    /// Multiple choice needs at least two non-blank options; anything less is free response.
    pub fn answer_kind(&self) -> AnswerKind<'a> {
        let filled = self.options.iter().filter(|o| !o.trim().is_empty()).count();
        if filled >= 2 {
            AnswerKind::MultipleChoice {
                options: self.options,
            }
        } else {
            AnswerKind::Numeric {
                margin: self.margin.unwrap_or(0.0),
            }
        }
    }
}

fn text_at(values: &[String], version: usize) -> &str {
    values.get(version).map(String::as_str).unwrap_or("")
}

fn slot_at(values: &[Option<String>], version: usize) -> Option<&str> {
    values
        .get(version)
        .and_then(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Question {
    pub fn version(&self, version: usize) -> VersionContent<'_> {
        VersionContent {
            version,
            body: text_at(&self.question_body, version),
            solution: text_at(&self.solutions, version),
            feedback: text_at(&self.feedback, version),
            image: slot_at(&self.question_image, version),
            feedback_image: slot_at(&self.feedback_images, version),
            feedback_video: slot_at(&self.feedback_videos, version),
            options: self
                .mcq_options
                .get(version)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            margin: self.frq_err_marg.get(version).copied().flatten(),
        }
    }
}

/// DTO for authoring a question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(range(min = 0.0, max = 1000.0))]
    pub points: f64,
    #[validate(length(equal = 4))]
    pub question_body: Vec<String>,
    #[validate(length(equal = 4))]
    pub solutions: Vec<String>,
    #[validate(length(equal = 4))]
    pub feedback: Vec<String>,
    #[serde(default)]
    pub question_image: Vec<Option<String>>,
    #[serde(default)]
    pub feedback_images: Vec<Option<String>>,
    #[serde(default)]
    pub feedback_videos: Vec<Option<String>>,
    #[serde(default)]
    pub mcq_options: Vec<Vec<String>>,
    #[serde(default)]
    pub frq_err_marg: Vec<Option<f64>>,
}

/// Insert payload handed to the record store.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub points: f64,
    pub question_body: Vec<String>,
    pub solutions: Vec<String>,
    pub feedback: Vec<String>,
    pub question_image: Vec<Option<String>>,
    pub feedback_images: Vec<Option<String>>,
    pub feedback_videos: Vec<Option<String>>,
    pub mcq_options: Vec<Vec<String>>,
    pub frq_err_marg: Vec<Option<f64>>,
}

impl From<CreateQuestionRequest> for NewQuestion {
    fn from(req: CreateQuestionRequest) -> Self {
        Self {
            points: req.points,
            question_body: req.question_body,
            solutions: req.solutions,
            feedback: req.feedback,
            question_image: req.question_image,
            feedback_images: req.feedback_images,
            feedback_videos: req.feedback_videos,
            mcq_options: req.mcq_options,
            frq_err_marg: req.frq_err_marg,
        }
    }
}

impl NewQuestion {
    /// Draft question used to check per-version consistency before insert.
    fn as_draft(&self) -> Question {
        Question {
            question_id: 0,
            instructor_id: 0,
            points: self.points,
            question_body: self.question_body.clone(),
            solutions: self.solutions.clone(),
            feedback: self.feedback.clone(),
            question_image: self.question_image.clone(),
            feedback_images: self.feedback_images.clone(),
            feedback_videos: self.feedback_videos.clone(),
            mcq_options: self.mcq_options.clone(),
            frq_err_marg: self.frq_err_marg.clone(),
            created_at: None,
        }
    }

    /// Checks that optional slots line up with the 4 versions and that each
    /// version's solution fits its answer kind.
    pub fn check_versions(&self) -> Result<(), String> {
        let optional_lengths = [
            ("question_image", self.question_image.len()),
            ("feedback_images", self.feedback_images.len()),
            ("feedback_videos", self.feedback_videos.len()),
            ("mcq_options", self.mcq_options.len()),
            ("frq_err_marg", self.frq_err_marg.len()),
        ];
        for (field, len) in optional_lengths {
            if len != 0 && len != VERSION_COUNT {
                return Err(format!(
                    "{} must be empty or have {} entries",
                    field, VERSION_COUNT
                ));
            }
        }

        let draft = self.as_draft();
        for v in 0..VERSION_COUNT {
            let content = draft.version(v);
            if content.body.trim().is_empty() {
                return Err(format!("version {} has an empty question body", v));
            }
            match content.answer_kind() {
                AnswerKind::MultipleChoice { options } => {
                    let index = content.solution.trim().parse::<usize>().map_err(|_| {
                        format!("version {} solution must be an option index", v)
                    })?;
                    match options.get(index) {
                        Some(option) if !option.trim().is_empty() => {}
                        _ => {
                            return Err(format!(
                                "version {} solution does not point at a non-blank option",
                                v
                            ));
                        }
                    }
                }
                AnswerKind::Numeric { margin } => {
                    let solution = content.solution.trim().parse::<f64>().map_err(|_| {
                        format!("version {} solution must be numeric", v)
                    })?;
                    if !solution.is_finite() {
                        return Err(format!("version {} solution must be finite", v));
                    }
                    if !margin.is_finite() || margin < 0.0 {
                        return Err(format!("version {} error margin must be non-negative", v));
                    }
                }
            }
        }
        Ok(())
    }
}
