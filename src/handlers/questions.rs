// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, NewQuestion},
    state::SharedStore,
    utils::{access::Identity, html::clean_versions},
};

/// Authors a 4-version question.
/// Bodies and feedback are sanitized; each version's solution must fit its answer kind.
pub async fn create_question(
    State(store): State<SharedStore>,
    identity: Identity,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut question = NewQuestion::from(payload);
    question.question_body = clean_versions(question.question_body);
    question.feedback = clean_versions(question.feedback);
    question.check_versions().map_err(AppError::BadRequest)?;

    let created = store
        .insert_question(identity.user_id, question)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Lists the caller's questions, newest first.
pub async fn list_questions(
    State(store): State<SharedStore>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let questions = store.list_questions(identity.user_id).await?;
    Ok(Json(questions))
}

pub async fn get_question(
    State(store): State<SharedStore>,
    identity: Identity,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = store.get_question(id).await?;
    if question.instructor_id != identity.user_id {
        return Err(AppError::Forbidden("You do not own this question".to_string()));
    }
    Ok(Json(question))
}
