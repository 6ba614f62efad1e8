// tests/attempt_tests.rs

mod common;

use common::{TestApp, spawn_app};
use serde_json::{Value, json};

/// Builds an assignment with two blocks:
/// block 1 holds a numeric and a multiple-choice question and needs 100%,
/// block 2 holds the numeric question alone with a zero threshold.
async fn seed_assignment(app: &TestApp, token: &str) -> i64 {
    let numeric: Value = app
        .client
        .post(app.url("/api/instructor/questions"))
        .bearer_auth(token)
        .json(&json!({
            "points": 5.0,
            "question_body": ["x = ?", "y = ?", "z = ?", "w = ?"],
            "solutions": ["10", "20", "30", "40"],
            "feedback": ["f0", "f1", "f2", "f3"],
            "question_image": ["diagrams/ramp.png", null, null, null],
            "frq_err_marg": [0.5, 0.5, 0.5, 0.5]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let choice: Value = app
        .client
        .post(app.url("/api/instructor/questions"))
        .bearer_auth(token)
        .json(&json!({
            "points": 5.0,
            "question_body": ["pick", "pick", "pick", "pick"],
            "solutions": ["1", "1", "2", "0"],
            "feedback": ["", "", "", ""],
            "mcq_options": [["A", "B", "C"], ["A", "B", "C"], ["A", "B", "C"], ["A", "B", "C"]]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let assignment: Value = app
        .client
        .post(app.url("/api/instructor/assignments"))
        .bearer_auth(token)
        .json(&json!({ "name": "Mastery check" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let aid = assignment["id"].as_i64().unwrap();

    for (ids, threshold) in [
        (json!([numeric["question_id"], choice["question_id"]]), 10.0),
        (json!([numeric["question_id"]]), 0.0),
    ] {
        let response = app
            .client
            .post(app.url(&format!("/api/instructor/assignments/{}/blocks", aid)))
            .bearer_auth(token)
            .json(&json!({ "question_ids": ids, "mastery_threshold": threshold }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    aid
}

async fn post(app: &TestApp, token: &str, path: &str, body: Option<Value>) -> reqwest::Response {
    let mut request = app.client.post(app.url(path)).bearer_auth(token);
    if let Some(body) = body {
        request = request.json(&body);
    }
    request.send().await.expect("Failed to execute request")
}

#[tokio::test]
async fn student_works_through_blocks_to_results() {
    let app = spawn_app().await;
    let instructor = app.instructor_token().await;
    let aid = seed_assignment(&app, &instructor).await;
    let student = app.student_token().await;

    // Dashboard lists the assignment
    let available: Vec<Value> = app
        .client
        .get(app.url("/api/assignments"))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(available.iter().any(|a| a["id"] == aid));

    // Start: block 1, version 0, nothing graded yet
    let start = post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None).await;
    assert_eq!(start.status().as_u16(), 200);
    let view: Value = start.json().await.unwrap();
    assert_eq!(view["status"], "in_progress");
    assert_eq!(view["current_block"], 0);
    assert_eq!(view["current_version"], 0);
    assert_eq!(view["showing_feedback"], false);
    assert_eq!(view["threshold_percent"], 100.0);
    assert_eq!(view["questions"][0]["body"], "x = ?");
    assert_eq!(
        view["questions"][0]["image_url"],
        "https://media.test/media/diagrams/ramp.png?sig=1"
    );
    assert!(view["questions"][0]["options"].is_null());
    assert_eq!(view["questions"][1]["options"].as_array().unwrap().len(), 3);
    assert!(!view.to_string().contains("solutions"));

    // Half right: numeric correct, choice wrong
    let submit_path = format!("/api/assignments/{}/attempt/submit", aid);
    let graded: Value = post(&app, &student, &submit_path, Some(json!({ "answers": [10, 0] })))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(graded["showing_feedback"], true);
    assert_eq!(graded["percent"], 50.0);
    assert_eq!(graded["next_action"], "retry");
    assert_eq!(graded["feedback"][0]["outcome"], "correct");
    assert_eq!(graded["feedback"][1]["outcome"], "incorrect");

    // Same version cannot be graded twice
    let again = post(&app, &student, &submit_path, Some(json!({ "answers": [10, 1] }))).await;
    assert_eq!(again.status().as_u16(), 409);

    // Resuming keeps the feedback on screen
    let resumed: Value = post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(resumed["showing_feedback"], true);
    assert_eq!(resumed["user_answers"], json!([10, 0]));

    // Retry moves to version 1 of the same block
    let advance_path = format!("/api/assignments/{}/attempt/advance", aid);
    let retry: Value = post(&app, &student, &advance_path, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(retry["current_block"], 0);
    assert_eq!(retry["current_version"], 1);
    assert_eq!(retry["showing_feedback"], false);
    assert_eq!(retry["questions"][0]["body"], "y = ?");

    // Full marks on version 1
    let mastered: Value = post(&app, &student, &submit_path, Some(json!({ "answers": ["20.2", "1"] })))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(mastered["percent"], 100.0);
    assert_eq!(mastered["next_action"], "next_block");

    let next: Value = post(&app, &student, &advance_path, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(next["current_block"], 1);
    assert_eq!(next["current_version"], 0);

    // Non-numeric answer scores zero but the zero threshold still passes
    let last: Value = post(&app, &student, &submit_path, Some(json!({ "answers": ["abc"] })))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(last["percent"], 0.0);
    assert_eq!(last["feedback"][0]["outcome"], "invalid_input");
    assert_eq!(last["next_action"], "finish");

    let finished: Value = post(&app, &student, &advance_path, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(finished["status"], "finished");
    assert_eq!(finished["block_scores"], json!([100.0, 0.0]));
    assert_eq!(finished["points_earned"], 10.0);
    assert_eq!(finished["total_points"], 15.0);

    // Finished assignments stay finished
    let reopened: Value = post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(reopened["status"], "finished");

    let after = post(&app, &student, &submit_path, Some(json!({ "answers": [40] }))).await;
    assert_eq!(after.status().as_u16(), 409);

    let results: Value = app
        .client
        .get(app.url(&format!("/api/assignments/{}/results", aid)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results["finished"], true);
    assert_eq!(results["blocks_complete"], 2);

    // Gradebook shows the finished submission
    let gradebook: Vec<Value> = app
        .client
        .get(app.url(&format!("/api/instructor/assignments/{}/submissions", aid)))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(gradebook.len(), 1);
    assert_eq!(gradebook[0]["finished"], true);
}

#[tokio::test]
async fn four_failures_force_the_next_block_with_best_score() {
    let app = spawn_app().await;
    let instructor = app.instructor_token().await;
    let aid = seed_assignment(&app, &instructor).await;
    let student = app.student_token().await;

    let submit_path = format!("/api/assignments/{}/attempt/submit", aid);
    let advance_path = format!("/api/assignments/{}/attempt/advance", aid);
    post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None).await;

    // Versions 0..2 at 0%, 50%, 0%; each retries
    let solutions = ["10", "20", "30"];
    for (version, numeric) in solutions.iter().enumerate() {
        let answer = if version == 1 { json!(numeric) } else { json!("-1") };
        let graded: Value = post(&app, &student, &submit_path, Some(json!({ "answers": [answer, "9"] })))
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(graded["next_action"], "retry");
        post(&app, &student, &advance_path, None).await;
    }

    // Version 3 fails too, which is the last chance
    let graded: Value = post(&app, &student, &submit_path, Some(json!({ "answers": [] })))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(graded["current_version"], 3);
    assert_eq!(graded["next_action"], "next_block");

    let next: Value = post(&app, &student, &advance_path, None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(next["current_block"], 1);

    let results: Value = app
        .client
        .get(app.url(&format!("/api/assignments/{}/results", aid)))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results["block_scores"], json!([50.0]));
    assert_eq!(results["finished"], false);
}

#[tokio::test]
async fn advancing_before_submitting_is_a_conflict() {
    let app = spawn_app().await;
    let instructor = app.instructor_token().await;
    let aid = seed_assignment(&app, &instructor).await;
    let student = app.student_token().await;

    post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None).await;
    let response = post(
        &app,
        &student,
        &format!("/api/assignments/{}/attempt/advance", aid),
        None,
    )
    .await;

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn closed_and_unassigned_assignments_are_guarded() {
    let app = spawn_app().await;
    let instructor = app.instructor_token().await;
    let aid = seed_assignment(&app, &instructor).await;
    let student = app.student_token().await;
    let patch_path = app.url(&format!("/api/instructor/assignments/{}", aid));

    // Closed: visible but not accepting attempts
    let closed = app
        .client
        .patch(&patch_path)
        .bearer_auth(&instructor)
        .json(&json!({ "is_open": "off" }))
        .send()
        .await
        .unwrap();
    assert_eq!(closed.status().as_u16(), 200);

    let start = post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None).await;
    assert_eq!(start.status().as_u16(), 403);

    // Unassigned: hidden entirely
    app.client
        .patch(&patch_path)
        .bearer_auth(&instructor)
        .json(&json!({ "is_open": "schedule", "is_assigned": "off" }))
        .send()
        .await
        .unwrap();

    let hidden = post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None).await;
    assert_eq!(hidden.status().as_u16(), 404);

    let available: Vec<Value> = app
        .client
        .get(app.url("/api/assignments"))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(available.iter().all(|a| a["id"] != aid));
}

#[tokio::test]
async fn too_many_answers_are_rejected() {
    let app = spawn_app().await;
    let instructor = app.instructor_token().await;
    let aid = seed_assignment(&app, &instructor).await;
    let student = app.student_token().await;

    post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None).await;
    let response = post(
        &app,
        &student,
        &format!("/api/assignments/{}/attempt/submit", aid),
        Some(json!({ "answers": [1, 2, 3] })),
    )
    .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn blocks_cannot_be_deleted_once_a_student_starts() {
    let app = spawn_app().await;
    let instructor = app.instructor_token().await;
    let aid = seed_assignment(&app, &instructor).await;
    let student = app.student_token().await;

    post(&app, &student, &format!("/api/assignments/{}/attempt", aid), None).await;

    let detail: Value = app
        .client
        .get(app.url(&format!("/api/instructor/assignments/{}", aid)))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let first_block = detail["blocks"][0]["block_id"].as_i64().unwrap();

    let response = app
        .client
        .delete(app.url(&format!(
            "/api/instructor/assignments/{}/blocks/{}",
            aid, first_block
        )))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let after: Value = app
        .client
        .get(app.url(&format!("/api/instructor/assignments/{}", aid)))
        .bearer_auth(&instructor)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(after["num_blocks"], 2);
}

#[tokio::test]
async fn clearing_close_at_reopens_the_assignment() {
    let app = spawn_app().await;
    let instructor = app.instructor_token().await;
    let aid = seed_assignment(&app, &instructor).await;
    let student = app.student_token().await;
    let patch_path = app.url(&format!("/api/instructor/assignments/{}", aid));
    let start_path = format!("/api/assignments/{}/attempt", aid);

    let closed: Value = app
        .client
        .patch(&patch_path)
        .bearer_auth(&instructor)
        .json(&json!({ "close_at": "2020-01-01T00:00:00Z" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(closed["close_at"].is_string());
    assert_eq!(post(&app, &student, &start_path, None).await.status().as_u16(), 403);

    let cleared = app
        .client
        .patch(&patch_path)
        .bearer_auth(&instructor)
        .json(&json!({ "close_at": null, "name": "Reopened" }))
        .send()
        .await
        .unwrap();
    assert_eq!(cleared.status().as_u16(), 200);
    let cleared: Value = cleared.json().await.unwrap();
    assert!(cleared["close_at"].is_null());
    assert_eq!(cleared["name"], "Reopened");

    assert_eq!(post(&app, &student, &start_path, None).await.status().as_u16(), 200);
}
