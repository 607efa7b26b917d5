//! API-level integration tests: full router, real database, envelope checks.

use crate::test_utils::{create_test_server, seed_lines};
use axum::http::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

fn assign_body(username: &str) -> Value {
    json!({
        "user_id": Uuid::new_v4(),
        "username": username,
        "user_email": format!("{username}@example.com"),
    })
}

#[sqlx::test]
#[test_log::test]
async fn test_healthz(pool: PgPool) {
    let server = create_test_server(pool);
    let response = server.get("/healthz").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.text(), "OK");
}

#[sqlx::test]
#[test_log::test]
async fn test_assign_flow_and_stats(pool: PgPool) {
    let ids = seed_lines(&pool, 3).await;
    let server = create_test_server(pool);

    // First caller gets the lowest id
    let response = server.post("/api/v1/assignments").json(&assign_body("usera")).await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], json!(ids[0]));
    assert_eq!(body["data"]["assigned_username"], "usera");
    // Credentials are included in the handout
    assert_eq!(body["data"]["password"], "secret-1");

    // Second caller gets the next one
    let response = server.post("/api/v1/assignments").json(&assign_body("userb")).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], json!(ids[1]));

    // Stats reflect exactly the two holds
    let response = server.get("/api/v1/stats/overview").await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["available"], 1);
    assert_eq!(body["data"]["assigned"], 2);
    assert_eq!(body["data"]["percentage_used"], 67);
}

#[sqlx::test]
#[test_log::test]
async fn test_validation_rejected_before_service(pool: PgPool) {
    seed_lines(&pool, 1).await;
    let server = create_test_server(pool.clone());

    let response = server
        .post("/api/v1/assignments")
        .json(&json!({
            "user_id": Uuid::new_v4(),
            "username": "",
            "user_email": "nobody@example.com",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Nothing was assigned
    let server = create_test_server(pool);
    let response = server.get("/api/v1/stats/overview").await;
    let body: Value = response.json();
    assert_eq!(body["data"]["assigned"], 0);
}

#[sqlx::test]
#[test_log::test]
async fn test_pool_exhausted_envelope(pool: PgPool) {
    seed_lines(&pool, 1).await;
    let server = create_test_server(pool);

    server.post("/api/v1/assignments").json(&assign_body("usera")).await.assert_status(StatusCode::OK);

    let response = server.post("/api/v1/assignments").json(&assign_body("userb")).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "POOL_EXHAUSTED");
    assert_eq!(body["error"], "No SIP lines available in the pool");
}

#[sqlx::test]
#[test_log::test]
async fn test_assign_specific_conflict(pool: PgPool) {
    let ids = seed_lines(&pool, 2).await;
    let server = create_test_server(pool);

    let owner = assign_body("owner");
    server
        .put(&format!("/api/v1/sip-configs/{}/assign", ids[0]))
        .json(&owner)
        .await
        .assert_status(StatusCode::OK);

    // Directed assignment of a held record conflicts and changes nothing
    let response = server
        .put(&format!("/api/v1/sip-configs/{}/assign", ids[0]))
        .json(&assign_body("other"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "CONFLICT");

    let response = server.get("/api/v1/stats/overview").await;
    let body: Value = response.json();
    assert_eq!(body["data"]["assigned"], 1);

    // Unknown ids are 404, not conflicts
    let response = server.put("/api/v1/sip-configs/9999/assign").json(&assign_body("other")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[sqlx::test]
#[test_log::test]
async fn test_release_and_reassign(pool: PgPool) {
    let ids = seed_lines(&pool, 1).await;
    let server = create_test_server(pool);

    let owner = assign_body("owner");
    server.post("/api/v1/assignments").json(&owner).await.assert_status(StatusCode::OK);

    // A stranger cannot self-release someone else's line
    let response = server
        .put(&format!("/api/v1/sip-configs/{}/release", ids[0]))
        .json(&json!({"user_id": Uuid::new_v4()}))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Admin force-release works without a body
    let response = server.put(&format!("/api/v1/sip-configs/{}/release", ids[0])).await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["assigned_user_id"], Value::Null);
    assert_eq!(body["data"]["assigned_username"], Value::Null);

    // The freed record goes to the next caller
    let response = server.post("/api/v1/assignments").json(&assign_body("next")).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], json!(ids[0]));
    assert_eq!(body["data"]["assigned_username"], "next");
}

#[sqlx::test]
#[test_log::test]
async fn test_release_for_user_idempotent_over_http(pool: PgPool) {
    seed_lines(&pool, 1).await;
    let server = create_test_server(pool);

    let owner = assign_body("owner");
    let user_id = owner["user_id"].as_str().unwrap().to_string();
    server.post("/api/v1/assignments").json(&owner).await.assert_status(StatusCode::OK);

    // First release returns the freed record
    let response = server.delete(&format!("/api/v1/assignments/{user_id}")).await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["data"].is_object());

    // Second release: same end state, still success, no data
    let response = server.delete(&format!("/api/v1/assignments/{user_id}")).await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());
}

#[sqlx::test]
#[test_log::test]
async fn test_get_assignment_reports_current_state(pool: PgPool) {
    seed_lines(&pool, 1).await;
    let server = create_test_server(pool);

    let owner = assign_body("owner");
    let user_id = owner["user_id"].as_str().unwrap().to_string();

    // Before assignment: success with no data
    let response = server.get(&format!("/api/v1/assignments/{user_id}")).await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());

    server.post("/api/v1/assignments").json(&owner).await.assert_status(StatusCode::OK);

    let response = server.get(&format!("/api/v1/assignments/{user_id}")).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["assigned_user_id"], json!(user_id));
}

#[sqlx::test]
#[test_log::test]
async fn test_peek_is_non_reserving(pool: PgPool) {
    let ids = seed_lines(&pool, 1).await;
    let server = create_test_server(pool);

    let response = server.get("/api/v1/sip-configs/available/next").await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], json!(ids[0]));

    // Peeking again sees the same record: nothing was reserved
    let response = server.get("/api/v1/sip-configs/available/next").await;
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], json!(ids[0]));

    // Once the pool is fully assigned the peek comes back empty but successful
    server.post("/api/v1/assignments").json(&assign_body("usera")).await.assert_status(StatusCode::OK);
    let response = server.get("/api/v1/sip-configs/available/next").await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());
}

#[sqlx::test]
#[test_log::test]
async fn test_admin_crud_lifecycle(pool: PgPool) {
    let server = create_test_server(pool);

    // Provision
    let response = server
        .post("/api/v1/sip-configs")
        .json(&json!({
            "username": "line100",
            "password": "secret",
            "domain": "sip.example.com",
            "server": "sip.example.com",
            "transport": "TCP",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["port"], 5060);
    assert_eq!(body["data"]["transport"], "TCP");

    // Blank fields are rejected at the boundary
    let response = server
        .post("/api/v1/sip-configs")
        .json(&json!({
            "username": " ",
            "password": "secret",
            "domain": "sip.example.com",
            "server": "sip.example.com",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Duplicate account is a conflict
    let response = server
        .post("/api/v1/sip-configs")
        .json(&json!({
            "username": "line100",
            "password": "other",
            "domain": "sip.example.com",
            "server": "sip.example.com",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // Correction while unassigned
    let response = server
        .patch(&format!("/api/v1/sip-configs/{id}"))
        .json(&json!({"server": "sip2.example.com"}))
        .await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"]["server"], "sip2.example.com");

    // Assigned records cannot be corrected or retired
    server
        .put(&format!("/api/v1/sip-configs/{id}/assign"))
        .json(&assign_body("holder"))
        .await
        .assert_status(StatusCode::OK);
    server
        .patch(&format!("/api/v1/sip-configs/{id}"))
        .json(&json!({"server": "sip3.example.com"}))
        .await
        .assert_status(StatusCode::CONFLICT);
    server
        .delete(&format!("/api/v1/sip-configs/{id}"))
        .await
        .assert_status(StatusCode::CONFLICT);

    // After release the record can be retired
    server
        .put(&format!("/api/v1/sip-configs/{id}/release"))
        .await
        .assert_status(StatusCode::OK);
    server.delete(&format!("/api/v1/sip-configs/{id}")).await.assert_status(StatusCode::OK);

    let response = server.get(&format!("/api/v1/sip-configs/{id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[sqlx::test]
#[test_log::test]
async fn test_list_pagination_and_status_filter(pool: PgPool) {
    let ids = seed_lines(&pool, 3).await;
    let server = create_test_server(pool);

    server
        .put(&format!("/api/v1/sip-configs/{}/assign", ids[1]))
        .json(&assign_body("holder"))
        .await
        .assert_status(StatusCode::OK);

    let response = server.get("/api/v1/sip-configs").await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let response = server
        .get("/api/v1/sip-configs")
        .add_query_param("status", "available")
        .await;
    let body: Value = response.json();
    let listed: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, vec![ids[0], ids[2]]);

    let response = server
        .get("/api/v1/sip-configs")
        .add_query_param("skip", "1")
        .add_query_param("limit", "1")
        .await;
    let body: Value = response.json();
    let listed: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, vec![ids[1]]);
}
