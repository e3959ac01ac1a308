// ABOUTME: HTTP integration tests for profile, health metrics, health records and their child lists
// ABOUTME: Exercises validation messages, value stringification and owner-scoped mutations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_profile_requires_auth() {
    let app = common::create_test_app().await;

    let response = AxumTestRequest::get("/api/profile").send(app.router()).await;

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_get_profile_includes_child_lists() {
    let app = common::create_test_app().await;
    let (user, token) = common::create_test_user(&app, "profile@example.com").await;

    let response = AxumTestRequest::get("/api/profile")
        .bearer(&token)
        .send(app.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let profile = &body["profile"];
    assert_eq!(profile["id"], user.id);
    assert_eq!(profile["first_name"], "Test");
    assert!(profile.get("password_hash").is_none());
    assert_eq!(profile["medications"], json!([]));
    assert_eq!(profile["allergies"], json!([]));
    assert_eq!(profile["conditions"], json!([]));
}

#[tokio::test]
async fn test_update_profile_is_partial_and_replaces_lists() {
    let app = common::create_test_app().await;
    let (_, token) = common::create_test_user(&app, "update@example.com").await;

    let response = AxumTestRequest::put("/api/profile")
        .bearer(&token)
        .json(&json!({
            "bloodGroup": "O+",
            "height": 172.5,
            "allergies": ["Peanuts", "  ", "Dust"],
            "currentMedications": ["Metformin"],
        }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Profile updated successfully");
    let profile = &body["profile"];
    assert_eq!(profile["blood_group"], "O+");
    assert_eq!(profile["height"], 172.5);
    assert_eq!(profile["first_name"], "Test");
    assert_eq!(profile["allergies"].as_array().unwrap().len(), 2);
    assert_eq!(profile["medications"][0]["name"], "Metformin");

    // A second update without list fields leaves the lists alone
    let response = AxumTestRequest::put("/api/profile")
        .bearer(&token)
        .json(&json!({ "city": "Lahore", "allergies": ["Dust"] }))
        .send(app.router())
        .await;
    let body: Value = response.json();
    assert_eq!(body["profile"]["city"], "Lahore");
    assert_eq!(body["profile"]["allergies"].as_array().unwrap().len(), 1);
    assert_eq!(body["profile"]["allergies"][0]["allergen"], "Dust");
    assert_eq!(body["profile"]["medications"].as_array().unwrap().len(), 1);
}

// ============================================================================
// Health metrics
// ============================================================================

#[tokio::test]
async fn test_create_metric_requires_fields() {
    let app = common::create_test_app().await;
    let (_, token) = common::create_test_user(&app, "metrics@example.com").await;

    let response = AxumTestRequest::post("/api/health-metrics")
        .bearer(&token)
        .json(&json!({ "metricType": "weight", "unit": "kg" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["message"],
        "Metric type, value, and unit are required"
    );
}

#[tokio::test]
async fn test_metric_crud_and_numeric_values() {
    let app = common::create_test_app().await;
    let (_, token) = common::create_test_user(&app, "crud@example.com").await;

    let created = AxumTestRequest::post("/api/health-metrics")
        .bearer(&token)
        .json(&json!({ "metricType": "weight", "value": 72.5, "unit": "kg" }))
        .send(app.router())
        .await;
    assert_eq!(created.status(), 201);
    let created: Value = created.json();
    assert_eq!(created["message"], "Health metric added successfully");
    assert_eq!(created["metric"]["value"], "72.5");
    let id = created["metric"]["id"].as_str().unwrap().to_owned();

    AxumTestRequest::post("/api/health-metrics")
        .bearer(&token)
        .json(&json!({ "metricType": "blood_pressure", "value": "120/80", "unit": "mmHg" }))
        .send(app.router())
        .await;

    let filtered = AxumTestRequest::get("/api/health-metrics?type=weight")
        .bearer(&token)
        .send(app.router())
        .await;
    let filtered: Value = filtered.json();
    assert_eq!(filtered["metrics"].as_array().unwrap().len(), 1);

    let all = AxumTestRequest::get("/api/health-metrics?limit=abc")
        .bearer(&token)
        .send(app.router())
        .await;
    let all: Value = all.json();
    assert_eq!(all["metrics"].as_array().unwrap().len(), 2);

    let updated = AxumTestRequest::put(&format!("/api/health-metrics/{id}"))
        .bearer(&token)
        .json(&json!({ "value": 71, "notes": "after breakfast" }))
        .send(app.router())
        .await;
    assert_eq!(updated.status(), 200);
    let updated: Value = updated.json();
    assert_eq!(updated["metric"]["value"], "71");
    assert_eq!(updated["metric"]["unit"], "kg");
    assert_eq!(updated["metric"]["notes"], "after breakfast");

    let deleted = AxumTestRequest::delete(&format!("/api/health-metrics/{id}"))
        .bearer(&token)
        .send(app.router())
        .await;
    assert_eq!(deleted.status(), 200);
    let deleted: Value = deleted.json();
    assert_eq!(deleted["message"], "Health metric deleted successfully");

    let again = AxumTestRequest::delete(&format!("/api/health-metrics/{id}"))
        .bearer(&token)
        .send(app.router())
        .await;
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_metric_mutation_by_other_user_is_not_found() {
    let app = common::create_test_app().await;
    let (owner, owner_token) = common::create_test_user(&app, "owner@example.com").await;
    let (_, other_token) = common::create_test_user(&app, "other@example.com").await;

    let created = AxumTestRequest::post("/api/health-metrics")
        .bearer(&owner_token)
        .json(&json!({ "metricType": "glucose", "value": "5.4", "unit": "mmol/L" }))
        .send(app.router())
        .await;
    let created: Value = created.json();
    let id = created["metric"]["id"].as_str().unwrap().to_owned();

    let update = AxumTestRequest::put(&format!("/api/health-metrics/{id}"))
        .bearer(&other_token)
        .json(&json!({ "value": "9.9" }))
        .send(app.router())
        .await;
    assert_eq!(update.status(), 404);

    let delete = AxumTestRequest::delete(&format!("/api/health-metrics/{id}"))
        .bearer(&other_token)
        .send(app.router())
        .await;
    assert_eq!(delete.status(), 404);

    let stored = app
        .database()
        .health_metrics()
        .get(&owner.id, &id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value, "5.4");
}

// ============================================================================
// Health records
// ============================================================================

#[tokio::test]
async fn test_record_requires_title() {
    let app = common::create_test_app().await;
    let (_, token) = common::create_test_user(&app, "records@example.com").await;

    let response = AxumTestRequest::post("/api/health-records")
        .bearer(&token)
        .json(&json!({ "description": "no title" }))
        .send(app.router())
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Title is required");
}

#[tokio::test]
async fn test_record_lifecycle_with_defaults() {
    let app = common::create_test_app().await;
    let (_, token) = common::create_test_user(&app, "lifecycle@example.com").await;

    let created = AxumTestRequest::post("/api/health-records")
        .bearer(&token)
        .json(&json!({ "title": "Annual checkup", "providerName": "Dr. Malik" }))
        .send(app.router())
        .await;
    assert_eq!(created.status(), 201);
    let created: Value = created.json();
    assert_eq!(created["message"], "Health record added successfully");
    assert_eq!(created["record"]["record_type"], "general");
    assert_eq!(created["record"]["provider_name"], "Dr. Malik");
    assert_eq!(created["record"]["date"].as_str().unwrap().len(), 10);
    let id = created["record"]["id"].as_str().unwrap().to_owned();

    let updated = AxumTestRequest::put(&format!("/api/health-records/{id}"))
        .bearer(&token)
        .json(&json!({ "recordType": "lab_result", "notes": "HbA1c normal" }))
        .send(app.router())
        .await;
    assert_eq!(updated.status(), 200);
    let updated: Value = updated.json();
    assert_eq!(updated["record"]["record_type"], "lab_result");
    assert_eq!(updated["record"]["title"], "Annual checkup");

    let listed = AxumTestRequest::get("/api/health-records")
        .bearer(&token)
        .send(app.router())
        .await;
    let listed: Value = listed.json();
    assert_eq!(listed["records"].as_array().unwrap().len(), 1);

    let deleted = AxumTestRequest::delete(&format!("/api/health-records/{id}"))
        .bearer(&token)
        .send(app.router())
        .await;
    assert_eq!(deleted.status(), 200);

    let missing = AxumTestRequest::put(&format!("/api/health-records/{id}"))
        .bearer(&token)
        .json(&json!({ "title": "gone" }))
        .send(app.router())
        .await;
    assert_eq!(missing.status(), 404);
}

// ============================================================================
// Child lists
// ============================================================================

#[tokio::test]
async fn test_medication_crud() {
    let app = common::create_test_app().await;
    let (_, token) = common::create_test_user(&app, "meds@example.com").await;

    let missing_name = AxumTestRequest::post("/api/health-records/medications")
        .bearer(&token)
        .json(&json!({ "dosage": "500mg" }))
        .send(app.router())
        .await;
    assert_eq!(missing_name.status(), 400);

    let created = AxumTestRequest::post("/api/health-records/medications")
        .bearer(&token)
        .json(&json!({ "name": "Metformin", "dosage": "500mg", "frequency": "twice daily" }))
        .send(app.router())
        .await;
    assert_eq!(created.status(), 201);
    let created: Value = created.json();
    let id = created["medication"]["id"].as_str().unwrap().to_owned();

    let updated = AxumTestRequest::put(&format!("/api/health-records/medications/{id}"))
        .bearer(&token)
        .json(&json!({ "dosage": "850mg" }))
        .send(app.router())
        .await;
    assert_eq!(updated.status(), 200);
    let updated: Value = updated.json();
    assert_eq!(updated["medication"]["dosage"], "850mg");
    assert_eq!(updated["medication"]["name"], "Metformin");

    let listed = AxumTestRequest::get("/api/health-records/medications")
        .bearer(&token)
        .send(app.router())
        .await;
    let listed: Value = listed.json();
    assert_eq!(listed["medications"].as_array().unwrap().len(), 1);

    let deleted = AxumTestRequest::delete(&format!("/api/health-records/medications/{id}"))
        .bearer(&token)
        .send(app.router())
        .await;
    let deleted: Value = deleted.json();
    assert_eq!(deleted["message"], "Medication deleted successfully");
}

#[tokio::test]
async fn test_allergy_and_condition_are_owner_scoped() {
    let app = common::create_test_app().await;
    let (_, token) = common::create_test_user(&app, "allergy@example.com").await;
    let (_, other_token) = common::create_test_user(&app, "nosy@example.com").await;

    let allergy = AxumTestRequest::post("/api/health-records/allergies")
        .bearer(&token)
        .json(&json!({ "allergen": "Penicillin", "severity": "severe" }))
        .send(app.router())
        .await;
    assert_eq!(allergy.status(), 201);
    let allergy: Value = allergy.json();
    let allergy_id = allergy["allergy"]["id"].as_str().unwrap().to_owned();

    let condition = AxumTestRequest::post("/api/health-records/conditions")
        .bearer(&token)
        .json(&json!({ "name": "Asthma", "diagnosedDate": "2015-04-01", "status": "active" }))
        .send(app.router())
        .await;
    assert_eq!(condition.status(), 201);
    let condition: Value = condition.json();
    assert_eq!(condition["condition"]["diagnosed_date"], "2015-04-01");
    let condition_id = condition["condition"]["id"].as_str().unwrap().to_owned();

    let foreign_delete = AxumTestRequest::delete(&format!(
        "/api/health-records/allergies/{allergy_id}"
    ))
    .bearer(&other_token)
    .send(app.router())
    .await;
    assert_eq!(foreign_delete.status(), 404);

    let foreign_update = AxumTestRequest::put(&format!(
        "/api/health-records/conditions/{condition_id}"
    ))
    .bearer(&other_token)
    .json(&json!({ "status": "resolved" }))
    .send(app.router())
    .await;
    assert_eq!(foreign_update.status(), 404);

    let other_view = AxumTestRequest::get("/api/health-records/allergies")
        .bearer(&other_token)
        .send(app.router())
        .await;
    let other_view: Value = other_view.json();
    assert_eq!(other_view["allergies"], json!([]));

    let own_view = AxumTestRequest::get("/api/health-records/conditions")
        .bearer(&token)
        .send(app.router())
        .await;
    let own_view: Value = own_view.json();
    assert_eq!(own_view["conditions"][0]["status"], "active");
}
