//! HTTP-level integration tests for the `/loans` endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_bytes, body_json, content_type, delete, get, post_json, post_multipart, put_json,
    FilePart, LOAN_CSV,
};
use serde_json::json;
use sqlx::PgPool;

async fn seed(app: axum::Router) {
    let response = post_multipart(
        app,
        "/api/v1/loans/upload_csv",
        &[FilePart::csv("loans.csv", LOAN_CSV.as_bytes())],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// CSV upload
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_csv_inserts_complete_rows(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_multipart(
        app.clone(),
        "/api/v1/loans/upload_csv",
        &[FilePart::csv("loans.csv", LOAN_CSV.as_bytes())],
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "3 loans successfully added to the database");
    assert_eq!(json["inserted"], 3);
    assert_eq!(json["dropped"], 1);

    let json = body_json(get(app, "/api/v1/loans/3").await).await;
    assert_eq!(json["credit_score"], 810);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_csv_rejects_bad_uploads(pool: PgPool) {
    let app = common::build_test_app(pool);

    let wrong_field = FilePart {
        field: "document",
        ..FilePart::csv("loans.csv", LOAN_CSV.as_bytes())
    };
    let response = post_multipart(app.clone(), "/api/v1/loans/upload_csv", &[wrong_field]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file part");

    let response = post_multipart(
        app.clone(),
        "/api/v1/loans/upload_csv",
        &[FilePart::csv("", LOAN_CSV.as_bytes())],
    )
    .await;
    assert_eq!(body_json(response).await["error"], "No selected file");

    let response = post_multipart(
        app.clone(),
        "/api/v1/loans/upload_csv",
        &[FilePart::csv("loans.txt", LOAN_CSV.as_bytes())],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid file format"));

    let response = post_multipart(
        app,
        "/api/v1/loans/upload_csv",
        &[FilePart::csv("loans.csv", b"loan_id,income\n1,2\n")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Missing required column: loan_amount"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_csv_with_existing_ids_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    seed(app.clone()).await;

    let response = post_multipart(
        app.clone(),
        "/api/v1/loans/upload_csv",
        &[FilePart::csv("loans.csv", LOAN_CSV.as_bytes())],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");

    // The failed import left nothing behind.
    let json = body_json(get(app, "/api/v1/loans").await).await;
    assert_eq!(json["total_items"], 3);
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn loan_crud_round_trip(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/loans",
        json!({
            "income": 52000.0,
            "loan_amount": 15000.0,
            "credit_score": 712.6,
            "loan_status": "Approved",
            "asset_value": 90000.0
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Loan approval created");
    let id = json["loan_id"].as_i64().unwrap();

    let json = body_json(get(app.clone(), &format!("/api/v1/loans/{id}")).await).await;
    assert_eq!(json["credit_score"], 713);
    assert_eq!(json["loan_status"], "Approved");

    let response = put_json(
        app.clone(),
        &format!("/api/v1/loans/{id}"),
        json!({"loan_status": "Rejected"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Loan approval updated");
    assert_eq!(json["loan"]["loan_status"], "Rejected");
    assert_eq!(json["loan"]["income"], 52000.0);

    let response = delete(app.clone(), &format!("/api/v1/loans/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Loan approval deleted");

    let response = get(app, &format!("/api/v1/loans/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_loan_reports_missing_and_invalid_fields(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/loans",
        json!({"income": 1.0, "loan_amount": 1.0, "credit_score": 700, "loan_status": "Approved"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Missing required field: asset_value"
    );

    let response = post_json(
        app,
        "/api/v1/loans",
        json!({
            "income": 1.0,
            "loan_amount": -5.0,
            "credit_score": 700,
            "loan_status": "Approved",
            "asset_value": 1.0
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_and_delete_missing_loan_return_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = put_json(app.clone(), "/api/v1/loans/999", json!({"income": 1.0})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(app, "/api/v1/loans/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_loans_is_paginated(pool: PgPool) {
    let app = common::build_test_app(pool);
    seed(app.clone()).await;

    let json = body_json(get(app.clone(), "/api/v1/loans?page=2&per_page=2").await).await;
    assert_eq!(json["page"], 2);
    assert_eq!(json["total_items"], 3);
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["loan_id"], 3);

    let json = body_json(get(app, "/api/v1/loans?page=9").await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Filter and aggregate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn filter_ands_conditions(pool: PgPool) {
    let app = common::build_test_app(pool);
    seed(app.clone()).await;

    let response = post_json(
        app,
        "/api/v1/loans/filter",
        json!({
            "filters": [
                {"column": "loan_status", "value": "Approved"},
                {"column": "income", "value": "60000", "operator": "greater_than"}
            ]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["pages"], 1);
    assert_eq!(json["current_page"], 1);
    assert_eq!(json["filtered_loans"][0]["loan_id"], 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn aggregate_runs_over_filtered_rows(pool: PgPool) {
    let app = common::build_test_app(pool);
    seed(app.clone()).await;

    let json = body_json(
        post_json(
            app.clone(),
            "/api/v1/loans/filter",
            json!({
                "filters": [{"column": "loan_status", "value": "Approved"}],
                "aggregate_type": "sum",
                "field": "loan_amount"
            }),
        )
        .await,
    )
    .await;
    assert_eq!(json["aggregate_type"], "sum");
    assert_eq!(json["field"], "loan_amount");
    assert_eq!(json["result"], 15000.0);

    let empty = json!([{"column": "credit_score", "value": 2000, "operator": "greater_than"}]);
    let json = body_json(
        post_json(
            app.clone(),
            "/api/v1/loans/filter",
            json!({"filters": empty, "aggregate_type": "count", "field": "loan_id"}),
        )
        .await,
    )
    .await;
    assert_eq!(json["result"], 0);

    let json = body_json(
        post_json(
            app,
            "/api/v1/loans/filter",
            json!({"filters": empty, "aggregate_type": "avg", "field": "income"}),
        )
        .await,
    )
    .await;
    assert!(json["result"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn filter_rejects_unknown_names(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/loans/filter",
        json!({"filters": [{"column": "loan_id", "value": 1}]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Unsupported column: loan_id");

    let response = post_json(
        app.clone(),
        "/api/v1/loans/filter",
        json!({"filters": [{"column": "income", "value": 1, "operator": "like"}]}),
    )
    .await;
    assert_eq!(body_json(response).await["error"], "Unsupported operator: like");

    let response = post_json(
        app,
        "/api/v1/loans/filter",
        json!({"aggregate_type": "median", "field": "income"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Statistics and charts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_summarize_a_column(pool: PgPool) {
    let app = common::build_test_app(pool);
    seed(app.clone()).await;

    let response = post_json(app, "/api/v1/loans/stats", json!({"column_name": "income"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["mean"], 56666.7);
    assert_eq!(json["median"], 50000.0);
    assert_eq!(json["mode"], 30000.0);
    assert_eq!(json["q1"], 40000.0);
    assert_eq!(json["q3"], 70000.0);
    assert_eq!(json["outliers"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stats_validate_the_column(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app.clone(), "/api/v1/loans/stats", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Please provide a 'column_name' in the request body"
    );

    let response = post_json(
        app.clone(),
        "/api/v1/loans/stats",
        json!({"column_name": "loan_status"}),
    )
    .await;
    assert_eq!(
        body_json(response).await["error"],
        "Column 'loan_status' does not exist in the LoanApproval table"
    );

    let response = post_json(app, "/api/v1/loans/stats", json!({"column_name": "income"})).await;
    assert_eq!(
        body_json(response).await["error"],
        "Not enough data points to compute statistics"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn chart_and_graph_render_png(pool: PgPool) {
    let app = common::build_test_app(pool);
    seed(app.clone()).await;

    for uri in ["/api/v1/loans/chart", "/api/v1/loans/graph"] {
        let response = post_json(app.clone(), uri, json!({"column_name": "credit_score"})).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(content_type(&response), "image/png");
        let png = body_bytes(response).await;
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn chart_of_empty_table_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/v1/loans/chart", json!({"column_name": "income"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "No data available for column 'income'"
    );
}
