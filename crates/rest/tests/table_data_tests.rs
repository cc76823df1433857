//! End-to-end tests for the table data endpoints.
//!
//! Each test starts the full application over an in-memory SQLite database
//! seeded with 25 people:
//!
//! - `name` is `{alice|bob|carol|dave|erin}{id}`, cycling in that order
//! - `city` is `Paris` when `id` is a multiple of 3, `Lima` otherwise
//!
//! Run with: `cargo test -p tabledata-rest --test table_data_tests`

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use tabledata_persistence::backends::sqlite::SqliteBackend;
use tabledata_persistence::types::{QueryDescriptor, SqlParam};
use tabledata_rest::error::DATA_ACCESS_MESSAGE;
use tabledata_rest::{ServerConfig, TableRegistry, create_app_with_config};

const FIRST_NAMES: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

fn seeded_backend() -> SqliteBackend {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");

    let mut sql = String::from(
        "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT NOT NULL);",
    );
    for id in 1..=25 {
        let name = format!("{}{}", FIRST_NAMES[(id - 1) % 5], id);
        let city = if id % 3 == 0 { "Paris" } else { "Lima" };
        sql.push_str(&format!(
            "INSERT INTO people (id, name, city) VALUES ({id}, '{name}', '{city}');"
        ));
    }
    backend.execute_batch(&sql).expect("Failed to seed people");
    backend
}

fn tables() -> TableRegistry {
    TableRegistry::new()
        .with_table("people", QueryDescriptor::new("FROM people").unwrap())
        .unwrap()
        .with_table(
            "early_people",
            QueryDescriptor::new("FROM people")
                .unwrap()
                .with_where("WHERE id <= :max_id", [("max_id", SqlParam::integer(20))])
                .unwrap(),
        )
        .unwrap()
}

fn create_server_with_config(config: ServerConfig) -> TestServer {
    let app = create_app_with_config(seeded_backend(), tables(), config);
    TestServer::new(app).expect("Failed to create test server")
}

fn create_server() -> TestServer {
    create_server_with_config(ServerConfig::for_testing())
}

/// Grid parameters for the `id`, `name` and `city` columns plus `extra`.
fn grid(extra: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        ("columns[0][data]", "id"),
        ("columns[0][searchable]", "false"),
        ("columns[1][data]", "name"),
        ("columns[2][data]", "city"),
        ("columns[2][orderable]", "false"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    params.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    params
}

fn ids(body: &Value) -> Vec<i64> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row[0].as_i64().unwrap())
        .collect()
}

// ============================================================================
// Paging and ordering
// ============================================================================

#[tokio::test]
async fn test_first_page() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[
            ("draw", "1"),
            ("start", "0"),
            ("length", "10"),
            ("order[0][column]", "0"),
            ("order[0][dir]", "asc"),
        ]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["draw"], 1);
    assert_eq!(body["recordsTotal"], 25);
    assert_eq!(body["recordsFiltered"], 25);
    assert_eq!(body["data"][0], json!([1, "alice1", "Lima"]));
    assert_eq!(ids(&body), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_last_partial_page() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[
            ("start", "20"),
            ("length", "10"),
            ("order[0][column]", "0"),
            ("order[0][dir]", "asc"),
        ]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), vec![21, 22, 23, 24, 25]);
}

#[tokio::test]
async fn test_descending_order() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[
            ("length", "3"),
            ("order[0][column]", "0"),
            ("order[0][dir]", "desc"),
        ]))
        .await;

    let body: Value = response.json();
    assert_eq!(ids(&body), vec![25, 24, 23]);
}

#[tokio::test]
async fn test_all_rows_and_draw_default() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[("length", "-1")]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["draw"], 0);
    assert_eq!(body["data"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_default_page_length() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[]))
        .await;

    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_page_length_ceiling() {
    let server = create_server_with_config(ServerConfig {
        max_page_length: 5,
        default_page_length: 5,
        ..ServerConfig::for_testing()
    });

    for length in ["50", "-1"] {
        let response = server
            .get("/tables/people")
            .add_query_params(grid(&[("length", length)]))
            .await;
        let body: Value = response.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["recordsTotal"], 25);
    }
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_filters_rows() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[
            ("search[value]", "ALICE"),
            ("order[0][column]", "0"),
            ("order[0][dir]", "desc"),
        ]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recordsTotal"], 25);
    assert_eq!(body["recordsFiltered"], 5);
    assert_eq!(ids(&body), vec![21, 16, 11, 6, 1]);
}

#[tokio::test]
async fn test_search_skips_unsearchable_columns() {
    let server = create_server();

    // id is not searchable, so "2" only matches names.
    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[("search[value]", "2"), ("length", "-1")]))
        .await;

    let body: Value = response.json();
    // 2, 12, 20..25
    assert_eq!(body["recordsFiltered"], 8);
}

#[tokio::test]
async fn test_search_is_bound_not_interpolated() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[("search[value]", "' OR '1'='1")]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recordsFiltered"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_static_where_with_search() {
    let server = create_server();

    let response = server
        .get("/tables/early_people")
        .add_query_params(grid(&[("search[value]", "paris"), ("length", "-1")]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recordsTotal"], 20);
    assert_eq!(body["recordsFiltered"], 6);
}

// ============================================================================
// Request bodies
// ============================================================================

#[tokio::test]
async fn test_form_post() {
    let server = create_server();

    let response = server
        .post("/tables/people")
        .form(&grid(&[
            ("draw", "5"),
            ("length", "2"),
            ("order[0][column]", "1"),
            ("order[0][dir]", "asc"),
        ]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["draw"], 5);
    assert_eq!(body["data"][0][1], "alice1");
    assert_eq!(body["data"][1][1], "alice11");
}

#[tokio::test]
async fn test_json_post() {
    let server = create_server();

    let response = server
        .post("/tables/people")
        .json(&json!({
            "draw": 8,
            "start": 0,
            "length": 2,
            "columns": [
                {"data": "name", "name": "", "searchable": true, "orderable": true},
                {"data": "city", "name": "", "searchable": true, "orderable": true}
            ],
            "order": [{"column": 1, "dir": "desc"}, {"column": 0, "dir": "asc"}],
            "search": {"value": "erin", "regex": false}
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["draw"], 8);
    assert_eq!(body["recordsFiltered"], 5);
    assert_eq!(body["data"], json!([["erin15", "Paris"], ["erin10", "Lima"]]));
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_unknown_table() {
    let server = create_server();

    let response = server
        .get("/tables/nope")
        .add_query_params(grid(&[]))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": "unknown table: nope"}));
}

#[tokio::test]
async fn test_malformed_parameters_are_bad_request() {
    let server = create_server();

    for extra in [
        [("start", "-1"), ("length", "10")],
        [("start", "abc"), ("length", "10")],
        [("order[0][column]", "0"), ("order[0][dir]", "sideways")],
        [("order[0][column]", "9"), ("order[0][dir]", "asc")],
    ] {
        let response = server
            .get("/tables/people")
            .add_query_params(grid(&extra))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_not_orderable_column_rejected() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[("order[0][column]", "2"), ("order[0][dir]", "asc")]))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_not_orderable_allowed_when_not_enforced() {
    let server = create_server_with_config(ServerConfig {
        enforce_orderable: false,
        ..ServerConfig::for_testing()
    });

    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[("order[0][column]", "2"), ("order[0][dir]", "desc")]))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"][0][2], "Paris");
}

#[tokio::test]
async fn test_invalid_column_name_rejected() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(vec![("columns[0][data]", "id; DROP TABLE people")])
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    // The table is still there.
    let response = server
        .get("/tables/people")
        .add_query_params(grid(&[]))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_no_columns_is_bad_request() {
    let server = create_server();

    let response = server.get("/tables/people").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_database_error_is_generic() {
    let server = create_server();

    let response = server
        .get("/tables/people")
        .add_query_params(vec![("columns[0][data]", "salary")])
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body, json!({"error": DATA_ACCESS_MESSAGE}));
}

// ============================================================================
// Other routes
// ============================================================================

#[tokio::test]
async fn test_list_tables() {
    let server = create_server();

    let response = server.get("/tables").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"tables": ["early_people", "people"]}));
}

#[tokio::test]
async fn test_health() {
    let server = create_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "sqlite");
    assert_eq!(body["tables"], 2);
}
