use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cheminf::server::{build_router, AppState};
use cheminf::{Config, SqliteStore};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    router: Router,
}

fn app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = Config {
        database: dir.path().join("lab.db"),
        static_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let store = SqliteStore::from_config(&config).unwrap();
    store.load_sample_data().unwrap();
    drop(store);

    let state = Arc::new(AppState::new(config).unwrap());
    TestApp { _dir: dir, router: build_router(state) }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body, headers)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body, _) = self.send(Request::get(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn json(&self, method: &str, uri: &str, payload: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, body, _) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body, _) = self.send(Request::delete(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn test_health_reports_table_counts() {
    let app = app();
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tables"]["molecules"], 40);
    assert_eq!(body["tables"]["time_series"], 200);
}

#[tokio::test]
async fn test_molecule_crud() {
    let app = app();

    let (status, body) =
        app.json("POST", "/api/molecules", json!({"MoleculeUpacName": "Ethanol", "SMILES": "CCO"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/api/molecules/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["MoleculeUpacName"], "Ethanol");

    let (status, _) = app.json("PUT", &format!("/api/molecules/{id}"), json!({"MoleculeUpacName": "Ethyl alcohol"})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get(&format!("/api/molecules/{id}")).await;
    assert_eq!(body["MoleculeUpacName"], "Ethyl alcohol");
    assert_eq!(body["SMILES"], "CCO");

    let (status, _) = app.delete(&format!("/api/molecules/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.get(&format!("/api/molecules/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("molecule {id} not found"));
}

#[tokio::test]
async fn test_molecule_validation_errors() {
    let app = app();
    let (status, body) =
        app.json("POST", "/api/molecules", json!({"MoleculeUpacName": "Broken", "SMILES": "C1CC"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app.delete("/api/molecules/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_molecule_image_and_render() {
    let app = app();
    let (status, body) = app.get("/api/molecules/3/image").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["formula"], "C9H8O4");
    assert!(body["image"].as_str().unwrap().starts_with("data:image/svg+xml;base64,"));

    let (_, body) = app.json("POST", "/api/molecules", json!({"MoleculeUpacName": "Mystery"})).await;
    let id = body["id"].as_i64().unwrap();
    let (status, body) = app.get(&format!("/api/molecules/{id}/image")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, body) = app.get("/api/molecules/render?smiles=CCO").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["formula"], "C2H6O");

    let (status, _) = app.get("/api/molecules/render?smiles=C(C").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_out_of_range_bracket_atoms_rejected() {
    let app = app();
    let (status, body) =
        app.json("POST", "/api/molecules", json!({"MoleculeUpacName": "Overcharged", "SMILES": "[C-128]"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("charge"));

    let (status, body) = app.get("/api/molecules/render?smiles=%5BC-128%5D").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/molecules/render?smiles=%5BFe%2B200%5D").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = app.get("/api/molecules/render?smiles=%5BCH300%5D").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let huge = "C".repeat(cheminf::chem::smiles::MAX_ATOMS + 1);
    let (status, _) = app.get(&format!("/api/molecules/render?smiles={huge}")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_extractor_rejections_are_json() {
    let app = app();
    let request = Request::post("/api/molecules")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body, _) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].is_string());

    let (status, body) = app.get("/api/molecules/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.get("/api/molecules/render").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_molecule_search() {
    let app = app();
    let (status, body) = app.get("/api/molecules/search?q=acid").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body.as_array().unwrap().iter().map(|m| m["MoleculeUpacName"].as_str().unwrap()).collect();
    assert!(names.contains(&"Salicylic Acid"));
    assert!(names.iter().all(|n| n.to_lowercase().contains("acid")));
}

#[tokio::test]
async fn test_inventory_rules() {
    let app = app();
    let (status, body) =
        app.json("POST", "/api/inventory", json!({"MoleculeUpacName": "Methanol", "amount": 10, "unit": "ml"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Methanol"));

    let (status, _) =
        app.json("POST", "/api/inventory", json!({"MoleculeUpacName": "Hexane", "amount": -1, "unit": "ml"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/inventory/check?name=Ethanol").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["in_stock"], true);
    assert_eq!(body["amount"], 300);

    let (_, body) = app.get("/api/inventory/check?name=Unobtainium").await;
    assert_eq!(body["in_stock"], false);
}

#[tokio::test]
async fn test_deleting_project_removes_tasks() {
    let app = app();
    let (_, body) = app.json("POST", "/api/projects", json!({"name": "Esterification"})).await;
    let project = body["id"].as_i64().unwrap();
    let (status, _) = app
        .json("POST", "/api/tasks", json!({"project_id": project, "description": "Reflux", "content": "{\"h\": 2}"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, tasks) = app.get(&format!("/api/projects/{project}/tasks")).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);

    let (status, _) = app.delete(&format!("/api/projects/{project}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/projects/{project}/tasks")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, all) = app.get("/api/tasks").await;
    assert!(all.as_array().unwrap().iter().all(|t| t["project_id"] != project));
}

#[tokio::test]
async fn test_task_for_missing_project_rejected() {
    let app = app();
    let (status, body) =
        app.json("POST", "/api/tasks", json!({"project_id": 4242, "description": "Orphan"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("4242"));
}

#[tokio::test]
async fn test_reaction_overview_and_participants() {
    let app = app();
    let (status, body) = app.get("/api/reactions/1/overview").await;
    assert_eq!(status, StatusCode::OK);
    let equation = body["equation"].as_str().unwrap();
    assert!(equation.contains("->"));
    assert!(equation.contains("Salicylic Acid"));
    assert_eq!(body["reactants"].as_array().unwrap().len(), 2);

    let (status, _) = app.json("PUT", "/api/participants/1/1/reactant", json!({"stoichiometric_coefficient": 2.0})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/reactions/1/overview").await;
    assert!(body["equation"].as_str().unwrap().starts_with("2 Salicylic Acid"));

    let (status, _) = app.json("PUT", "/api/participants/1/1/spectator", json!({"stoichiometric_coefficient": 1.0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete("/api/reactions/1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/reactions/1/participants").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lims_sample_code_unique_and_cascade() {
    let app = app();
    let (status, body) = app
        .json("POST", "/api/lims/samples", json!({"experiment_id": 1, "sample_code": "S001", "sample_type": "Water"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("S001"));

    let (status, samples) = app.get("/api/lims/experiments/1/samples").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(samples.as_array().unwrap().len(), 5);

    let (status, _) = app.delete("/api/lims/experiments/1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/lims/experiments/1/samples").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, measurements) = app.get("/api/lims/measurements").await;
    assert_eq!(measurements.as_array().unwrap().len(), 15);
    let (status, _) = app.get("/api/v1/timeseries/1/data").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_timeseries_queries() {
    let app = app();
    let (status, body) = app.get("/api/v1/timeseries/experiments").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["series_count"], 4);
    assert_eq!(body[0]["point_count"], 200);

    let (_, points) = app.get("/api/v1/timeseries/1/data?parameters=temperature&parameters=pH").await;
    assert_eq!(points.as_array().unwrap().len(), 100);

    let (status, stats) = app.get("/api/v1/timeseries/1/statistics?parameters=conversion").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats[0]["data_points"], 50);
    assert_eq!(stats[0]["min_value"], 0.0);
}

#[tokio::test]
async fn test_timeseries_insert_and_delete() {
    let app = app();
    let points = json!([
        {"parameter_name": "absorbance", "time_step": 0, "value": 0.12, "unit": "AU"},
        {"parameter_name": "absorbance", "time_step": 1, "value": 0.18, "unit": "AU"},
    ]);
    let (status, body) = app.json("POST", "/api/v1/timeseries/2/data", points).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["inserted"], 2);

    let bad = json!([{"parameter_name": "absorbance", "time_step": -1, "value": 0.1}]);
    let (status, _) = app.json("POST", "/api/v1/timeseries/2/data", bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.json("POST", "/api/v1/timeseries/2/data", json!([])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let one = json!([{"parameter_name": "absorbance", "time_step": 0, "value": 0.1}]);
    let (status, _) = app.json("POST", "/api/v1/timeseries/9999/data", one).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/api/v1/timeseries/2/data").await;
    assert_eq!(status, StatusCode::OK);
    let (_, points) = app.get("/api/v1/timeseries/2/data").await;
    assert!(points.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_timeseries_mixed_timestamp_forms() {
    let app = app();
    let points = json!([
        {"parameter_name": "turbidity", "time_step": 1, "timestamp": "2025-03-01 10:00:00", "value": 3.0, "unit": "NTU"},
        {"parameter_name": "turbidity", "time_step": 0, "timestamp": "2025-03-01T09:00", "value": 2.0, "unit": "NTU"},
    ]);
    let (status, _) = app.json("POST", "/api/v1/timeseries/2/data", points).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, series) = app.get("/api/v1/timeseries/2/series").await;
    let turbidity = series.as_array().unwrap().iter().find(|s| s["parameter_name"] == "turbidity").unwrap();
    assert_eq!(turbidity["start_time"], "2025-03-01 09:00:00");
    assert_eq!(turbidity["end_time"], "2025-03-01 10:00:00");
}

#[tokio::test]
async fn test_timeseries_export_formats() {
    let app = app();
    let request = Request::get("/api/v1/timeseries/1/export?format=csv&parameters=pressure").body(Body::empty()).unwrap();
    let (status, body, headers) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().contains("experiment_1_timeseries.csv"));
    let csv = String::from_utf8(body).unwrap();
    assert!(csv.starts_with("series_name,parameter_name,time_step,timestamp,value,unit,notes"));
    assert_eq!(csv.lines().count(), 51);

    let (status, figure) = app.get("/api/v1/timeseries/1/export?format=plotly&parameters=temperature&parameters=pressure").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(figure["data"].as_array().unwrap().len(), 2);

    let (status, body) = app.get("/api/v1/timeseries/1/export?format=yaml").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("yaml"));

    let (status, _) = app.get("/api/v1/timeseries/77/export?format=csv").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pages_require_login() {
    let app = app();
    let (status, _, headers) = app.send(Request::get("/molecules/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login");

    let bad = Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin&password=nope"))
        .unwrap();
    let (status, body, _) = app.send(bad).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Invalid username or password"));

    let good = Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin&password=admin"))
        .unwrap();
    let (status, _, headers) = app.send(good).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let cookie = headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("cheminf_session="));
    let session = cookie.split(';').next().unwrap().to_string();

    let page = Request::get("/molecules/").header(header::COOKIE, &session).body(Body::empty()).unwrap();
    let (status, body, _) = app.send(page).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Salicylic Acid"));

    let add = Request::post("/inventory/")
        .header(header::COOKIE, &session)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("action=add&name=Methanol&amount=5&unit=ml"))
        .unwrap();
    let (status, body, _) = app.send(add).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_timeseries_page_limits_parameters() {
    let app = app();
    let login = Request::post("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=admin&password=admin"))
        .unwrap();
    let (_, _, headers) = app.send(login).await;
    let session = headers[header::SET_COOKIE].to_str().unwrap().split(';').next().unwrap().to_string();

    let uri = "/timeseries/?experiment_id=1&parameters=temperature&parameters=pressure&parameters=pH\
               &parameters=conversion&parameters=extra";
    let (status, body, _) =
        app.send(Request::get(uri).header(header::COOKIE, &session).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Please select up to 4 parameters maximum"));
    assert!(!html.contains("Plotly.newPlot"));

    let uri = "/timeseries/?experiment_id=1&parameters=temperature";
    let (_, body, _) = app.send(Request::get(uri).header(header::COOKIE, &session).body(Body::empty()).unwrap()).await;
    assert!(String::from_utf8(body).unwrap().contains("Plotly.newPlot"));
}
