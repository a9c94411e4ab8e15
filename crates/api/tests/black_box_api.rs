use reqwest::StatusCode;
use serde_json::{json, Value};

use stockroom_infra::config::CatalogConfig;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let app = stockroom_api::app::build_app(CatalogConfig::default())
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        read(res).await
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).send().await.unwrap();
        read(res).await
    }

    async fn category(&self, name: &str, parent_name: &str) -> (StatusCode, Value) {
        self.post("/categories", json!({"name": name, "parent_name": parent_name}))
            .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn location(row: i64) -> Value {
    json!({"room": "basement1", "bookcase": 1, "shelf": 1, "cuvette": 1, "column": 1, "row": row})
}

fn part(serial: &str, category: &str) -> Value {
    json!({
        "serial_number": serial,
        "name": "resistor",
        "description": "10k",
        "category": category,
        "quantity": 5,
        "price": 0.25,
    })
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn category_lifecycle() {
    let server = TestServer::spawn().await;

    let (status, body) = server.category("base_parts", "").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"name": "base_parts", "parent_name": ""}));

    let (status, _) = server.category("test_parts", "base_parts").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = server.get("/categories/test_parts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parent_name"], "base_parts");

    let (status, body) = server.get("/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = server
        .put("/categories/test_parts", json!({"name": "renamed", "parent_name": "base_parts"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");

    let (status, _) = server.get("/categories/test_parts").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server.delete("/categories/renamed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "renamed", "parent_name": "base_parts"}));
}

#[tokio::test]
async fn category_errors_map_to_statuses() {
    let server = TestServer::spawn().await;
    server.category("base_parts", "").await;

    let (status, body) = server.category("base_parts", "").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "category base_parts already exists");

    let (status, body) = server.category("loop", "loop").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "category parent name can't be same as category name");

    let (status, body) = server.category("orphan", "nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "parent category with name nope does not exist");

    let (status, body) = server.category("", "").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = server.get("/categories/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "category with name missing does not exist");
}

#[tokio::test]
async fn parts_only_go_to_non_root_categories() {
    let server = TestServer::spawn().await;
    server.category("base_parts", "").await;
    server.category("test_parts", "base_parts").await;

    let (status, body) = server
        .post("/parts", json!({"part": part("example_serial_no", "base_parts"), "location": location(1)}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "part can't be assigned to a base category (base_parts)");

    let (status, body) = server
        .post("/parts", json!({"part": part("example_serial_no", "doesntexist"), "location": location(1)}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "part category doesntexist does not exist");

    let (status, body) = server
        .post("/parts", json!({"part": part("example_serial_no", "test_parts"), "location": location(1)}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["category"], "test_parts");
    assert_eq!(body["location"], location(1));
}

#[tokio::test]
async fn duplicate_serial_and_location_conflict() {
    let server = TestServer::spawn().await;
    server.category("base", "").await;
    server.category("shelf", "base").await;

    let (status, _) = server.post("/parts", json!({"part": part("X", "shelf"), "location": location(1)})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = server.post("/parts", json!({"part": part("X", "shelf"), "location": location(2)})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "serial X already exists");

    let (status, _) = server.post("/parts", json!({"part": part("Y", "shelf"), "location": location(1)})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = server.delete("/parts/X").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["serial_number"], "X");

    let (status, _) = server.post("/parts", json!({"part": part("Y", "shelf"), "location": location(1)})).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn deletion_order_follows_part_assignments() {
    let server = TestServer::spawn().await;
    server.category("c1", "").await;
    server.category("c2", "c1").await;
    server.post("/parts", json!({"part": part("P", "c2"), "location": location(1)})).await;

    let (status, _) = server.delete("/categories/c1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server.delete("/categories/c2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.delete("/parts/P").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.delete("/categories/c2").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.delete("/categories/c1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_and_search_parts() {
    let server = TestServer::spawn().await;
    server.category("base", "").await;
    server.category("resistors", "base").await;
    server.category("capacitors", "base").await;
    server.post("/parts", json!({"part": part("r1", "resistors"), "location": location(1)})).await;
    server.post("/parts", json!({"part": part("c1", "capacitors"), "location": location(2)})).await;

    let mut changed = part("r1", "resistors");
    changed["quantity"] = json!(42);
    let (status, body) = server.put("/parts/r1", json!({"part": changed, "location": location(1)})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 42);

    let (status, body) = server.get("/parts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = server.get("/parts?t=capac").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["serial_number"], "c1");

    let (status, body) = server.get("/parts?t=nothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = server.get("/parts?t=(").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");
}

#[tokio::test]
async fn part_location_may_be_nested_but_is_required() {
    let server = TestServer::spawn().await;
    server.category("base", "").await;
    server.category("shelf", "base").await;

    let mut nested = part("n1", "shelf");
    nested["location"] = location(4);
    let (status, body) = server.post("/parts", json!({"part": nested})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["location"]["row"], 4);

    let (status, body) = server.post("/parts", json!({"part": part("n2", "shelf")})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let mut undescribed = part("n3", "shelf");
    undescribed.as_object_mut().unwrap().remove("description");
    let (status, _) = server.post("/parts", json!({"part": undescribed, "location": location(5)})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = server.get("/parts/n3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.get("/parts/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
