//! End-to-end tests over a real socket.
//!
//! Each test binds port 0, serves a router until its shutdown channel
//! fires, and talks raw HTTP/1.1 with `Connection: close` so the response
//! is everything read until EOF.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value as Json, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use vetted::middleware::Sanitize;
use vetted::{Request, Response, Router, Sanitizer, Server, StatusCode};

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), vetted::Error>>,
}

impl TestServer {
    async fn start(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(Server::from_listener(listener).serve_with_shutdown(router, async {
            let _ = stopped.await;
        }));
        Self { addr, stop, handle }
    }

    async fn shutdown(self) {
        self.stop.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
    }

    async fn send(&self, method: &str, target: &str, content_type: Option<&str>, body: &str) -> (u16, String) {
        let mut head = format!("{method} {target} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n");
        if let Some(ct) = content_type {
            head.push_str(&format!("content-type: {ct}\r\n"));
        }
        head.push_str(&format!("content-length: {}\r\n\r\n", body.len()));

        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(body.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let raw = String::from_utf8(raw).unwrap();

        let status = raw.split(' ').nth(1).unwrap().parse().unwrap();
        let body = raw.split_once("\r\n\r\n").map(|(_, b)| b.to_owned()).unwrap_or_default();
        (status, body)
    }
}

async fn echo(req: Request) -> vetted::Json<Json> {
    vetted::Json(json!({
        "body": req.body().cloned().map(Json::from),
        "query": req.query().cloned().map(Json::from),
        "params": req.params().cloned().map(Json::from),
    }))
}

fn sanitized_app() -> Router {
    Router::new()
        .layer(Sanitize::default())
        .post("/trips", echo)
        .get("/trips/{id}", echo)
        .get("/search", echo)
}

fn parse(body: &str) -> Json {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn body_scripts_removed() {
    let server = TestServer::start(sanitized_app()).await;

    let (status, body) = server
        .send("POST", "/trips", Some("application/json"), r#"{"name":"<script>alert(1)</script>John"}"#)
        .await;

    assert_eq!(status, 200);
    assert_eq!(parse(&body)["body"], json!({ "name": "John" }));
    server.shutdown().await;
}

#[tokio::test]
async fn arrays_keep_length_and_order() {
    let server = TestServer::start(sanitized_app()).await;

    let (_, body) = server
        .send("POST", "/trips", Some("application/json"), r#"{"tags":["<img src=x onerror=alert(1)>","beach"]}"#)
        .await;

    assert_eq!(parse(&body)["body"], json!({ "tags": ["", "beach"] }));
    server.shutdown().await;
}

#[tokio::test]
async fn non_string_values_untouched() {
    let server = TestServer::start(sanitized_app()).await;

    let (_, body) = server
        .send("POST", "/trips", Some("application/json"), r#"{"age":29,"verified":true,"bio":null}"#)
        .await;

    assert_eq!(parse(&body)["body"], json!({ "age": 29, "verified": true, "bio": null }));
    server.shutdown().await;
}

#[tokio::test]
async fn deep_strings_cleaned() {
    let server = TestServer::start(sanitized_app()).await;

    let (_, body) = server
        .send(
            "POST",
            "/trips",
            Some("application/json"),
            r#"{"nested":{"deep":{"deeper":"<script>x</script>"}}}"#,
        )
        .await;

    assert_eq!(parse(&body)["body"], json!({ "nested": { "deep": { "deeper": "" } } }));
    server.shutdown().await;
}

#[tokio::test]
async fn query_and_params_cleaned() {
    let server = TestServer::start(sanitized_app()).await;

    let (_, body) = server.send("GET", "/trips/%3Cb%3E9%3C%2Fb%3E", None, "").await;
    assert_eq!(parse(&body)["params"], json!({ "id": "9" }));
    assert_eq!(parse(&body)["body"], Json::Null);
    assert_eq!(parse(&body)["query"], Json::Null);

    let (_, body) = server
        .send("GET", "/search?q=%3Cscript%3Ex%3C%2Fscript%3Elima&tag=a&tag=%3Ci%3Eb%3C%2Fi%3E", None, "")
        .await;
    assert_eq!(parse(&body)["query"], json!({ "q": "lima", "tag": ["a", "b"] }));

    server.shutdown().await;
}

#[tokio::test]
async fn form_bodies_cleaned() {
    let server = TestServer::start(sanitized_app()).await;

    let (_, body) = server
        .send("POST", "/trips", Some("application/x-www-form-urlencoded"), "note=%3Cb%3Ehi%3C%2Fb%3E")
        .await;

    assert_eq!(parse(&body)["body"], json!({ "note": "hi" }));
    server.shutdown().await;
}

#[tokio::test]
async fn sanitization_failure_is_400_and_handler_skipped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let app = Router::new()
        .layer(Sanitize::new(Sanitizer::new().max_depth(2)))
        .post("/trips", move |_req: Request| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Response::status(StatusCode::CREATED)
            }
        });
    let server = TestServer::start(app).await;

    let (status, body) = server
        .send("POST", "/trips", Some("application/json"), r#"{"a":{"b":{"c":{"d":"<script>token</script>"}}}}"#)
        .await;

    assert_eq!(status, 400);
    assert_eq!(parse(&body), json!({ "status": "error", "message": "Invalid request data" }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let (status, _) = server.send("POST", "/trips", Some("application/json"), r#"{"a":"ok"}"#).await;
    assert_eq!(status, 201);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn malformed_json_is_generic_400() {
    let server = TestServer::start(sanitized_app()).await;

    let (status, body) = server.send("POST", "/trips", Some("application/json"), "{\"a\": <script>").await;

    assert_eq!(status, 400);
    assert_eq!(parse(&body), json!({ "status": "error", "message": "Malformed request body" }));
    server.shutdown().await;
}

#[tokio::test]
async fn unsupported_content_type_is_415() {
    let server = TestServer::start(sanitized_app()).await;

    let (status, body) = server.send("POST", "/trips", Some("text/html"), "<p>hello</p>").await;

    assert_eq!(status, 415);
    assert_eq!(parse(&body)["message"], "Unsupported content type");
    server.shutdown().await;
}

#[tokio::test]
async fn unknown_route_is_404() {
    let server = TestServer::start(sanitized_app()).await;

    let (status, body) = server.send("GET", "/hotels", None, "").await;

    assert_eq!(status, 404);
    assert_eq!(parse(&body), json!({ "status": "error", "message": "Not found" }));
    server.shutdown().await;
}
