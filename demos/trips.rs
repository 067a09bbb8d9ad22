//! Travel-planner API behind the sanitization stage.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example trips
//!
//! Try:
//!   curl -X POST http://localhost:3000/trips \
//!        -H 'content-type: application/json' \
//!        -d '{"destination":"<script>alert(1)</script>Lisbon","nights":4,"tags":["<img src=x onerror=alert(1)>","beach"]}'
//!   curl 'http://localhost:3000/search?q=%3Cb%3Eporto%3C/b%3E&tag=food&tag=wine'
//!   curl http://localhost:3000/trips/42
//!
//! Nesting deeper than `VETTED_SANITIZE_MAX_DEPTH` is rejected with 400.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use vetted::config::{self, SanitizeConfig, ServerConfig};
use vetted::header::{HeaderValue, LOCATION};
use vetted::middleware::Sanitize;
use vetted::{Json, Request, Response, Router, Server, StatusCode};

#[derive(Deserialize, Serialize)]
struct NewTrip {
    destination: String,
    nights: u32,
    #[serde(default)]
    tags: Vec<String>,
    notes: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), vetted::Error> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sanitize = SanitizeConfig::from_env()?;
    let server = ServerConfig::from_env()?;

    let app = Router::new()
        .layer(Sanitize::from_config(&sanitize))
        .post("/trips",     create_trip)
        .get("/trips/{id}", get_trip)
        .get("/search",     search);

    Server::from_config(&server)?.serve(app).await
}

// POST /trips
//
// The body arrives already cleaned; deserialize it like any other JSON.
async fn create_trip(req: Request) -> Response {
    let trip: NewTrip = match req.json() {
        Ok(trip) => trip,
        Err(_) => return Response::error(StatusCode::UNPROCESSABLE_ENTITY, "Invalid trip"),
    };

    match serde_json::to_vec(&trip) {
        Ok(bytes) => Response::builder()
            .status(StatusCode::CREATED)
            .header(LOCATION, HeaderValue::from_static("/trips/99"))
            .json(bytes),
        Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// GET /trips/{id}
async fn get_trip(req: Request) -> Json<serde_json::Value> {
    let id = req.param("id").unwrap_or("unknown");
    Json(serde_json::json!({ "id": id, "destination": "Lisbon", "nights": 4 }))
}

// GET /search?q=...&tag=...
//
// Echoes the cleaned query container back, repeated keys as arrays.
async fn search(req: Request) -> Json<Option<vetted::Value>> {
    Json(req.query().cloned())
}
