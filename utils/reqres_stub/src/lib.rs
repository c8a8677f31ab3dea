//! A local stand-in for the `reqres.in` endpoints the smoke suite talks to.

use std::net::SocketAddr;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

const TOKEN: &str = "QpwL5tke4Pnpja7X4";
const PER_PAGE: usize = 6;

#[derive(Debug, Serialize, Clone)]
struct User {
    id: u32,
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    avatar: String,
}

#[derive(Debug, Serialize, Clone)]
struct Resource {
    id: u32,
    name: &'static str,
    year: u32,
    color: &'static str,
    pantone_value: &'static str,
}

const USERS: [(&str, &str, &str); 12] = [
    ("george.bluth@reqres.in", "George", "Bluth"),
    ("janet.weaver@reqres.in", "Janet", "Weaver"),
    ("emma.wong@reqres.in", "Emma", "Wong"),
    ("eve.holt@reqres.in", "Eve", "Holt"),
    ("charles.morris@reqres.in", "Charles", "Morris"),
    ("tracey.ramos@reqres.in", "Tracey", "Ramos"),
    ("michael.lawson@reqres.in", "Michael", "Lawson"),
    ("lindsay.ferguson@reqres.in", "Lindsay", "Ferguson"),
    ("tobias.funke@reqres.in", "Tobias", "Funke"),
    ("byron.fields@reqres.in", "Byron", "Fields"),
    ("george.edwards@reqres.in", "George", "Edwards"),
    ("rachel.howell@reqres.in", "Rachel", "Howell"),
];

const RESOURCES: [(&str, &str, &str); 12] = [
    ("cerulean", "#98B2D1", "15-4020"),
    ("fuchsia rose", "#C74375", "17-2031"),
    ("true red", "#BF1932", "19-1664"),
    ("aqua sky", "#7BC4C4", "14-4811"),
    ("tigerlily", "#E2583E", "17-1456"),
    ("blue turquoise", "#53B0AE", "15-5217"),
    ("sand dollar", "#DECDBE", "13-1106"),
    ("chili pepper", "#9B1B30", "19-1557"),
    ("blue iris", "#5A5B9F", "18-3943"),
    ("mimosa", "#F0C05A", "14-0848"),
    ("turquoise", "#45B5AA", "15-5519"),
    ("honeysuckle", "#D94F70", "18-2120"),
];

fn users() -> Vec<User> {
    USERS
        .iter()
        .zip(1..)
        .map(|(&(email, first_name, last_name), id)| User {
            id,
            email,
            first_name,
            last_name,
            avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
        })
        .collect()
}

fn resources() -> Vec<Resource> {
    RESOURCES
        .iter()
        .zip(1..)
        .map(|(&(name, color, pantone_value), id)| Resource {
            id,
            name,
            year: 1999 + id,
            color,
            pantone_value,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/api/unknown", get(list_resources))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .layer(TraceLayer::new_for_http())
}

/// Serves the stub on an ephemeral local port in the background.
///
/// The handle resolves with the server's error if it stops serving.
pub async fn spawn() -> std::io::Result<(SocketAddr, JoinHandle<std::io::Result<()>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let result = axum::serve(listener, router()).await;
        if let Err(error) = &result {
            eprintln!("reqres stub on {addr} stopped: {error}");
        }
        result
    });

    Ok((addr, handle))
}

async fn health() -> &'static str {
    "ok"
}

fn page<T: Serialize>(items: Vec<T>, page: Option<usize>) -> Value {
    let total = items.len();
    let page = page.unwrap_or(1).max(1);
    let data: Vec<T> = items
        .into_iter()
        .skip((page - 1) * PER_PAGE)
        .take(PER_PAGE)
        .collect();

    json!({
        "page": page,
        "per_page": PER_PAGE,
        "total": total,
        "total_pages": total.div_ceil(PER_PAGE),
        "data": data,
    })
}

async fn list_users(Query(query): Query<PageQuery>) -> Json<Value> {
    Json(page(users(), query.page))
}

async fn list_resources(Query(query): Query<PageQuery>) -> Json<Value> {
    Json(page(resources(), query.page))
}

async fn get_user(Path(id): Path<u32>) -> (StatusCode, Json<Value>) {
    match users().into_iter().find(|u| u.id == id) {
        Some(user) => (StatusCode::OK, Json(json!({ "data": user }))),
        None => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}

async fn create_user(Json(payload): Json<Map<String, Value>>) -> (StatusCode, Json<Value>) {
    let mut created = payload;
    created.insert("id".into(), json!(next_id().to_string()));
    created.insert("createdAt".into(), json!(now()));

    (StatusCode::CREATED, Json(Value::Object(created)))
}

async fn update_user(
    Path(_id): Path<u32>,
    Json(payload): Json<Map<String, Value>>,
) -> Json<Value> {
    let mut updated = payload;
    updated.insert("updatedAt".into(), json!(now()));

    Json(Value::Object(updated))
}

async fn delete_user(Path(_id): Path<u32>) -> StatusCode {
    StatusCode::NO_CONTENT
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

enum Rejection {
    MissingLogin,
    MissingPassword,
    UnknownUser,
}

fn known_user(credentials: &Credentials) -> Result<User, Rejection> {
    let login = credentials
        .email
        .as_deref()
        .or(credentials.username.as_deref())
        .ok_or(Rejection::MissingLogin)?;

    if credentials.password.as_deref().unwrap_or_default().is_empty() {
        return Err(Rejection::MissingPassword);
    }

    users()
        .into_iter()
        .find(|u| u.email == login)
        .ok_or(Rejection::UnknownUser)
}

async fn register(Json(credentials): Json<Credentials>) -> (StatusCode, Json<Value>) {
    match known_user(&credentials) {
        Ok(user) => (StatusCode::OK, Json(json!({ "id": user.id, "token": TOKEN }))),
        Err(Rejection::MissingLogin) => bad_request("Missing email or username"),
        Err(Rejection::MissingPassword) => bad_request("Missing password"),
        Err(Rejection::UnknownUser) => {
            bad_request("Note: Only defined users succeed registration")
        }
    }
}

async fn login(Json(credentials): Json<Credentials>) -> (StatusCode, Json<Value>) {
    match known_user(&credentials) {
        Ok(_) => (StatusCode::OK, Json(json!({ "token": TOKEN }))),
        Err(Rejection::MissingLogin) => bad_request("Missing email or username"),
        Err(Rejection::MissingPassword) => bad_request("Missing password"),
        Err(Rejection::UnknownUser) => bad_request("user not found"),
    }
}

fn next_id() -> u32 {
    static NEXT: AtomicU32 = AtomicU32::new(100);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod test {
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    use super::*;

    #[tokio::test]
    async fn spawned_stub_keeps_serving() {
        let (addr, handle) = spawn().await.unwrap();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.ends_with("ok"), "{response}");
        assert!(!handle.is_finished());

        handle.abort();
    }
}
