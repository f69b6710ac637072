use std::net::SocketAddr;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use time::OffsetDateTime;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, movies};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let routes = Router::new()
        .route("/", get(health))
        .merge(auth::router())
        .merge(movies::router());
    let routes = match state.config.api_prefix.as_str() {
        "" => routes,
        prefix => Router::new().nest(prefix, routes),
    };
    routes
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[derive(Debug, Serialize)]
struct Health {
    message: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

async fn health() -> Json<Health> {
    Json(Health {
        message: "Hello World!",
        timestamp: OffsetDateTime::now_utc(),
    })
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use axum::{body::Body, http::Request, http::StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn movie_body(title: &str, barcode: &str) -> Value {
        json!({
            "title": title,
            "director": "Christopher Nolan",
            "releaseYear": 2010,
            "barcode": barcode,
            "genre": "Sci-Fi",
            "rating": 8.8,
        })
    }

    #[tokio::test]
    async fn health_says_hello() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello World!");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn register_login_then_me() {
        let app = build_app(AppState::fake());

        let (status, registered) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "a@b.com", "username": "alice", "password": "password1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(registered["accessToken"].is_string());
        assert!(registered["user"].get("passwordHash").is_none());

        let (status, logged_in) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "a@b.com", "password": "password1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = logged_in["accessToken"].as_str().unwrap().to_string();

        let (status, me) = send(&app, Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], registered["user"]["id"]);
        assert_eq!(me["email"], "a@b.com");
        assert_eq!(me["username"], "alice");
        assert!(me["createdAt"].is_string());
    }

    #[tokio::test]
    async fn register_conflicts_are_409() {
        let app = build_app(AppState::fake());
        let body = json!({"email": "a@b.com", "username": "alice", "password": "password1"});
        let (status, _) = send(&app, Method::POST, "/auth/register", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, err) = send(&app, Method::POST, "/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["statusCode"], 409);
        assert_eq!(err["message"], "Email already exists");
        assert_eq!(err["error"], "Conflict");

        let (status, err) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "c@d.com", "username": "carol", "password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["message"], "Password must be at least 8 characters");
    }

    #[tokio::test]
    async fn bad_login_is_401() {
        let app = build_app(AppState::fake());
        let (status, err) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "nobody@b.com", "password": "password1"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn me_requires_a_valid_bearer_token() {
        let app = build_app(AppState::fake());
        let (status, _) = send(&app, Method::GET, "/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, err) = send(&app, Method::GET, "/auth/me", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["message"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn movie_crud_over_http() {
        let app = build_app(AppState::fake());

        let (status, created) = send(
            &app,
            Method::POST,
            "/movies",
            None,
            Some(movie_body("Inception", "883929044511")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["releaseYear"], 2010);

        let (status, list) = send(&app, Method::GET, "/movies", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["count"], 1);
        assert_eq!(list["items"][0], created);

        let (status, found) =
            send(&app, Method::GET, "/movies?barcode=883929044511", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found, created);

        let (status, _) = send(&app, Method::GET, "/movies?barcode=000", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/movies/{id}"),
            None,
            Some(json!({"title": "New Title"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "New Title");
        assert_eq!(updated["director"], created["director"]);
        assert_eq!(updated["rating"], created["rating"]);

        let (status, fetched) = send(&app, Method::GET, &format!("/movies/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, updated);

        let (status, body) =
            send(&app, Method::DELETE, &format!("/movies/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, _) = send(&app, Method::DELETE, &format!("/movies/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &format!("/movies/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_barcode_is_409() {
        let app = build_app(AppState::fake());
        let (status, _) =
            send(&app, Method::POST, "/movies", None, Some(movie_body("A", "123"))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, err) =
            send(&app, Method::POST, "/movies", None, Some(movie_body("B", "123"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["message"], "Movie with barcode 123 already exists");
    }

    #[tokio::test]
    async fn update_of_missing_movie_is_404() {
        let app = build_app(AppState::fake());
        let (status, err) = send(
            &app,
            Method::PUT,
            "/movies/99999",
            None,
            Some(json!({"title": "Nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["message"], "No movie with id 99999 exists");
    }

    fn state_with(edit: impl FnOnce(&mut AppConfig)) -> AppState {
        let state = AppState::fake();
        let mut config = (*state.config).clone();
        edit(&mut config);
        AppState {
            config: Arc::new(config),
            ..state
        }
    }

    async fn preflight(app: &Router, origin: &str) -> (StatusCode, Option<String>) {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/movies")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string());
        (response.status(), allowed)
    }

    #[tokio::test]
    async fn cors_allows_only_listed_origins() {
        let app = build_app(state_with(|c| {
            c.cors_origins = vec!["http://localhost:5173".into(), "bad\norigin".into()];
        }));

        let (status, allowed) = preflight(&app, "http://localhost:5173").await;
        assert!(status.is_success());
        assert_eq!(allowed.as_deref(), Some("http://localhost:5173"));

        let (_, allowed) = preflight(&app, "http://evil.test").await;
        assert_eq!(allowed, None);
    }

    #[tokio::test]
    async fn cors_wildcard_allows_any_origin() {
        let app = build_app(state_with(|c| c.cors_origins = vec!["*".into()]));
        let (_, allowed) = preflight(&app, "http://evil.test").await;
        assert_eq!(allowed.as_deref(), Some("*"));
    }

    #[tokio::test]
    async fn routes_mount_under_configured_prefix() {
        let app = build_app(state_with(|c| c.api_prefix = "/api/v1".into()));

        let (status, body) = send(&app, Method::GET, "/api/v1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello World!");

        let (status, list) = send(&app, Method::GET, "/api/v1/movies", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["count"], 0);

        let (status, _) = send(&app, Method::GET, "/movies", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_update_returns_movie_unchanged() {
        let app = build_app(AppState::fake());
        let (_, created) = send(
            &app,
            Method::POST,
            "/movies",
            None,
            Some(movie_body("Inception", "883929044511")),
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let (status, same) =
            send(&app, Method::PUT, &format!("/movies/{id}"), None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(same, created);

        let (status, _) = send(&app, Method::PUT, "/movies/99999", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
