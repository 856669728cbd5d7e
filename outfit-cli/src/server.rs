use axum::{
    Json, Router,
    extract::{FromRequest, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use outfit_core::{AdviceError, Advisor, Recommendation, WardrobeError, WardrobeStore};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct ClothRequest {
    pub name: String,
}

/// `Json` whose rejections use the same `{"detail": ...}` body as every other error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Errors rendered as `{"detail": ...}` with a matching status code.
#[derive(Debug)]
pub enum ApiError {
    Advice(AdviceError),
    Wardrobe(WardrobeError),
    Rejected { status: StatusCode, detail: String },
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<AdviceError> for ApiError {
    fn from(e: AdviceError) -> Self {
        ApiError::Advice(e)
    }
}

impl From<WardrobeError> for ApiError {
    fn from(e: WardrobeError) -> Self {
        ApiError::Wardrobe(e)
    }
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            ApiError::Advice(e @ AdviceError::Validation(_)) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Advice(e @ AdviceError::LocationNotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            // The forecast chain can carry request details, so it is only logged.
            ApiError::Advice(AdviceError::ForecastUnavailable(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "forecast unavailable".to_string(),
            ),
            ApiError::Advice(e @ AdviceError::GenerationUnavailable(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Wardrobe(e @ WardrobeError::Blank) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Wardrobe(e @ WardrobeError::NotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),
            ApiError::Rejected { status, detail } => (*status, detail.clone()),
            ApiError::Advice(AdviceError::Internal(_))
            | ApiError::Wardrobe(WardrobeError::Io(_))
            | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        } else {
            warn!("Request rejected: {}", detail);
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub struct AppState {
    advisor: Advisor,
}

pub fn router(advisor: Advisor) -> Router {
    let state = Arc::new(AppState { advisor });

    Router::new()
        .route("/", get(root))
        .route("/generate", post(generate))
        .route("/list", get(list_clothes))
        .route("/register", post(register_cloth))
        .route("/delete", post(delete_cloth))
        .with_state(state)
}

pub async fn serve(bind: &str, advisor: Advisor) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(advisor)).await?;
    Ok(())
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Outfit advisor backend is running!" }))
}

async fn generate(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Result<Json<Recommendation>, ApiError> {
    let advisor = state.advisor.clone();

    // A panic anywhere in the pipeline surfaces as a JoinError, not a dropped connection.
    let rec = tokio::spawn(async move { advisor.advise(&req.location).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(rec))
}

/// Runs a blocking wardrobe operation off the async workers.
async fn with_store<F>(state: &AppState, op: F) -> Result<Json<Vec<String>>, ApiError>
where
    F: FnOnce(&dyn WardrobeStore) -> Result<Vec<String>, WardrobeError> + Send + 'static,
{
    let store = Arc::clone(state.advisor.wardrobe());
    let items = tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(items))
}

async fn list_clothes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    with_store(&state, |store| store.list_all()).await
}

async fn register_cloth(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ClothRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    with_store(&state, move |store| store.append(&req.name)).await
}

async fn delete_cloth(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ClothRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    with_store(&state, move |store| store.remove(&req.name)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use outfit_core::{
        CivilOffset, Coordinate, FileWardrobeStore, Forecast, ForecastProvider, GenerationError,
        Geocoder, LocationQuery, TextGenerator,
    };
    use tower::ServiceExt;

    #[derive(Debug)]
    struct FixedGeocoder(Option<Coordinate>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn resolve(&self, _query: &LocationQuery) -> Option<Coordinate> {
            self.0
        }
    }

    #[derive(Debug)]
    struct EmptyForecast;

    #[async_trait]
    impl ForecastProvider for EmptyForecast {
        async fn fetch_forecast(&self, _coord: Coordinate) -> anyhow::Result<Forecast> {
            Ok(Forecast {
                daily_icon_url: Some("https://openweathermap.org/img/wn/01d@2x.png".into()),
                ..Forecast::default()
            })
        }
    }

    #[derive(Debug)]
    struct UnreachableForecast;

    #[async_trait]
    impl ForecastProvider for UnreachableForecast {
        async fn fetch_forecast(&self, _coord: Coordinate) -> anyhow::Result<Forecast> {
            Err(anyhow::anyhow!(
                "error sending request for url (http://127.0.0.1:1/data/3.0/onecall?appid=SECRET123)"
            )
            .context("Failed to send request to OpenWeather (forecast)"))
        }
    }

    #[derive(Debug)]
    struct FixedGenerator(Result<&'static str, u16>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(GenerationError::Provider {
                    status,
                    body: "model overloaded".into(),
                }),
            }
        }
    }

    #[derive(Debug)]
    struct PanickingGenerator;

    #[async_trait]
    impl TextGenerator for PanickingGenerator {
        async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
            panic!("generator state corrupted")
        }
    }

    fn app_with(
        dir: &tempfile::TempDir,
        coord: Option<Coordinate>,
        forecasts: Arc<dyn ForecastProvider>,
        generator: Arc<dyn TextGenerator>,
    ) -> Router {
        let advisor = Advisor::new(
            Arc::new(FixedGeocoder(coord)),
            forecasts,
            generator,
            Arc::new(FileWardrobeStore::new(dir.path().join("clothes.txt"))),
            CivilOffset::default(),
        );
        router(advisor)
    }

    fn app(
        dir: &tempfile::TempDir,
        coord: Option<Coordinate>,
        generated: Result<&'static str, u16>,
    ) -> Router {
        app_with(
            dir,
            coord,
            Arc::new(EmptyForecast),
            Arc::new(FixedGenerator(generated)),
        )
    }

    const OSAKA: Option<Coordinate> = Some(Coordinate {
        latitude: 34.69,
        longitude: 135.5,
    });

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app.oneshot(req).await.expect("response");
        let status = res.status();
        let bytes = res.into_body().collect().await.expect("body").to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn root_reports_running() {
        let dir = tempfile::tempdir().expect("tempdir");
        let req = Request::builder().uri("/").body(Body::empty()).expect("request");

        let (status, body) = send(app(&dir, OSAKA, Ok("ok")), req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().expect("message").contains("running"));
    }

    #[tokio::test]
    async fn generate_returns_text_and_icon() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, body) = send(
            app(&dir, OSAKA, Ok("Clear skies today.")),
            post_json("/generate", json!({ "location": "Osaka_Sakai" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generated_text"], "Clear skies today.");
        assert_eq!(body["daily_icon_url"], "https://openweathermap.org/img/wn/01d@2x.png");
    }

    #[tokio::test]
    async fn malformed_location_is_bad_request() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, body) = send(
            app(&dir, OSAKA, Ok("unused")),
            post_json("/generate", json!({ "location": "Osaka" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().expect("detail").contains("invalid location"));
    }

    #[tokio::test]
    async fn unknown_location_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, _) = send(
            app(&dir, None, Ok("unused")),
            post_json("/generate", json!({ "location": "Nowhere_Town" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generation_failure_is_server_error_with_message() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, body) = send(
            app(&dir, OSAKA, Err(503)),
            post_json("/generate", json!({ "location": "Osaka_Sakai" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().expect("detail");
        assert!(detail.contains("failed to generate text"));
        assert!(detail.contains("model overloaded"));
    }

    #[tokio::test]
    async fn wardrobe_register_list_delete() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, body) = send(
            app(&dir, OSAKA, Ok("")),
            post_json("/register", json!({ "name": "denim jacket" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["denim jacket"]));

        let req = Request::builder().uri("/list").body(Body::empty()).expect("request");
        let (_, body) = send(app(&dir, OSAKA, Ok("")), req).await;
        assert_eq!(body, json!(["denim jacket"]));

        let (status, body) = send(
            app(&dir, OSAKA, Ok("")),
            post_json("/delete", json!({ "name": "denim jacket" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn wardrobe_errors_map_to_client_statuses() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, _) = send(
            app(&dir, OSAKA, Ok("")),
            post_json("/register", json!({ "name": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app(&dir, OSAKA, Ok("")),
            post_json("/delete", json!({ "name": "hat" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ApiError::Advice(AdviceError::Internal(anyhow::anyhow!("secret path /etc/x")));
        let (status, detail) = err.status_and_detail();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail, "Internal server error");
    }

    #[tokio::test]
    async fn forecast_failure_detail_hides_request_url() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, body) = send(
            app_with(
                &dir,
                OSAKA,
                Arc::new(UnreachableForecast),
                Arc::new(FixedGenerator(Ok("unused"))),
            ),
            post_json("/generate", json!({ "location": "Osaka_Sakai" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().expect("detail");
        assert_eq!(detail, "forecast unavailable");
        assert!(!detail.contains("SECRET123"));
    }

    #[tokio::test]
    async fn panic_in_pipeline_is_generic_server_error() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, body) = send(
            app_with(&dir, OSAKA, Arc::new(EmptyForecast), Arc::new(PanickingGenerator)),
            post_json("/generate", json!({ "location": "Osaka_Sakai" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "detail": "Internal server error" }));
    }

    #[tokio::test]
    async fn rejected_bodies_keep_the_detail_shape() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (status, body) = send(
            app(&dir, OSAKA, Ok("unused")),
            post_json("/generate", json!({})),
        )
        .await;
        assert!(status.is_client_error());
        assert!(body["detail"].as_str().expect("detail").contains("location"));

        let malformed = Request::builder()
            .method("POST")
            .uri("/register")
            .header("content-type", "application/json")
            .body(Body::from("{\"name\": "))
            .expect("request");
        let (status, body) = send(app(&dir, OSAKA, Ok("unused")), malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let untyped = Request::builder()
            .method("POST")
            .uri("/delete")
            .body(Body::from("{}"))
            .expect("request");
        let (status, body) = send(app(&dir, OSAKA, Ok("unused")), untyped).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["detail"].is_string());
    }
}
