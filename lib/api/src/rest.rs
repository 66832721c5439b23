use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{error, web, App, HttpResponse, HttpServer, ResponseError, Result as ActixResult};
use matrec_core::{AttributeValue, Attributes, Error, Query};
use matrec_similarity::{Engines, RankResponse, Strategy};
use matrec_storage::CatalogStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CatalogStore>,
    pub engines: Arc<Engines>,
    pub default_strategy: Strategy,
}

impl AppState {
    pub fn new(store: Arc<CatalogStore>, engines: Arc<Engines>) -> Self {
        Self {
            store,
            engines,
            default_strategy: Strategy::default(),
        }
    }

    #[must_use]
    pub fn with_default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Rank one catalog. `top_k` and `strategy` fall back to the defaults.
    pub fn rank(
        &self,
        catalog_id: &str,
        query: &Query,
        top_k: Option<usize>,
        strategy: Option<Strategy>,
    ) -> matrec_core::Result<RankResponse> {
        let catalog = self.store.get(catalog_id)?;
        self.engines
            .rank(strategy.unwrap_or(self.default_strategy), &catalog, query, top_k)
    }
}

/// A library error rendered as `{"error": message}` with a matching status
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::CatalogNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidQuery(_) | Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Error::Encoding(_) | Error::InvalidDimension { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::ResourceLoad { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Io(_) | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.0.to_string()
        }))
    }
}

/// An attribute as sent by clients: a level label or a number
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AttributeInput {
    Number(f32),
    Label(String),
}

impl From<AttributeInput> for AttributeValue {
    fn from(input: AttributeInput) -> Self {
        match input {
            AttributeInput::Number(n) => AttributeValue::Numeric(n),
            AttributeInput::Label(label) => AttributeValue::parse_cell(&label),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    strength: AttributeInput,
    cost: AttributeInput,
    water_resistance: AttributeInput,
    durability: AttributeInput,
    material_type: Option<String>,
}

impl From<QueryRequest> for Query {
    fn from(req: QueryRequest) -> Self {
        let query = Query::new(Attributes::new(
            req.strength,
            req.cost,
            req.water_resistance,
            req.durability,
        ));
        match req.material_type {
            Some(material_type) => query.with_material_type(material_type),
            None => query,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RankRequest {
    query: QueryRequest,
    top_k: Option<usize>,
    strategy: Option<String>,
}

#[derive(Serialize)]
struct CatalogInfo {
    id: String,
    /// Row count and material types are only known once the catalog is loaded
    items: Option<usize>,
    material_types: Option<Vec<String>>,
}

#[derive(Serialize)]
struct LevelInfo<'a> {
    label: &'a str,
    value: f32,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: AppState, port: u16) -> std::io::Result<()> {
        info!(port, "starting REST API");
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register all routes. Expects `web::Data<AppState>` to be present.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        warn!(error = %message, "rejected request body");
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        )
        .into()
    }))
    .route("/health", web::get().to(health))
    .route("/levels", web::get().to(list_levels))
    .route("/catalogs", web::get().to(list_catalogs))
    .route("/catalogs/{id}/rank", web::post().to(rank_catalog));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn list_levels(state: web::Data<AppState>) -> HttpResponse {
    let levels: Vec<LevelInfo<'_>> = state
        .engines
        .level()
        .levels()
        .labels()
        .into_iter()
        .map(|(label, value)| LevelInfo { label, value })
        .collect();
    HttpResponse::Ok().json(levels)
}

async fn list_catalogs(state: web::Data<AppState>) -> HttpResponse {
    let catalogs: Vec<CatalogInfo> = state
        .store
        .ids()
        .into_iter()
        .map(|id| {
            let loaded = state.store.loaded(&id);
            CatalogInfo {
                items: loaded.as_ref().map(|c| c.len()),
                material_types: loaded.as_ref().map(|c| c.material_types()),
                id,
            }
        })
        .collect();
    HttpResponse::Ok().json(catalogs)
}

async fn rank_catalog(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<RankRequest>,
) -> ActixResult<HttpResponse, ApiError> {
    let catalog_id = path.into_inner();
    let req = req.into_inner();

    let strategy = req
        .strategy
        .as_deref()
        .map(str::parse::<Strategy>)
        .transpose()?;
    let query = Query::from(req.query);

    let response = state
        .rank(&catalog_id, &query, req.top_k, strategy)
        .map_err(|e| {
            warn!(catalog = %catalog_id, error = %e, "rank request failed");
            e
        })?;
    Ok(HttpResponse::Ok().json(response))
}
