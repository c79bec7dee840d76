//! axum surface: `GET /api/cliente?id=<id>` and a liveness probe.
//!
//! | Outcome                              | Status | Body                                   |
//! |--------------------------------------|--------|----------------------------------------|
//! | `id` missing or blank                | 400    | `{message}`                            |
//! | upstream returned no records         | 404    | `{message: "Cliente no encontrado"}`   |
//! | no record with usable GPS            | 200    | summary + `sinGPS: true`               |
//! | exactly one record with GPS          | 200    | the record verbatim                    |
//! | several records with GPS             | 200    | summary + `multipleSucursales` list    |
//! | upstream refused the connection      | 503    | `{message}` ("servidor ocupado")       |
//! | any other failure                    | 500    | `{message}`                            |

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    resolve::resolve_cliente, ClienteOutcome, ClienteSummary, LookupError, SqlApiClient,
    Sucursal, VendedorDirectory,
};

pub const MISSING_ID_MESSAGE: &str = "El parámetro \"id\" del cliente es requerido.";
pub const NOT_FOUND_MESSAGE: &str = "Cliente no encontrado";
pub const SERVER_BUSY_MESSAGE: &str =
    "Servicio temporalmente no disponible: servidor ocupado, intenta de nuevo en unos momentos.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Error interno del servidor.";

/// Shared CDN caching for lookup answers.
pub const CACHE_CONTROL_VALUE: &str = "s-maxage=60, stale-while-revalidate=300";

/// State injected into every request.
#[derive(Clone, Debug)]
pub struct AppState {
    client: SqlApiClient,
    vendedores: Option<Arc<VendedorDirectory>>,
}

impl AppState {
    pub fn new(client: SqlApiClient) -> Self {
        Self {
            client,
            vendedores: None,
        }
    }

    pub fn with_vendedores(mut self, directory: Arc<VendedorDirectory>) -> Self {
        self.vendedores = Some(directory);
        self
    }
}

/// Builds the service router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/cliente", get(cliente_handler))
        .route("/healthz", get(liveness_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error answer with a JSON `{message}` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn missing_id() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: MISSING_ID_MESSAGE,
        }
    }

    fn from_lookup(cliente_id: &str, err: &LookupError) -> Self {
        if err.is_connection_refused() {
            tracing::error!(cliente_id, error = %err, "sql api refused connection");
            return Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: SERVER_BUSY_MESSAGE,
            };
        }
        tracing::error!(cliente_id, error = %err, "cliente lookup failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ClienteQuery {
    id: Option<String>,
}

#[derive(Serialize)]
struct SinGpsBody {
    #[serde(flatten)]
    cliente: ClienteSummary,
    #[serde(rename = "sinGPS")]
    sin_gps: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MultipleBody {
    #[serde(flatten)]
    cliente: ClienteSummary,
    multiple_sucursales: bool,
    sucursales: Vec<Sucursal>,
}

async fn cliente_handler(
    State(state): State<AppState>,
    query: Option<Query<ClienteQuery>>,
) -> Result<Response, ApiError> {
    let cliente_id = query
        .and_then(|Query(query)| query.id)
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(ApiError::missing_id)?;

    let mut records = state
        .client
        .search_sucursales(&cliente_id)
        .await
        .map_err(|err| ApiError::from_lookup(&cliente_id, &err))?;

    if let Some(directory) = &state.vendedores {
        fill_missing_vendedores(directory, &cliente_id, &mut records).await;
    }

    let mut response = match resolve_cliente(records) {
        ClienteOutcome::NotFound => {
            tracing::info!(cliente_id = %cliente_id, "cliente not found");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": NOT_FOUND_MESSAGE })),
            )
                .into_response()
        }
        ClienteOutcome::SinGps(cliente) => {
            tracing::info!(cliente_id = %cliente_id, "cliente found without gps");
            Json(SinGpsBody {
                cliente,
                sin_gps: true,
            })
            .into_response()
        }
        ClienteOutcome::Single(sucursal) => {
            tracing::info!(
                cliente_id = %cliente_id,
                nombre = %sucursal.nombre(),
                "cliente found"
            );
            Json(sucursal).into_response()
        }
        ClienteOutcome::Multiple {
            cliente,
            sucursales,
        } => {
            tracing::info!(
                cliente_id = %cliente_id,
                sucursales = sucursales.len(),
                "cliente found with several sucursales"
            );
            Json(MultipleBody {
                cliente,
                multiple_sucursales: true,
                sucursales,
            })
            .into_response()
        }
    };

    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_VALUE),
    );
    Ok(response)
}

async fn fill_missing_vendedores(
    directory: &VendedorDirectory,
    cliente_id: &str,
    records: &mut [Sucursal],
) {
    if !records.iter().any(Sucursal::lacks_vendedor) {
        return;
    }
    if let Some(vendedor) = directory.lookup(cliente_id).await {
        for record in records.iter_mut() {
            record.fill_vendedor(&vendedor);
        }
    }
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
