use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::error::CatalogError;
use crate::form::{FormErrors, ProductForm};
use crate::id::IdMatch;
use crate::lookup::{find_or_fetch, Origin};
use crate::product::{Category, Product};
use crate::store::{CatalogStore, StoreStatus};

#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/categories", get(categories))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/edit", get(edit_form))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/* ----------------------------
Errors
---------------------------- */

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    /// Product list could not be loaded.
    Remote(CatalogError),
    /// Single-product fallback failed.
    Lookup(CatalogError),
    Invalid(FormErrors),
    /// Body was not JSON or did not fit the form shape.
    Malformed(JsonRejection),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection)
    }
}

/// `Json` extractor whose rejection renders as an [`ApiError`] body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct FormJson<T>(T);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    code: u16,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FormErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message, detail, fields) = match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Product not found!".to_string(),
                None,
                None,
            ),
            ApiError::Remote(e) => (
                StatusCode::BAD_GATEWAY,
                "REMOTE_FETCH_FAILED",
                e.user_message().to_string(),
                Some(e.to_string()),
                None,
            ),
            ApiError::Lookup(e) => (
                StatusCode::BAD_GATEWAY,
                "REMOTE_FETCH_FAILED",
                e.lookup_message().to_string(),
                Some(e.to_string()),
                None,
            ),
            ApiError::Malformed(rejection) => (
                rejection.status(),
                "INVALID_BODY",
                "Request body is not a valid product form".to_string(),
                Some(rejection.body_text()),
                None,
            ),
            ApiError::Invalid(errs) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                "Please fix the highlighted fields".to_string(),
                None,
                Some(errs),
            ),
        };

        let body = ErrorBody {
            error,
            message,
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            detail,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

/* ----------------------------
Handlers
---------------------------- */

#[derive(Serialize)]
struct ProductList {
    count: usize,
    products: Vec<Product>,
}

/// Hydrates on first access (or after a failed attempt), then lists.
async fn list_products(State(state): State<AppState>) -> Result<Json<ProductList>, ApiError> {
    state.store.hydrate().await.map_err(ApiError::Remote)?;
    let products = state.store.products();
    Ok(Json(ProductList {
        count: products.len(),
        products,
    }))
}

#[derive(Serialize)]
struct ProductOut {
    origin: Origin,
    #[serde(flatten)]
    product: Product,
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductOut>, ApiError> {
    let found = find_or_fetch(&state.store, id.as_str())
        .await
        .map_err(ApiError::Lookup)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ProductOut {
        origin: found.origin,
        product: found.product,
    }))
}

#[derive(Serialize)]
struct EditOut {
    id: String,
    origin: Origin,
    form: ProductForm,
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EditOut>, ApiError> {
    let found = find_or_fetch(&state.store, id.as_str())
        .await
        .map_err(ApiError::Lookup)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(EditOut {
        id: found.product.id.to_string(),
        origin: found.origin,
        form: ProductForm::from_product(&found.product),
    }))
}

async fn create_product(
    State(state): State<AppState>,
    FormJson(form): FormJson<ProductForm>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let draft = form.validate().map_err(ApiError::Invalid)?;
    let product = state.store.create(draft);
    tracing::info!(id = %product.id, "product added");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    FormJson(form): FormJson<ProductForm>,
) -> Result<Json<Product>, ApiError> {
    let draft = form.validate().map_err(ApiError::Invalid)?;
    let product = state
        .store
        .update(id.as_str(), draft.into())
        .ok_or(ApiError::NotFound)?;
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete(id.as_str())
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ApiError::NotFound)
}

#[derive(Serialize)]
struct StatusOut {
    loading: bool,
    /// Adds `state` (and `message` once failed) at the top level.
    #[serde(flatten)]
    status: StoreStatus,
    count: usize,
    last_error: Option<String>,
    id_match: IdMatch,
}

async fn status(State(state): State<AppState>) -> Json<StatusOut> {
    let status = state.store.status();
    Json(StatusOut {
        loading: status == StoreStatus::Loading,
        status,
        count: state.store.len(),
        last_error: state.store.last_error().map(|e| e.to_string()),
        id_match: state.store.id_match(),
    })
}

#[derive(Serialize)]
struct CategoryOut {
    value: String,
    label: String,
}

async fn categories() -> Json<Vec<CategoryOut>> {
    let out = Category::SELECTABLE
        .iter()
        .map(|c| CategoryOut {
            value: c.as_str().to_string(),
            label: c.label().to_string(),
        })
        .collect();
    Json(out)
}
