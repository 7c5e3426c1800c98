//! CRUD handlers shared by every content record.
//!
//! Each handler is generic over the record type and resolves its repository
//! through [`Record::repository`], so `/articles` and `/certificates` run the
//! same code. Write handlers sit behind the admin gate and read the verified
//! principal only for audit logging.

use axum::extract::State;
use axum::response::Response;
use axum::routing::{get as get_route, post, put};
use axum::{Extension, Json, Router};
use uuid::Uuid;

use crate::admin::AdminPrincipal;
use crate::error::ApiError;
use crate::http::request::{ApiJson, ApiPath};
use crate::http::response::{created, no_content};
use crate::http::server::AppState;
use crate::storage::{Article, Category, Certificate, Course, Project, Record, Sortable};

/// Read routes, open to everyone.
pub fn public_router() -> Router<AppState> {
    let router = Router::new();
    let router = readable::<Article>(router, "/articles");
    let router = readable::<Course>(router, "/courses");
    let router = readable::<Category>(router, "/categories");
    let router = readable::<Project>(router, "/projects");
    readable::<Certificate>(router, "/certificates")
}

/// Write routes. The caller layers the admin gate over all of them.
pub fn admin_router() -> Router<AppState> {
    let router = Router::new();
    let router = writable::<Article>(router, "/articles");
    let router = writable::<Course>(router, "/courses");
    let router = sortable::<Category>(writable::<Category>(router, "/categories"), "/categories");
    let router = sortable::<Project>(writable::<Project>(router, "/projects"), "/projects");
    sortable::<Certificate>(writable::<Certificate>(router, "/certificates"), "/certificates")
}

fn readable<R: Record>(router: Router<AppState>, base: &str) -> Router<AppState> {
    router
        .route(base, get_route(list::<R>))
        .route(&format!("{base}/{{id}}"), get_route(get::<R>))
}

fn writable<R: Record>(router: Router<AppState>, base: &str) -> Router<AppState> {
    router
        .route(base, post(create::<R>))
        .route(&format!("{base}/{{id}}"), put(update::<R>).delete(delete::<R>))
}

fn sortable<R: Sortable>(router: Router<AppState>, base: &str) -> Router<AppState> {
    router.route(&format!("{base}/reorder"), put(reorder::<R>))
}

pub async fn list<R: Record>(State(state): State<AppState>) -> Result<Json<Vec<R>>, ApiError> {
    let records = R::repository(&state.store).list().await?;
    Ok(Json(records.into_iter().map(R::with_defaults).collect()))
}

pub async fn get<R: Record>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<R>, ApiError> {
    let record = R::repository(&state.store).get(id).await?;
    Ok(Json(record.with_defaults()))
}

pub async fn create<R: Record>(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    ApiJson(input): ApiJson<R::Input>,
) -> Result<Response, ApiError> {
    R::validate(&input).map_err(ApiError::BadRequest)?;
    let record = R::repository(&state.store).create(input).await?;
    tracing::info!(entity = R::LABEL, id = %record.id(), admin = %admin.email, "Record created");
    Ok(created(record))
}

pub async fn update<R: Record>(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<R::Input>,
) -> Result<Response, ApiError> {
    R::validate(&input).map_err(ApiError::BadRequest)?;
    R::repository(&state.store).update(id, input).await?;
    tracing::info!(entity = R::LABEL, %id, admin = %admin.email, "Record updated");
    Ok(no_content())
}

pub async fn delete<R: Record>(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    R::repository(&state.store).delete(id).await?;
    tracing::info!(entity = R::LABEL, %id, admin = %admin.email, "Record deleted");
    Ok(no_content())
}

/// Body is the full ordered list of ids, e.g. `["c3", "c1", "c2"]`.
pub async fn reorder<R: Sortable>(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    ApiJson(ids): ApiJson<Vec<Uuid>>,
) -> Result<Response, ApiError> {
    R::reorderer(&state.store).reorder(&ids).await?;
    tracing::info!(entity = R::LABEL, count = ids.len(), admin = %admin.email, "Records reordered");
    Ok(no_content())
}
