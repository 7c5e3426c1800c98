//! Content storage subsystem.
//!
//! # Data Flow
//! ```text
//! content handlers
//!     → Record::repository(&Store)   (per-entity trait object)
//!     → postgres.rs (sqlx, production) | memory.rs (local dev, tests)
//! ```
//!
//! Every backend implements one `Repository<R>` per record type and one
//! `Reorder<R>` per sortable record type. `Store` bundles them so handlers
//! can stay generic over the record.

pub mod memory;
pub mod models;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{Article, Category, Certificate, Course, Project, Record, Sortable};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// CRUD over one record type. Ids and timestamps are assigned by the store.
#[async_trait]
pub trait Repository<R: Record>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<R, StoreError>;

    async fn create(&self, input: R::Input) -> Result<R, StoreError>;

    /// Replaces the editable fields and refreshes `updated_at`.
    async fn update(&self, id: Uuid, input: R::Input) -> Result<R, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Manual ordering for sortable records.
#[async_trait]
pub trait Reorder<R: Sortable>: Send + Sync {
    /// Assign `0..ids.len()` as sort order, all or nothing. An unknown id
    /// fails the whole call and leaves every record untouched.
    async fn reorder(&self, ids: &[Uuid]) -> Result<(), StoreError>;
}

/// Handle to every repository, cheap to clone into request state.
#[derive(Clone)]
pub struct Store {
    pub articles: Arc<dyn Repository<Article>>,
    pub courses: Arc<dyn Repository<Course>>,
    pub categories: Arc<dyn Repository<Category>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub certificates: Arc<dyn Repository<Certificate>>,
    pub category_order: Arc<dyn Reorder<Category>>,
    pub project_order: Arc<dyn Reorder<Project>>,
    pub certificate_order: Arc<dyn Reorder<Certificate>>,
}

impl Store {
    /// Use one backend for every record type.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: Repository<Article>
            + Repository<Course>
            + Repository<Category>
            + Repository<Project>
            + Repository<Certificate>
            + Reorder<Category>
            + Reorder<Project>
            + Reorder<Certificate>
            + 'static,
    {
        Self {
            articles: backend.clone(),
            courses: backend.clone(),
            categories: backend.clone(),
            projects: backend.clone(),
            certificates: backend.clone(),
            category_order: backend.clone(),
            project_order: backend.clone(),
            certificate_order: backend,
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        Self::from_backend(Arc::new(store))
    }

    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::default()))
    }
}
