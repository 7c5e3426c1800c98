//! PostgreSQL store backed by a sqlx connection pool.
//!
//! Nullable text columns are read through `COALESCE` so records always carry
//! plain strings; image placeholders are applied later by the HTTP layer.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::storage::models::{
    Article, ArticleInput, Category, CategoryInput, Certificate, CertificateInput, Course,
    CourseInput, Project, ProjectInput,
};
use crate::storage::{Reorder, Repository, StoreError};

const SCHEMA: &str = include_str!("schema.sql");

macro_rules! article_columns {
    () => {
        "id, title, COALESCE(excerpt, '') AS excerpt, content, COALESCE(author, '') AS author, \
         date, COALESCE(category, '') AS category, featured, COALESCE(image, '') AS image, \
         created_at, updated_at"
    };
}

macro_rules! course_columns {
    () => {
        "id, title, COALESCE(description, '') AS description, COALESCE(lessons, '') AS lessons, \
         COALESCE(duration, '') AS duration, COALESCE(enroll_link, '') AS enroll_link, \
         COALESCE(category, '') AS category, COALESCE(tags, '{}') AS tags, \
         COALESCE(image, '') AS image, created_at, updated_at"
    };
}

macro_rules! category_columns {
    () => {
        "id, name, type AS kind, sort_order, created_at, updated_at"
    };
}

macro_rules! project_columns {
    () => {
        "id, title, COALESCE(description, '') AS description, COALESCE(detail, '') AS detail, \
         COALESCE(link_label, '') AS link_label, COALESCE(link_href, '') AS link_href, \
         COALESCE(image, '') AS image, sort_order, created_at, updated_at"
    };
}

macro_rules! certificate_columns {
    () => {
        "id, title, issuer, year, COALESCE(image, '') AS image, sort_order, created_at, updated_at"
    };
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create missing tables. Existing tables are left as they are.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("Schema ensured");
        Ok(())
    }

    async fn delete_from(&self, table: &str, label: &'static str, id: Uuid) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(label));
        }
        Ok(())
    }

    /// All positions are written in one transaction; dropping it on the
    /// first miss rolls back the rows already touched.
    async fn reorder_table(
        &self,
        table: &str,
        label: &'static str,
        ids: &[Uuid],
    ) -> Result<(), StoreError> {
        let sql = format!("UPDATE {table} SET sort_order = $1 WHERE id = $2");
        let mut tx = self.pool.begin().await?;

        for (position, id) in ids.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::Invalid("too many ids".to_string()))?;
            let result = sqlx::query(&sql)
                .bind(position)
                .bind(*id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                tracing::debug!(table, %id, "Reorder aborted on unknown id");
                return Err(StoreError::NotFound(label));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

fn found<R>(row: Option<R>, label: &'static str) -> Result<R, StoreError> {
    row.ok_or(StoreError::NotFound(label))
}

#[async_trait]
impl Repository<Article> for PgStore {
    async fn list(&self) -> Result<Vec<Article>, StoreError> {
        let rows = sqlx::query_as::<_, Article>(concat!(
            "SELECT ",
            article_columns!(),
            " FROM articles ORDER BY date DESC NULLS LAST, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Article, StoreError> {
        let row = sqlx::query_as::<_, Article>(concat!(
            "SELECT ",
            article_columns!(),
            " FROM articles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Article")
    }

    async fn create(&self, input: ArticleInput) -> Result<Article, StoreError> {
        let row = sqlx::query_as::<_, Article>(concat!(
            "INSERT INTO articles (title, excerpt, content, author, date, category, featured, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING ",
            article_columns!()
        ))
        .bind(input.title)
        .bind(input.excerpt)
        .bind(input.content)
        .bind(input.author)
        .bind(input.date)
        .bind(input.category)
        .bind(input.featured)
        .bind(input.image)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, input: ArticleInput) -> Result<Article, StoreError> {
        let row = sqlx::query_as::<_, Article>(concat!(
            "UPDATE articles SET title = $2, excerpt = $3, content = $4, author = $5, date = $6, \
             category = $7, featured = $8, image = $9, updated_at = NOW() \
             WHERE id = $1 RETURNING ",
            article_columns!()
        ))
        .bind(id)
        .bind(input.title)
        .bind(input.excerpt)
        .bind(input.content)
        .bind(input.author)
        .bind(input.date)
        .bind(input.category)
        .bind(input.featured)
        .bind(input.image)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Article")
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.delete_from("articles", "Article", id).await
    }
}

#[async_trait]
impl Repository<Course> for PgStore {
    async fn list(&self) -> Result<Vec<Course>, StoreError> {
        let rows = sqlx::query_as::<_, Course>(concat!(
            "SELECT ",
            course_columns!(),
            " FROM courses ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Course, StoreError> {
        let row = sqlx::query_as::<_, Course>(concat!(
            "SELECT ",
            course_columns!(),
            " FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Course")
    }

    async fn create(&self, input: CourseInput) -> Result<Course, StoreError> {
        let row = sqlx::query_as::<_, Course>(concat!(
            "INSERT INTO courses (title, description, lessons, duration, enroll_link, category, tags, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING ",
            course_columns!()
        ))
        .bind(input.title)
        .bind(input.description)
        .bind(input.lessons)
        .bind(input.duration)
        .bind(input.enroll_link)
        .bind(input.category)
        .bind(input.tags)
        .bind(input.image)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, input: CourseInput) -> Result<Course, StoreError> {
        let row = sqlx::query_as::<_, Course>(concat!(
            "UPDATE courses SET title = $2, description = $3, lessons = $4, duration = $5, \
             enroll_link = $6, category = $7, tags = $8, image = $9, updated_at = NOW() \
             WHERE id = $1 RETURNING ",
            course_columns!()
        ))
        .bind(id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.lessons)
        .bind(input.duration)
        .bind(input.enroll_link)
        .bind(input.category)
        .bind(input.tags)
        .bind(input.image)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Course")
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.delete_from("courses", "Course", id).await
    }
}

#[async_trait]
impl Repository<Category> for PgStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, Category>(concat!(
            "SELECT ",
            category_columns!(),
            " FROM categories ORDER BY sort_order ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Category, StoreError> {
        let row = sqlx::query_as::<_, Category>(concat!(
            "SELECT ",
            category_columns!(),
            " FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Category")
    }

    async fn create(&self, input: CategoryInput) -> Result<Category, StoreError> {
        let row = sqlx::query_as::<_, Category>(concat!(
            "INSERT INTO categories (name, type, sort_order) \
             VALUES ($1, $2, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM categories)) RETURNING ",
            category_columns!()
        ))
        .bind(input.name)
        .bind(input.kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, input: CategoryInput) -> Result<Category, StoreError> {
        let row = sqlx::query_as::<_, Category>(concat!(
            "UPDATE categories SET name = $2, type = $3, updated_at = NOW() WHERE id = $1 RETURNING ",
            category_columns!()
        ))
        .bind(id)
        .bind(input.name)
        .bind(input.kind)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Category")
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.delete_from("categories", "Category", id).await
    }
}

#[async_trait]
impl Repository<Project> for PgStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, Project>(concat!(
            "SELECT ",
            project_columns!(),
            " FROM projects ORDER BY sort_order ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Project, StoreError> {
        let row = sqlx::query_as::<_, Project>(concat!(
            "SELECT ",
            project_columns!(),
            " FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Project")
    }

    async fn create(&self, input: ProjectInput) -> Result<Project, StoreError> {
        let row = sqlx::query_as::<_, Project>(concat!(
            "INSERT INTO projects (title, description, detail, link_label, link_href, image, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM projects)) \
             RETURNING ",
            project_columns!()
        ))
        .bind(input.title)
        .bind(input.description)
        .bind(input.detail)
        .bind(input.link_label)
        .bind(input.link_href)
        .bind(input.image)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, input: ProjectInput) -> Result<Project, StoreError> {
        let row = sqlx::query_as::<_, Project>(concat!(
            "UPDATE projects SET title = $2, description = $3, detail = $4, link_label = $5, \
             link_href = $6, image = $7, updated_at = NOW() WHERE id = $1 RETURNING ",
            project_columns!()
        ))
        .bind(id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.detail)
        .bind(input.link_label)
        .bind(input.link_href)
        .bind(input.image)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Project")
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.delete_from("projects", "Project", id).await
    }
}

#[async_trait]
impl Repository<Certificate> for PgStore {
    async fn list(&self) -> Result<Vec<Certificate>, StoreError> {
        let rows = sqlx::query_as::<_, Certificate>(concat!(
            "SELECT ",
            certificate_columns!(),
            " FROM certificates ORDER BY sort_order ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Certificate, StoreError> {
        let row = sqlx::query_as::<_, Certificate>(concat!(
            "SELECT ",
            certificate_columns!(),
            " FROM certificates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Certificate")
    }

    async fn create(&self, input: CertificateInput) -> Result<Certificate, StoreError> {
        let row = sqlx::query_as::<_, Certificate>(concat!(
            "INSERT INTO certificates (title, issuer, year, image, sort_order) \
             VALUES ($1, $2, $3, $4, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM certificates)) \
             RETURNING ",
            certificate_columns!()
        ))
        .bind(input.title)
        .bind(input.issuer)
        .bind(input.year)
        .bind(input.image)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, input: CertificateInput) -> Result<Certificate, StoreError> {
        let row = sqlx::query_as::<_, Certificate>(concat!(
            "UPDATE certificates SET title = $2, issuer = $3, year = $4, image = $5, \
             updated_at = NOW() WHERE id = $1 RETURNING ",
            certificate_columns!()
        ))
        .bind(id)
        .bind(input.title)
        .bind(input.issuer)
        .bind(input.year)
        .bind(input.image)
        .fetch_optional(&self.pool)
        .await?;
        found(row, "Certificate")
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.delete_from("certificates", "Certificate", id).await
    }
}

#[async_trait]
impl Reorder<Category> for PgStore {
    async fn reorder(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        self.reorder_table("categories", "Category", ids).await
    }
}

#[async_trait]
impl Reorder<Project> for PgStore {
    async fn reorder(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        self.reorder_table("projects", "Project", ids).await
    }
}

#[async_trait]
impl Reorder<Certificate> for PgStore {
    async fn reorder(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        self.reorder_table("certificates", "Certificate", ids).await
    }
}
