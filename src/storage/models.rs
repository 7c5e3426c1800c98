//! Persisted content records and their write payloads.
//!
//! Records serialize with the field names the site frontend expects
//! (`createdAt`, `linkHref`, but `sort_order`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::storage::{Reorder, Repository, Store};

/// A content record the HTTP layer can list, fetch, create, update and delete.
pub trait Record: Serialize + Clone + Send + Sync + Unpin + 'static {
    type Input: DeserializeOwned + Send + Sync + 'static;

    /// Name used in client-facing messages ("Article not found").
    const LABEL: &'static str;

    fn id(&self) -> Uuid;

    /// Reject payloads the database would refuse or that make no sense.
    fn validate(input: &Self::Input) -> Result<(), String>;

    /// Read-side presentation defaults (placeholder images).
    fn with_defaults(self) -> Self {
        self
    }

    fn repository(store: &Store) -> &dyn Repository<Self>;
}

/// A record with a manual `sort_order` that admins can rearrange.
pub trait Sortable: Record {
    fn sort_order(&self) -> i32;

    fn set_sort_order(&mut self, order: i32);

    fn reorderer(store: &Store) -> &dyn Reorder<Self>;
}

fn require(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(())
    }
}

fn fallback(image: &mut String, placeholder: &str) {
    if image.is_empty() {
        *image = placeholder.to_string();
    }
}

/// Admin forms submit `""` for an unset date.
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

// --- Article ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub featured: bool,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArticleInput {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    #[serde(deserialize_with = "optional_date")]
    pub date: Option<NaiveDate>,
    pub category: String,
    pub featured: bool,
    pub image: String,
}

impl Record for Article {
    type Input = ArticleInput;
    const LABEL: &'static str = "Article";

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &ArticleInput) -> Result<(), String> {
        require(&input.title, "title")?;
        require(&input.content, "content")
    }

    fn with_defaults(mut self) -> Self {
        fallback(&mut self.image, "/images/blog-1.png");
        self
    }

    fn repository(store: &Store) -> &dyn Repository<Self> {
        store.articles.as_ref()
    }
}

// --- Course ----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub lessons: String,
    pub duration: String,
    pub enroll_link: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub lessons: String,
    pub duration: String,
    pub enroll_link: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image: String,
}

impl Record for Course {
    type Input = CourseInput;
    const LABEL: &'static str = "Course";

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &CourseInput) -> Result<(), String> {
        require(&input.title, "title")
    }

    fn with_defaults(mut self) -> Self {
        fallback(&mut self.image, "/images/service-1.png");
        self
    }

    fn repository(store: &Store) -> &dyn Repository<Self> {
        store.courses.as_ref()
    }
}

// --- Category --------------------------------------------------------------

pub const CATEGORY_KINDS: [&str; 2] = ["blog", "course"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// `blog` or `course`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "sort_order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryInput {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Record for Category {
    type Input = CategoryInput;
    const LABEL: &'static str = "Category";

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &CategoryInput) -> Result<(), String> {
        require(&input.name, "name")?;
        if CATEGORY_KINDS.contains(&input.kind.as_str()) {
            Ok(())
        } else {
            Err("type must be \"blog\" or \"course\"".to_string())
        }
    }

    fn repository(store: &Store) -> &dyn Repository<Self> {
        store.categories.as_ref()
    }
}

impl Sortable for Category {
    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, order: i32) {
        self.sort_order = order;
    }

    fn reorderer(store: &Store) -> &dyn Reorder<Self> {
        store.category_order.as_ref()
    }
}

// --- Project ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub detail: String,
    pub link_label: String,
    pub link_href: String,
    pub image: String,
    #[serde(rename = "sort_order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectInput {
    pub title: String,
    pub description: String,
    pub detail: String,
    pub link_label: String,
    pub link_href: String,
    pub image: String,
}

impl Record for Project {
    type Input = ProjectInput;
    const LABEL: &'static str = "Project";

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &ProjectInput) -> Result<(), String> {
        require(&input.title, "title")
    }

    fn with_defaults(mut self) -> Self {
        fallback(&mut self.image, "/images/collaboration.jpg");
        self
    }

    fn repository(store: &Store) -> &dyn Repository<Self> {
        store.projects.as_ref()
    }
}

impl Sortable for Project {
    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, order: i32) {
        self.sort_order = order;
    }

    fn reorderer(store: &Store) -> &dyn Reorder<Self> {
        store.project_order.as_ref()
    }
}

// --- Certificate -----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub title: String,
    pub issuer: String,
    pub year: String,
    pub image: String,
    #[serde(rename = "sort_order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertificateInput {
    pub title: String,
    pub issuer: String,
    pub year: String,
    pub image: String,
}

impl Record for Certificate {
    type Input = CertificateInput;
    const LABEL: &'static str = "Certificate";

    fn id(&self) -> Uuid {
        self.id
    }

    fn validate(input: &CertificateInput) -> Result<(), String> {
        require(&input.title, "title")?;
        require(&input.issuer, "issuer")?;
        require(&input.year, "year")
    }

    fn with_defaults(mut self) -> Self {
        fallback(&mut self.image, "/images/blog-1.png");
        self
    }

    fn repository(store: &Store) -> &dyn Repository<Self> {
        store.certificates.as_ref()
    }
}

impl Sortable for Certificate {
    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, order: i32) {
        self.sort_order = order;
    }

    fn reorderer(store: &Store) -> &dyn Reorder<Self> {
        store.certificate_order.as_ref()
    }
}
