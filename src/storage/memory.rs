//! In-process store.
//!
//! Mirrors the PostgreSQL store's ordering and id/timestamp rules so the
//! HTTP layer behaves the same on either backend. Data lives only as long as
//! the process.

use std::cmp::Ordering;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::storage::models::{
    Article, ArticleInput, Category, CategoryInput, Certificate, CertificateInput, Course,
    CourseInput, Project, ProjectInput, Record, Sortable,
};
use crate::storage::{Reorder, Repository, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    articles: Mutex<Vec<Article>>,
    courses: Mutex<Vec<Course>>,
    categories: Mutex<Vec<Category>>,
    projects: Mutex<Vec<Project>>,
    certificates: Mutex<Vec<Certificate>>,
}

/// How a record lives in a [`MemoryStore`] table.
pub trait InMemory: Record {
    fn table(store: &MemoryStore) -> &Mutex<Vec<Self>>;

    /// `position` is the next free sort order; ignored by unsorted records.
    fn build(id: Uuid, input: Self::Input, now: DateTime<Utc>, position: i32) -> Self;

    fn apply(&mut self, input: Self::Input, now: DateTime<Utc>);

    fn list_order(a: &Self, b: &Self) -> Ordering;

    fn position(&self) -> Option<i32> {
        None
    }
}

impl MemoryStore {
    fn rows<R: InMemory>(&self) -> MutexGuard<'_, Vec<R>> {
        R::table(self).lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn list_rows<R: InMemory>(&self) -> Vec<R> {
        let mut rows = self.rows::<R>().clone();
        rows.sort_by(R::list_order);
        rows
    }

    fn get_row<R: InMemory>(&self, id: Uuid) -> Result<R, StoreError> {
        self.rows::<R>()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or(StoreError::NotFound(R::LABEL))
    }

    fn insert_row<R: InMemory>(&self, input: R::Input) -> R {
        let mut rows = self.rows::<R>();
        let next = rows.iter().filter_map(R::position).max().unwrap_or(0) + 1;
        let record = R::build(Uuid::new_v4(), input, Utc::now(), next);
        rows.push(record.clone());
        record
    }

    fn update_row<R: InMemory>(&self, id: Uuid, input: R::Input) -> Result<R, StoreError> {
        let mut rows = self.rows::<R>();
        let row = rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(StoreError::NotFound(R::LABEL))?;
        row.apply(input, Utc::now());
        Ok(row.clone())
    }

    fn delete_row<R: InMemory>(&self, id: Uuid) -> Result<(), StoreError> {
        let mut rows = self.rows::<R>();
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        if rows.len() == before {
            Err(StoreError::NotFound(R::LABEL))
        } else {
            Ok(())
        }
    }

    fn reorder_rows<R: InMemory + Sortable>(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let mut rows = self.rows::<R>();

        // Check everything before touching anything.
        let mut targets = Vec::with_capacity(ids.len());
        for id in ids {
            let index = rows
                .iter()
                .position(|r| r.id() == *id)
                .ok_or(StoreError::NotFound(R::LABEL))?;
            targets.push(index);
        }

        for (order, index) in targets.into_iter().enumerate() {
            let order = i32::try_from(order)
                .map_err(|_| StoreError::Invalid("too many ids".to_string()))?;
            rows[index].set_sort_order(order);
        }
        Ok(())
    }
}

#[async_trait]
impl<R: InMemory> Repository<R> for MemoryStore {
    async fn list(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.list_rows())
    }

    async fn get(&self, id: Uuid) -> Result<R, StoreError> {
        self.get_row(id)
    }

    async fn create(&self, input: R::Input) -> Result<R, StoreError> {
        Ok(self.insert_row(input))
    }

    async fn update(&self, id: Uuid, input: R::Input) -> Result<R, StoreError> {
        self.update_row(id, input)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.delete_row::<R>(id)
    }
}

#[async_trait]
impl<R: InMemory + Sortable> Reorder<R> for MemoryStore {
    async fn reorder(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        self.reorder_rows::<R>(ids)
    }
}

fn manual_order<R: Sortable>(a: &R, b: &R, created: (DateTime<Utc>, DateTime<Utc>)) -> Ordering {
    a.sort_order()
        .cmp(&b.sort_order())
        .then_with(|| created.0.cmp(&created.1))
}

impl InMemory for Article {
    fn table(store: &MemoryStore) -> &Mutex<Vec<Self>> {
        &store.articles
    }

    fn build(id: Uuid, input: ArticleInput, now: DateTime<Utc>, _position: i32) -> Self {
        Self {
            id,
            title: input.title,
            excerpt: input.excerpt,
            content: input.content,
            author: input.author,
            date: input.date,
            category: input.category,
            featured: input.featured,
            image: input.image,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, input: ArticleInput, now: DateTime<Utc>) {
        self.title = input.title;
        self.excerpt = input.excerpt;
        self.content = input.content;
        self.author = input.author;
        self.date = input.date;
        self.category = input.category;
        self.featured = input.featured;
        self.image = input.image;
        self.updated_at = now;
    }

    /// Newest date first, undated last.
    fn list_order(a: &Self, b: &Self) -> Ordering {
        match (a.date, b.date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| b.created_at.cmp(&a.created_at))
    }
}

impl InMemory for Course {
    fn table(store: &MemoryStore) -> &Mutex<Vec<Self>> {
        &store.courses
    }

    fn build(id: Uuid, input: CourseInput, now: DateTime<Utc>, _position: i32) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            lessons: input.lessons,
            duration: input.duration,
            enroll_link: input.enroll_link,
            category: input.category,
            tags: input.tags,
            image: input.image,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, input: CourseInput, now: DateTime<Utc>) {
        self.title = input.title;
        self.description = input.description;
        self.lessons = input.lessons;
        self.duration = input.duration;
        self.enroll_link = input.enroll_link;
        self.category = input.category;
        self.tags = input.tags;
        self.image = input.image;
        self.updated_at = now;
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }
}

impl InMemory for Category {
    fn table(store: &MemoryStore) -> &Mutex<Vec<Self>> {
        &store.categories
    }

    fn build(id: Uuid, input: CategoryInput, now: DateTime<Utc>, position: i32) -> Self {
        Self {
            id,
            name: input.name,
            kind: input.kind,
            sort_order: position,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, input: CategoryInput, now: DateTime<Utc>) {
        self.name = input.name;
        self.kind = input.kind;
        self.updated_at = now;
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        manual_order(a, b, (a.created_at, b.created_at))
    }

    fn position(&self) -> Option<i32> {
        Some(self.sort_order)
    }
}

impl InMemory for Project {
    fn table(store: &MemoryStore) -> &Mutex<Vec<Self>> {
        &store.projects
    }

    fn build(id: Uuid, input: ProjectInput, now: DateTime<Utc>, position: i32) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            detail: input.detail,
            link_label: input.link_label,
            link_href: input.link_href,
            image: input.image,
            sort_order: position,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, input: ProjectInput, now: DateTime<Utc>) {
        self.title = input.title;
        self.description = input.description;
        self.detail = input.detail;
        self.link_label = input.link_label;
        self.link_href = input.link_href;
        self.image = input.image;
        self.updated_at = now;
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        manual_order(a, b, (a.created_at, b.created_at))
    }

    fn position(&self) -> Option<i32> {
        Some(self.sort_order)
    }
}

impl InMemory for Certificate {
    fn table(store: &MemoryStore) -> &Mutex<Vec<Self>> {
        &store.certificates
    }

    fn build(id: Uuid, input: CertificateInput, now: DateTime<Utc>, position: i32) -> Self {
        Self {
            id,
            title: input.title,
            issuer: input.issuer,
            year: input.year,
            image: input.image,
            sort_order: position,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, input: CertificateInput, now: DateTime<Utc>) {
        self.title = input.title;
        self.issuer = input.issuer;
        self.year = input.year;
        self.image = input.image;
        self.updated_at = now;
    }

    fn list_order(a: &Self, b: &Self) -> Ordering {
        manual_order(a, b, (a.created_at, b.created_at))
    }

    fn position(&self) -> Option<i32> {
        Some(self.sort_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn category(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.into(),
            kind: "blog".into(),
        }
    }

    async fn names(store: &MemoryStore) -> Vec<(String, i32)> {
        Repository::<Category>::list(store)
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.name, c.sort_order))
            .collect()
    }

    #[tokio::test]
    async fn new_sortable_records_are_appended() {
        let store = MemoryStore::default();
        for name in ["c1", "c2", "c3"] {
            Repository::<Category>::create(&store, category(name)).await.unwrap();
        }
        assert_eq!(
            names(&store).await,
            vec![("c1".into(), 1), ("c2".into(), 2), ("c3".into(), 3)]
        );
    }

    #[tokio::test]
    async fn reorder_assigns_positions_from_zero() {
        let store = MemoryStore::default();
        let mut ids = Vec::new();
        for name in ["c1", "c2", "c3"] {
            ids.push(Repository::<Category>::create(&store, category(name)).await.unwrap().id);
        }

        Reorder::<Category>::reorder(&store, &[ids[2], ids[0], ids[1]])
            .await
            .unwrap();

        assert_eq!(
            names(&store).await,
            vec![("c3".into(), 0), ("c1".into(), 1), ("c2".into(), 2)]
        );
    }

    #[tokio::test]
    async fn reorder_with_unknown_id_changes_nothing() {
        let store = MemoryStore::default();
        let a = Repository::<Category>::create(&store, category("a")).await.unwrap().id;
        let b = Repository::<Category>::create(&store, category("b")).await.unwrap().id;

        let err = Reorder::<Category>::reorder(&store, &[b, Uuid::new_v4(), a])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("Category")));
        assert_eq!(names(&store).await, vec![("a".into(), 1), ("b".into(), 2)]);
    }

    #[tokio::test]
    async fn update_refreshes_timestamp_and_missing_ids_fail() {
        let store = MemoryStore::default();
        let created = Repository::<Project>::create(
            &store,
            ProjectInput {
                title: "Old".into(),
                ..ProjectInput::default()
            },
        )
        .await
        .unwrap();

        let updated = Repository::<Project>::update(
            &store,
            created.id,
            ProjectInput {
                title: "New".into(),
                ..ProjectInput::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.sort_order, created.sort_order);

        let missing = Repository::<Project>::update(&store, Uuid::new_v4(), ProjectInput::default()).await;
        assert!(matches!(missing, Err(StoreError::NotFound("Project"))));
        assert!(Repository::<Project>::delete(&store, Uuid::new_v4()).await.is_err());

        Repository::<Project>::delete(&store, created.id).await.unwrap();
        assert!(Repository::<Project>::get(&store, created.id).await.is_err());
    }

    #[tokio::test]
    async fn articles_list_newest_date_first() {
        let store = MemoryStore::default();
        for (title, date) in [
            ("undated", None),
            ("old", NaiveDate::from_ymd_opt(2023, 1, 1)),
            ("new", NaiveDate::from_ymd_opt(2024, 6, 1)),
        ] {
            Repository::<Article>::create(
                &store,
                ArticleInput {
                    title: title.into(),
                    content: "body".into(),
                    date,
                    ..ArticleInput::default()
                },
            )
            .await
            .unwrap();
        }

        let titles: Vec<_> = Repository::<Article>::list(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["new", "old", "undated"]);
    }
}
