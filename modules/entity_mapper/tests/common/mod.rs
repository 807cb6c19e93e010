//! Common test utilities: fixture entities and a mock repository
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use entity_mapper::{
    DbValue, Entity, ForeignKeyRepository, FromRow, ManyToOne, MappedRow, MappingError, OneToMany,
    Point,
};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// ===== Fixture entities =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub contacts: OneToMany<ContactInfo>,
    pub addresses: OneToMany<Address>,
}

impl User {
    pub fn new(id: Option<i64>, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Entity for User {
    type Id = i64;
    const FIELDS: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl FromRow for User {
    fn from_row(row: &MappedRow<'_>) -> Result<Self, MappingError> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInfo {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub kind: String,
    pub detail: String,
    pub user: ManyToOne<User>,
}

impl ContactInfo {
    pub fn new(id: i64, user_id: i64, kind: &str, detail: &str) -> Self {
        Self {
            id: Some(id),
            user_id: Some(user_id),
            kind: kind.to_string(),
            detail: detail.to_string(),
            user: ManyToOne::default(),
        }
    }
}

impl Entity for ContactInfo {
    type Id = i64;
    const FIELDS: &'static [&'static str] = &["id", "user_id", "kind", "detail"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl FromRow for ContactInfo {
    fn from_row(row: &MappedRow<'_>) -> Result<Self, MappingError> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            kind: row.get("kind")?,
            detail: row.get("detail")?,
            user: ManyToOne::default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub id: Option<i64>,
    pub user_id: i64,
    pub location: Point,
}

impl Entity for Address {
    type Id = i64;
    const FIELDS: &'static [&'static str] = &["id", "user_id", "location"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl FromRow for Address {
    fn from_row(row: &MappedRow<'_>) -> Result<Self, MappingError> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            location: row.get("location")?,
        })
    }
}

// ===== Mock repository =====

/// In-memory repository of typed rows keyed by their lookup value.
///
/// Records every call, can be switched to fail, and can sleep a random
/// delay before answering to shuffle completion order.
pub struct MockRepo<C> {
    rows: RwLock<Vec<(DbValue, C)>>,
    calls: Mutex<Vec<(String, DbValue)>>,
    failing: AtomicBool,
    max_delay_ms: u64,
}

impl<C: Clone> MockRepo<C> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            max_delay_ms: 0,
        }
    }

    /// Sleep up to `max_delay_ms` before each answer
    pub fn with_jitter(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn insert(&self, key: impl Into<DbValue>, row: C) {
        self.rows.write().push((key.into(), row));
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(String, DbValue)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl<C: Clone + Send + Sync> ForeignKeyRepository<C> for MockRepo<C> {
    async fn find_by_foreign_key(&self, field_name: &str, value: &DbValue) -> Result<Vec<C>> {
        self.calls
            .lock()
            .push((field_name.to_string(), value.clone()));

        if self.max_delay_ms > 0 {
            let delay = rand::rng().random_range(0..=self.max_delay_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("mock repository unavailable");
        }

        Ok(self
            .rows
            .read()
            .iter()
            .filter(|(key, _)| key == value)
            .map(|(_, row)| row.clone())
            .collect())
    }
}
