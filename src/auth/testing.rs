//! In-memory `IdentityStore` for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::auth::{
    repo::{IdentityStore, StoreError},
    repo_types::{NewUser, User, UserAttendance},
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: HashMap<i64, User>,
    attendance: Vec<UserAttendance>,
    summaries: HashMap<i64, i64>,
}

/// Enforces active-phone uniqueness on write, like the database index.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
    blind_phone_lookup: bool,
    fail_summary: bool,
    lookup_gate: Option<Barrier>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `find_by_phone` always misses, so only the write-time check runs.
    pub fn with_blind_phone_lookup() -> Self {
        Self {
            blind_phone_lookup: true,
            ..Self::default()
        }
    }

    /// Each `find_by_phone` waits until `callers` lookups have been made, so
    /// concurrent registrations all pass the pre-check before any write.
    pub fn with_lookup_gate(callers: usize) -> Self {
        Self {
            lookup_gate: Some(Barrier::new(callers)),
            ..Self::default()
        }
    }

    pub fn with_failing_summary() -> Self {
        Self {
            fail_summary: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.tables.lock().unwrap().users.get(&id).cloned()
    }

    pub fn attendance_count(&self, user_id: i64) -> usize {
        self.tables
            .lock()
            .unwrap()
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id)
            .count()
    }

    pub fn summary(&self, user_id: i64) -> Option<i64> {
        self.tables.lock().unwrap().summaries.get(&user_id).copied()
    }

    pub fn soft_delete(&self, id: i64) {
        if let Some(user) = self.tables.lock().unwrap().users.get_mut(&id) {
            user.deleted_at = Some(time::OffsetDateTime::now_utc());
        }
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn phone_taken(tables: &Tables, phone: &str, except: Option<i64>) -> bool {
    tables
        .users
        .values()
        .any(|u| u.deleted_at.is_none() && u.phone == phone && Some(u.id) != except)
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<i64, StoreError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        if phone_taken(&tables, &user.phone, None) {
            return Err(StoreError::PhoneTaken);
        }
        tables.next_id += 1;
        let id = tables.next_id;
        tables.users.insert(
            id,
            User {
                id,
                full_name: user.full_name.clone(),
                phone: user.phone.clone(),
                password_hash: user.password_hash.clone(),
                created_at: user.created_at,
                updated_at: user.updated_at,
                deleted_at: None,
            },
        );
        Ok(id)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        self.touch();
        if self.blind_phone_lookup {
            return Ok(None);
        }
        let found = self
            .tables
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| u.deleted_at.is_none() && u.phone == phone)
            .cloned();
        if let Some(gate) = &self.lookup_gate {
            gate.wait().await;
        }
        Ok(found)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        if phone_taken(&tables, &user.phone, Some(user.id)) {
            return Err(StoreError::PhoneTaken);
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn record_login(&self, attendance: &UserAttendance) -> Result<(), StoreError> {
        self.touch();
        self.tables
            .lock()
            .unwrap()
            .attendance
            .push(attendance.clone());
        Ok(())
    }

    async fn increment_login_summary(&self, user_id: i64) -> Result<(), StoreError> {
        self.touch();
        if self.fail_summary {
            return Err(StoreError::Backend(anyhow::anyhow!("summary table unavailable")));
        }
        *self
            .tables
            .lock()
            .unwrap()
            .summaries
            .entry(user_id)
            .or_insert(0) += 1;
        Ok(())
    }
}
