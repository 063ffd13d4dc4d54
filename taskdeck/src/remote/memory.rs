//! In-process reference backend for tests and local development.
//!
//! Stores JSON rows per table behind a mutex, assigns server-side
//! columns (`id`, `created_at`, task `position`) on insert, and keeps a
//! single session slot. Faults can be scripted via
//! [`fail_next`](MemoryBackend::fail_next) so tests can exercise the
//! store's rollback paths.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use uuid::Uuid;

use taskdeck_model::{Direction, EntityId, OrderKey};

use super::{RemoteError, RemoteTable, SessionProvider, UserSession};

/// Which backend operation a scripted fault should hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultOp {
    /// Fail the next `select`.
    Select,
    /// Fail the next `insert`.
    Insert,
    /// Fail the next `update`.
    Update,
    /// Fail the next `delete`.
    Delete,
}

struct Account {
    user_id: String,
    password: String,
}

/// In-memory tables plus a single-session identity provider.
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Map<String, Value>>>>,
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<UserSession>>,
    faults: Mutex<HashMap<FaultOp, u32>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates a backend with empty `tasks` and `contacts` tables.
    #[must_use]
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        tables.insert("tasks".to_string(), Vec::new());
        tables.insert("contacts".to_string(), Vec::new());
        Self {
            tables: Mutex::new(tables),
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// Scripts the next matching operation to fail with
    /// [`RemoteError::Unreachable`]. Faults stack: calling this twice
    /// fails the next two matching operations.
    pub fn fail_next(&self, op: FaultOp) {
        *self.faults.lock().entry(op).or_insert(0) += 1;
    }

    /// Inserts a row keeping a caller-provided id (test seeding).
    /// Missing server columns are still filled in.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::UnknownTable`] or
    /// [`RemoteError::Rejected`] if the row is not an object.
    pub fn seed(&self, table: &str, row: Value) -> Result<EntityId, RemoteError> {
        let Value::Object(mut row) = row else {
            return Err(RemoteError::Rejected("row must be an object".to_string()));
        };
        let mut tables = self.tables.lock();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| RemoteError::UnknownTable(table.to_string()))?;
        fill_server_columns(table, rows, &mut row);
        let id = row_id(&row).unwrap_or_default();
        rows.push(row);
        Ok(EntityId::new(id))
    }

    /// Number of rows currently stored in a table (test assertions).
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map_or(0, Vec::len)
    }

    fn take_fault(&self, op: FaultOp) -> bool {
        let mut faults = self.faults.lock();
        match faults.get_mut(&op) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }
}

fn row_id(row: &Map<String, Value>) -> Option<String> {
    row.get("id").and_then(Value::as_str).map(String::from)
}

/// Assigns `id`, `created_at` and (for tasks) `position` where absent.
fn fill_server_columns(table: &str, rows: &[Map<String, Value>], row: &mut Map<String, Value>) {
    if !row.contains_key("id") {
        row.insert("id".to_string(), Value::String(Uuid::now_v7().to_string()));
    }
    if !row.contains_key("created_at") {
        row.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
    }
    if table == "tasks" && !row.contains_key("position") {
        let next = rows
            .iter()
            .filter_map(|r| r.get("position").and_then(Value::as_i64))
            .max()
            .map_or(1, |max| max + 1);
        row.insert("position".to_string(), Value::Number(next.into()));
    }
}

/// Compares two rows by one ordering key.
fn compare_by_key(a: &Map<String, Value>, b: &Map<String, Value>, key: &OrderKey) -> Ordering {
    let left = a.get(key.column).filter(|v| !v.is_null());
    let right = b.get(key.column).filter(|v| !v.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => {
            if key.nulls_last {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Some(_), None) => {
            if key.nulls_last {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (Some(left), Some(right)) => {
            let present = compare_values(left, right);
            match key.direction {
                Direction::Ascending => present,
                Direction::Descending => present.reverse(),
            }
        }
    }
}

/// Total-enough ordering over the JSON scalars the backend stores.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

impl RemoteTable for MemoryBackend {
    async fn select(&self, table: &str, order: &[OrderKey]) -> Result<Vec<Value>, RemoteError> {
        if self.take_fault(FaultOp::Select) {
            return Err(RemoteError::Unreachable("scripted fault".to_string()));
        }
        let tables = self.tables.lock();
        let rows = tables
            .get(table)
            .ok_or_else(|| RemoteError::UnknownTable(table.to_string()))?;
        let mut rows = rows.clone();
        rows.sort_by(|a, b| {
            order
                .iter()
                .map(|key| compare_by_key(a, b, key))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, RemoteError> {
        if self.take_fault(FaultOp::Insert) {
            return Err(RemoteError::Unreachable("scripted fault".to_string()));
        }
        let Value::Object(mut row) = row else {
            return Err(RemoteError::Rejected("row must be an object".to_string()));
        };
        // Ids are server-assigned: a client-supplied id is discarded.
        row.remove("id");
        let mut tables = self.tables.lock();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| RemoteError::UnknownTable(table.to_string()))?;
        fill_server_columns(table, rows, &mut row);
        rows.push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update(
        &self,
        table: &str,
        id: &EntityId,
        patch: Map<String, Value>,
    ) -> Result<Value, RemoteError> {
        if self.take_fault(FaultOp::Update) {
            return Err(RemoteError::Unreachable("scripted fault".to_string()));
        }
        let mut tables = self.tables.lock();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| RemoteError::UnknownTable(table.to_string()))?;
        let row = rows
            .iter_mut()
            .find(|row| row_id(row).as_deref() == Some(id.as_str()))
            .ok_or_else(|| {
                RemoteError::Rejected(format!("no row with id {id} in `{table}`"))
            })?;
        for (column, value) in patch {
            // A null patch value clears the stored column.
            row.insert(column, value);
        }
        Ok(Value::Object(row.clone()))
    }

    async fn delete(&self, table: &str, id: &EntityId) -> Result<bool, RemoteError> {
        if self.take_fault(FaultOp::Delete) {
            return Err(RemoteError::Unreachable("scripted fault".to_string()));
        }
        let mut tables = self.tables.lock();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| RemoteError::UnknownTable(table.to_string()))?;
        let before = rows.len();
        rows.retain(|row| row_id(row).as_deref() != Some(id.as_str()));
        Ok(rows.len() < before)
    }
}

impl SessionProvider for MemoryBackend {
    fn current_user(&self) -> Option<UserSession> {
        self.session.lock().clone()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserSession, RemoteError> {
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(email) {
            return Err(RemoteError::Rejected(format!(
                "account already exists for {email}"
            )));
        }
        let user_id = Uuid::now_v7().to_string();
        accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        let session = UserSession {
            user_id,
            email: email.to_string(),
            metadata: Map::new(),
        };
        *self.session.lock() = Some(session.clone());
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserSession, RemoteError> {
        let accounts = self.accounts.lock();
        let account = accounts
            .get(email)
            .filter(|account| account.password == password)
            .ok_or(RemoteError::InvalidCredentials)?;
        let session = UserSession {
            user_id: account.user_id.clone(),
            email: email.to_string(),
            metadata: Map::new(),
        };
        *self.session.lock() = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) {
        *self.session.lock() = None;
    }
}
