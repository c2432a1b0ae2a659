use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use causa_core::errors::CausaError;
use causa_core::tenant::TenantContext;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::services::types::{OfficeState, Partitioned};
use crate::utils::clock::now_ts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Clients,
    Cases,
    CaseProgress,
    Appointments,
    Reschedules,
    Fees,
    Notifications,
}

impl StoreKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            StoreKind::Clients => "client",
            StoreKind::Cases => "case",
            StoreKind::CaseProgress => "progress",
            StoreKind::Appointments => "appointment",
            StoreKind::Reschedules => "reschedule",
            StoreKind::Fees => "fee",
            StoreKind::Notifications => "notification",
        }
    }

    pub fn not_found_prefix(self) -> &'static str {
        match self {
            StoreKind::Clients => "Client not found",
            StoreKind::Cases => "Case not found",
            StoreKind::CaseProgress => "Progress entry not found",
            StoreKind::Appointments => "Appointment not found",
            StoreKind::Reschedules => "Reschedule not found",
            StoreKind::Fees => "Fee not found",
            StoreKind::Notifications => "Notification not found",
        }
    }
}

/// Keys that belong to the stored record, never to a payload.
const SYSTEM_KEYS: [&str; 2] = ["id", "created_at"];

/// Partitioned CRUD over one [`OfficeState`] table.
///
/// Every operation starts by deriving the partition from the call's
/// [`TenantContext`]; an anonymous context never reaches a table.
#[derive(Clone)]
pub struct OfficeAdapter {
    pub state: Arc<OfficeState>,
    pub store: StoreKind,
    pub id_prefix: &'static str,
    pub not_found_prefix: &'static str,
}

impl OfficeAdapter {
    pub fn new(state: Arc<OfficeState>, store: StoreKind) -> Self {
        Self {
            state,
            store,
            id_prefix: store.id_prefix(),
            not_found_prefix: store.not_found_prefix(),
        }
    }

    fn map_for(&self) -> &Partitioned {
        match self.store {
            StoreKind::Clients => &self.state.clients_by_owner,
            StoreKind::Cases => &self.state.cases_by_owner,
            StoreKind::CaseProgress => &self.state.progress_by_owner,
            StoreKind::Appointments => &self.state.appointments_by_owner,
            StoreKind::Reschedules => &self.state.reschedules_by_owner,
            StoreKind::Fees => &self.state.fees_by_owner,
            StoreKind::Notifications => &self.state.notifications_by_user,
        }
    }

    /// Owner partition, or the acting user for per-user tables.
    fn partition(&self, ctx: &TenantContext) -> Result<String> {
        if ctx.is_anonymous() {
            return Err(CausaError::not_authenticated("Authentication required").into_anyhow());
        }
        match self.store {
            StoreKind::Notifications => ctx
                .actor()
                .map(|a| a.to_string())
                .ok_or_else(|| CausaError::not_authenticated("Authentication required").into_anyhow()),
            _ => Ok(ctx.tenant_id.as_str().to_string()),
        }
    }

    fn not_found(&self, id: &str) -> anyhow::Error {
        CausaError::not_found(format!("{}: {id}", self.not_found_prefix)).into_anyhow()
    }

    pub fn require_id<'a>(&self, id: Option<&'a str>, msg: &'static str) -> Result<&'a str> {
        id.ok_or_else(|| CausaError::bad_request(msg).into_anyhow())
    }

    fn new_id(&self) -> String {
        format!("{}:{}", self.id_prefix, Uuid::new_v4())
    }

    /// Insert a new record. `check` sees the partition under the write lock,
    /// so uniqueness rules hold against concurrent writers.
    pub async fn _create_checked<F>(&self, ctx: &TenantContext, data: Value, check: F) -> Result<Value>
    where
        F: FnOnce(&HashMap<String, Value>) -> Result<()>,
    {
        let partition = self.partition(ctx)?;
        let mut obj = data.as_object().cloned().unwrap_or_default();
        for key in SYSTEM_KEYS {
            obj.remove(key);
        }

        let id = self.new_id();
        obj.insert("id".to_string(), Value::String(id.clone()));
        obj.insert("created_at".to_string(), Value::String(now_ts()));
        let value = Value::Object(obj);

        let mut by_partition = self.map_for().write().await;
        let map = by_partition.entry(partition).or_default();
        check(map)?;
        map.insert(id, value.clone());
        Ok(value)
    }

    pub async fn _create(&self, ctx: &TenantContext, data: Value) -> Result<Value> {
        self._create_checked(ctx, data, |_| Ok(())).await
    }

    pub async fn _find(&self, ctx: &TenantContext) -> Result<Vec<Value>> {
        let partition = self.partition(ctx)?;
        let by_partition = self.map_for().read().await;
        Ok(by_partition
            .get(&partition)
            .into_iter()
            .flat_map(|m| m.values())
            .cloned()
            .collect())
    }

    pub async fn _get(&self, ctx: &TenantContext, id: &str) -> Result<Value> {
        let partition = self.partition(ctx)?;
        let by_partition = self.map_for().read().await;
        by_partition
            .get(&partition)
            .and_then(|m| m.get(id))
            .cloned()
            .ok_or_else(|| self.not_found(id))
    }

    /// Replace a record with whatever `f` computes from the current one.
    /// `f` also sees the whole partition (the current record included) for
    /// uniqueness checks. `id` and `created_at` are always carried over.
    pub async fn _modify<F>(&self, ctx: &TenantContext, id: &str, f: F) -> Result<Value>
    where
        F: FnOnce(&Value, &HashMap<String, Value>) -> Result<Value>,
    {
        let partition = self.partition(ctx)?;
        let mut by_partition = self.map_for().write().await;
        let map = by_partition.entry(partition).or_default();
        let existing = map.get(id).cloned().ok_or_else(|| self.not_found(id))?;

        let next = f(&existing, map)?;
        let mut obj = next.as_object().cloned().unwrap_or_default();
        for key in SYSTEM_KEYS {
            match existing.get(key) {
                Some(v) => obj.insert(key.to_string(), v.clone()),
                None => obj.remove(key),
            };
        }

        let value = Value::Object(obj);
        map.insert(id.to_string(), value.clone());
        Ok(value)
    }

    pub async fn _patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value) -> Result<Value> {
        let id = self.require_id(id, "Patch requires an id")?;
        self._modify(ctx, id, |existing, _| Ok(merge_patch(existing, &data)))
            .await
    }

    /// Apply `f` to every record of the caller's partition; returns the
    /// changed records.
    pub async fn _modify_all<F>(&self, ctx: &TenantContext, mut f: F) -> Result<Vec<Value>>
    where
        F: FnMut(&mut Map<String, Value>) -> bool,
    {
        let partition = self.partition(ctx)?;
        let mut by_partition = self.map_for().write().await;
        let mut changed = Vec::new();
        if let Some(map) = by_partition.get_mut(&partition) {
            for record in map.values_mut() {
                if let Some(obj) = record.as_object_mut() {
                    if f(obj) {
                        changed.push(record.clone());
                    }
                }
            }
        }
        Ok(changed)
    }

    pub async fn _remove(&self, ctx: &TenantContext, id: Option<&str>) -> Result<Value> {
        let id = self.require_id(id, "Remove requires an id")?;
        let partition = self.partition(ctx)?;
        let mut by_partition = self.map_for().write().await;
        by_partition
            .get_mut(&partition)
            .and_then(|m| m.remove(id))
            .ok_or_else(|| self.not_found(id))
    }

    /// Remove every record of the partition matching `pred`.
    pub async fn _remove_where<F>(&self, ctx: &TenantContext, pred: F) -> Result<Vec<Value>>
    where
        F: Fn(&Value) -> bool,
    {
        let partition = self.partition(ctx)?;
        let mut by_partition = self.map_for().write().await;
        let Some(map) = by_partition.get_mut(&partition) else {
            return Ok(Vec::new());
        };
        let ids: Vec<String> = map
            .iter()
            .filter(|(_, v)| pred(*v))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(ids.iter().filter_map(|id| map.remove(id)).collect())
    }

    /// Insert into someone else's partition (per-user tables only).
    pub async fn _create_for(&self, partition: &str, data: Value) -> Result<Value> {
        let ctx = TenantContext::new(partition).with_actor(partition);
        self._create(&ctx, data).await
    }
}

/// Shallow merge of `patch` over `existing`, ignoring system keys.
pub fn merge_patch(existing: &Value, patch: &Value) -> Value {
    let mut record = existing.as_object().cloned().unwrap_or_default();
    if let Some(patch) = patch.as_object() {
        for (k, v) in patch {
            if SYSTEM_KEYS.contains(&k.as_str()) {
                continue;
            }
            record.insert(k.clone(), v.clone());
        }
    }
    Value::Object(record)
}

pub fn str_field<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(|v| v.as_str())
}

/// Order by `field` descending (newest first), ties broken by id.
pub fn sort_desc_by(records: &mut [Value], field: &str) {
    records.sort_by(|a, b| compare_by(b, a, field));
}

/// Order by `field` ascending, ties broken by id.
pub fn sort_asc_by(records: &mut [Value], field: &str) {
    records.sort_by(|a, b| compare_by(a, b, field));
}

fn compare_by(a: &Value, b: &Value, field: &str) -> Ordering {
    str_field(a, field)
        .cmp(&str_field(b, field))
        .then_with(|| str_field(a, "id").cmp(&str_field(b, "id")))
}
