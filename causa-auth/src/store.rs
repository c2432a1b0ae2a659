//! Delegate links and capability sets.
//!
//! [`IdentityStore`] is the read side the resolver and gate need: two
//! point lookups. [`MemoryIdentityStore`] implements it in memory and adds
//! the owner-scoped mutations the delegate management endpoints use.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use tokio::sync::RwLock;

use crate::capability::CapabilitySet;
use crate::error::{AuthError, AuthResult};
use crate::principal::{DelegateId, OwnerId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr)]
pub enum DelegateRole {
    /// Secretary.
    #[serde(rename = "SEC")]
    #[strum(serialize = "SEC")]
    Sec,
    /// Junior lawyer.
    #[serde(rename = "AUX")]
    #[strum(serialize = "AUX")]
    Aux,
}

/// A staff member working under one owner, linked to exactly one login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateRecord {
    pub id: DelegateId,
    pub owner: OwnerId,
    pub user: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub role: DelegateRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of a delegate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateChanges {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: DelegateRole,
    pub active: bool,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// The delegate a login identity is linked to. Logins of removed
    /// delegates come back as an inactive record, never as `None`.
    async fn delegate_for_user(&self, user: &UserId) -> AuthResult<Option<DelegateRecord>>;

    async fn capability_set(&self, delegate: &DelegateId) -> AuthResult<Option<CapabilitySet>>;

    /// Called when a login resolves as an owner. Once claimed, the login can
    /// never be linked as anyone's delegate.
    async fn claim_owner(&self, _user: &UserId) -> AuthResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct Tables {
    delegates: HashMap<DelegateId, DelegateRecord>,
    by_user: HashMap<UserId, DelegateId>,
    capabilities: HashMap<DelegateId, CapabilitySet>,
    credentials: HashMap<UserId, String>,
    // logins of removed delegates; kept so they never fall back to owner
    revoked: HashMap<UserId, DelegateRecord>,
    owners: HashSet<UserId>,
}

impl Tables {
    fn owned(&self, owner: &OwnerId, id: &DelegateId) -> AuthResult<&DelegateRecord> {
        self.delegates
            .get(id)
            .filter(|d| &d.owner == owner)
            .ok_or_else(|| AuthError::DelegateNotFound(id.to_string()))
    }

    fn check_email(&self, email: &str, except: Option<&DelegateId>) -> AuthResult<()> {
        let taken = self
            .delegates
            .values()
            .any(|d| d.email.eq_ignore_ascii_case(email) && Some(&d.id) != except);
        if taken {
            return Err(AuthError::Duplicate {
                field: "email",
                value: email.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryIdentityStore {
    tables: RwLock<Tables>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a new delegate login and give it the default capability set.
    pub async fn insert_delegate(
        &self,
        record: DelegateRecord,
        password_hash: Option<String>,
    ) -> AuthResult<DelegateRecord> {
        let mut t = self.tables.write().await;

        if record.user.as_str() == record.owner.as_str() {
            return Err(AuthError::InvalidDelegate(
                "an owner cannot be its own delegate".into(),
            ));
        }
        let reclaimed_elsewhere = t
            .revoked
            .get(&record.user)
            .is_some_and(|old| old.owner != record.owner);
        if t.by_user.contains_key(&record.user)
            || t.owners.contains(&record.user)
            || reclaimed_elsewhere
        {
            return Err(AuthError::Duplicate {
                field: "username",
                value: record.user.to_string(),
            });
        }
        if t.delegates.contains_key(&record.id) {
            return Err(AuthError::Duplicate {
                field: "id",
                value: record.id.to_string(),
            });
        }
        t.check_email(&record.email, None)?;

        t.revoked.remove(&record.user);
        t.owners.insert(UserId::new(record.owner.as_str()));
        t.by_user.insert(record.user.clone(), record.id.clone());
        t.capabilities
            .insert(record.id.clone(), CapabilitySet::defaults());
        if let Some(hash) = password_hash {
            t.credentials.insert(record.user.clone(), hash);
        }
        t.delegates.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Replace the editable fields of a delegate. Identity, owner and login
    /// never change.
    pub async fn update_delegate(
        &self,
        owner: &OwnerId,
        id: &DelegateId,
        changes: DelegateChanges,
    ) -> AuthResult<DelegateRecord> {
        let mut t = self.tables.write().await;
        t.owned(owner, id)?;
        t.check_email(&changes.email, Some(id))?;

        let record = t
            .delegates
            .get_mut(id)
            .ok_or_else(|| AuthError::DelegateNotFound(id.to_string()))?;
        record.name = changes.name;
        record.email = changes.email;
        record.phone = changes.phone;
        record.role = changes.role;
        record.active = changes.active;
        Ok(record.clone())
    }

    /// Remove a delegate together with its capability set and credentials.
    pub async fn remove_delegate(
        &self,
        owner: &OwnerId,
        id: &DelegateId,
    ) -> AuthResult<DelegateRecord> {
        let mut t = self.tables.write().await;
        t.owned(owner, id)?;

        let mut record = t
            .delegates
            .remove(id)
            .ok_or_else(|| AuthError::DelegateNotFound(id.to_string()))?;
        t.by_user.remove(&record.user);
        t.capabilities.remove(id);
        t.credentials.remove(&record.user);

        let removed = record.clone();
        record.active = false;
        t.revoked.insert(record.user.clone(), record);
        Ok(removed)
    }

    pub async fn get_delegate(&self, owner: &OwnerId, id: &DelegateId) -> AuthResult<DelegateRecord> {
        let t = self.tables.read().await;
        t.owned(owner, id).cloned()
    }

    /// The owner's delegates, oldest first.
    pub async fn list_delegates(&self, owner: &OwnerId) -> Vec<DelegateRecord> {
        let t = self.tables.read().await;
        let mut out: Vec<DelegateRecord> = t
            .delegates
            .values()
            .filter(|d| &d.owner == owner)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Last write wins.
    pub async fn put_capability_set(&self, delegate: &DelegateId, set: CapabilitySet) {
        self.tables
            .write()
            .await
            .capabilities
            .insert(delegate.clone(), set);
    }

    pub async fn remove_capability_set(&self, delegate: &DelegateId) -> Option<CapabilitySet> {
        self.tables.write().await.capabilities.remove(delegate)
    }

    pub async fn set_password_hash(&self, user: &UserId, hash: String) {
        self.tables
            .write()
            .await
            .credentials
            .insert(user.clone(), hash);
    }

    pub async fn password_hash(&self, user: &UserId) -> Option<String> {
        self.tables.read().await.credentials.get(user).cloned()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn delegate_for_user(&self, user: &UserId) -> AuthResult<Option<DelegateRecord>> {
        let t = self.tables.read().await;
        if let Some(id) = t.by_user.get(user) {
            return Ok(t.delegates.get(id).cloned());
        }
        Ok(t.revoked.get(user).cloned())
    }

    async fn capability_set(&self, delegate: &DelegateId) -> AuthResult<Option<CapabilitySet>> {
        Ok(self.tables.read().await.capabilities.get(delegate).cloned())
    }

    async fn claim_owner(&self, user: &UserId) -> AuthResult<()> {
        if self.tables.read().await.owners.contains(user) {
            return Ok(());
        }
        let mut t = self.tables.write().await;
        // a delegate may have been linked between the lookup and this write
        if t.by_user.contains_key(user) || t.revoked.contains_key(user) {
            return Err(AuthError::Duplicate {
                field: "username",
                value: user.to_string(),
            });
        }
        t.owners.insert(user.clone());
        Ok(())
    }
}
