//! Fakes shared by the unit tests of this crate.

use async_trait::async_trait;
use bloxmesh_database::{Database, DatabaseError, DocumentStore, ErrorKind as DbErrorKind, MemoryStore};
use bloxmesh_models::{
    audit_log::{AuditLog, AuditLogKind},
    roblox::{
        group::GroupRole,
        id::{GroupId, RoleId, UserId},
    },
};
use bloxmesh_roblox::{
    error::{ErrorKind, RobloxError},
    GroupMembership,
};
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use crate::{audit::AuditSink, error::CoreError};

pub const GROUP: GroupId = GroupId(7);
pub const GUEST: RoleId = RoleId(1);
pub const MEMBER: RoleId = RoleId(10);
pub const OFFICER: RoleId = RoleId(50);
pub const SUSPENDED: RoleId = RoleId(999);

pub fn memory_database() -> (Database, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Database::new(store.clone()), store)
}

pub fn role(id: RoleId, name: &str, rank: u32) -> GroupRole {
    GroupRole {
        id,
        name: name.to_string(),
        rank,
        member_count: None,
    }
}

/// An in-memory stand-in for the Roblox groups API.
pub struct FakeRoblox {
    pub roles: Vec<GroupRole>,
    members: Mutex<HashMap<(GroupId, UserId), RoleId>>,
    failing: Mutex<HashSet<UserId>>,
    calls: Mutex<Vec<(GroupId, UserId, RoleId)>>,
    removed: Mutex<Vec<(GroupId, UserId)>>,
}

impl FakeRoblox {
    pub fn new() -> Self {
        Self {
            roles: vec![
                role(GUEST, "Guest", 0),
                role(SUSPENDED, "Suspended", 1),
                role(MEMBER, "Member", 10),
                role(OFFICER, "Officer", 50),
            ],
            members: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_member(self, group_id: GroupId, user_id: UserId, role_id: RoleId) -> Self {
        self.members
            .lock()
            .unwrap()
            .insert((group_id, user_id), role_id);
        self
    }

    /// Every role change for this user fails from now on.
    pub fn fail_for(&self, user_id: UserId) {
        self.failing.lock().unwrap().insert(user_id);
    }

    pub fn role_of(&self, group_id: GroupId, user_id: UserId) -> Option<RoleId> {
        self.members
            .lock()
            .unwrap()
            .get(&(group_id, user_id))
            .copied()
    }

    /// Every attempted role change, including failed ones.
    pub fn calls(&self) -> Vec<(GroupId, UserId, RoleId)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<(GroupId, UserId)> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl GroupMembership for FakeRoblox {
    async fn set_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), RobloxError> {
        self.calls.lock().unwrap().push((group_id, user_id, role_id));
        if self.failing.lock().unwrap().contains(&user_id) {
            return Err(RobloxError::from_parts(ErrorKind::Sending, None));
        }
        self.members
            .lock()
            .unwrap()
            .insert((group_id, user_id), role_id);
        Ok(())
    }

    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> Result<(), RobloxError> {
        self.removed.lock().unwrap().push((group_id, user_id));
        self.members.lock().unwrap().remove(&(group_id, user_id));
        Ok(())
    }

    async fn get_user_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<GroupRole>, RobloxError> {
        let Some(role_id) = self.role_of(group_id, user_id) else {
            return Ok(None);
        };
        Ok(self.roles.iter().find(|r| r.id == role_id).cloned())
    }

    async fn get_group_roles(
        &self,
        group_id: GroupId,
    ) -> Result<Option<Vec<GroupRole>>, RobloxError> {
        if group_id == GROUP {
            Ok(Some(self.roles.clone()))
        } else {
            Ok(None)
        }
    }
}

#[derive(Default)]
pub struct RecordingAuditor {
    logs: Mutex<Vec<AuditLog>>,
}

impl RecordingAuditor {
    pub fn kinds(&self) -> Vec<AuditLogKind> {
        self.logs.lock().unwrap().iter().map(|l| l.kind).collect()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditor {
    async fn record(&self, log: AuditLog) -> Result<(), CoreError> {
        self.logs.lock().unwrap().push(log);
        Ok(())
    }
}

/// A store whose writes to selected documents fail.
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_writes_to(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, DatabaseError> {
        self.inner.get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<(), DatabaseError> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(DatabaseError::from_parts(DbErrorKind::Pool, None));
        }
        self.inner.set(collection, id, value).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, DatabaseError> {
        self.inner.list(collection).await
    }
}
