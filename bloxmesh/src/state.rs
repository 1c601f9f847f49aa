use bloxmesh_core::{
    audit::AuditSink,
    suspensions::Sweeper,
};
use bloxmesh_database::Database;
use bloxmesh_roblox::GroupMembership;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub roblox: Arc<dyn GroupMembership>,
    pub database: Database,
    pub audit: Arc<dyn AuditSink>,
    pub sweeper: Sweeper,
    pub cron_secret: Option<Arc<str>>,
}
