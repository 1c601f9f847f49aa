use async_trait::async_trait;
use bloxmesh_models::audit_log::{AuditLog, AuditLogKind};
use twilight_http::Client as DiscordClient;
use twilight_model::{
    id::{marker::WebhookMarker, Id},
    util::Timestamp,
};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};

use crate::error::CoreError;

pub const RED: u32 = 0x00E7_4C3C;
pub const DARK_GREEN: u32 = 0x001F_8B4C;
pub const BLUE: u32 = 0x0034_98DB;

/// Receives a record of everything the automation engine did.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, log: AuditLog) -> Result<(), CoreError>;
}

/// Used when no audit destination is configured.
pub struct NoopAuditor;

#[async_trait]
impl AuditSink for NoopAuditor {
    async fn record(&self, log: AuditLog) -> Result<(), CoreError> {
        tracing::debug!(kind = ?log.kind, group_id = %log.group_id, "audit log");
        Ok(())
    }
}

/// Posts each entry as an embed to a Discord webhook.
pub struct DiscordAuditor {
    http: DiscordClient,
    webhook_id: Id<WebhookMarker>,
    token: String,
}

impl DiscordAuditor {
    /// Builds an auditor from a `https://discord.com/api/webhooks/{id}/{token}` url.
    /// Returns `None` if the url does not look like a webhook url.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let (webhook_id, token) = parse_webhook_url(url)?;
        Some(Self {
            http: DiscordClient::new(String::new()),
            webhook_id,
            token,
        })
    }
}

#[async_trait]
impl AuditSink for DiscordAuditor {
    async fn record(&self, log: AuditLog) -> Result<(), CoreError> {
        let mut embed = EmbedBuilder::new()
            .title(log.kind.to_string())
            .color(color(log.kind))
            .footer(EmbedFooterBuilder::new("Bloxmesh").build())
            .description(format!(
                "Group {} | By {}",
                log.group_id,
                log.actor.as_deref().unwrap_or("Automation")
            ));
        if let Ok(timestamp) = Timestamp::from_secs(log.timestamp.timestamp()) {
            embed = embed.timestamp(timestamp);
        }
        for (name, value) in log.metadata.fields() {
            embed = embed.field(EmbedFieldBuilder::new(name, value).inline().build());
        }

        let embeds = [embed.build()];
        self.http
            .execute_webhook(self.webhook_id, &self.token)
            .embeds(&embeds)
            .await?;
        Ok(())
    }
}

/// Records an entry. Audit failures are logged and never fail the operation
/// that produced them.
pub(crate) async fn emit(audit: &dyn AuditSink, log: AuditLog) {
    let kind = log.kind;
    if let Err(err) = audit.record(log).await {
        tracing::warn!(?kind, err = %err, "failed to deliver audit log");
    }
}

fn parse_webhook_url(url: &str) -> Option<(Id<WebhookMarker>, String)> {
    let mut segments = url.trim_end_matches('/').rsplit('/');
    let token = segments.next()?;
    let id = segments.next()?.parse::<u64>().ok()?;
    if segments.next()? != "webhooks" || token.is_empty() {
        return None;
    }
    Some((Id::new_checked(id)?, token.to_string()))
}

fn color(kind: AuditLogKind) -> u32 {
    match kind {
        AuditLogKind::Suspend
        | AuditLogKind::Kick
        | AuditLogKind::PointsRemove
        | AuditLogKind::RuleDelete
        | AuditLogKind::SubGroupDelete => RED,
        AuditLogKind::Unsuspend | AuditLogKind::SuspensionExpired | AuditLogKind::PointsAdd => {
            DARK_GREEN
        }
        _ => BLUE,
    }
}
