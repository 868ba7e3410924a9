use async_trait::async_trait;

use hectara_core::{AppResult, TenantId};
use hectara_domain::AuditAction;

/// Audit event payload written by access-control use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant of the acting identity.
    pub tenant_id: TenantId,
    /// Actor subject.
    pub subject: String,
    /// Stable action.
    pub action: AuditAction,
    /// Resource type touched by the action.
    pub resource_type: String,
    /// Resource identifier touched by the action.
    pub resource_id: String,
    /// Optional detail message.
    pub detail: Option<String>,
}

/// Repository port for appending audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
