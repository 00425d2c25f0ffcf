//! User synchronization from Bitwarden.
//!
//! Sync reads provider state into the platform: grants are recorded as
//! platform-side associations only, because the member already holds the
//! permission in the organization. Nothing here pushes to the provider.

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use vigil_connector::conflict::ImportConflict;
use vigil_connector::identity::{AttributeValue, Identity};

use crate::connector::BitwardenConnector;
use crate::error::BitwardenResult;
use crate::model::{
    ListResponse, Member, ACCESS_ALL_ATTRIBUTE, GRANT_TYPE_ROLE, RESOURCE_GROUP, RESOURCE_TYPE,
};

impl BitwardenConnector {
    /// Fetches the full member list and queues it for per-record import.
    #[instrument(skip(self), fields(instance_id = %self.instance_id()))]
    pub async fn import_users(&self, actor: Uuid) -> BitwardenResult<()> {
        let members: ListResponse<serde_json::Value> =
            self.client().get_json("/public/members").await?;

        if members.data.is_empty() {
            info!("Member list is empty, nothing to import");
            return Ok(());
        }

        info!(count = members.data.len(), "Queueing member import");
        self.platform()
            .import_queue
            .enqueue_user_imports(self.instance_id(), members.data, actor)
            .await?;

        Ok(())
    }

    /// Imports a single raw member record.
    ///
    /// Only active and invited members are processed; every other status is
    /// skipped without side effects. A member that cannot be resolved to an
    /// identity is queued as a conflict for manual reconciliation, which is
    /// a deferred outcome rather than a failure.
    #[instrument(skip(self, user), fields(instance_id = %self.instance_id()))]
    pub async fn import_user(&self, user: &serde_json::Value, actor: Uuid) -> BitwardenResult<()> {
        let member = Member::from_json(user)?;

        if !member.is_importable() {
            debug!(member_id = %member.id, status = member.status, "Skipping member");
            return Ok(());
        }

        let Some(identity) = self.resolve_identity(&member).await? else {
            self.platform()
                .conflicts
                .enqueue(ImportConflict {
                    application_id: self.instance_id(),
                    service_identifier: member.id.clone(),
                    email: member.email.clone(),
                    payload: user.clone(),
                    actor,
                    created_at: Utc::now(),
                })
                .await?;
            return Ok(());
        };

        self.platform()
            .identities
            .link_service_identifier(identity.id, self.instance_id(), &member.id)
            .await?;

        // The accessAll flag is needed later when roles change; stash it as
        // an identity attribute.
        self.platform()
            .identities
            .set_attribute(
                identity.id,
                self.instance_id(),
                ACCESS_ALL_ATTRIBUTE,
                AttributeValue::Boolean(member.access_all),
            )
            .await?;

        if let Some(base) = self.base_entitlement().await? {
            self.record_grant(identity.id, base.id, None, GRANT_TYPE_ROLE)
                .await?;
        }

        // Custom roles have no head entitlement, so they fall through the
        // lookup and are skipped like a not-yet-imported catalog.
        if let Some(role) = member.role() {
            if let Some(entitlement) = self
                .platform()
                .entitlements
                .find_head_by_resource(
                    self.instance_id(),
                    RESOURCE_TYPE,
                    &json!({ "type": role.code() }),
                )
                .await?
            {
                self.record_grant(identity.id, entitlement.id, None, GRANT_TYPE_ROLE)
                    .await?;
            }
        }

        // The member record carries no group information; fetch the ids
        // separately. A failed fetch loses the group grants for this pass
        // but does not undo the work above.
        match self
            .client()
            .get_json::<Vec<String>>(&format!("/public/members/{}/group-ids", member.id))
            .await
        {
            Ok(group_ids) => {
                for group_id in group_ids {
                    if let Some(entitlement) = self
                        .platform()
                        .entitlements
                        .find_head_by_resource(
                            self.instance_id(),
                            RESOURCE_GROUP,
                            &json!({ "id": group_id }),
                        )
                        .await?
                    {
                        self.record_grant(identity.id, entitlement.id, None, GRANT_TYPE_ROLE)
                            .await?;
                    }
                }
            }
            Err(err) => {
                warn!(member_id = %member.id, error = %err, "Failed to fetch group memberships");
            }
        }

        Ok(())
    }

    /// Resolves a member to a platform identity: first by the linked
    /// provider id, then by email as a best-effort fallback.
    async fn resolve_identity(&self, member: &Member) -> BitwardenResult<Option<Identity>> {
        if let Some(identity) = self
            .platform()
            .identities
            .find_by_service_identifier(self.instance_id(), &member.id)
            .await?
        {
            return Ok(Some(identity));
        }

        if let Some(email) = &member.email {
            return Ok(self.platform().identities.find_by_email(email).await?);
        }

        Ok(None)
    }

    /// Fetches the provider member linked to an identity, refreshing the
    /// service-identifier link from the returned record.
    #[instrument(skip(self, identity), fields(identity_id = %identity.id))]
    pub async fn get_user(&self, identity: &Identity) -> BitwardenResult<Option<Member>> {
        let Some(service_identifier) = self
            .platform()
            .identities
            .service_identifier(identity.id, self.instance_id())
            .await?
        else {
            return Ok(None);
        };

        let Some(member) = self
            .client()
            .get_optional::<Member>(&format!("/public/members/{service_identifier}"))
            .await?
        else {
            return Ok(None);
        };

        self.platform()
            .identities
            .link_service_identifier(identity.id, self.instance_id(), &member.id)
            .await?;

        Ok(Some(member))
    }
}
