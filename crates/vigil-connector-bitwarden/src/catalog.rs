//! Entitlement catalog import from Bitwarden.

use serde_json::json;
use tracing::{info, instrument};

use vigil_connector::entitlement::CreateEntitlementInput;

use crate::connector::BitwardenConnector;
use crate::error::BitwardenResult;
use crate::model::{Group, ListResponse, MemberRole, RESOURCE_GROUP, RESOURCE_TYPE};

impl BitwardenConnector {
    /// Imports the organization's groups and member roles as head-revision
    /// entitlements.
    ///
    /// Groups are provider-defined and discovered from the API; the role
    /// taxonomy is a small fixed set and hard-coded. A re-run over
    /// unchanged provider data marks existing heads fresh instead of
    /// creating duplicates.
    ///
    /// Lookups key on the entitlement name, so a group renamed in the
    /// provider produces a new head entitlement next to the old one.
    #[instrument(skip(self), fields(instance_id = %self.instance_id()))]
    pub async fn import_entitlements(&self) -> BitwardenResult<()> {
        // Groups are load-bearing: a failed fetch fails the whole import.
        let groups: ListResponse<Group> = self.client().get_json("/public/groups").await?;

        let mut created = 0usize;
        let mut refreshed = 0usize;

        for group in &groups.data {
            match self
                .platform()
                .entitlements
                .find_head_by_name(self.instance_id(), &group.name)
                .await?
            {
                Some(existing) => {
                    self.platform().entitlements.mark_fresh(existing.id).await?;
                    refreshed += 1;
                }
                None => {
                    self.platform()
                        .entitlements
                        .create(CreateEntitlementInput {
                            application_id: self.instance_id(),
                            name: group.name.clone(),
                            resource_type: RESOURCE_GROUP.to_string(),
                            extra_params: json!({ "id": group.id }),
                        })
                        .await?;
                    created += 1;
                }
            }
        }

        for role in MemberRole::ALL {
            match self
                .platform()
                .entitlements
                .find_head_by_name(self.instance_id(), role.label())
                .await?
            {
                Some(existing) => {
                    self.platform().entitlements.mark_fresh(existing.id).await?;
                    refreshed += 1;
                }
                None => {
                    self.platform()
                        .entitlements
                        .create(CreateEntitlementInput {
                            application_id: self.instance_id(),
                            name: role.label().to_string(),
                            resource_type: RESOURCE_TYPE.to_string(),
                            extra_params: json!({ "type": role.code() }),
                        })
                        .await?;
                    created += 1;
                }
            }
        }

        info!(created, refreshed, "Entitlement import completed");

        Ok(())
    }
}
