//! Administrator-driven provisioning against Bitwarden.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use vigil_connector::entitlement::{Entitlement, IdentityEntitlement};
use vigil_connector::identity::Identity;
use vigil_connector::notify::Severity;
use vigil_connector::traits::Connector;

use crate::connector::BitwardenConnector;
use crate::error::{BitwardenError, BitwardenResult};
use crate::model::{
    CreateMember, EntitlementResource, GroupIdsUpdate, Member, MemberIdsUpdate, MemberUpdate,
};

impl BitwardenConnector {
    /// Grants an entitlement to an identity, pushing it to the provider.
    ///
    /// Ensures the identity has a member account first (creating one when
    /// needed) and grants the instance's base entitlement before the
    /// requested one, since every provisioned member needs a base role.
    #[instrument(skip(self, entitlement, identity), fields(entitlement_id = %entitlement.id, identity_id = %identity.id))]
    pub async fn add_entitlement_to_identity(
        &self,
        entitlement: &Entitlement,
        identity: &Identity,
        expiration: Option<DateTime<Utc>>,
        grant_type: &str,
    ) -> BitwardenResult<()> {
        // Validate the entitlement shape before touching the provider.
        let Some(resource) = EntitlementResource::classify(entitlement) else {
            warn!(entitlement_id = %entitlement.id, "Entitlement has an unexpected resource type");
            return Err(BitwardenError::DataIntegrity(format!(
                "entitlement {} has an unexpected resource type",
                entitlement.id
            )));
        };

        self.check_or_add_identity(identity).await?;

        if let Some(base) = self.base_entitlement().await? {
            self.record_grant(identity.id, base.id, None, grant_type)
                .await?;
        }

        let Some(service_identifier) = self
            .platform()
            .identities
            .service_identifier(identity.id, self.instance_id())
            .await?
        else {
            self.platform().notifier.toast(
                Severity::Warning,
                &format!(
                    "Could not find a service identifier for {}, even though they do have an account.",
                    identity.display_name
                ),
            );
            return Err(BitwardenError::MissingServiceIdentifier(
                identity.display_name.clone(),
            ));
        };

        let result = match resource {
            EntitlementResource::Group { id } => {
                self.client()
                    .put(
                        &format!("/public/members/{service_identifier}/group-ids"),
                        &GroupIdsUpdate {
                            group_ids: vec![id],
                        },
                    )
                    .await
            }
            EntitlementResource::RoleType { code } => {
                let access_all = self.access_all_attribute(identity.id).await?;
                self.client()
                    .put(
                        &format!("/public/members/{service_identifier}"),
                        &MemberUpdate {
                            role_code: code,
                            access_all,
                        },
                    )
                    .await
            }
        };

        match result {
            Ok(()) => {
                self.record_grant(identity.id, entitlement.id, expiration, grant_type)
                    .await?;
                info!(entitlement_id = %entitlement.id, "Entitlement granted");
                Ok(())
            }
            Err(err) => {
                self.platform().notifier.toast(
                    Severity::Error,
                    &format!(
                        "An error occurred when adding an entitlement to identity: {}",
                        identity.display_name
                    ),
                );
                Err(err)
            }
        }
    }

    /// Revokes a granted entitlement, pushing the removal to the provider.
    ///
    /// The provider has no remove-one-member primitive for groups: removal
    /// fetches the group's full member list, drops this member's id and
    /// replaces the list. Two concurrent removals against the same group
    /// can lose one of the updates unless serialized upstream.
    ///
    /// Removing a role entitlement re-puts the member's current type and
    /// accessAll; the provider offers nothing narrower.
    #[instrument(skip(self, grant), fields(grant_id = %grant.id))]
    pub async fn remove_entitlement_from_identity(
        &self,
        grant: &IdentityEntitlement,
    ) -> BitwardenResult<()> {
        let entitlement = self
            .platform()
            .entitlements
            .get(grant.entitlement_id)
            .await?
            .ok_or_else(|| {
                BitwardenError::DataIntegrity(format!(
                    "grant {} references a missing entitlement",
                    grant.id
                ))
            })?;

        let Some(resource) = EntitlementResource::classify(&entitlement) else {
            warn!(entitlement_id = %entitlement.id, "Entitlement has an unexpected resource type");
            return Err(BitwardenError::DataIntegrity(format!(
                "entitlement {} has an unexpected resource type",
                entitlement.id
            )));
        };

        let Some(service_identifier) = self
            .platform()
            .identities
            .service_identifier(grant.identity_id, self.instance_id())
            .await?
        else {
            return Err(BitwardenError::MissingServiceIdentifier(
                grant.identity_id.to_string(),
            ));
        };

        match resource {
            EntitlementResource::Group { id } => {
                let mut member_ids: Vec<String> = self
                    .client()
                    .get_json(&format!("/public/groups/{id}/member-ids"))
                    .await?;
                member_ids.retain(|m| m != &service_identifier);

                self.client()
                    .put(
                        &format!("/public/members/{service_identifier}/group-ids"),
                        &MemberIdsUpdate { member_ids },
                    )
                    .await?;
            }
            EntitlementResource::RoleType { code } => {
                let access_all = self.access_all_attribute(grant.identity_id).await?;
                self.client()
                    .put(
                        &format!("/public/members/{service_identifier}"),
                        &MemberUpdate {
                            role_code: code,
                            access_all,
                        },
                    )
                    .await?;
            }
        }

        self.platform().grants.revoke(grant.id).await?;
        info!(entitlement_id = %entitlement.id, "Entitlement revoked");

        Ok(())
    }

    /// Bitwarden has no member-deactivation endpoint; this is a no-op.
    pub async fn deactivate_user(&self, service_identifier: &str) -> BitwardenResult<()> {
        debug!(service_identifier, "Provider does not support deactivation");
        Ok(())
    }

    /// Permanently removes the member from the organization. The user's
    /// account outside the organization is unaffected. Cannot be undone.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, service_identifier: &str) -> BitwardenResult<()> {
        self.client()
            .delete(&format!("/public/members/{service_identifier}"))
            .await?;
        info!(service_identifier, "Member removed from organization");
        Ok(())
    }

    /// Creates a member account for an identity.
    ///
    /// Creation needs a role to assign, taken from the instance's default
    /// entitlement; a missing or non-role default raises an administrator
    /// alert and fails.
    #[instrument(skip(self, identity), fields(identity_id = %identity.id))]
    pub async fn create_new_user(&self, identity: &Identity) -> BitwardenResult<Member> {
        let default = self.default_entitlement().await?;

        let Some(EntitlementResource::RoleType { code }) =
            default.as_ref().and_then(EntitlementResource::classify)
        else {
            self.platform().notifier.alert(&format!(
                "The default entitlement for new users for {} is not of the proper type. Please select a valid 'type'.",
                self.display_name()
            ));
            return Err(BitwardenError::Config(
                "default entitlement is missing or is not a member type".to_string(),
            ));
        };

        let request = CreateMember {
            external_id: String::new(),
            role_code: code,
            access_all: false,
            reset_password_enrolled: false,
            collections: Vec::new(),
            email: identity.email.clone(),
        };

        let member: Member = self.client().post_json("/public/members", &request).await?;

        self.platform()
            .identities
            .link_service_identifier(identity.id, self.instance_id(), &member.id)
            .await?;

        info!(member_id = %member.id, "Member created");

        Ok(member)
    }

    /// Ensures the identity has a member account, creating one if needed.
    pub(crate) async fn check_or_add_identity(
        &self,
        identity: &Identity,
    ) -> BitwardenResult<Member> {
        if let Some(member) = self.get_user(identity).await? {
            return Ok(member);
        }
        self.create_new_user(identity).await
    }
}
