//! Wire types for the Bitwarden public API.

use serde::{Deserialize, Serialize};

use vigil_connector::entitlement::Entitlement;

use crate::error::BitwardenResult;

/// Resource type written into group entitlements.
pub const RESOURCE_GROUP: &str = "group";

/// Resource type written into member-role entitlements.
pub const RESOURCE_TYPE: &str = "type";

/// Grant type recorded for role and group associations.
pub const GRANT_TYPE_ROLE: &str = "role";

/// Identity attribute holding the member's `accessAll` flag.
pub const ACCESS_ALL_ATTRIBUTE: &str = "accessAll";

/// Member status: invited but not yet accepted.
pub const STATUS_INVITED: i64 = 0;

/// Member status: active (confirmed) organization member.
pub const STATUS_ACTIVE: i64 = 2;

/// Organization member roles.
///
/// Role code 4 ("Custom") is deliberately unmapped: its permissions are
/// customizable per user and cannot be represented by a shared entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberRole {
    Owner,
    Admin,
    User,
    Manager,
}

impl MemberRole {
    /// Every reconcilable role, in code order.
    pub const ALL: [MemberRole; 4] = [
        MemberRole::Owner,
        MemberRole::Admin,
        MemberRole::User,
        MemberRole::Manager,
    ];

    /// Map a provider role code to a role. Returns `None` for the Custom
    /// role and for codes the provider does not define.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MemberRole::Owner),
            1 => Some(MemberRole::Admin),
            2 => Some(MemberRole::User),
            3 => Some(MemberRole::Manager),
            _ => None,
        }
    }

    /// The provider's numeric code for this role.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            MemberRole::Owner => 0,
            MemberRole::Admin => 1,
            MemberRole::User => 2,
            MemberRole::Manager => 3,
        }
    }

    /// Display label, also used as the entitlement name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MemberRole::Owner => "Owner",
            MemberRole::Admin => "Admin",
            MemberRole::User => "User",
            MemberRole::Manager => "Manager",
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An organization member as returned by `/public/members`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Member id within the organization.
    pub id: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Membership status code.
    pub status: i64,
    /// Role code.
    #[serde(rename = "type")]
    pub role_code: i64,
    /// Whether the member can access all collections.
    #[serde(default)]
    pub access_all: bool,
    /// External id, if one was assigned at creation.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

impl Member {
    /// Parse a raw provider record.
    pub fn from_json(value: &serde_json::Value) -> BitwardenResult<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Whether this member should be imported. Only active and invited
    /// members are; every other status is skipped.
    #[must_use]
    pub fn is_importable(&self) -> bool {
        matches!(self.status, STATUS_ACTIVE | STATUS_INVITED)
    }

    /// The member's role, if it is one of the reconcilable roles.
    #[must_use]
    pub fn role(&self) -> Option<MemberRole> {
        MemberRole::from_code(self.role_code)
    }
}

/// An organization group as returned by `/public/groups`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group id.
    pub id: String,
    /// Group name.
    pub name: String,
}

/// List envelope used by the collection endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    /// The listed records.
    pub data: Vec<T>,
}

/// Body for `PUT /public/members/{id}/group-ids` when assigning groups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupIdsUpdate {
    /// Group ids the member belongs to.
    pub group_ids: Vec<String>,
}

/// Body for the full-list member replace on a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberIdsUpdate {
    /// Member ids remaining in the group.
    pub member_ids: Vec<String>,
}

/// Body for `PUT /public/members/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    /// Role code.
    #[serde(rename = "type")]
    pub role_code: i64,
    /// Whether the member can access all collections.
    pub access_all: bool,
}

/// Body for `POST /public/members`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMember {
    /// External id; empty when the platform does not assign one.
    pub external_id: String,
    /// Role code for the new member.
    #[serde(rename = "type")]
    pub role_code: i64,
    /// Whether the member can access all collections.
    pub access_all: bool,
    /// Whether the member is enrolled in password reset.
    pub reset_password_enrolled: bool,
    /// Collection assignments; empty at creation.
    pub collections: Vec<serde_json::Value>,
    /// Invitation email address.
    pub email: String,
}

/// Response from the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// The issued access token.
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// A provider resource an entitlement stands for.
///
/// Entitlements in the platform store carry an opaque `resource_type` and
/// `extra_params`; this is the connector-side interpretation of the shapes
/// it writes during catalog import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementResource {
    /// Membership in an organization group.
    Group {
        /// Provider group id.
        id: String,
    },
    /// An organization member role.
    RoleType {
        /// Provider role code.
        code: i64,
    },
}

impl EntitlementResource {
    /// Interpret an entitlement's resource fields. Returns `None` when the
    /// resource type or its parameters are not ones this connector writes.
    #[must_use]
    pub fn classify(entitlement: &Entitlement) -> Option<Self> {
        match entitlement.resource_type.as_str() {
            RESOURCE_GROUP => entitlement
                .extra_params
                .get("id")
                .and_then(|v| v.as_str())
                .map(|id| EntitlementResource::Group { id: id.to_string() }),
            RESOURCE_TYPE => entitlement
                .extra_params
                .get("type")
                .and_then(serde_json::Value::as_i64)
                .map(|code| EntitlementResource::RoleType { code }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn entitlement(resource_type: &str, extra_params: serde_json::Value) -> Entitlement {
        Entitlement {
            id: Uuid::new_v4(),
            application_id: Uuid::new_v4(),
            name: "test".to_string(),
            resource_type: resource_type.to_string(),
            extra_params,
            is_head_revision: true,
            stale: false,
            created_at: Utc::now(),
            refreshed_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_code_mapping() {
        assert_eq!(MemberRole::from_code(0), Some(MemberRole::Owner));
        assert_eq!(MemberRole::from_code(1), Some(MemberRole::Admin));
        assert_eq!(MemberRole::from_code(2), Some(MemberRole::User));
        assert_eq!(MemberRole::from_code(3), Some(MemberRole::Manager));
        // Custom roles cannot be reconciled
        assert_eq!(MemberRole::from_code(4), None);
        assert_eq!(MemberRole::from_code(99), None);
    }

    #[test]
    fn test_member_from_json() {
        let member = Member::from_json(&json!({
            "id": "m-1",
            "email": "jo@example.com",
            "status": 2,
            "type": 1,
            "accessAll": true
        }))
        .unwrap();

        assert_eq!(member.id, "m-1");
        assert_eq!(member.role(), Some(MemberRole::Admin));
        assert!(member.access_all);
        assert!(member.is_importable());
    }

    #[test]
    fn test_importable_statuses() {
        let mut member = Member::from_json(&json!({
            "id": "m-1",
            "status": 0,
            "type": 2
        }))
        .unwrap();
        assert!(member.is_importable(), "invited members are imported");

        member.status = 1;
        assert!(!member.is_importable());

        member.status = -1;
        assert!(!member.is_importable());
    }

    #[test]
    fn test_request_body_field_names() {
        let body = serde_json::to_value(GroupIdsUpdate {
            group_ids: vec!["g1".to_string()],
        })
        .unwrap();
        assert_eq!(body, json!({ "groupIds": ["g1"] }));

        let body = serde_json::to_value(MemberIdsUpdate {
            member_ids: vec!["5".to_string(), "9".to_string()],
        })
        .unwrap();
        assert_eq!(body, json!({ "memberIds": ["5", "9"] }));

        let body = serde_json::to_value(MemberUpdate {
            role_code: 2,
            access_all: false,
        })
        .unwrap();
        assert_eq!(body, json!({ "type": 2, "accessAll": false }));
    }

    #[test]
    fn test_create_member_body() {
        let body = serde_json::to_value(CreateMember {
            external_id: String::new(),
            role_code: 2,
            access_all: false,
            reset_password_enrolled: false,
            collections: Vec::new(),
            email: "new@example.com".to_string(),
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "externalId": "",
                "type": 2,
                "accessAll": false,
                "resetPasswordEnrolled": false,
                "collections": [],
                "email": "new@example.com"
            })
        );
    }

    #[test]
    fn test_classify_entitlement_resources() {
        let group = entitlement(RESOURCE_GROUP, json!({ "id": "g1" }));
        assert_eq!(
            EntitlementResource::classify(&group),
            Some(EntitlementResource::Group { id: "g1".to_string() })
        );

        let role = entitlement(RESOURCE_TYPE, json!({ "type": 3 }));
        assert_eq!(
            EntitlementResource::classify(&role),
            Some(EntitlementResource::RoleType { code: 3 })
        );

        let unknown = entitlement("collection", json!({ "id": "c1" }));
        assert_eq!(EntitlementResource::classify(&unknown), None);

        let malformed = entitlement(RESOURCE_GROUP, json!({}));
        assert_eq!(EntitlementResource::classify(&malformed), None);
    }
}
