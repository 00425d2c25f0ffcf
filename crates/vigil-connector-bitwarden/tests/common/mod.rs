//! Common test utilities for vigil-connector-bitwarden integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigil_connector::conflict::InMemoryConflictQueue;
use vigil_connector::entitlement::{
    CreateEntitlementInput, Entitlement, EntitlementStore, InMemoryEntitlementStore,
    InMemoryGrantStore,
};
use vigil_connector::identity::{Identity, InMemoryIdentityStore};
use vigil_connector::instance::{
    ApplicationInstance, InMemoryInstanceStore, InstanceCredentials, InstanceStore, TokenRecord,
};
use vigil_connector::jobs::InMemoryImportQueue;
use vigil_connector::notify::RecordingNotifier;
use vigil_connector::platform::Platform;
use vigil_connector_bitwarden::{
    BitwardenConfig, BitwardenConnector, MemberRole, RESOURCE_GROUP, RESOURCE_TYPE,
};

/// Token seeded into the instance record by default.
pub const SEED_TOKEN: &str = "seed-access-token";

/// Token returned by the mocked token endpoint.
pub const REFRESHED_TOKEN: &str = "refreshed-access-token";

/// A connector wired against a mock provider and in-memory platform stores.
pub struct TestContext {
    pub server: MockServer,
    pub connector: BitwardenConnector,
    pub instance_id: Uuid,
    pub actor: Uuid,
    pub entitlements: Arc<InMemoryEntitlementStore>,
    pub grants: Arc<InMemoryGrantStore>,
    pub identities: Arc<InMemoryIdentityStore>,
    pub instances: Arc<InMemoryInstanceStore>,
    pub conflicts: Arc<InMemoryConflictQueue>,
    pub notifier: Arc<RecordingNotifier>,
    pub import_queue: Arc<InMemoryImportQueue>,
}

impl TestContext {
    /// Creates a context whose instance record already holds a live token,
    /// so API calls do not touch the token endpoint.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let instance_id = Uuid::new_v4();

        let entitlements = Arc::new(InMemoryEntitlementStore::new());
        let grants = Arc::new(InMemoryGrantStore::new());
        let identities = Arc::new(InMemoryIdentityStore::new());
        let instances = Arc::new(InMemoryInstanceStore::new());
        let conflicts = Arc::new(InMemoryConflictQueue::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let import_queue = Arc::new(InMemoryImportQueue::new());

        instances
            .insert(ApplicationInstance {
                id: instance_id,
                display_name: "Bitwarden (test org)".to_string(),
                credentials: InstanceCredentials {
                    client_id: "organization.test".to_string(),
                    client_secret: "test-secret".to_string().into(),
                },
                access_token: Some(TokenRecord {
                    access_token: SEED_TOKEN.to_string(),
                    expiration: Utc::now() + Duration::hours(1),
                }),
                base_entitlement_id: None,
                default_entitlement_id: None,
            })
            .await;

        let platform = Platform {
            entitlements: entitlements.clone(),
            grants: grants.clone(),
            identities: identities.clone(),
            instances: instances.clone(),
            conflicts: conflicts.clone(),
            notifier: notifier.clone(),
            import_queue: import_queue.clone(),
        };

        let config = BitwardenConfig::default()
            .with_api_url(server.uri())
            .with_token_url(format!("{}/connect/token", server.uri()));

        let connector = BitwardenConnector::new(config, instance_id, platform)
            .expect("connector construction");

        Self {
            server,
            connector,
            instance_id,
            actor: Uuid::new_v4(),
            entitlements,
            grants,
            identities,
            instances,
            conflicts,
            notifier,
            import_queue,
        }
    }

    /// Mutates and re-persists the instance record.
    pub async fn configure_instance<F>(&self, mutate: F)
    where
        F: FnOnce(&mut ApplicationInstance),
    {
        let mut instance = self
            .instances
            .load(self.instance_id)
            .await
            .unwrap()
            .expect("instance seeded");
        mutate(&mut instance);
        self.instances.insert(instance).await;
    }

    /// Mounts the OAuth token endpoint.
    pub async fn mock_token_endpoint(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": REFRESHED_TOKEN,
                    "token_type": "Bearer",
                    "expires_in": 3600
                })),
            )
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Mounts the member list endpoint.
    pub async fn mock_members_endpoint(&self, members: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/public/members"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": members })))
            .mount(&self.server)
            .await;
    }

    /// Mounts the group list endpoint.
    pub async fn mock_groups_endpoint(&self, groups: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path("/public/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": groups })))
            .mount(&self.server)
            .await;
    }

    /// Mounts the per-member group-ids endpoint.
    pub async fn mock_member_group_ids(&self, member_id: &str, group_ids: Vec<&str>) {
        Mock::given(method("GET"))
            .and(path(format!("/public/members/{member_id}/group-ids")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(group_ids)))
            .mount(&self.server)
            .await;
    }

    /// Mounts the single-member endpoint.
    pub async fn mock_member_endpoint(&self, member: Value) {
        let id = member["id"].as_str().expect("member id").to_string();
        Mock::given(method("GET"))
            .and(path(format!("/public/members/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(member))
            .mount(&self.server)
            .await;
    }

    /// Inserts an identity into the platform store.
    pub async fn seed_identity(&self, email: &str, display_name: &str) -> Identity {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: display_name.to_string(),
        };
        self.identities.insert(identity.clone()).await;
        identity
    }

    /// Creates a head group entitlement as a catalog import would.
    pub async fn seed_group_entitlement(&self, name: &str, group_id: &str) -> Entitlement {
        self.entitlements
            .create(CreateEntitlementInput {
                application_id: self.instance_id,
                name: name.to_string(),
                resource_type: RESOURCE_GROUP.to_string(),
                extra_params: json!({ "id": group_id }),
            })
            .await
            .unwrap()
    }

    /// Creates a head role entitlement as a catalog import would.
    pub async fn seed_role_entitlement(&self, role: MemberRole) -> Entitlement {
        self.entitlements
            .create(CreateEntitlementInput {
                application_id: self.instance_id,
                name: role.label().to_string(),
                resource_type: RESOURCE_TYPE.to_string(),
                extra_params: json!({ "type": role.code() }),
            })
            .await
            .unwrap()
    }

    /// Creates a head entitlement with a resource type this connector does
    /// not understand.
    pub async fn seed_foreign_entitlement(&self, name: &str) -> Entitlement {
        self.entitlements
            .create(CreateEntitlementInput {
                application_id: self.instance_id,
                name: name.to_string(),
                resource_type: "collection".to_string(),
                extra_params: json!({ "id": "c-1" }),
            })
            .await
            .unwrap()
    }

    /// Number of requests the mock provider has received.
    pub async fn received_request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

/// Test data factory for raw member payloads.
pub fn member_json(id: &str, email: &str, status: i64, role_code: i64, access_all: bool) -> Value {
    json!({
        "id": id,
        "email": email,
        "name": format!("Member {id}"),
        "status": status,
        "type": role_code,
        "accessAll": access_all,
        "externalId": null
    })
}

/// Test data factory for group records.
pub fn group_json(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name })
}
