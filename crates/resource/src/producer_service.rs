//! ProducerService CRD
//!
//! Describes a service offered by a producer to consumers in the mesh.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of a `ProducerService`
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "galley.microscaler.io",
    version = "v1alpha1",
    kind = "ProducerService",
    plural = "producerservices",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ProducerServiceSpec {
    /// Name the service is published under
    pub service_name: String,

    /// Plans consumers can bind against
    #[serde(default)]
    pub plans: Vec<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
