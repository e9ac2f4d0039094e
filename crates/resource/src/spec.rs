//! Resource kind configuration
//!
//! `ResourceSpec` names the kind a watch adapter is bound to together with
//! the API coordinates needed to list, watch and read it. It is passed to
//! constructors explicitly; there is no global kind table.

use crate::key::ResourceKind;
use crate::producer_service::ProducerService;
use kube::core::{ApiResource, GroupVersionKind};
use kube::Resource;
use serde::{Deserialize, Serialize};

/// Kind plus API shape of a watched resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Kind stamped on every key produced for this resource type
    pub kind: ResourceKind,

    /// API group (empty for the core group)
    pub group: String,

    /// API version (e.g. "v1alpha1")
    pub version: String,

    /// Plural resource name used in API paths
    pub plural: String,

    /// Whether objects live in namespaces
    pub namespaced: bool,
}

impl ResourceSpec {
    /// Spec for an arbitrary group/version/kind
    pub fn new(group: &str, version: &str, kind: &str, plural: &str, namespaced: bool) -> Self {
        Self {
            kind: ResourceKind::new(kind),
            group: group.to_string(),
            version: version.to_string(),
            plural: plural.to_string(),
            namespaced,
        }
    }

    /// Spec for a statically typed resource
    pub fn for_resource<K>(namespaced: bool) -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        Self::new(
            &K::group(&()),
            &K::version(&()),
            &K::kind(&()),
            &K::plural(&()),
            namespaced,
        )
    }

    /// Spec for the `ProducerService` custom resource
    pub fn producer_service() -> Self {
        Self::for_resource::<ProducerService>(true)
    }

    /// Group/version/kind triple
    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(&self.group, &self.version, self.kind.as_str())
    }

    /// API resource descriptor for dynamic clients
    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(&self.gvk(), &self.plural)
    }
}
