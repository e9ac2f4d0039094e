//! Conversion from raw store objects to domain types

use crate::error::StoreError;
use kube::ResourceExt;
use kube::core::DynamicObject;
use serde::de::DeserializeOwned;

/// Namespace-qualified name of an object (`"<namespace>/<name>"`).
///
/// Cluster-scoped objects get an empty namespace segment.
pub fn full_name(obj: &DynamicObject) -> String {
    format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Store version of an object, empty when the store did not report one.
pub fn version(obj: &DynamicObject) -> String {
    obj.resource_version().unwrap_or_default()
}

/// Convert the object's `spec` into the domain type `T`.
pub fn to_domain<T: DeserializeOwned>(obj: &DynamicObject) -> Result<T, StoreError> {
    let spec = obj.data.get("spec").ok_or_else(|| {
        StoreError::Conversion(format!("{} has no spec", full_name(obj)))
    })?;

    serde_json::from_value(spec.clone()).map_err(|e| {
        StoreError::Conversion(format!("{}: {}", full_name(obj), e))
    })
}
