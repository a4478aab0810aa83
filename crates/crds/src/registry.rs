//! Resource kind registry
//!
//! Maps kind names to their API coordinates. The controller builds one
//! registry at startup and hands it to the reconciler, which uses it to stamp
//! owner references onto managed objects.

use crate::error::RegistryError;
use crate::scheduler::Scheduler;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use std::collections::BTreeMap;

/// API coordinates of one registered kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
}

impl ResourceKind {
    /// `group/version`, or just `version` for the core group
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    kinds: BTreeMap<String, ResourceKind>,
}

impl ResourceRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every kind the scheduler controller touches
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<Scheduler>().register::<CronJob>();
        registry
    }

    /// Registers a statically typed kind. Re-registering a kind overwrites it.
    pub fn register<K>(&mut self) -> &mut Self
    where
        K: Resource<DynamicType = ()>,
    {
        let kind = ResourceKind {
            group: K::group(&()).into_owned(),
            version: K::version(&()).into_owned(),
            kind: K::kind(&()).into_owned(),
            plural: K::plural(&()).into_owned(),
        };
        self.kinds.insert(kind.kind.clone(), kind);
        self
    }

    /// Looks up a kind by name
    pub fn get(&self, kind: &str) -> Result<&ResourceKind, RegistryError> {
        self.kinds
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownKind(kind.to_string()))
    }

    /// Looks up the registered coordinates of `K`
    pub fn lookup<K>(&self) -> Result<&ResourceKind, RegistryError>
    where
        K: Resource<DynamicType = ()>,
    {
        self.get(&K::kind(&()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Builds a controller owner reference pointing at `owner`.
    ///
    /// The owner must be registered and must carry both a name and a uid,
    /// since the store resolves ownership by uid.
    pub fn controller_reference<K>(&self, owner: &K) -> Result<OwnerReference, RegistryError>
    where
        K: Resource<DynamicType = ()>,
    {
        let kind = self.lookup::<K>()?;
        let meta = owner.meta();
        let name = meta.name.clone().ok_or_else(|| RegistryError::MissingOwnerField {
            kind: kind.kind.clone(),
            field: "name",
        })?;
        let uid = meta.uid.clone().ok_or_else(|| RegistryError::MissingOwnerField {
            kind: kind.kind.clone(),
            field: "uid",
        })?;

        Ok(OwnerReference {
            api_version: kind.api_version(),
            kind: kind.kind.clone(),
            name,
            uid,
            controller: Some(true),
            block_owner_deletion: Some(true),
        })
    }
}
