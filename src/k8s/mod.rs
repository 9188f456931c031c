//! Kubernetes core types embedded by the logging CRDs.
//!
//! Field names are the configuration attribute names (snake_case); the
//! serialized names follow the Kubernetes API (camelCase).

pub mod container;
pub mod meta;
pub mod scheduling;
pub mod volume;

pub use container::{
    Capabilities, EnvVar, EnvVarSource, ObjectFieldSelector, PodSecurityContext, SecurityContext,
    VolumeMount,
};
pub use meta::{KeySelector, LabelSelector, LabelSelectorRequirement, LocalObjectReference, ObjectMeta};
pub use scheduling::{
    Affinity, NodeAffinity, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm, PodAffinity,
    PodAffinityTerm, PreferredSchedulingTerm, ResourceRequirements, Toleration,
    WeightedPodAffinityTerm,
};
pub use volume::{
    EmptyDirVolumeSource, HostPathVolumeSource, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, VolumeResourceRequirements,
};
