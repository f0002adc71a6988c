#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod auth;
mod endpoint;
mod workload;

pub use self::{
    auth::TokenReviewValidator,
    endpoint::{resolve, ResolveError, JOLOKIA_PORT_NAME, PATH_ANNOTATION, PROTOCOL_ANNOTATION},
    workload::{LookupError, PodStore, WorkloadStore},
};
pub use k8s_openapi::api::{
    authentication::v1::{TokenReview, TokenReviewSpec, TokenReviewStatus, UserInfo},
    core::v1::{Container, ContainerPort, Pod, PodSpec, PodStatus},
};
pub use kube::{api::ObjectMeta, Client};
