#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use jolokia_gateway_client as client;
pub use jolokia_gateway_core as core;
pub use jolokia_gateway_k8s as k8s;
pub use jolokia_gateway_runtime as runtime;
