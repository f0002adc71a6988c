#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cache;
mod jolokia;
mod registry;
mod tls;

pub use self::{
    cache::MBeanIndexCache,
    jolokia::{ClientParams, JolokiaClient, JolokiaFactory},
    registry::{CacheKey, ClientRegistry, NewClient},
    tls::ProxyTls,
};
