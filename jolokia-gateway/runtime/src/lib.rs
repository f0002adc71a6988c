#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod gateway;
mod server;

pub use self::{
    args::Args,
    gateway::Gateway,
    server::{GatewayHandle, ToolService},
};
