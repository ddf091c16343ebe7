//! # param-z — decentralized parameters over Zenoh
//!
//! Every participating node owns a private key-value store of typed
//! parameters and serves three operations (Set, Get, List) to any other
//! node, plus a broadcast stream of change events. Point-to-point request
//! routing is emulated on shared pub/sub topics: servers subscribe with a
//! `node_id` filter, clients correlate responses by `(node_id, request_id)`.
//!
//! ```rust,ignore
//! use param_z::{Builder, Parameter, context::ZContextBuilder};
//!
//! let ctx = ZContextBuilder::default().build()?;
//! let server = ctx.create_param_server("robot1").build()?;
//! let client = ctx.create_param_client().build()?;
//! client.set_parameters("robot1", &[Parameter::new("max_velocity", 2.0)], timeout)?;
//! ```

pub mod context;
pub mod error;
pub mod msg;
pub mod parameter;
pub mod pubsub;
pub mod topic;

pub use error::ParamError;
pub use parameter::{
    Parameter, ParameterClient, ParameterEvent, ParameterKind, ParameterServer, ParameterStore,
    ParameterValue, SetResult,
};
pub use zenoh::Result;

/// Builds a configured object, consuming the builder.
///
/// All param-z builders implement this trait; bring it into scope to call
/// `.build()`.
pub trait Builder {
    type Output;
    fn build(self) -> Result<Self::Output>;
}
