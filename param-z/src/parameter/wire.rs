//! Wire format for the parameter-service channels.
//!
//! All bus traffic uses these flat serde structs, CDR-encoded. Values carry
//! a `u8` kind tag plus one field per variant rather than a Rust enum, so
//! the encoding stays a plain struct on every peer regardless of language.

use serde::{Deserialize, Serialize};

/// Kind tags for [`WireParameterValue::kind`].
pub mod parameter_kind {
    pub const NOT_SET: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const INTEGER: u8 = 2;
    pub const DOUBLE: u8 = 3;
    pub const STRING: u8 = 4;
    pub const BYTE_ARRAY: u8 = 5;
    pub const BOOL_ARRAY: u8 = 6;
    pub const INTEGER_ARRAY: u8 = 7;
    pub const DOUBLE_ARRAY: u8 = 8;
    pub const STRING_ARRAY: u8 = 9;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireParameterValue {
    pub kind: u8,
    pub bool_value: bool,
    pub integer_value: i64,
    pub double_value: f64,
    pub string_value: String,
    pub byte_array_value: Vec<u8>,
    pub bool_array_value: Vec<bool>,
    pub integer_array_value: Vec<i64>,
    pub double_array_value: Vec<f64>,
    pub string_array_value: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireParameter {
    pub name: String,
    pub value: WireParameterValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetParametersRequest {
    /// Target node identity; evaluated by every server's routing filter.
    pub node_id: String,
    pub request_id: u64,
    pub parameters: Vec<WireParameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireSetResult {
    pub successful: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetParametersResponse {
    /// Responder's own identity, echoed from the request.
    pub node_id: String,
    pub request_id: u64,
    pub results: Vec<WireSetResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetParametersRequest {
    pub node_id: String,
    pub request_id: u64,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetParametersResponse {
    pub node_id: String,
    pub request_id: u64,
    /// Requested parameters present in the store, in request order.
    /// Absent names are omitted.
    pub parameters: Vec<WireParameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParametersRequest {
    pub node_id: String,
    pub request_id: u64,
    pub prefixes: Vec<String>,
    pub depth: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParametersResponse {
    pub node_id: String,
    pub request_id: u64,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireParameterEvent {
    pub node_id: String,
    pub timestamp_ns: u64,
    pub new_parameters: Vec<WireParameter>,
    pub changed_parameters: Vec<WireParameter>,
    pub deleted_parameters: Vec<WireParameter>,
}

/// Responses a client can correlate to an outstanding request.
///
/// Correlation always checks both fields together; `request_id` alone is
/// only unique within one client instance.
pub trait Correlated {
    fn node_id(&self) -> &str;
    fn request_id(&self) -> u64;
}

macro_rules! impl_correlated {
    ($($ty:ty),+) => {
        $(impl Correlated for $ty {
            fn node_id(&self) -> &str {
                &self.node_id
            }
            fn request_id(&self) -> u64 {
                self.request_id
            }
        })+
    };
}

impl_correlated!(SetParametersResponse, GetParametersResponse, ListParametersResponse);
