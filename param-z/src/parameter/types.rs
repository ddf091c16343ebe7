//! User-facing parameter types.
//!
//! These provide an ergonomic Rust API for building, reading, and comparing
//! parameters. They convert to/from the flat wire structs in
//! [`super::wire`] for CDR serialization.

use std::fmt;

use crate::error::ParamError;

use super::wire::{self, WireParameter, WireParameterEvent, WireParameterValue, parameter_kind};

/// The kind of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    NotSet,
    Bool,
    Integer,
    Double,
    String,
    ByteArray,
    BoolArray,
    IntegerArray,
    DoubleArray,
    StringArray,
}

impl ParameterKind {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::NotSet => parameter_kind::NOT_SET,
            Self::Bool => parameter_kind::BOOL,
            Self::Integer => parameter_kind::INTEGER,
            Self::Double => parameter_kind::DOUBLE,
            Self::String => parameter_kind::STRING,
            Self::ByteArray => parameter_kind::BYTE_ARRAY,
            Self::BoolArray => parameter_kind::BOOL_ARRAY,
            Self::IntegerArray => parameter_kind::INTEGER_ARRAY,
            Self::DoubleArray => parameter_kind::DOUBLE_ARRAY,
            Self::StringArray => parameter_kind::STRING_ARRAY,
        }
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            parameter_kind::BOOL => Self::Bool,
            parameter_kind::INTEGER => Self::Integer,
            parameter_kind::DOUBLE => Self::Double,
            parameter_kind::STRING => Self::String,
            parameter_kind::BYTE_ARRAY => Self::ByteArray,
            parameter_kind::BOOL_ARRAY => Self::BoolArray,
            parameter_kind::INTEGER_ARRAY => Self::IntegerArray,
            parameter_kind::DOUBLE_ARRAY => Self::DoubleArray,
            parameter_kind::STRING_ARRAY => Self::StringArray,
            _ => Self::NotSet,
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotSet => "not_set",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
            Self::ByteArray => "byte_array",
            Self::BoolArray => "bool_array",
            Self::IntegerArray => "integer_array",
            Self::DoubleArray => "double_array",
            Self::StringArray => "string_array",
        };
        write!(f, "{}", s)
    }
}

/// A typed parameter value. Exactly one variant is active; reading the
/// wrong variant through an accessor is an error, never a default.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParameterValue {
    #[default]
    NotSet,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    ByteArray(Vec<u8>),
    BoolArray(Vec<bool>),
    IntegerArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::NotSet => ParameterKind::NotSet,
            Self::Bool(_) => ParameterKind::Bool,
            Self::Integer(_) => ParameterKind::Integer,
            Self::Double(_) => ParameterKind::Double,
            Self::String(_) => ParameterKind::String,
            Self::ByteArray(_) => ParameterKind::ByteArray,
            Self::BoolArray(_) => ParameterKind::BoolArray,
            Self::IntegerArray(_) => ParameterKind::IntegerArray,
            Self::DoubleArray(_) => ParameterKind::DoubleArray,
            Self::StringArray(_) => ParameterKind::StringArray,
        }
    }

    fn wrong_type(&self, expected: ParameterKind) -> ParamError {
        ParamError::WrongType {
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ParamError> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(other.wrong_type(ParameterKind::Bool)),
        }
    }

    pub fn as_integer(&self) -> Result<i64, ParamError> {
        match self {
            Self::Integer(v) => Ok(*v),
            other => Err(other.wrong_type(ParameterKind::Integer)),
        }
    }

    pub fn as_double(&self) -> Result<f64, ParamError> {
        match self {
            Self::Double(v) => Ok(*v),
            other => Err(other.wrong_type(ParameterKind::Double)),
        }
    }

    pub fn as_str(&self) -> Result<&str, ParamError> {
        match self {
            Self::String(v) => Ok(v),
            other => Err(other.wrong_type(ParameterKind::String)),
        }
    }

    pub fn as_byte_array(&self) -> Result<&[u8], ParamError> {
        match self {
            Self::ByteArray(v) => Ok(v),
            other => Err(other.wrong_type(ParameterKind::ByteArray)),
        }
    }

    pub fn as_bool_array(&self) -> Result<&[bool], ParamError> {
        match self {
            Self::BoolArray(v) => Ok(v),
            other => Err(other.wrong_type(ParameterKind::BoolArray)),
        }
    }

    pub fn as_integer_array(&self) -> Result<&[i64], ParamError> {
        match self {
            Self::IntegerArray(v) => Ok(v),
            other => Err(other.wrong_type(ParameterKind::IntegerArray)),
        }
    }

    pub fn as_double_array(&self) -> Result<&[f64], ParamError> {
        match self {
            Self::DoubleArray(v) => Ok(v),
            other => Err(other.wrong_type(ParameterKind::DoubleArray)),
        }
    }

    pub fn as_string_array(&self) -> Result<&[String], ParamError> {
        match self {
            Self::StringArray(v) => Ok(v),
            other => Err(other.wrong_type(ParameterKind::StringArray)),
        }
    }

    pub(crate) fn to_wire(&self) -> WireParameterValue {
        let mut wire = WireParameterValue {
            kind: self.kind().to_u8(),
            ..Default::default()
        };
        match self {
            Self::NotSet => {}
            Self::Bool(v) => wire.bool_value = *v,
            Self::Integer(v) => wire.integer_value = *v,
            Self::Double(v) => wire.double_value = *v,
            Self::String(v) => wire.string_value = v.clone(),
            Self::ByteArray(v) => wire.byte_array_value = v.clone(),
            Self::BoolArray(v) => wire.bool_array_value = v.clone(),
            Self::IntegerArray(v) => wire.integer_array_value = v.clone(),
            Self::DoubleArray(v) => wire.double_array_value = v.clone(),
            Self::StringArray(v) => wire.string_array_value = v.clone(),
        }
        wire
    }

    pub(crate) fn from_wire(wire: &WireParameterValue) -> Self {
        match wire.kind {
            parameter_kind::BOOL => Self::Bool(wire.bool_value),
            parameter_kind::INTEGER => Self::Integer(wire.integer_value),
            parameter_kind::DOUBLE => Self::Double(wire.double_value),
            parameter_kind::STRING => Self::String(wire.string_value.clone()),
            parameter_kind::BYTE_ARRAY => Self::ByteArray(wire.byte_array_value.clone()),
            parameter_kind::BOOL_ARRAY => Self::BoolArray(wire.bool_array_value.clone()),
            parameter_kind::INTEGER_ARRAY => Self::IntegerArray(wire.integer_array_value.clone()),
            parameter_kind::DOUBLE_ARRAY => Self::DoubleArray(wire.double_array_value.clone()),
            parameter_kind::STRING_ARRAY => Self::StringArray(wire.string_array_value.clone()),
            _ => Self::NotSet,
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for ParameterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for ParameterValue {
    fn from(v: Vec<u8>) -> Self {
        Self::ByteArray(v)
    }
}

impl From<Vec<bool>> for ParameterValue {
    fn from(v: Vec<bool>) -> Self {
        Self::BoolArray(v)
    }
}

impl From<Vec<i64>> for ParameterValue {
    fn from(v: Vec<i64>) -> Self {
        Self::IntegerArray(v)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(v: Vec<f64>) -> Self {
        Self::DoubleArray(v)
    }
}

impl From<Vec<String>> for ParameterValue {
    fn from(v: Vec<String>) -> Self {
        Self::StringArray(v)
    }
}

/// A named, typed configuration value. Names are hierarchical with `.` as
/// the level separator (e.g. `robot.max_velocity`); uniqueness is scoped to
/// one node's store.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: ParameterValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub(crate) fn to_wire(&self) -> WireParameter {
        WireParameter {
            name: self.name.clone(),
            value: self.value.to_wire(),
        }
    }

    pub(crate) fn from_wire(wire: &WireParameter) -> Self {
        Self {
            name: wire.name.clone(),
            value: ParameterValue::from_wire(&wire.value),
        }
    }
}

/// Result of applying one parameter in a Set request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetResult {
    pub successful: bool,
    pub reason: String,
}

impl SetResult {
    pub fn success() -> Self {
        Self {
            successful: true,
            reason: String::new(),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            successful: false,
            reason: reason.into(),
        }
    }

    pub(crate) fn to_wire(&self) -> wire::WireSetResult {
        wire::WireSetResult {
            successful: self.successful,
            reason: self.reason.clone(),
        }
    }

    pub(crate) fn from_wire(wire: wire::WireSetResult) -> Self {
        Self {
            successful: wire.successful,
            reason: wire.reason,
        }
    }
}

/// One flushed batch of parameter changes, broadcast by the owning node.
/// A given name appears in at most one of the three lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterEvent {
    pub node_id: String,
    pub timestamp_ns: u64,
    pub new: Vec<Parameter>,
    pub changed: Vec<Parameter>,
    pub deleted: Vec<Parameter>,
}

impl ParameterEvent {
    pub(crate) fn to_wire(&self) -> WireParameterEvent {
        WireParameterEvent {
            node_id: self.node_id.clone(),
            timestamp_ns: self.timestamp_ns,
            new_parameters: self.new.iter().map(Parameter::to_wire).collect(),
            changed_parameters: self.changed.iter().map(Parameter::to_wire).collect(),
            deleted_parameters: self.deleted.iter().map(Parameter::to_wire).collect(),
        }
    }

    pub(crate) fn from_wire(wire: &WireParameterEvent) -> Self {
        Self {
            node_id: wire.node_id.clone(),
            timestamp_ns: wire.timestamp_ns,
            new: wire.new_parameters.iter().map(Parameter::from_wire).collect(),
            changed: wire.changed_parameters.iter().map(Parameter::from_wire).collect(),
            deleted: wire.deleted_parameters.iter().map(Parameter::from_wire).collect(),
        }
    }
}
