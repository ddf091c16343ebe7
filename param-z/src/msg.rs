//! CDR serialization for bus messages.

use std::marker::PhantomData;

use cdr::{CdrLe, Infinite};
use serde::{Serialize, de::DeserializeOwned};

use crate::Result;

/// Marker for types that can travel over the bus.
///
/// Blanket-implemented for every serde-compatible type; all wire structs in
/// [`crate::parameter::wire`] qualify.
pub trait ZMessage: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> ZMessage for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// CDR (little-endian) encoder/decoder.
pub struct CdrSerdes<T>(PhantomData<T>);

impl<T: Serialize> CdrSerdes<T> {
    pub fn serialize(msg: &T) -> Result<Vec<u8>> {
        cdr::serialize::<_, _, CdrLe>(msg, Infinite).map_err(|e| zenoh::Error::from(e.to_string()))
    }
}

impl<T: DeserializeOwned> CdrSerdes<T> {
    pub fn deserialize(bytes: &[u8]) -> Result<T> {
        cdr::deserialize::<T>(bytes).map_err(|e| zenoh::Error::from(e.to_string()))
    }
}
