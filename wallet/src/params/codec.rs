//! Fixed binary codec for parameter values and token frames.
//!
//! All values go through one `bincode` option set: little-endian, varint
//! integers, a hard size limit, and no trailing bytes. Changing any of these
//! changes the wire format.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::MAX_ENCODED_LENGTH;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_ENCODED_LENGTH)
        .with_little_endian()
        .with_varint_encoding()
        .reject_trailing_bytes()
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, bincode::Error> {
    options().serialize(value)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, bincode::Error> {
    options().deserialize(bytes)
}
