//! Versioned wire codec for persist messages.
//!
//! Layout: `[1 version byte][bincode-encoded PersistMessage]`. Future
//! versions may change the body encoding but must keep the leading byte.

use crate::PersistMessage;
use crate::Result;
use crate::SerializationError;

/// Version tag of the current envelope format.
pub const PERSIST_MESSAGE_V1: u8 = 1;

/// Serialize `msg` into `buf` (typically checked out of a
/// [`crate::utils::BufferPool`]), prefixed with the version byte.
pub fn encode_into(
    buf: &mut Vec<u8>,
    msg: &PersistMessage,
) -> Result<()> {
    buf.push(PERSIST_MESSAGE_V1);
    bincode::serialize_into(&mut *buf, msg)?;
    Ok(())
}

/// Decode a persist message, checking the version byte first.
pub fn decode(payload: &[u8]) -> Result<PersistMessage> {
    let (version, body) = payload
        .split_first()
        .ok_or(SerializationError::EmptyPayload)
        .map_err(crate::Error::Serialization)?;

    if *version != PERSIST_MESSAGE_V1 {
        return Err(SerializationError::UnknownVersion(*version).into());
    }

    Ok(bincode::deserialize(body)?)
}
