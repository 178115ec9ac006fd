//! Length-prefixed frame encoding, used by the producer client

use bytes::{BufMut, Bytes, BytesMut};

use super::constants::LENGTH_PREFIX_SIZE;
use crate::error::ClientError;

/// Encode one payload as `[u32 BE length][payload]`
pub fn encode_frame(payload: &[u8]) -> Result<Bytes, ClientError> {
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    encode_frame_into(payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Append one encoded frame to an existing buffer
pub fn encode_frame_into(payload: &[u8], buf: &mut BytesMut) -> Result<(), ClientError> {
    let length =
        u32::try_from(payload.len()).map_err(|_| ClientError::FrameTooLarge(payload.len()))?;

    buf.reserve(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_u32(length);
    buf.put_slice(payload);
    Ok(())
}
