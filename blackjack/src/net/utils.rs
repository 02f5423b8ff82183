use std::{
    io::{Read, Write},
    time::Duration,
};

use super::{
    errors::Result,
    messages::{HEADER_LEN, NAME_LEN, WireMessage},
};

/// How long either side waits on an idle peer. Generous enough for a human
/// to think.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Read exactly one fixed-size message and decode it.
///
/// # Errors
///
/// EOF maps to a disconnect, a socket read timeout maps to a timeout, and
/// a buffer that doesn't decode maps to a protocol violation.
pub fn read_message<M: WireMessage, R: Read>(reader: &mut R) -> Result<M> {
    let mut buf = vec![0; M::SIZE];
    reader.read_exact(&mut buf)?;
    Ok(M::decode(&buf)?)
}

/// Like [`read_message`], but rejects a bad magic cookie or message type
/// as soon as the header arrives instead of waiting for the whole message.
///
/// # Errors
///
/// Same as [`read_message`].
pub fn read_message_checked<M: WireMessage, R: Read>(reader: &mut R) -> Result<M> {
    let mut buf = vec![0; M::SIZE];
    reader.read_exact(&mut buf[..HEADER_LEN])?;
    M::check_header(&buf[..HEADER_LEN])?;
    reader.read_exact(&mut buf[HEADER_LEN..])?;
    Ok(M::decode(&buf)?)
}

pub fn write_message<M: WireMessage, W: Write>(writer: &mut W, msg: &M) -> Result<()> {
    // One write per message so a message never straddles a partial write
    // error.
    writer.write_all(&msg.encode())?;
    writer.flush()?;
    Ok(())
}

/// Cut a name down to the wire's 32 bytes without splitting a character.
#[must_use]
pub fn truncate_name(name: &str) -> &str {
    if name.len() <= NAME_LEN {
        return name;
    }
    let mut end = NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[must_use]
pub fn encode_name(name: &str) -> [u8; NAME_LEN] {
    let mut buf = [0; NAME_LEN];
    let name = truncate_name(name).as_bytes();
    buf[..name.len()].copy_from_slice(name);
    buf
}

/// Strip NUL padding. Invalid UTF-8 is replaced rather than rejected.
#[must_use]
pub fn decode_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_matches('\0').to_string()
}
