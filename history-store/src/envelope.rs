//! The `CFB1` binary framing shared by the report store and the `binary`
//! serialization format (spec §6): `magic "CFB1" + payload_len: u32 LE +
//! payload`. Envelopes are concatenated back to back; a reader decodes them
//! one at a time until EOF.

use std::io::{self, Read, Write};

pub const MAGIC: &[u8; 4] = b"CFB1";

/// Writes one envelope.
pub fn write_envelope<W: Write>(mut w: W, payload: &[u8]) -> io::Result<()> {
    w.write_all(MAGIC)?;
    w.write_all(&(payload.len() as u32).to_le_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// Reads one envelope. Returns `Ok(None)` on a clean EOF before any byte of
/// a new envelope is read; a truncated header or payload is an error rather
/// than a silent stop, since that can only mean the file was cut short.
pub fn read_envelope<R: Read>(mut r: R) -> io::Result<Option<Vec<u8>>> {
    let mut first = [0u8; 1];
    if r.read(&mut first)? == 0 {
        return Ok(None);
    }
    let mut magic = [0u8; 4];
    magic[0] = first[0];
    r.read_exact(&mut magic[1..])?;
    if &magic != MAGIC {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "bad CFB1 magic"));
    }

    let mut len_bytes = [0u8; 4];
    r.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    Ok(Some(payload))
}
