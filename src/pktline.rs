//! pkt-line framing used by the git smart protocol
//!
//! Each packet starts with a four digit hex length that counts the header
//! itself. `0000` is a flush packet; `0001` and `0002` are the protocol v2
//! delimiter and response-end packets.

use std::io::{self, Read, Write};

use crate::error::{Error, Result};

/// Largest packet git will send, header included
pub const MAX_PACKET_LEN: usize = 65520;

const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketLine {
    Data(Vec<u8>),
    Flush,
    Delimiter,
    ResponseEnd,
}

/// Reads packets one at a time from an underlying stream
pub struct PacketReader<R> {
    inner: R,
}

impl<R: Read> PacketReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next packet; `None` on a clean end of stream
    pub fn read_packet(&mut self) -> Result<Option<PacketLine>> {
        let mut header = [0u8; HEADER_LEN];
        match read_exact_or_eof(&mut self.inner, &mut header)? {
            0 => return Ok(None),
            HEADER_LEN => {}
            n => {
                return Err(Error::Protocol(format!(
                    "Truncated pkt-line header ({} of {} bytes)",
                    n, HEADER_LEN
                )))
            }
        }

        let header = std::str::from_utf8(&header)
            .map_err(|_| Error::Protocol(format!("Invalid pkt-line header: {:?}", header)))?;
        let len = usize::from_str_radix(header, 16)
            .map_err(|_| Error::Protocol(format!("Invalid pkt-line length: {:?}", header)))?;

        match len {
            0 => Ok(Some(PacketLine::Flush)),
            1 => Ok(Some(PacketLine::Delimiter)),
            2 => Ok(Some(PacketLine::ResponseEnd)),
            3 => Err(Error::Protocol("Invalid pkt-line length: 3".to_string())),
            len if len > MAX_PACKET_LEN => Err(Error::Protocol(format!(
                "pkt-line length {} exceeds maximum {}",
                len, MAX_PACKET_LEN
            ))),
            len => {
                let mut data = vec![0u8; len - HEADER_LEN];
                self.inner.read_exact(&mut data).map_err(|e| {
                    if e.kind() == io::ErrorKind::UnexpectedEof {
                        Error::Protocol("Remote hung up in the middle of a pkt-line".to_string())
                    } else {
                        Error::Io(e)
                    }
                })?;
                if data.last() == Some(&b'\n') {
                    data.pop();
                }
                Ok(Some(PacketLine::Data(data)))
            }
        }
    }

    /// Collect data packets up to the next flush
    pub fn read_until_flush(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut lines = Vec::new();
        loop {
            match self.read_packet()? {
                Some(PacketLine::Data(data)) => lines.push(data),
                Some(PacketLine::Flush) => return Ok(lines),
                Some(other) => {
                    return Err(Error::Protocol(format!(
                        "Unexpected {:?} packet in ref advertisement",
                        other
                    )))
                }
                None => {
                    return Err(Error::Protocol(
                        "Remote hung up before the end of the ref advertisement".to_string(),
                    ))
                }
            }
        }
    }
}

/// Fill `buf`, returning fewer bytes only when the stream ends
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(filled)
}

/// Frame `data` as a single packet
pub fn write_packet<W: Write>(output: &mut W, data: &[u8]) -> Result<()> {
    let len = data.len() + HEADER_LEN;
    if len > MAX_PACKET_LEN {
        return Err(Error::Protocol(format!(
            "pkt-line payload of {} bytes is too large",
            data.len()
        )));
    }
    write!(output, "{:04x}", len)?;
    output.write_all(data)?;
    Ok(())
}

pub fn write_flush<W: Write>(output: &mut W) -> Result<()> {
    output.write_all(b"0000")?;
    output.flush()?;
    Ok(())
}
