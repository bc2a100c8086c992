//! Parsing of the ref advertisement an upload-pack server sends first

use std::io::Read;

use crate::error::{Error, Result};
use crate::filter::PEELED_SUFFIX;
use crate::pktline::{PacketLine, PacketReader};
use crate::refs::{ObjectId, Ref};

/// Placeholder ref name sent by an empty repository
const CAPABILITIES_PLACEHOLDER: &str = "capabilities^{}";

/// Refs and capabilities offered by a remote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advertisement {
    pub refs: Vec<Ref>,
    pub capabilities: Vec<String>,
}

#[cfg(test)]
impl Advertisement {
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c == name || c.split_once('=').map(|(k, _)| k) == Some(name))
    }
}

/// Read a protocol v0/v1 advertisement from a pkt-line stream, up to its flush
pub fn read_advertisement<R: Read>(reader: &mut PacketReader<R>) -> Result<Advertisement> {
    let lines = reader.read_until_flush()?;
    parse_lines(lines.iter().map(|l| l.as_slice()))
}

/// Parse the body of a smart HTTP `info/refs?service=git-upload-pack` response
pub fn parse_smart_http(body: &[u8], service: &str) -> Result<Advertisement> {
    let mut reader = PacketReader::new(body);

    let expected = format!("# service={}", service);
    match reader.read_packet()? {
        Some(PacketLine::Data(line)) if line == expected.as_bytes() => {}
        other => {
            return Err(Error::Protocol(format!(
                "Expected '{}' at start of smart HTTP response, got {:?}",
                expected, other
            )))
        }
    }

    // Servers are allowed to omit the flush after the service line
    let mut lines = Vec::new();
    match reader.read_packet()? {
        Some(PacketLine::Flush) => {}
        Some(PacketLine::Data(line)) => lines.push(line),
        other => {
            return Err(Error::Protocol(format!(
                "Unexpected {:?} after smart HTTP service line",
                other
            )))
        }
    }
    lines.extend(reader.read_until_flush()?);

    parse_lines(lines.iter().map(|l| l.as_slice()))
}

/// Parse a dumb HTTP `info/refs` file: `<hex>\t<name>` per line
pub fn parse_dumb(body: &str) -> Result<Advertisement> {
    let mut refs = Vec::new();
    for line in body.lines() {
        if line.is_empty() {
            continue;
        }
        let (hex_str, name) = line
            .split_once('\t')
            .ok_or_else(|| Error::Protocol(format!("Malformed info/refs line: {}", line)))?;
        push_ref(&mut refs, hex_str, name)?;
    }

    Ok(Advertisement {
        refs,
        capabilities: Vec::new(),
    })
}

fn parse_lines<'a, I>(lines: I) -> Result<Advertisement>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut advertisement = Advertisement::default();

    for (index, raw) in lines.into_iter().enumerate() {
        let line = std::str::from_utf8(raw)
            .map_err(|_| Error::Protocol("Ref advertisement is not valid UTF-8".to_string()))?;

        if index == 0 {
            if line == "version 1" {
                continue;
            }
            if line.starts_with("version ") {
                return Err(Error::Protocol(format!(
                    "Unsupported protocol response: {}",
                    line
                )));
            }
        }
        if line.starts_with("shallow ") {
            continue;
        }

        let line = match line.split_once('\0') {
            Some((head, caps)) => {
                if advertisement.capabilities.is_empty() {
                    advertisement.capabilities =
                        caps.split_whitespace().map(str::to_string).collect();
                }
                head
            }
            None => line,
        };

        let (hex_str, name) = line
            .split_once(' ')
            .ok_or_else(|| Error::Protocol(format!("Malformed ref advertisement: {}", line)))?;

        if name == CAPABILITIES_PLACEHOLDER {
            if !ObjectId::from_hex(hex_str)?.is_null() {
                tracing::warn!("Non-null id {} on capabilities placeholder", hex_str);
            }
            continue;
        }

        push_ref(&mut advertisement.refs, hex_str, name)?;
    }

    tracing::debug!(
        "Remote advertised {} refs, capabilities: {:?}",
        advertisement.refs.len(),
        advertisement.capabilities
    );

    Ok(advertisement)
}

/// Append a ref, or attach a `^{}` line to the ref it peels
fn push_ref(refs: &mut Vec<Ref>, hex_str: &str, name: &str) -> Result<()> {
    let object_id = ObjectId::from_hex(hex_str)?;

    if let Some(base) = name.strip_suffix(PEELED_SUFFIX) {
        return match refs.last_mut() {
            Some(last) if last.name == base && last.peeled.is_none() => {
                last.peeled = Some(object_id);
                Ok(())
            }
            _ => Err(Error::Protocol(format!(
                "Peeled ref {} does not follow its tag",
                name
            ))),
        };
    }

    if name.is_empty() {
        return Err(Error::Protocol(format!(
            "Empty ref name for object {}",
            hex_str
        )));
    }

    refs.push(Ref::new(name, object_id));
    Ok(())
}
