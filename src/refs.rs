use std::fmt;

use crate::error::{Error, Result};

/// Raw length of a SHA-1 object name
pub const SHA1_LEN: usize = 20;
/// Raw length of a SHA-256 object name
pub const SHA256_LEN: usize = 32;

/// A git object name, either SHA-1 or SHA-256
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(Vec<u8>);

impl ObjectId {
    /// Parse a 40 or 64 character hex object name
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != SHA1_LEN * 2 && hex_str.len() != SHA256_LEN * 2 {
            return Err(Error::Protocol(format!(
                "Invalid object id length {}: {}",
                hex_str.len(),
                hex_str
            )));
        }
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::Protocol(format!("Invalid object id {}: {}", hex_str, e)))?;
        Ok(ObjectId(bytes))
    }

    #[cfg(test)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// True for the all-zero id git uses as a placeholder
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Lowercase hex form
    pub fn name(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.name())
    }
}

/// A ref advertised by a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub name: String,
    pub object_id: ObjectId,
    /// Target of an annotated tag, when the remote peeled it for us
    pub peeled: Option<ObjectId>,
}

impl Ref {
    pub fn new(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            object_id,
            peeled: None,
        }
    }

    #[cfg(test)]
    pub fn with_peeled(mut self, peeled: ObjectId) -> Self {
        self.peeled = Some(peeled);
        self
    }
}
