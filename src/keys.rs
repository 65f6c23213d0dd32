//! Routing-key parsing.
//!
//! A saved-chunk key encodes org id, metric identity, and optionally the
//! archive (rollup) it belongs to: `"<org>.<32 hex chars>[_<method>_<span>]"`,
//! e.g. `"1.0a1b2c3d4e5f60718293a4b5c6d7e8f9_sum_3600"`. Partition ownership
//! is keyed on the metric identity alone, so the producer parses the key to
//! recover it before the routing lookup. Parse failures are data-level:
//! the offending event is dropped, never the batch.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::KeyError;

/// Identity of one metric: owning org plus the 16-byte digest of its
/// name/tags/interval. This is the routing key for partition ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricKey {
    pub org: u32,
    pub id: [u8; 16],
}

impl MetricKey {
    pub fn parse(s: &str) -> std::result::Result<Self, KeyError> {
        let (org_str, id_str) = s
            .split_once('.')
            .ok_or_else(|| KeyError::MissingSeparator(s.to_string()))?;

        let org: u32 = org_str
            .parse()
            .map_err(|_| KeyError::InvalidOrg(s.to_string()))?;

        if id_str.len() != 32 {
            return Err(KeyError::InvalidIdLength(id_str.len()));
        }

        let mut id = [0u8; 16];
        for (i, byte) in id.iter_mut().enumerate() {
            let hi = hex_val(id_str.as_bytes()[i * 2])
                .ok_or_else(|| KeyError::InvalidIdEncoding(s.to_string()))?;
            let lo = hex_val(id_str.as_bytes()[i * 2 + 1])
                .ok_or_else(|| KeyError::InvalidIdEncoding(s.to_string()))?;
            *byte = (hi << 4) | lo;
        }

        Ok(Self { org, id })
    }
}

impl fmt::Display for MetricKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}.", self.org)?;
        for byte in &self.id {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// A rollup archive of a metric: consolidation method plus span in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Archive {
    pub method: String,
    pub span: u32,
}

/// A metric identity plus the archive the chunk belongs to. `archive` is
/// `None` for the raw series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveKey {
    pub mkey: MetricKey,
    pub archive: Option<Archive>,
}

impl ArchiveKey {
    pub fn parse(s: &str) -> std::result::Result<Self, KeyError> {
        let (base, suffix) = match s.split_once('_') {
            Some((base, suffix)) => (base, Some(suffix)),
            None => (s, None),
        };

        let mkey = MetricKey::parse(base)?;

        let archive = match suffix {
            None => None,
            Some(suffix) => {
                let (method, span_str) = suffix
                    .split_once('_')
                    .ok_or_else(|| KeyError::InvalidArchive(s.to_string()))?;
                if method.is_empty() {
                    return Err(KeyError::InvalidArchive(s.to_string()));
                }
                let span: u32 = span_str
                    .parse()
                    .map_err(|_| KeyError::InvalidArchive(s.to_string()))?;
                Some(Archive {
                    method: method.to_string(),
                    span,
                })
            }
        };

        Ok(Self { mkey, archive })
    }
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
