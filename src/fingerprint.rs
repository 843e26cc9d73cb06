//! Content fingerprints, key-set ids and init data normalization
//!
//! A [`Fingerprint`] is the canonical byte form of a scheme's initialization
//! data and is the cache key for stored key-set ids. On legacy platforms the
//! CDM wants the payload embedded in the `pssh` box rather than the box
//! itself, so [`normalize`] extracts it when it can and falls back to the raw
//! bytes otherwise.

use crate::scheme::WIDEVINE_UUID;
use std::fmt;
use tracing::trace;
use uuid::Uuid;

/// Canonical identifier for one encryption-scheme instance of content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

/// Opaque offline license key-set id issued by the license backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySetId(Vec<u8>);

impl KeySetId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for KeySetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

const PSSH_TYPE: &[u8; 4] = b"pssh";
const FULL_ATOM_HEADER: usize = 12;
const SYSTEM_ID_LEN: usize = 16;
const KEY_ID_LEN: usize = 16;

/// A parsed `pssh` box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsshAtom<'a> {
    pub version: u8,
    pub system_id: Uuid,
    pub key_ids: Vec<&'a [u8]>,
    pub data: &'a [u8],
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.buf.len() < n {
            return None;
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Some(head)
    }

    fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_be_bytes(bytes.try_into().ok()?))
    }

    fn remaining(&self) -> usize {
        self.buf.len()
    }
}

/// Parse a complete `pssh` box (versions 0 and 1).
///
/// Returns `None` if the box size does not match the buffer, the type is not
/// `pssh`, the version is unsupported or the data size is inconsistent.
pub fn parse_pssh(atom: &[u8]) -> Option<PsshAtom<'_>> {
    let mut reader = Reader { buf: atom };

    let size = reader.read_u32()? as usize;
    if size != atom.len() || size < FULL_ATOM_HEADER + SYSTEM_ID_LEN + 4 {
        return None;
    }
    if reader.take(4)? != PSSH_TYPE {
        return None;
    }

    let full_atom = reader.read_u32()?;
    let version = (full_atom >> 24) as u8;
    if version > 1 {
        return None;
    }

    let system_id = Uuid::from_slice(reader.take(SYSTEM_ID_LEN)?).ok()?;

    let mut key_ids = Vec::new();
    if version == 1 {
        let count = reader.read_u32()? as usize;
        for _ in 0..count {
            key_ids.push(reader.take(KEY_ID_LEN)?);
        }
    }

    let data_size = reader.read_u32()? as usize;
    if data_size != reader.remaining() {
        return None;
    }
    let data = reader.take(data_size)?;

    Some(PsshAtom {
        version,
        system_id,
        key_ids,
        data,
    })
}

/// Extract the scheme-specific payload of a `pssh` box if it belongs to `system_id`
pub fn scheme_specific_data(atom: &[u8], system_id: Uuid) -> Option<&[u8]> {
    let parsed = parse_pssh(atom)?;
    if parsed.system_id != system_id {
        trace!(
            "pssh system id {} does not match {}",
            parsed.system_id,
            system_id
        );
        return None;
    }
    Some(parsed.data)
}

/// Map raw scheme init data to the fingerprint used as cache key.
///
/// Outside legacy mode the input is returned unchanged. In legacy mode the
/// Widevine payload is extracted from the `pssh` box; if the input is not a
/// Widevine `pssh` box it is returned unchanged. Never fails.
pub fn normalize(raw_init_data: &[u8], legacy_mode: bool) -> Fingerprint {
    if legacy_mode {
        if let Some(payload) = scheme_specific_data(raw_init_data, WIDEVINE_UUID) {
            return Fingerprint::new(payload);
        }
    }
    Fingerprint::new(raw_init_data)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::scheme::PLAYREADY_UUID;

    pub(crate) fn build_pssh(
        version: u8,
        system_id: Uuid,
        key_ids: &[[u8; 16]],
        data: &[u8],
    ) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(PSSH_TYPE);
        body.extend_from_slice(&(u32::from(version) << 24).to_be_bytes());
        body.extend_from_slice(system_id.as_bytes());
        if version == 1 {
            body.extend_from_slice(&(key_ids.len() as u32).to_be_bytes());
            for kid in key_ids {
                body.extend_from_slice(kid);
            }
        }
        body.extend_from_slice(&(data.len() as u32).to_be_bytes());
        body.extend_from_slice(data);

        let mut atom = ((body.len() + 4) as u32).to_be_bytes().to_vec();
        atom.extend_from_slice(&body);
        atom
    }

    #[test]
    fn non_legacy_returns_input_unchanged() {
        let atom = build_pssh(0, WIDEVINE_UUID, &[], b"payload");
        assert_eq!(normalize(&atom, false).as_bytes(), atom.as_slice());
    }

    #[test]
    fn legacy_extracts_widevine_payload() {
        let atom = build_pssh(0, WIDEVINE_UUID, &[], b"payload");
        assert_eq!(normalize(&atom, true).as_bytes(), b"payload");
    }

    #[test]
    fn legacy_handles_v1_key_ids() {
        let atom = build_pssh(1, WIDEVINE_UUID, &[[7u8; 16], [9u8; 16]], b"v1data");
        let parsed = parse_pssh(&atom).unwrap();
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.key_ids.len(), 2);
        assert_eq!(normalize(&atom, true).as_bytes(), b"v1data");
    }

    #[test]
    fn legacy_falls_back_for_other_system() {
        let atom = build_pssh(0, PLAYREADY_UUID, &[], b"payload");
        assert_eq!(normalize(&atom, true).as_bytes(), atom.as_slice());
    }

    #[test]
    fn legacy_falls_back_for_malformed_input() {
        let garbage = b"not a box at all".to_vec();
        assert_eq!(normalize(&garbage, true).as_bytes(), garbage.as_slice());

        let mut truncated = build_pssh(0, WIDEVINE_UUID, &[], b"payload");
        truncated.pop();
        assert_eq!(normalize(&truncated, true).as_bytes(), truncated.as_slice());
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut atom = build_pssh(0, WIDEVINE_UUID, &[], b"x");
        atom[8] = 2;
        assert!(parse_pssh(&atom).is_none());
    }

    #[test]
    fn display_is_uppercase_hex() {
        assert_eq!(Fingerprint::new(vec![0xab, 0x01]).to_string(), "AB01");
        assert_eq!(KeySetId::new(vec![0x0f]).to_string(), "0F");
    }
}
