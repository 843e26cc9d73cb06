//! Scheme identities, initialization data and platform capability

use uuid::Uuid;

/// Widevine system id
pub const WIDEVINE_UUID: Uuid = Uuid::from_u128(0xedef8ba9_79d6_4ace_a3c8_27dcd51d21ed);

/// PlayReady system id
pub const PLAYREADY_UUID: Uuid = Uuid::from_u128(0x9a04f079_9840_4286_ab92_e65be0885f95);

/// ClearKey system id
pub const CLEARKEY_UUID: Uuid = Uuid::from_u128(0xe2719d58_a985_b3c9_781a_b030af78d30e);

/// Common Encryption scheme type: AES-CTR, no pattern
pub const CENC_TYPE_CENC: &str = "cenc";
/// AES-CBC, no pattern
pub const CENC_TYPE_CBC1: &str = "cbc1";
/// AES-CBC with pattern encryption
pub const CENC_TYPE_CBCS: &str = "cbcs";
/// AES-CTR with pattern encryption
pub const CENC_TYPE_CENS: &str = "cens";

/// Scheme-specific initialization data for one DRM system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeData {
    /// DRM system this data belongs to
    pub uuid: Uuid,

    /// Common Encryption scheme type, if signalled by the container
    pub scheme_type: Option<String>,

    /// Raw initialization data (usually a full `pssh` box)
    pub data: Vec<u8>,
}

impl SchemeData {
    pub fn new(uuid: Uuid, scheme_type: Option<&str>, data: Vec<u8>) -> Self {
        Self {
            uuid,
            scheme_type: scheme_type.map(str::to_string),
            data,
        }
    }
}

/// Initialization data for a piece of content, one entry per DRM system
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrmInitData {
    schemes: Vec<SchemeData>,
}

impl DrmInitData {
    pub fn new(schemes: Vec<SchemeData>) -> Self {
        Self { schemes }
    }

    /// Scheme data for the given DRM system, first match wins
    pub fn get(&self, uuid: Uuid) -> Option<&SchemeData> {
        self.schemes.iter().find(|s| s.uuid == uuid)
    }
}

/// How a scheme type relates to platform support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    /// Unset or `cenc`
    Patternless,
    /// `cbc1`, `cbcs` or `cens`
    Pattern,
    /// Anything else
    Unknown,
}

impl SchemeKind {
    pub fn classify(scheme_type: Option<&str>) -> Self {
        match scheme_type {
            None | Some(CENC_TYPE_CENC) => Self::Patternless,
            Some(CENC_TYPE_CBC1) | Some(CENC_TYPE_CBCS) | Some(CENC_TYPE_CENS) => Self::Pattern,
            Some(_) => Self::Unknown,
        }
    }
}

/// Capability level of the running platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapability {
    pub api_level: u32,
}

impl PlatformCapability {
    /// Below this level the CDM needs data extracted from the `pssh` box
    pub const LEGACY_EXTRACTION_BELOW: u32 = 21;

    /// AES-CBC and pattern encryption are supported from this level on
    pub const PATTERN_ENCRYPTION_MIN: u32 = 24;

    pub fn new(api_level: u32) -> Self {
        Self { api_level }
    }

    pub fn needs_legacy_extraction(&self) -> bool {
        self.api_level < Self::LEGACY_EXTRACTION_BELOW
    }

    pub fn supports_pattern_encryption(&self) -> bool {
        self.api_level >= Self::PATTERN_ENCRYPTION_MIN
    }

    /// Whether a scheme type can be decrypted on this platform.
    /// Unknown types are assumed to be supported.
    pub fn supports(&self, kind: SchemeKind) -> bool {
        match kind {
            SchemeKind::Patternless | SchemeKind::Unknown => true,
            SchemeKind::Pattern => self.supports_pattern_encryption(),
        }
    }
}

impl Default for PlatformCapability {
    fn default() -> Self {
        Self::new(28)
    }
}
