//! TMD (Title MetaData) - lists a title's content blocks.
//!
//! ## Layout (all integers big-endian unless noted)
//! ```text
//! [0x000] SignatureType           (u32)
//! [0x004] Signature               (0x100 bytes, RSA-2048, opaque)
//! [0x104] SignaturePadding        (0x3C bytes)
//! [0x140] Issuer                  (0x40 bytes)
//! [0x180] FormatVersion           (1 byte)
//! [0x181] CaCrlVersion            (1 byte)
//! [0x182] SignerCrlVersion        (1 byte)
//! [0x183] IsVWii                  (1 byte)
//! [0x184] SystemVersion           (u64, IOS title id)
//! [0x18C] TitleId                 (8 bytes)
//! [0x194] TitleType               (u32)
//! [0x198] GroupId                 (u16)
//! [0x19A] Reserved                (2 bytes)
//! [0x19C] Region                  (u16)
//! [0x19E] Ratings                 (0x10 bytes)
//! [0x1AE] Reserved                (0x0C bytes)
//! [0x1BA] IpcMask                 (0x0C bytes)
//! [0x1C6] Reserved                (0x12 bytes)
//! [0x1D8] AccessRights            (u32)
//! [0x1DC] TitleVersion            (u16)
//! [0x1DE] ContentCount            (u16)
//! [0x1E0] BootIndex               (u16)
//! [0x1E2] MinorVersion            (u16)
//! [0x1E4] ContentRecords          (ContentCount × 0x24 bytes)
//! ```
//!
//! ## Content record (0x24 bytes)
//! ```text
//! [0x00] ContentId   (u32)
//! [0x04] Index       (u16)
//! [0x06] Type        (u16)
//! [0x08] Size        (8 bytes, see below)
//! [0x10] Sha1        (20 bytes, hash of the decrypted content)
//! ```
//!
//! ## Content size encoding
//! The size field is loaded as a little-endian `u64` and then byte-swapped,
//! which lands on the big-endian value. The conversion is kept in one pair of
//! functions ([`content_size_from_disk`], [`content_size_to_disk`]) and used
//! nowhere else.

use crate::utils::ByteReader;
use crate::{Error, Result};

/// Size of the fixed TMD header before the content record table.
pub const TMD_HEADER_SIZE: usize = 0x1E4;

/// Size of one content record.
pub const CONTENT_RECORD_SIZE: usize = 0x24;

/// Content type flags stored in a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Normal,
    Development,
    HashTree,
    Dlc,
    Shared,
    Unknown(u16),
}

impl From<u16> for ContentType {
    fn from(v: u16) -> Self {
        match v {
            0x0001 => Self::Normal,
            0x0002 => Self::Development,
            0x0003 => Self::HashTree,
            0x4001 => Self::Dlc,
            0x8001 => Self::Shared,
            x => Self::Unknown(x),
        }
    }
}

impl From<ContentType> for u16 {
    fn from(t: ContentType) -> Self {
        match t {
            ContentType::Normal => 0x0001,
            ContentType::Development => 0x0002,
            ContentType::HashTree => 0x0003,
            ContentType::Dlc => 0x4001,
            ContentType::Shared => 0x8001,
            ContentType::Unknown(x) => x,
        }
    }
}

/// Region a title is locked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Japan,
    Usa,
    Europe,
    Free,
    Korea,
    Unknown(u16),
}

impl From<u16> for Region {
    fn from(v: u16) -> Self {
        match v {
            0 => Self::Japan,
            1 => Self::Usa,
            2 => Self::Europe,
            3 => Self::Free,
            4 => Self::Korea,
            x => Self::Unknown(x),
        }
    }
}

/// One entry of the TMD content table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub content_id: u32,
    /// Position of the content within the title; also its IV.
    pub index: u16,
    pub content_type: ContentType,
    /// Size of the decrypted content in bytes.
    pub size: u64,
    /// SHA-1 of the decrypted content.
    pub hash: [u8; 20],
}

/// Decode the TMD content size field.
#[inline]
pub fn content_size_from_disk(raw: [u8; 8]) -> u64 {
    u64::from_le_bytes(raw).swap_bytes()
}

/// Encode the TMD content size field. Inverse of [`content_size_from_disk`].
#[inline]
pub fn content_size_to_disk(size: u64) -> [u8; 8] {
    size.swap_bytes().to_le_bytes()
}

impl ContentRecord {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self> {
        let content_id = r.be_u32()?;
        let index = r.be_u16()?;
        let content_type = ContentType::from(r.be_u16()?);
        let size = content_size_from_disk(r.bytesa()?);
        let hash = r.bytesa()?;
        Ok(Self {
            content_id,
            index,
            content_type,
            size,
            hash,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.content_id.to_be_bytes());
        out.extend_from_slice(&self.index.to_be_bytes());
        out.extend_from_slice(&u16::from(self.content_type).to_be_bytes());
        out.extend_from_slice(&content_size_to_disk(self.size));
        out.extend_from_slice(&self.hash);
    }
}

/// Parsed title metadata.
///
/// The content count is not stored separately: it is always
/// `content_records.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMetadata {
    pub signature_type: u32,
    pub signature: [u8; 0x100],
    pub signature_padding: [u8; 0x3C],
    pub issuer: [u8; 0x40],
    pub format_version: u8,
    pub ca_crl_version: u8,
    pub signer_crl_version: u8,
    pub vwii: u8,
    pub system_version: u64,
    pub title_id: [u8; 8],
    pub title_type: u32,
    pub group_id: u16,
    pub reserved1: [u8; 2],
    pub region: u16,
    pub ratings: [u8; 0x10],
    pub reserved2: [u8; 0x0C],
    pub ipc_mask: [u8; 0x0C],
    pub reserved3: [u8; 0x12],
    pub access_rights: u32,
    pub title_version: u16,
    pub boot_index: u16,
    pub minor_version: u16,
    pub content_records: Vec<ContentRecord>,
}

impl TitleMetadata {
    /// Parse a TMD, including exactly as many content records as its count
    /// field declares.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);

        let signature_type = r.be_u32()?;
        let signature = r.bytesa()?;
        let signature_padding = r.bytesa()?;
        let issuer = r.bytesa()?;
        let format_version = r.u8()?;
        let ca_crl_version = r.u8()?;
        let signer_crl_version = r.u8()?;
        let vwii = r.u8()?;
        let system_version = r.be_u64()?;
        let title_id = r.bytesa()?;
        let title_type = r.be_u32()?;
        let group_id = r.be_u16()?;
        let reserved1 = r.bytesa()?;
        let region = r.be_u16()?;
        let ratings = r.bytesa()?;
        let reserved2 = r.bytesa()?;
        let ipc_mask = r.bytesa()?;
        let reserved3 = r.bytesa()?;
        let access_rights = r.be_u32()?;
        let title_version = r.be_u16()?;
        let content_count = r.be_u16()?;
        let boot_index = r.be_u16()?;
        let minor_version = r.be_u16()?;
        debug_assert_eq!(r.position(), TMD_HEADER_SIZE);

        let mut content_records = Vec::with_capacity(content_count as usize);
        for _ in 0..content_count {
            content_records.push(ContentRecord::parse(&mut r)?);
        }

        Ok(Self {
            signature_type,
            signature,
            signature_padding,
            issuer,
            format_version,
            ca_crl_version,
            signer_crl_version,
            vwii,
            system_version,
            title_id,
            title_type,
            group_id,
            reserved1,
            region,
            ratings,
            reserved2,
            ipc_mask,
            reserved3,
            access_rights,
            title_version,
            boot_index,
            minor_version,
            content_records,
        })
    }

    /// Serialize the TMD. The count field is taken from the current table.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let content_count = self.num_contents()?;

        let mut out =
            Vec::with_capacity(TMD_HEADER_SIZE + self.content_records.len() * CONTENT_RECORD_SIZE);
        out.extend_from_slice(&self.signature_type.to_be_bytes());
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.signature_padding);
        out.extend_from_slice(&self.issuer);
        out.push(self.format_version);
        out.push(self.ca_crl_version);
        out.push(self.signer_crl_version);
        out.push(self.vwii);
        out.extend_from_slice(&self.system_version.to_be_bytes());
        out.extend_from_slice(&self.title_id);
        out.extend_from_slice(&self.title_type.to_be_bytes());
        out.extend_from_slice(&self.group_id.to_be_bytes());
        out.extend_from_slice(&self.reserved1);
        out.extend_from_slice(&self.region.to_be_bytes());
        out.extend_from_slice(&self.ratings);
        out.extend_from_slice(&self.reserved2);
        out.extend_from_slice(&self.ipc_mask);
        out.extend_from_slice(&self.reserved3);
        out.extend_from_slice(&self.access_rights.to_be_bytes());
        out.extend_from_slice(&self.title_version.to_be_bytes());
        out.extend_from_slice(&content_count.to_be_bytes());
        out.extend_from_slice(&self.boot_index.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        for record in &self.content_records {
            record.write(&mut out);
        }
        Ok(out)
    }

    /// Number of content records, as written to the count field.
    pub fn num_contents(&self) -> Result<u16> {
        u16::try_from(self.content_records.len())
            .map_err(|_| Error::Parse("more than 65535 content records"))
    }

    /// Find a content record by content id.
    pub fn content_record_by_id(&self, content_id: u32) -> Option<&ContentRecord> {
        self.content_records
            .iter()
            .find(|c| c.content_id == content_id)
    }

    /// Title id as a single integer.
    pub fn title_id_u64(&self) -> u64 {
        u64::from_be_bytes(self.title_id)
    }

    pub fn region(&self) -> Region {
        Region::from(self.region)
    }

    /// Whether the title targets the vWii (Wii U) environment.
    pub fn is_vwii(&self) -> bool {
        self.vwii != 0
    }
}
