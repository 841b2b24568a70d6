//! WAD - signed, encrypted title package.
//!
//! ## Layout
//! ```text
//! [0x00] Header                    (0x20 bytes, see below)
//!        CertificateChain          (CertSize bytes, opaque)
//!        CertificateRevocationList (CrlSize bytes, opaque)
//!        Ticket                    (TicketSize bytes, see formats::ticket)
//!        TitleMetadata             (TmdSize bytes, see formats::tmd)
//!        ContentArea               (DataSize bytes, one block per content record)
//!        Meta                      (MetaSize bytes, opaque)
//! ```
//! Every section starts on a 64-byte boundary measured from the start of the
//! package; the gap before it is zero-filled.
//!
//! ## Header (0x20 bytes, all u32 BE)
//! ```text
//! [0x00] HeaderSize   (always 0x20)
//! [0x04] WadType
//! [0x08] CertSize
//! [0x0C] CrlSize
//! [0x10] TicketSize
//! [0x14] TmdSize
//! [0x18] DataSize
//! [0x1C] MetaSize
//! ```
//!
//! ## Content area
//! Content blocks appear in content-record order. Each occupies its record's
//! size rounded up to 16 bytes, followed by padding to the next 64-byte
//! boundary. A block's offset is only known once every earlier block has been
//! measured.

use std::io::{Read, Write};
use std::ops::Range;

use crate::formats::content::Content;
use crate::formats::ticket::Ticket;
use crate::formats::tmd::{ContentRecord, TitleMetadata};
use crate::keys::KeySet;
use crate::utils::{ByteReader, align_padding, pad_to_alignment, range, round_up_to_block};
use crate::{Error, Result};

/// Value of the header's first field.
pub const WAD_HEADER_SIZE: u32 = 0x20;

/// Package type tag stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WadType {
    /// `Is` - regular installable title.
    Installable,
    /// `ib` - boot2 package.
    Boot,
    /// `Bk` - save/backup package.
    Backup,
    Unknown(u32),
}

impl From<u32> for WadType {
    fn from(v: u32) -> Self {
        match v {
            0x4973_0000 => Self::Installable,
            0x6962_0000 => Self::Boot,
            0x426B_0000 => Self::Backup,
            x => Self::Unknown(x),
        }
    }
}

impl From<WadType> for u32 {
    fn from(t: WadType) -> Self {
        match t {
            WadType::Installable => 0x4973_0000,
            WadType::Boot => 0x6962_0000,
            WadType::Backup => 0x426B_0000,
            WadType::Unknown(x) => x,
        }
    }
}

/// The fixed 32-byte package header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WadHeader {
    pub header_size: u32,
    pub wad_type: WadType,
    pub cert_size: u32,
    pub crl_size: u32,
    pub ticket_size: u32,
    pub tmd_size: u32,
    pub data_size: u32,
    pub meta_size: u32,
}

impl WadHeader {
    /// Parse and validate the header against the full input length.
    ///
    /// The header size is checked before any other field is read.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);

        let header_size = r.be_u32()?;
        if header_size != WAD_HEADER_SIZE {
            return Err(Error::HeaderSizeMismatch(header_size));
        }

        let header = Self {
            header_size,
            wad_type: WadType::from(r.be_u32()?),
            cert_size: r.be_u32()?,
            crl_size: r.be_u32()?,
            ticket_size: r.be_u32()?,
            tmd_size: r.be_u32()?,
            data_size: r.be_u32()?,
            meta_size: r.be_u32()?,
        };

        let declared = header.declared_size();
        if declared > data.len() as u64 {
            return Err(Error::DeclaredSizeExceedsInput {
                declared,
                available: data.len(),
            });
        }

        Ok(header)
    }

    /// Sum of the six section sizes.
    pub fn declared_size(&self) -> u64 {
        [
            self.cert_size,
            self.crl_size,
            self.ticket_size,
            self.tmd_size,
            self.data_size,
            self.meta_size,
        ]
        .iter()
        .map(|&s| u64::from(s))
        .sum()
    }

    pub fn to_bytes(&self) -> [u8; 0x20] {
        let mut out = [0u8; 0x20];
        let fields = [
            self.header_size,
            self.wad_type.into(),
            self.cert_size,
            self.crl_size,
            self.ticket_size,
            self.tmd_size,
            self.data_size,
            self.meta_size,
        ];
        for (chunk, field) in out.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_be_bytes());
        }
        out
    }
}

/// A fully decoded package: ticket and TMD parsed, contents decrypted and
/// verified.
///
/// `contents` is index-aligned with `tmd.content_records`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wad {
    pub header: WadHeader,
    pub cert_chain: Vec<u8>,
    pub crl: Vec<u8>,
    pub ticket: Ticket,
    pub tmd: TitleMetadata,
    pub contents: Vec<Content>,
    pub meta: Vec<u8>,
    keys: KeySet,
}

impl Wad {
    /// Parse a package using the retail wrapping keys.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with_keys(data, KeySet::default())
    }

    /// Read a whole package from `r` and parse it.
    pub fn read<R: Read>(r: &mut R, keys: KeySet) -> Result<Self> {
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        Self::parse_with_keys(&data, keys)
    }

    /// Parse a package, unwrapping its title key with `keys`.
    ///
    /// Any failure aborts the whole parse; contents are verified in table
    /// order and the first mismatch is reported.
    pub fn parse_with_keys(data: &[u8], keys: KeySet) -> Result<Self> {
        let header = WadHeader::parse(data)?;

        let mut pos = WAD_HEADER_SIZE as usize;
        pos += align_padding(pos);

        let cert_chain = section(data, &mut pos, header.cert_size)?.to_vec();
        let crl = section(data, &mut pos, header.crl_size)?.to_vec();

        tracing::debug!(offset = pos, size = header.ticket_size, "reading ticket");
        let ticket = Ticket::parse(section(data, &mut pos, header.ticket_size)?, &keys)?;

        tracing::debug!(offset = pos, size = header.tmd_size, "reading tmd");
        let tmd = TitleMetadata::parse(section(data, &mut pos, header.tmd_size)?)?;

        tracing::debug!(
            offset = pos,
            count = tmd.content_records.len(),
            "reading content area"
        );
        let (contents, end) =
            decode_contents(data, pos, &tmd.content_records, ticket.title_key())?;
        pos = end;

        tracing::debug!(offset = pos, size = header.meta_size, "reading meta");
        let meta = range(data, pos, header.meta_size as usize)?.to_vec();

        Ok(Self {
            header,
            cert_chain,
            crl,
            ticket,
            tmd,
            contents,
            meta,
            keys,
        })
    }

    /// Re-encrypt every content block and serialize the package.
    ///
    /// Each TMD content record gets its size and hash refreshed from the
    /// current plaintext, and the header is rebuilt from the serialized
    /// section lengths. Content plaintext stays as it is.
    pub fn to_bytes(&mut self, wad_type: WadType) -> Result<Vec<u8>> {
        if self.contents.len() != self.tmd.content_records.len() {
            return Err(Error::ContentCountMismatch {
                records: self.tmd.content_records.len(),
                contents: self.contents.len(),
            });
        }

        let title_key = *self.ticket.title_key();
        let mut data = Vec::new();
        for (content, slot) in self
            .contents
            .iter_mut()
            .zip(self.tmd.content_records.iter_mut())
        {
            // The TMD entry owns id, index and type; the content owns its bytes.
            content.record.content_id = slot.content_id;
            content.record.index = slot.index;
            content.record.content_type = slot.content_type;

            let (ciphertext, record) = content.encrypted(&title_key)?;
            data.extend_from_slice(&ciphertext);
            pad_to_alignment(&mut data);
            content.record = record.clone();
            *slot = record;
        }

        let ticket = self.ticket.to_bytes(&self.keys)?;
        let tmd = self.tmd.to_bytes()?;

        self.header = WadHeader {
            header_size: WAD_HEADER_SIZE,
            wad_type,
            cert_size: section_size(&self.cert_chain)?,
            crl_size: section_size(&self.crl)?,
            ticket_size: section_size(&ticket)?,
            tmd_size: section_size(&tmd)?,
            data_size: section_size(&data)?,
            meta_size: section_size(&self.meta)?,
        };

        let header = self.header.to_bytes();
        let mut out = Vec::new();
        for part in [
            header.as_slice(),
            self.cert_chain.as_slice(),
            self.crl.as_slice(),
            ticket.as_slice(),
            tmd.as_slice(),
            data.as_slice(),
            self.meta.as_slice(),
        ] {
            out.extend_from_slice(part);
            pad_to_alignment(&mut out);
        }
        Ok(out)
    }

    /// Serialize the package to `w`.
    pub fn write<W: Write>(&mut self, w: &mut W, wad_type: WadType) -> Result<()> {
        let bytes = self.to_bytes(wad_type)?;
        w.write_all(&bytes)?;
        Ok(())
    }

    /// Replace the ticket with a freshly parsed one, leaving everything else
    /// as it is.
    pub fn replace_ticket(&mut self, data: &[u8]) -> Result<()> {
        self.ticket = Ticket::parse(data, &self.keys)?;
        Ok(())
    }

    /// Replace the TMD with a freshly parsed one, leaving everything else as
    /// it is.
    ///
    /// The new table's ids, indices and types apply to the loaded contents on
    /// the next serialization.
    pub fn replace_tmd(&mut self, data: &[u8]) -> Result<()> {
        self.tmd = TitleMetadata::parse(data)?;
        Ok(())
    }

    /// The plaintext title key.
    pub fn title_key(&self) -> &[u8; 16] {
        self.ticket.title_key()
    }

    /// Key set used to unwrap and re-wrap the title key.
    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Find a content by content id.
    pub fn content_by_id(&self, content_id: u32) -> Option<&Content> {
        self.contents
            .iter()
            .find(|c| c.record.content_id == content_id)
    }

    /// Replace the plaintext of the content at table position `index`.
    ///
    /// Its record's size and hash are refreshed on the next
    /// [`Wad::to_bytes`].
    pub fn set_content(&mut self, index: usize, plaintext: Vec<u8>) -> Result<()> {
        let content = self
            .contents
            .get_mut(index)
            .ok_or(Error::Parse("content index out of range"))?;
        content.set_data(plaintext);
        Ok(())
    }
}

/// Borrow the section at `*pos` and move `*pos` past it and its alignment
/// padding.
fn section<'a>(data: &'a [u8], pos: &mut usize, size: u32) -> Result<&'a [u8]> {
    let bytes = range(data, *pos, size as usize)?;
    *pos += bytes.len();
    *pos += align_padding(*pos);
    Ok(bytes)
}

fn section_size(bytes: &[u8]) -> Result<u32> {
    u32::try_from(bytes.len()).map_err(|_| Error::Parse("section larger than 4 GiB"))
}

/// Byte ranges of each content block, starting at `start`, plus the offset
/// just past the last block's padding.
///
/// Only overflow is checked here; ranges are bounds-checked when read.
fn content_layout(start: usize, records: &[ContentRecord]) -> Result<(Vec<Range<usize>>, usize)> {
    const OVERFLOW: Error = Error::Parse("content area offsets overflow");

    let mut ranges = Vec::with_capacity(records.len());
    let mut pos = start;
    for record in records {
        let size = usize::try_from(record.size).map_err(|_| OVERFLOW)?;
        let padded = round_up_to_block(size).ok_or(OVERFLOW)?;
        let end = pos.checked_add(padded).ok_or(OVERFLOW)?;
        ranges.push(pos..end);
        pos = end.checked_add(align_padding(padded)).ok_or(OVERFLOW)?;
    }
    Ok((ranges, pos))
}

fn read_content(data: &[u8], record: &ContentRecord, block: &Range<usize>) -> Result<Content> {
    let ciphertext = range(data, block.start, block.len())?;
    Ok(Content::from_encrypted(record.clone(), ciphertext.to_vec()))
}

#[cfg(not(feature = "parallel"))]
fn decode_contents(
    data: &[u8],
    start: usize,
    records: &[ContentRecord],
    title_key: &[u8; 16],
) -> Result<(Vec<Content>, usize)> {
    let (blocks, end) = content_layout(start, records)?;
    let mut contents = Vec::with_capacity(records.len());
    for (record, block) in records.iter().zip(&blocks) {
        let mut content = read_content(data, record, block)?;
        content.decrypt(title_key)?;
        contents.push(content);
    }
    Ok((contents, end))
}

#[cfg(feature = "parallel")]
fn decode_contents(
    data: &[u8],
    start: usize,
    records: &[ContentRecord],
    title_key: &[u8; 16],
) -> Result<(Vec<Content>, usize)> {
    use rayon::prelude::*;

    let (blocks, end) = content_layout(start, records)?;
    let encrypted = records
        .iter()
        .zip(&blocks)
        .map(|(record, block)| read_content(data, record, block))
        .collect::<Result<Vec<_>>>()?;

    // Results come back in table order, so the first error collected is the
    // first failing content by position rather than by completion time.
    let contents = encrypted
        .into_par_iter()
        .map(|mut content| content.decrypt(title_key).map(|()| content))
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    Ok((contents, end))
}
