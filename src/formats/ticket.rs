//! Ticket - license record carrying the wrapped title key.
//!
//! ## Layout (0x2A4 bytes, all integers big-endian)
//! ```text
//! [0x000] SignatureType           (u32)
//! [0x004] Signature               (0x100 bytes, RSA-2048, opaque)
//! [0x104] SignaturePadding        (0x3C bytes)
//! [0x140] Issuer                  (0x40 bytes, NUL-padded ASCII)
//! [0x180] EcdhData                (0x3C bytes, opaque)
//! [0x1BC] FormatVersion           (1 byte)
//! [0x1BD] CaCrlVersion            (1 byte)
//! [0x1BE] SignerCrlVersion        (1 byte)
//! [0x1BF] TitleKey                (0x10 bytes, wrapped)
//! [0x1CF] Reserved                (1 byte)
//! [0x1D0] TicketId                (u64)
//! [0x1D8] ConsoleId               (u32)
//! [0x1DC] TitleId                 (8 bytes)
//! [0x1E4] SystemAccessMask        (u16)
//! [0x1E6] TitleVersion            (u16)
//! [0x1E8] AccessTitleId           (u32)
//! [0x1EC] AccessTitleMask         (u32)
//! [0x1F0] LicenseType             (1 byte)
//! [0x1F1] KeyType                 (1 byte)
//! [0x1F2] Reserved                (0x72 bytes)
//! [0x264] TimeLimits              (8 × {Code u32, Limit u32})
//! ```
//!
//! The title key is unwrapped while parsing and held in plaintext from then
//! on. [`Ticket::to_bytes`] re-wraps it into the output without touching the
//! in-memory copy.

use crate::Result;
use crate::crypto::title::{unwrap_title_key, wrap_title_key};
use crate::keys::{KeySet, KeyType};
use crate::utils::ByteReader;

/// Size of a serialized ticket.
pub const TICKET_SIZE: usize = 0x2A4;

/// Number of entries in the time-limit table.
pub const TIME_LIMIT_COUNT: usize = 8;

/// One (code, limit) entry of the ticket's time-limit table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeLimit {
    pub code: u32,
    pub limit: u32,
}

/// Parsed ticket with its title key already unwrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub signature_type: u32,
    pub signature: [u8; 0x100],
    pub signature_padding: [u8; 0x3C],
    pub issuer: [u8; 0x40],
    pub ecdh_data: [u8; 0x3C],
    pub format_version: u8,
    pub ca_crl_version: u8,
    pub signer_crl_version: u8,
    title_key: [u8; 16],
    pub reserved1: u8,
    pub ticket_id: u64,
    pub console_id: u32,
    pub title_id: [u8; 8],
    pub system_access_mask: u16,
    pub title_version: u16,
    pub access_title_id: u32,
    pub access_title_mask: u32,
    pub license_type: u8,
    pub key_type: KeyType,
    pub reserved2: [u8; 0x72],
    pub time_limits: [TimeLimit; TIME_LIMIT_COUNT],
}

impl Ticket {
    /// Parse a ticket and unwrap its title key with `keys`.
    ///
    /// `data` must start at the ticket; bytes past [`TICKET_SIZE`] are
    /// ignored.
    pub fn parse(data: &[u8], keys: &KeySet) -> Result<Self> {
        let mut r = ByteReader::new(data);

        let signature_type = r.be_u32()?;
        let signature = r.bytesa()?;
        let signature_padding = r.bytesa()?;
        let issuer = r.bytesa()?;
        let ecdh_data = r.bytesa()?;
        let format_version = r.u8()?;
        let ca_crl_version = r.u8()?;
        let signer_crl_version = r.u8()?;
        let wrapped_key = r.bytesa::<16>()?;
        let reserved1 = r.u8()?;
        let ticket_id = r.be_u64()?;
        let console_id = r.be_u32()?;
        let title_id = r.bytesa()?;
        let system_access_mask = r.be_u16()?;
        let title_version = r.be_u16()?;
        let access_title_id = r.be_u32()?;
        let access_title_mask = r.be_u32()?;
        let license_type = r.u8()?;
        let key_type = KeyType::from(r.u8()?);
        let reserved2 = r.bytesa()?;

        let mut time_limits = [TimeLimit::default(); TIME_LIMIT_COUNT];
        for entry in &mut time_limits {
            entry.code = r.be_u32()?;
            entry.limit = r.be_u32()?;
        }
        debug_assert_eq!(r.position(), TICKET_SIZE);

        let title_key = unwrap_title_key(keys, key_type, &title_id, &wrapped_key)?;

        Ok(Self {
            signature_type,
            signature,
            signature_padding,
            issuer,
            ecdh_data,
            format_version,
            ca_crl_version,
            signer_crl_version,
            title_key,
            reserved1,
            ticket_id,
            console_id,
            title_id,
            system_access_mask,
            title_version,
            access_title_id,
            access_title_mask,
            license_type,
            key_type,
            reserved2,
            time_limits,
        })
    }

    /// Serialize the ticket, wrapping the title key with `keys`.
    pub fn to_bytes(&self, keys: &KeySet) -> Result<Vec<u8>> {
        let wrapped_key = wrap_title_key(keys, self.key_type, &self.title_id, &self.title_key)?;

        let mut out = Vec::with_capacity(TICKET_SIZE);
        out.extend_from_slice(&self.signature_type.to_be_bytes());
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.signature_padding);
        out.extend_from_slice(&self.issuer);
        out.extend_from_slice(&self.ecdh_data);
        out.push(self.format_version);
        out.push(self.ca_crl_version);
        out.push(self.signer_crl_version);
        out.extend_from_slice(&wrapped_key);
        out.push(self.reserved1);
        out.extend_from_slice(&self.ticket_id.to_be_bytes());
        out.extend_from_slice(&self.console_id.to_be_bytes());
        out.extend_from_slice(&self.title_id);
        out.extend_from_slice(&self.system_access_mask.to_be_bytes());
        out.extend_from_slice(&self.title_version.to_be_bytes());
        out.extend_from_slice(&self.access_title_id.to_be_bytes());
        out.extend_from_slice(&self.access_title_mask.to_be_bytes());
        out.push(self.license_type);
        out.push(self.key_type.into());
        out.extend_from_slice(&self.reserved2);
        for entry in &self.time_limits {
            out.extend_from_slice(&entry.code.to_be_bytes());
            out.extend_from_slice(&entry.limit.to_be_bytes());
        }
        Ok(out)
    }

    /// The plaintext title key.
    pub fn title_key(&self) -> &[u8; 16] {
        &self.title_key
    }

    /// Replace the plaintext title key. It is wrapped again on serialization.
    pub fn set_title_key(&mut self, title_key: [u8; 16]) {
        self.title_key = title_key;
    }

    /// Title id as a single integer (e.g. `0x00010001_5741444B`).
    pub fn title_id_u64(&self) -> u64 {
        u64::from_be_bytes(self.title_id)
    }

    /// Issuer string with trailing NULs removed.
    pub fn issuer_str(&self) -> String {
        let end = self
            .issuer
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.issuer.len());
        String::from_utf8_lossy(&self.issuer[..end]).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const TITLE_ID: [u8; 8] = [0x00, 0x01, 0x00, 0x01, 0x48, 0x41, 0x43, 0x45];

    fn raw_ticket(wrapped_key: &[u8; 16], key_type: u8) -> Vec<u8> {
        let mut t = vec![0u8; TICKET_SIZE];
        t[0x000..0x004].copy_from_slice(&0x0001_0001u32.to_be_bytes());
        t[0x004..0x104].fill(0xA5);
        t[0x140..0x140 + 16].copy_from_slice(b"Root-CA00000001-");
        t[0x1BC] = 1;
        t[0x1BF..0x1CF].copy_from_slice(wrapped_key);
        t[0x1D0..0x1D8].copy_from_slice(&0x0005_0000_1234_5678u64.to_be_bytes());
        t[0x1D8..0x1DC].copy_from_slice(&0xCAFE_F00Du32.to_be_bytes());
        t[0x1DC..0x1E4].copy_from_slice(&TITLE_ID);
        t[0x1E6..0x1E8].copy_from_slice(&0x0102u16.to_be_bytes());
        t[0x1F1] = key_type;
        t[0x264..0x268].copy_from_slice(&1u32.to_be_bytes());
        t[0x268..0x26C].copy_from_slice(&3600u32.to_be_bytes());
        t
    }

    #[test]
    fn parse_unwraps_and_reads_fields() {
        let keys = KeySet::new();
        let title_key = [0x3Cu8; 16];
        let wrapped = wrap_title_key(&keys, KeyType::Common, &TITLE_ID, &title_key).unwrap();

        let ticket = Ticket::parse(&raw_ticket(&wrapped, 0), &keys).unwrap();
        assert_eq!(ticket.title_key(), &title_key);
        assert_eq!(ticket.signature_type, 0x0001_0001);
        assert_eq!(ticket.ticket_id, 0x0005_0000_1234_5678);
        assert_eq!(ticket.console_id, 0xCAFE_F00D);
        assert_eq!(ticket.title_version, 0x0102);
        assert_eq!(ticket.title_id_u64(), 0x0001_0001_4841_4345);
        assert_eq!(ticket.key_type, KeyType::Common);
        assert_eq!(ticket.issuer_str(), "Root-CA00000001-");
        assert_eq!(
            ticket.time_limits[0],
            TimeLimit {
                code: 1,
                limit: 3600
            }
        );
    }

    #[test]
    fn to_bytes_rewraps_without_touching_memory() {
        let keys = KeySet::new();
        let title_key = [0x77u8; 16];
        let wrapped = wrap_title_key(&keys, KeyType::Korean, &TITLE_ID, &title_key).unwrap();
        let raw = raw_ticket(&wrapped, 1);

        let ticket = Ticket::parse(&raw, &keys).unwrap();
        let out = ticket.to_bytes(&keys).unwrap();
        assert_eq!(out, raw);
        assert_eq!(ticket.title_key(), &title_key);
    }

    #[test]
    fn unknown_key_type_round_trips() {
        let keys = KeySet::new();
        let title_key = [0x01u8; 16];
        let wrapped = wrap_title_key(&keys, KeyType::Common, &TITLE_ID, &title_key).unwrap();
        let raw = raw_ticket(&wrapped, 0x7F);

        let ticket = Ticket::parse(&raw, &keys).unwrap();
        assert_eq!(ticket.key_type, KeyType::Unknown(0x7F));
        assert_eq!(ticket.title_key(), &title_key);
        assert_eq!(ticket.to_bytes(&keys).unwrap(), raw);
    }

    #[test]
    fn truncated_ticket_is_rejected() {
        let raw = raw_ticket(&[0u8; 16], 0);
        let err = Ticket::parse(&raw[..TICKET_SIZE - 1], &KeySet::new()).unwrap_err();
        assert!(matches!(err, Error::OutOfBoundsRead { .. }));
    }
}
