//! Wrapping keys for Wii title keys.
//!
//! Every ticket carries its title key encrypted under one of a small set of
//! fixed keys. The ticket's key-type byte selects which one:
//!
//! | Tag | Key |
//! |-----|-----|
//! | 0   | Common key |
//! | 1   | Korean common key |
//! | 2   | vWii (Wii U) common key |
//!
//! Any other tag falls back to the common key.
//!
//! This module is a plain data container. The AES work lives in
//! [`crate::crypto::title`].
//!
//! ## Key file format
//! Key files are simple `name = hex_value` text files, one entry per line,
//! comments prefixed with `;`. Recognised names are `common_key`,
//! `korean_key` and `vwii_key`.

use std::io::{BufRead, BufReader, Read};
use std::result::Result as StdResult;

use crate::{Error, Result};

const COMMON_KEY: [u8; 16] = [
    0xEB, 0xE4, 0x2A, 0x22, 0x5E, 0x85, 0x93, 0xE4, 0x48, 0xD9, 0xC5, 0x45, 0x73, 0x81, 0xAA, 0xF7,
];

const KOREAN_KEY: [u8; 16] = [
    0x63, 0xB8, 0x2B, 0xB4, 0xF4, 0x61, 0x4E, 0x2E, 0x13, 0xF2, 0xFE, 0xFB, 0xBA, 0x4C, 0x9B, 0x7E,
];

const VWII_KEY: [u8; 16] = [
    0x30, 0xBF, 0xC7, 0x6E, 0x7C, 0x19, 0xAF, 0xBB, 0x23, 0x16, 0x33, 0x30, 0xCE, 0xD7, 0xC2, 0x8D,
];

/// Key-type tag stored in a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Common,
    Korean,
    VWii,
    /// Unrecognised tag; kept verbatim so it round-trips.
    Unknown(u8),
}

impl From<u8> for KeyType {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Common,
            1 => Self::Korean,
            2 => Self::VWii,
            x => Self::Unknown(x),
        }
    }
}

impl From<KeyType> for u8 {
    fn from(k: KeyType) -> Self {
        match k {
            KeyType::Common => 0,
            KeyType::Korean => 1,
            KeyType::VWii => 2,
            KeyType::Unknown(x) => x,
        }
    }
}

/// The three title-key wrapping keys.
///
/// [`KeySet::default`] holds the well-known retail values; a key file can
/// override any of them with [`KeySet::load_keys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet {
    pub common: [u8; 16],
    pub korean: [u8; 16],
    pub vwii: [u8; 16],
}

impl Default for KeySet {
    fn default() -> Self {
        Self {
            common: COMMON_KEY,
            korean: KOREAN_KEY,
            vwii: VWII_KEY,
        }
    }
}

impl KeySet {
    /// Create a key set holding the retail keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the wrapping key for a ticket's key-type tag.
    ///
    /// Unrecognised tags select the common key.
    pub fn select(&self, key_type: KeyType) -> &[u8; 16] {
        match key_type {
            KeyType::Common => &self.common,
            KeyType::Korean => &self.korean,
            KeyType::VWii => &self.vwii,
            KeyType::Unknown(tag) => {
                tracing::warn!(tag, "unrecognised key type, falling back to the common key");
                &self.common
            }
        }
    }

    /// Override keys from a `name = hex` key file.
    ///
    /// Lines beginning with `;` and blank lines are ignored, as are unknown
    /// names and values that are not exactly 32 hex digits.
    pub fn load_keys<R: Read>(&mut self, reader: R) -> Result<()> {
        let buf = BufReader::new(reader);
        for line in buf.lines() {
            let line = line.map_err(Error::Io)?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let Some((name, value)) = line.split_once('=') else {
                continue;
            };
            let slot = match name.trim() {
                "common_key" => &mut self.common,
                "korean_key" => &mut self.korean,
                "vwii_key" => &mut self.vwii,
                _ => continue,
            };
            match decode_hex_16(value) {
                Ok(key) => *slot = key,
                Err(()) => tracing::warn!(name = name.trim(), "ignoring malformed key value"),
            }
        }
        Ok(())
    }
}

fn decode_hex_16(s: &str) -> StdResult<[u8; 16], ()> {
    let s = s.trim();
    if s.len() != 32 {
        return Err(());
    }
    let mut out = [0u8; 16];
    for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
        out[i] = (hex_nibble(chunk[0])? << 4) | hex_nibble(chunk[1])?;
    }
    Ok(out)
}

fn hex_nibble(b: u8) -> StdResult<u8, ()> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(()),
    }
}
