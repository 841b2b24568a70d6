//! Hand-assembled packages for the integration tests.
//!
//! Everything here is built straight from the on-disk layout with the raw
//! cipher and digest crates, so the fixtures never pass through the code they
//! are testing.

#![allow(dead_code)]

use aes::Aes128;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use sha1::{Digest, Sha1};

pub const TITLE_ID: [u8; 8] = [0x00, 0x01, 0x00, 0x01, 0x57, 0x41, 0x44, 0x4B];
pub const TITLE_KEY: [u8; 16] = [
    0x1F, 0x2E, 0x3D, 0x4C, 0x5B, 0x6A, 0x79, 0x88, 0x97, 0xA6, 0xB5, 0xC4, 0xD3, 0xE2, 0xF1, 0x00,
];
pub const INSTALLABLE: u32 = 0x4973_0000;

pub struct FixtureContent {
    pub id: u32,
    pub index: u16,
    pub content_type: u16,
    pub data: Vec<u8>,
}

pub struct Fixture {
    pub wad_type: u32,
    pub wrapping_key: [u8; 16],
    pub key_type: u8,
    pub title_key: [u8; 16],
    pub title_version: u16,
    pub cert: Vec<u8>,
    pub crl: Vec<u8>,
    pub meta: Vec<u8>,
    pub contents: Vec<FixtureContent>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            wad_type: INSTALLABLE,
            wrapping_key: wadkit::keys::KeySet::default().common,
            key_type: 0,
            title_key: TITLE_KEY,
            title_version: 0x0201,
            cert: (0..0xA00u32).map(|i| (i * 7) as u8).collect(),
            crl: Vec::new(),
            meta: Vec::new(),
            contents: vec![
                FixtureContent {
                    id: 0x0000_0000,
                    index: 0,
                    content_type: 0x0001,
                    data: b"boot content, forty bytes of plaintext!!".to_vec(),
                },
                FixtureContent {
                    id: 0x0000_0001,
                    index: 1,
                    content_type: 0x8001,
                    data: (0..0x100u32).map(|i| i as u8).collect(),
                },
                FixtureContent {
                    id: 0x0000_000A,
                    index: 2,
                    content_type: 0x0001,
                    data: b"tail!".to_vec(),
                },
            ],
        }
    }
}

pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// AES-128-CBC over `data` zero-filled to a whole number of blocks.
pub fn cbc_encrypt(key: &[u8; 16], iv: &[u8; 16], data: &[u8]) -> Vec<u8> {
    let mut buf = data.to_vec();
    buf.resize(data.len().div_ceil(16) * 16, 0);
    let len = buf.len();
    cbc::Encryptor::<Aes128>::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .unwrap();
    buf
}

pub fn pad64(buf: &mut Vec<u8>) {
    let len = buf.len().div_ceil(64) * 64;
    buf.resize(len, 0);
}

impl Fixture {
    pub fn ticket(&self) -> Vec<u8> {
        let mut iv = [0u8; 16];
        iv[..8].copy_from_slice(&TITLE_ID);
        let wrapped = cbc_encrypt(&self.wrapping_key, &iv, &self.title_key);

        let mut t = vec![0u8; 0x2A4];
        t[0x000..0x004].copy_from_slice(&0x0001_0001u32.to_be_bytes());
        t[0x004..0x104].fill(0x5C);
        t[0x140..0x15A].copy_from_slice(b"Root-CA00000001-XS00000003");
        t[0x1BC] = 1;
        t[0x1BF..0x1CF].copy_from_slice(&wrapped);
        t[0x1D0..0x1D8].copy_from_slice(&0x0001_0002_0003_0004u64.to_be_bytes());
        t[0x1DC..0x1E4].copy_from_slice(&TITLE_ID);
        t[0x1E4..0x1E6].copy_from_slice(&0xFFFFu16.to_be_bytes());
        t[0x1E6..0x1E8].copy_from_slice(&self.title_version.to_be_bytes());
        t[0x1EC..0x1F0].copy_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
        t[0x1F1] = self.key_type;
        t
    }

    pub fn tmd(&self) -> Vec<u8> {
        let mut t = vec![0u8; 0x1E4];
        t[0x000..0x004].copy_from_slice(&0x0001_0001u32.to_be_bytes());
        t[0x004..0x104].fill(0xC3);
        t[0x140..0x15A].copy_from_slice(b"Root-CA00000001-CP00000004");
        t[0x180] = 1;
        t[0x184..0x18C].copy_from_slice(&0x0000_0001_0000_0024u64.to_be_bytes());
        t[0x18C..0x194].copy_from_slice(&TITLE_ID);
        t[0x194..0x198].copy_from_slice(&1u32.to_be_bytes());
        t[0x19C..0x19E].copy_from_slice(&1u16.to_be_bytes());
        t[0x1DC..0x1DE].copy_from_slice(&self.title_version.to_be_bytes());
        t[0x1DE..0x1E0].copy_from_slice(&(self.contents.len() as u16).to_be_bytes());

        for c in &self.contents {
            t.extend_from_slice(&c.id.to_be_bytes());
            t.extend_from_slice(&c.index.to_be_bytes());
            t.extend_from_slice(&c.content_type.to_be_bytes());
            t.extend_from_slice(&(c.data.len() as u64).to_be_bytes());
            t.extend_from_slice(&sha1(&c.data));
        }
        t
    }

    /// Encrypted blocks, each padded to 64 bytes.
    pub fn content_area(&self) -> Vec<u8> {
        let mut area = Vec::new();
        for c in &self.contents {
            let mut iv = [0u8; 16];
            iv[..2].copy_from_slice(&c.index.to_be_bytes());
            area.extend(cbc_encrypt(&self.title_key, &iv, &c.data));
            pad64(&mut area);
        }
        area
    }

    /// Offset of the content area in [`Fixture::build`]'s output.
    pub fn content_offset(&self) -> usize {
        [
            0x20,
            self.cert.len(),
            self.crl.len(),
            self.ticket().len(),
            self.tmd().len(),
        ]
        .iter()
        .map(|len| len.div_ceil(64) * 64)
        .sum()
    }

    pub fn build(&self) -> Vec<u8> {
        let ticket = self.ticket();
        let tmd = self.tmd();
        let data = self.content_area();

        let mut out = Vec::new();
        for field in [
            0x20,
            self.wad_type,
            self.cert.len() as u32,
            self.crl.len() as u32,
            ticket.len() as u32,
            tmd.len() as u32,
            data.len() as u32,
            self.meta.len() as u32,
        ] {
            out.extend_from_slice(&field.to_be_bytes());
        }
        pad64(&mut out);
        for part in [&self.cert, &self.crl, &ticket, &tmd, &data, &self.meta] {
            out.extend_from_slice(part);
            pad64(&mut out);
        }
        out
    }
}
