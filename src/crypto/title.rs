//! Title-key wrapping and content block encryption.
//!
//! ## Title key
//! The ticket stores the 16-byte title key AES-128-CBC encrypted under the
//! wrapping key selected by the ticket's key type. The IV is the 8-byte title
//! id followed by eight zero bytes. Wrapping a single block yields exactly one
//! block of ciphertext; only those 16 bytes are ever written back.
//!
//! ## Content
//! Each content block is AES-128-CBC encrypted with the title key. The IV is
//! the content's 16-bit index (big-endian) followed by fourteen zero bytes.
//! On disk a block is rounded up to a whole number of AES blocks; the TMD
//! records the unrounded size and the SHA-1 of the plaintext, so the tail
//! beyond that size is dropped before hashing.

use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha1::{Digest, Sha1};

use crate::keys::{KeySet, KeyType};
use crate::utils::round_up_to_block;
use crate::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// IV used to wrap and unwrap a title key.
pub fn title_key_iv(title_id: &[u8; 8]) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..8].copy_from_slice(title_id);
    iv
}

/// IV used to encrypt and decrypt the content at `index`.
pub fn content_iv(index: u16) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..2].copy_from_slice(&index.to_be_bytes());
    iv
}

/// Decrypt `buf` in place with AES-128-CBC.
///
/// `buf` must be a whole number of 16-byte blocks.
pub fn decrypt_cbc(key: &[u8; 16], iv: &[u8; 16], buf: &mut [u8]) -> Result<()> {
    Aes128CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| Error::Cipher("ciphertext is not a whole number of blocks"))?;
    Ok(())
}

/// Encrypt `buf` in place with AES-128-CBC.
///
/// `buf` must be a whole number of 16-byte blocks.
pub fn encrypt_cbc(key: &[u8; 16], iv: &[u8; 16], buf: &mut [u8]) -> Result<()> {
    let len = buf.len();
    Aes128CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .map_err(|_| Error::Cipher("plaintext is not a whole number of blocks"))?;
    Ok(())
}

/// Recover the plaintext title key from the wrapped copy stored in a ticket.
pub fn unwrap_title_key(
    keys: &KeySet,
    key_type: KeyType,
    title_id: &[u8; 8],
    wrapped: &[u8; 16],
) -> Result<[u8; 16]> {
    let mut key = *wrapped;
    decrypt_cbc(keys.select(key_type), &title_key_iv(title_id), &mut key)?;
    Ok(key)
}

/// Wrap a plaintext title key for storage in a ticket.
///
/// Exact inverse of [`unwrap_title_key`].
pub fn wrap_title_key(
    keys: &KeySet,
    key_type: KeyType,
    title_id: &[u8; 8],
    title_key: &[u8; 16],
) -> Result<[u8; 16]> {
    let mut wrapped = *title_key;
    encrypt_cbc(keys.select(key_type), &title_key_iv(title_id), &mut wrapped)?;
    Ok(wrapped)
}

/// SHA-1 digest as stored in TMD content records.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// Decrypt one on-disk content block and truncate it to `size` bytes.
///
/// `ciphertext` is the block-rounded region read from the content area.
pub fn decrypt_content(
    ciphertext: &[u8],
    title_key: &[u8; 16],
    index: u16,
    size: usize,
) -> Result<Vec<u8>> {
    if size > ciphertext.len() {
        return Err(Error::Parse("content size exceeds its encrypted block"));
    }
    let mut plain = ciphertext.to_vec();
    decrypt_cbc(title_key, &content_iv(index), &mut plain)?;
    plain.truncate(size);
    Ok(plain)
}

/// Encrypt plaintext content, zero-filling the final partial block.
///
/// The result is the block-rounded ciphertext as stored on disk.
pub fn encrypt_content(plaintext: &[u8], title_key: &[u8; 16], index: u16) -> Result<Vec<u8>> {
    let padded = round_up_to_block(plaintext.len())
        .ok_or(Error::Parse("content too large to encrypt"))?;
    let mut buf = Vec::with_capacity(padded);
    buf.extend_from_slice(plaintext);
    buf.resize(padded, 0);
    encrypt_cbc(title_key, &content_iv(index), &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use aes::Aes128;
    use aes::cipher::{BlockEncrypt, KeyInit};
    use proptest::prelude::*;

    use super::*;

    const TITLE_ID: [u8; 8] = [0x00, 0x01, 0x00, 0x01, 0x57, 0x41, 0x44, 0x4B];

    #[test]
    fn iv_layouts() {
        let iv = title_key_iv(&TITLE_ID);
        assert_eq!(&iv[..8], &TITLE_ID);
        assert_eq!(&iv[8..], &[0u8; 8]);

        let iv = content_iv(0x0102);
        assert_eq!(iv[0], 0x01);
        assert_eq!(iv[1], 0x02);
        assert!(iv[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn wrap_matches_single_block_aes() {
        // One CBC block is AES(key, plaintext ^ iv).
        let keys = KeySet::new();
        let title_key = [0x5Au8; 16];
        let iv = title_key_iv(&TITLE_ID);
        let mut block = [0u8; 16];
        for i in 0..16 {
            block[i] = title_key[i] ^ iv[i];
        }
        let cipher = Aes128::new((&keys.common).into());
        let mut expected = aes::Block::from(block);
        cipher.encrypt_block(&mut expected);

        let wrapped = wrap_title_key(&keys, KeyType::Common, &TITLE_ID, &title_key).unwrap();
        assert_eq!(wrapped.as_slice(), expected.as_slice());
    }

    #[test]
    fn key_type_changes_wrapping() {
        let keys = KeySet::new();
        let title_key = [0x11u8; 16];
        let common = wrap_title_key(&keys, KeyType::Common, &TITLE_ID, &title_key).unwrap();
        let korean = wrap_title_key(&keys, KeyType::Korean, &TITLE_ID, &title_key).unwrap();
        let unknown = wrap_title_key(&keys, KeyType::Unknown(9), &TITLE_ID, &title_key).unwrap();
        assert_ne!(common, korean);
        assert_eq!(common, unknown);
    }

    #[test]
    fn content_round_trip_truncates_padding() {
        let key = [0x42u8; 16];
        let plain = b"twenty-one bytes long".to_vec();
        let cipher = encrypt_content(&plain, &key, 3).unwrap();
        assert_eq!(cipher.len(), 32);
        let back = decrypt_content(&cipher, &key, 3, plain.len()).unwrap();
        assert_eq!(back, plain);
    }

    #[test]
    fn content_index_changes_ciphertext() {
        let key = [0x42u8; 16];
        let plain = [0u8; 16];
        assert_ne!(
            encrypt_content(&plain, &key, 0).unwrap(),
            encrypt_content(&plain, &key, 1).unwrap()
        );
    }

    #[test]
    fn ragged_ciphertext_is_a_cipher_failure() {
        let key = [0u8; 16];
        let mut buf = [0u8; 15];
        assert!(matches!(
            decrypt_cbc(&key, &content_iv(0), &mut buf),
            Err(Error::Cipher(_))
        ));
    }

    #[test]
    fn sha1_known_answer() {
        assert_eq!(
            sha1(b"abc"),
            [
                0xA9, 0x99, 0x3E, 0x36, 0x47, 0x06, 0x81, 0x6A, 0xBA, 0x3E, 0x25, 0x71, 0x78, 0x50,
                0xC2, 0x6C, 0x9C, 0xD0, 0xD8, 0x9D
            ]
        );
    }

    proptest! {
        #[test]
        fn unwrap_inverts_wrap(title_key in any::<[u8; 16]>(), title_id in any::<[u8; 8]>(), tag in 0u8..4) {
            let keys = KeySet::new();
            let key_type = KeyType::from(tag);
            let wrapped = wrap_title_key(&keys, key_type, &title_id, &title_key).unwrap();
            let plain = unwrap_title_key(&keys, key_type, &title_id, &wrapped).unwrap();
            prop_assert_eq!(plain, title_key);
            let rewrapped = wrap_title_key(&keys, key_type, &title_id, &plain).unwrap();
            prop_assert_eq!(rewrapped, wrapped);
        }
    }
}
