//! **wadkit** - reader and writer for Wii WAD title packages.
//!
//! A WAD bundles a certificate chain, a CRL, a ticket carrying the wrapped
//! title key, the title metadata (TMD) and the title's encrypted content
//! blocks. wadkit decodes all of it into owned values, decrypting and
//! SHA-1-checking every content block, and serializes it back with fresh
//! content hashes and section sizes.
//!
//! Signatures and certificates are carried as opaque bytes; nothing here
//! verifies them.
//!
//! # Modules
//! | Module | Contents |
//! |--------|----------|
//! | [`formats::wad`]     | Package container: header, section layout, orchestration |
//! | [`formats::ticket`]  | Ticket codec with title-key unwrapping |
//! | [`formats::tmd`]     | Title metadata codec and content records |
//! | [`formats::content`] | Content blocks and their encryption state |
//! | [`crypto::title`]    | AES-128-CBC key wrapping, content crypto, SHA-1 |
//! | [`keys`]             | Common / Korean / vWii wrapping keys |
//!
//! # Example
//! ```no_run
//! use wadkit::formats::wad::{Wad, WadType};
//!
//! # fn main() -> wadkit::Result<()> {
//! let data = std::fs::read("title.wad")?;
//! let mut wad = Wad::parse(&data)?;
//! wad.set_content(0, b"patched".to_vec())?;
//! std::fs::write("patched.wad", wad.to_bytes(WadType::Installable)?)?;
//! # Ok(())
//! # }
//! ```

pub mod crypto;
pub mod error;
pub mod formats;
pub mod keys;
pub mod utils;

pub use error::{Error, Result};
pub use formats::wad::{Wad, WadType};
