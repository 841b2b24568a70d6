//! Codecs for the sections of a WAD package.
//!
//! Each submodule targets one section. All codecs follow the same
//! conventions:
//!
//! * **In-memory** - parsers take a byte slice and every read is
//!   bounds-checked; a short buffer is an [`crate::Error::OutOfBoundsRead`],
//!   never a panic.
//! * **Big-endian** - all on-disk integers are big-endian and converted at
//!   the parse/serialize boundary.
//! * **Symmetric** - every `parse` has a matching `to_bytes` that writes the
//!   same fields in the same order, opaque blobs (signatures, issuers, ECDH
//!   data, reserved fields) included verbatim.
//! * **Crypto is delegated** - key unwrapping and content encryption come
//!   from [`crate::crypto::title`]; the codecs only decide when to apply it.
//!
//! ## Format overview
//!
//! | Module      | Section | Description |
//! |-------------|---------|-------------|
//! | [`wad`]     | Package | Header, section ordering and alignment; drives the other codecs |
//! | [`ticket`]  | Ticket  | License record holding the wrapped title key |
//! | [`tmd`]     | TMD     | Title metadata and the content record table |
//! | [`content`] | Content | Per-content decryption, encryption and SHA-1 verification |

pub mod content;
pub mod ticket;
pub mod tmd;
pub mod wad;
