//! Cryptographic operations for Wii titles.
//!
//! All functions accept already-loaded key material; the fixed wrapping keys
//! live in [`crate::keys::KeySet`]. Signatures are never checked here: they
//! are carried as opaque bytes by the format codecs.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`title`] | AES-128-CBC title-key wrapping, per-content encryption, SHA-1 content hashes |
//!
//! ## Key hierarchy (brief)
//!
//! ```text
//! common / korean / vwii key (16 bytes, chosen by ticket key type)
//!   └── AES-CBC, IV = title id || 0u64
//!         └── title key (16 bytes, wrapped in the ticket)
//!               └── AES-CBC, IV = content index (u16 BE) || 0 * 14
//!                     └── content block plaintext, SHA-1 checked against the TMD
//! ```

pub mod title;
