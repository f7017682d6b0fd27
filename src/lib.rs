//! A pluggable Vigenère stream-cipher provider.
//!
//! The crate models the capability-dispatch protocol a host cryptographic
//! library drives a loadable algorithm module through: load entrypoint,
//! operation negotiation, typed parameter exchange, an error-reporting bridge
//! back into the host, and the per-session cipher context lifecycle.
//!
//! The cipher itself is a repeating-key additive stream cipher. It is
//! intentionally weak, exists only to exercise the protocol, and should
//! **not** be used for production security.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vigenere_provider::{
//!     provider_init, CoreHandle, ErrorReporter, OperationKind, ReasonCode,
//!     SourceLocation, UpcallTable, VIGENERE_IDENTITY,
//! };
//!
//! struct StderrReporter;
//!
//! impl ErrorReporter for StderrReporter {
//!     fn report(&self, reason: ReasonCode, location: Option<SourceLocation>) {
//!         eprintln!("provider error {}: {:?}", reason.code(), location);
//!     }
//! }
//!
//! let provider = provider_init(
//!     CoreHandle::new(0),
//!     UpcallTable::new(Arc::new(StderrReporter)),
//! )
//! .expect("load");
//!
//! let cipher = provider.fetch_cipher(VIGENERE_IDENTITY).expect("registered");
//! let mut ctx = cipher.new_context(Arc::clone(provider.handle()));
//! ctx.encrypt_init(Some(b"sixteen byte key")).unwrap();
//!
//! let mut ciphertext = [0u8; 5];
//! ctx.update(&mut ciphertext, b"hello").unwrap();
//! assert_eq!(provider.query_operation(OperationKind::Cipher).unwrap().len(), 1);
//! ```

pub mod cipher;
pub mod error;
pub mod params;
pub mod provider;

pub use crate::cipher::{
    default_key_length, Direction, Vigenere, VigenereContext, BLOCK_SIZE, DEFAULT_KEY_LENGTH,
    KEY_LENGTH_ENV, VIGENERE_IDENTITY,
};
pub use crate::error::{
    reason_strings, ErrorBridge, ErrorReporter, ProviderError, ReasonCode, ReasonString,
    SourceLocation,
};
pub use crate::params::{
    Param, ParamDescriptor, ParamKind, ParamValue, PARAM_BLOCKSIZE, PARAM_BUILDINFO, PARAM_KEYLEN,
    PARAM_VERSION,
};
pub use crate::provider::{
    provider_init, CipherAlgorithm, CipherContext, CoreHandle, OperationKind, Provider,
    ProviderHandle, UpcallTable,
};
