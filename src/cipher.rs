//! The Vigenère cipher: context lifecycle and the streaming transform.
//!
//! The transform is a repeating-key additive stream cipher with a block size
//! of one byte: each output byte is the input byte plus the key byte under the
//! keystream cursor, modulo 256. Decryption installs the modular negation of
//! the key at init time, so the same `update` loop serves both directions.
//! This is deliberately weak; the cipher exists to exercise the provider
//! protocol, nothing more.

use std::env;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;
use zeroize::Zeroizing;

use crate::error::{ProviderError, ReasonCode};
use crate::params::{Param, ParamDescriptor, ParamKind, PARAM_KEYLEN};
use crate::provider::{CipherAlgorithm, CipherContext, ProviderHandle};

/// Identifier the host uses to select this algorithm among providers.
pub const VIGENERE_IDENTITY: &str = "vigenere:1.3.6.1.4.1.5168.4711.22087.1";

/// The cipher operates on single bytes; there is no buffering and no padding.
pub const BLOCK_SIZE: usize = 1;

/// Default configured key length in bytes (128 bits) absent any override.
pub const DEFAULT_KEY_LENGTH: usize = 16;

/// Environment variable that overrides the default key length, read once.
pub const KEY_LENGTH_ENV: &str = "VIGENERE_KEYLEN";

static KEY_LENGTH_OVERRIDE: Lazy<Option<usize>> = Lazy::new(|| {
    env::var(KEY_LENGTH_ENV)
        .ok()
        .map(|raw| parse_key_length(&raw))
});

/// Returns the module-wide default key length in bytes, honoring the
/// `VIGENERE_KEYLEN` override captured at first use.
pub fn default_key_length() -> usize {
    KEY_LENGTH_OVERRIDE.unwrap_or(DEFAULT_KEY_LENGTH)
}

/// `strtoul(raw, NULL, 0)` semantics: `0x` prefix selects hex, a leading `0`
/// selects octal, anything unparseable yields 0.
fn parse_key_length(raw: &str) -> usize {
    let s = raw.trim();
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
    {
        (hex, 16)
    } else if s.starts_with('0') {
        (s, 8)
    } else {
        (s, 10)
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    usize::from_str_radix(&digits[..end], radix).unwrap_or(0)
}

/// Which key schedule an init call installs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

static ALGORITHM_GETTABLE_PARAMS: [ParamDescriptor; 1] =
    [ParamDescriptor::new(PARAM_KEYLEN, ParamKind::UnsignedInteger)];

static CONTEXT_GETTABLE_PARAMS: [ParamDescriptor; 1] =
    [ParamDescriptor::new(PARAM_KEYLEN, ParamKind::UnsignedInteger)];

static CONTEXT_SETTABLE_PARAMS: [ParamDescriptor; 1] =
    [ParamDescriptor::new(PARAM_KEYLEN, ParamKind::UnsignedInteger)];

/// The Vigenère algorithm, registered once at load.
#[derive(Debug, Default)]
pub struct Vigenere;

impl CipherAlgorithm for Vigenere {
    fn identity(&self) -> &'static str {
        VIGENERE_IDENTITY
    }

    fn new_context(&self, provider: Arc<ProviderHandle>) -> Box<dyn CipherContext> {
        Box::new(VigenereContext::new(provider))
    }

    fn get_params(&self, params: &mut [Param]) -> Result<(), ProviderError> {
        for param in params.iter_mut() {
            if param.name() == PARAM_KEYLEN {
                param.fill_uint(default_key_length() as u64)?;
            }
        }
        Ok(())
    }

    fn gettable_params(&self) -> &'static [ParamDescriptor] {
        &ALGORITHM_GETTABLE_PARAMS
    }

    fn gettable_ctx_params(&self) -> &'static [ParamDescriptor] {
        &CONTEXT_GETTABLE_PARAMS
    }

    fn settable_ctx_params(&self) -> &'static [ParamDescriptor] {
        &CONTEXT_SETTABLE_PARAMS
    }
}

/// Per-session cipher state.
///
/// A context is driven by exactly one logical call sequence at a time; callers
/// that want parallelism duplicate a context per worker. The provider handle
/// is the only state shared between a context and its duplicates.
#[derive(Debug)]
pub struct VigenereContext {
    provider: Arc<ProviderHandle>,
    /// Configured length in bytes, consulted by the host when sizing keys.
    key_length: usize,
    /// Installed key schedule; already negated for decryption.
    key: Option<Zeroizing<Vec<u8>>>,
    /// Index of the key byte applied to the next input byte.
    cursor: usize,
    direction: Direction,
    /// True between the first `update` on the current key and the next `finalize`.
    ongoing: bool,
}

impl VigenereContext {
    /// Creates an uninitialized context with the module default key length.
    pub fn new(provider: Arc<ProviderHandle>) -> Self {
        Self {
            provider,
            key_length: default_key_length(),
            key: None,
            cursor: 0,
            direction: Direction::Encrypt,
            ongoing: false,
        }
    }

    /// Prepares the context for encryption, installing `key` verbatim.
    ///
    /// `None` keeps the current key material and only rewinds the stream,
    /// matching the host flow where the cipher is selected before the key is
    /// known. An empty key slice means the host never settled on a key length
    /// and fails with [`ProviderError::NoKeyLengthSet`], leaving the context
    /// unchanged.
    pub fn encrypt_init(&mut self, key: Option<&[u8]>) -> Result<(), ProviderError> {
        self.init(key, Direction::Encrypt)
    }

    /// Prepares the context for decryption.
    ///
    /// The installed schedule is the byte-wise modular negation
    /// `(256 - key[i]) mod 256`, the additive inverse of the encryption step,
    /// so callers pass the same key K for both directions.
    pub fn decrypt_init(&mut self, key: Option<&[u8]>) -> Result<(), ProviderError> {
        self.init(key, Direction::Decrypt)
    }

    fn init(&mut self, key: Option<&[u8]>, direction: Direction) -> Result<(), ProviderError> {
        if let Some(key_bytes) = key {
            if key_bytes.is_empty() {
                self.provider.errors().raise(ReasonCode::NoKeyLengthSet);
                return Err(ProviderError::NoKeyLengthSet);
            }
            let schedule = match direction {
                Direction::Encrypt => key_bytes.to_vec(),
                Direction::Decrypt => key_bytes.iter().map(|b| b.wrapping_neg()).collect(),
            };
            // Replacing the option drops (and wipes) any previous schedule.
            self.key = Some(Zeroizing::new(schedule));
            debug!(
                "installed {:?} key schedule of {} bytes",
                direction,
                key_bytes.len()
            );
        }
        self.direction = direction;
        self.cursor = 0;
        self.ongoing = false;
        Ok(())
    }

    /// Transforms `input` into `out`, advancing the keystream cursor.
    ///
    /// Requires `out` to hold at least `input.len()` bytes and an installed
    /// key; violating either fails without writing any output. On success the
    /// number of bytes written equals `input.len()` exactly and the stream is
    /// marked ongoing.
    pub fn update(&mut self, out: &mut [u8], input: &[u8]) -> Result<usize, ProviderError> {
        if out.len() < input.len() {
            return Err(ProviderError::OutputBufferTooSmall {
                needed: input.len(),
                capacity: out.len(),
            });
        }
        let key = self.key.as_ref().ok_or(ProviderError::KeyNotSet)?;
        let mut cursor = self.cursor;
        for (dst, src) in out.iter_mut().zip(input.iter()) {
            *dst = src.wrapping_add(key[cursor]);
            cursor += 1;
            if cursor == key.len() {
                cursor = 0;
            }
        }
        self.cursor = cursor;
        self.ongoing = true;
        Ok(input.len())
    }

    /// Ends the current stream. Block size is 1 and there is no padding, so
    /// finalize never emits bytes; it reports zero output and returns the
    /// context to idle so the key length may be reconfigured again.
    pub fn finalize(&mut self, _out: &mut [u8]) -> Result<usize, ProviderError> {
        self.ongoing = false;
        Ok(0)
    }

    /// Fills recognized entries from context state, leaving others untouched.
    /// `keylen` is reported only while a nonzero length is configured.
    pub fn get_params(&self, params: &mut [Param]) -> Result<(), ProviderError> {
        if self.key_length == 0 {
            return Ok(());
        }
        for param in params.iter_mut() {
            if param.name() == PARAM_KEYLEN {
                param.fill_uint(self.key_length as u64)?;
            }
        }
        Ok(())
    }

    /// Applies recognized entries, ignoring unrecognized ones.
    ///
    /// Fails with [`ProviderError::OngoingOperation`] (also raised through the
    /// error bridge) while a transform is mid-stream: resizing the configured
    /// length would desynchronize cursor and key-length semantics. The new
    /// length takes effect at the next init; it never resizes an installed key.
    pub fn set_params(&mut self, params: &[Param]) -> Result<(), ProviderError> {
        if self.ongoing {
            self.provider.errors().raise(ReasonCode::OngoingOperation);
            return Err(ProviderError::OngoingOperation);
        }
        for param in params {
            if param.name() == PARAM_KEYLEN {
                let value = param.apply_uint()?;
                self.key_length = usize::try_from(value).map_err(|_| {
                    ProviderError::ParamValueOutOfRange {
                        name: param.name().to_owned(),
                    }
                })?;
            }
        }
        Ok(())
    }

    /// Deep copy: fresh key buffer, copied cursor/direction/ongoing state.
    /// Only the immutable provider handle is shared with the source.
    pub fn duplicate(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            key_length: self.key_length,
            key: self.key.clone(),
            cursor: self.cursor,
            direction: self.direction,
            ongoing: self.ongoing,
        }
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_ongoing(&self) -> bool {
        self.ongoing
    }
}

impl CipherContext for VigenereContext {
    fn encrypt_init(&mut self, key: Option<&[u8]>) -> Result<(), ProviderError> {
        VigenereContext::encrypt_init(self, key)
    }

    fn decrypt_init(&mut self, key: Option<&[u8]>) -> Result<(), ProviderError> {
        VigenereContext::decrypt_init(self, key)
    }

    fn update(&mut self, out: &mut [u8], input: &[u8]) -> Result<usize, ProviderError> {
        VigenereContext::update(self, out, input)
    }

    fn finalize(&mut self, out: &mut [u8]) -> Result<usize, ProviderError> {
        VigenereContext::finalize(self, out)
    }

    fn duplicate(&self) -> Box<dyn CipherContext> {
        Box::new(VigenereContext::duplicate(self))
    }

    fn get_params(&self, params: &mut [Param]) -> Result<(), ProviderError> {
        VigenereContext::get_params(self, params)
    }

    fn set_params(&mut self, params: &[Param]) -> Result<(), ProviderError> {
        VigenereContext::set_params(self, params)
    }
}
