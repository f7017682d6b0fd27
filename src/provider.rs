//! Provider registration, capability negotiation, and the load entrypoint.
//!
//! A host calls [`provider_init`] with an opaque core token and an upcall
//! table, receives a [`Provider`], and negotiates from there: query the
//! operations it supports, fetch an algorithm by identity, then drive cipher
//! contexts spawned from it. All host-visible upcall state lives inside the
//! [`ProviderHandle`]; there are no process-wide statics, so several
//! independent provider instances can coexist in one process.

use std::sync::Arc;

use log::debug;

use crate::cipher::{Vigenere, BLOCK_SIZE};
use crate::error::{reason_strings, ErrorBridge, ErrorReporter, ProviderError, ReasonString};
use crate::params::{
    Param, ParamDescriptor, ParamKind, PARAM_BLOCKSIZE, PARAM_BUILDINFO, PARAM_VERSION,
};

/// Opaque token handed over by the host at load time. The provider never
/// interprets it; it only stores it for the host's benefit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreHandle(u64);

impl CoreHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host-provided functions the provider may call back into.
pub struct UpcallTable {
    error_reporter: Arc<dyn ErrorReporter>,
}

impl UpcallTable {
    pub fn new(error_reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { error_reporter }
    }
}

/// Immutable per-load state shared read-only by every context the provider
/// spawns. Lives from load until the last context and the [`Provider`] drop.
#[derive(Debug)]
pub struct ProviderHandle {
    core: CoreHandle,
    errors: ErrorBridge,
}

impl ProviderHandle {
    fn new(core: CoreHandle, upcalls: UpcallTable) -> Self {
        Self {
            core,
            errors: ErrorBridge::new(upcalls.error_reporter),
        }
    }

    pub fn core(&self) -> CoreHandle {
        self.core
    }

    pub fn errors(&self) -> &ErrorBridge {
        &self.errors
    }
}

/// Operation kinds a host can ask this provider about. Only `Cipher` is
/// offered here; the rest exist so hosts can probe and be told no.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Cipher,
    Digest,
    KeyExchange,
}

/// An algorithm offered under [`OperationKind::Cipher`].
///
/// One implementing type per algorithm; the registration list maps identities
/// to owned instances, resolved once at load.
pub trait CipherAlgorithm: Send + Sync {
    /// Unique, versionable identifier the host selects this algorithm by.
    fn identity(&self) -> &'static str;

    /// Spawns a fresh session context tied to the provider handle.
    fn new_context(&self, provider: Arc<ProviderHandle>) -> Box<dyn CipherContext>;

    /// Fills recognized algorithm-level entries. `keylen` reports the module
    /// default so a host can size a key before any context exists.
    fn get_params(&self, params: &mut [Param]) -> Result<(), ProviderError>;

    /// Schema of the algorithm-level parameters.
    fn gettable_params(&self) -> &'static [ParamDescriptor];

    /// Schema of the context parameters a host can read, available before any
    /// context exists.
    fn gettable_ctx_params(&self) -> &'static [ParamDescriptor];

    /// Schema of the context parameters a host can write.
    fn settable_ctx_params(&self) -> &'static [ParamDescriptor];
}

/// The per-session operation surface of a cipher.
pub trait CipherContext: Send {
    fn encrypt_init(&mut self, key: Option<&[u8]>) -> Result<(), ProviderError>;
    fn decrypt_init(&mut self, key: Option<&[u8]>) -> Result<(), ProviderError>;
    fn update(&mut self, out: &mut [u8], input: &[u8]) -> Result<usize, ProviderError>;
    fn finalize(&mut self, out: &mut [u8]) -> Result<usize, ProviderError>;
    fn duplicate(&self) -> Box<dyn CipherContext>;
    fn get_params(&self, params: &mut [Param]) -> Result<(), ProviderError>;
    fn set_params(&mut self, params: &[Param]) -> Result<(), ProviderError>;
}

static PROVIDER_GETTABLE_PARAMS: [ParamDescriptor; 3] = [
    ParamDescriptor::new(PARAM_VERSION, ParamKind::Utf8String),
    ParamDescriptor::new(PARAM_BUILDINFO, ParamKind::Utf8String),
    ParamDescriptor::new(PARAM_BLOCKSIZE, ParamKind::UnsignedInteger),
];

fn build_info() -> &'static str {
    option_env!("VIGENERE_BUILDINFO").unwrap_or("")
}

/// A loaded provider instance: the handle plus the algorithms registered
/// under each operation kind.
pub struct Provider {
    handle: Arc<ProviderHandle>,
    ciphers: Vec<Arc<dyn CipherAlgorithm>>,
}

impl Provider {
    /// Shared handle threaded into every context this provider spawns.
    pub fn handle(&self) -> &Arc<ProviderHandle> {
        &self.handle
    }

    /// Returns the algorithm list for a supported operation, `None` for
    /// anything this provider does not offer. Hosts ignore absent slots.
    pub fn query_operation(&self, operation: OperationKind) -> Option<&[Arc<dyn CipherAlgorithm>]> {
        match operation {
            OperationKind::Cipher => Some(&self.ciphers),
            _ => None,
        }
    }

    /// Selects a cipher by its identity string.
    pub fn fetch_cipher(&self, identity: &str) -> Option<Arc<dyn CipherAlgorithm>> {
        self.ciphers
            .iter()
            .find(|algorithm| algorithm.identity() == identity)
            .cloned()
    }

    /// The static reason-code table the host uses to render raised errors.
    pub fn reason_strings(&self) -> &'static [ReasonString] {
        reason_strings()
    }

    /// Fills recognized provider-level entries: `version`, `buildinfo`
    /// (only when non-empty), and the constant `blocksize`.
    pub fn get_params(&self, params: &mut [Param]) -> Result<(), ProviderError> {
        for param in params.iter_mut() {
            match param.name() {
                PARAM_VERSION => param.fill_utf8(env!("CARGO_PKG_VERSION"))?,
                PARAM_BUILDINFO => {
                    let info = build_info();
                    if !info.is_empty() {
                        param.fill_utf8(info)?;
                    }
                }
                PARAM_BLOCKSIZE => param.fill_uint(BLOCK_SIZE as u64)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Schema of the provider-level parameters, queryable without a context.
    pub fn gettable_params() -> &'static [ParamDescriptor] {
        &PROVIDER_GETTABLE_PARAMS
    }
}

/// Load entrypoint. Builds the provider handle around the host upcalls and
/// registers the algorithm table once. `None` is reserved for construction
/// failure per the dispatch protocol; the host must not proceed on `None`.
pub fn provider_init(core: CoreHandle, upcalls: UpcallTable) -> Option<Provider> {
    let handle = Arc::new(ProviderHandle::new(core, upcalls));
    let ciphers: Vec<Arc<dyn CipherAlgorithm>> = vec![Arc::new(Vigenere)];
    debug!(
        "provider loaded with core {:?}, {} cipher(s) registered",
        handle.core(),
        ciphers.len()
    );
    Some(Provider { handle, ciphers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::VIGENERE_IDENTITY;
    use crate::error::{ReasonCode, SourceLocation};
    use crate::params::PARAM_KEYLEN;

    struct SilentReporter;

    impl ErrorReporter for SilentReporter {
        fn report(&self, _reason: ReasonCode, _location: Option<SourceLocation>) {}
    }

    fn load() -> Provider {
        provider_init(
            CoreHandle::new(42),
            UpcallTable::new(Arc::new(SilentReporter)),
        )
        .expect("provider loads")
    }

    #[test]
    fn load_returns_handle_holding_the_core_token() {
        let provider = load();
        assert_eq!(provider.handle().core(), CoreHandle::new(42));
    }

    #[test]
    fn cipher_operation_lists_vigenere() {
        let provider = load();
        let ciphers = provider.query_operation(OperationKind::Cipher).unwrap();
        assert_eq!(ciphers.len(), 1);
        assert_eq!(ciphers[0].identity(), VIGENERE_IDENTITY);
    }

    #[test]
    fn unsupported_operations_are_absent() {
        let provider = load();
        assert!(provider.query_operation(OperationKind::Digest).is_none());
        assert!(provider
            .query_operation(OperationKind::KeyExchange)
            .is_none());
    }

    #[test]
    fn algorithm_reports_the_default_keylen_before_any_context() {
        let provider = load();
        let cipher = provider.fetch_cipher(VIGENERE_IDENTITY).unwrap();

        let mut request = [Param::request_uint(PARAM_KEYLEN)];
        cipher.get_params(&mut request).unwrap();
        assert_eq!(
            request[0].as_uint(),
            Some(crate::cipher::default_key_length() as u64)
        );
        assert!(cipher
            .gettable_params()
            .iter()
            .any(|d| d.name == PARAM_KEYLEN && d.kind == ParamKind::UnsignedInteger));
    }

    #[test]
    fn fetch_by_identity() {
        let provider = load();
        assert!(provider.fetch_cipher(VIGENERE_IDENTITY).is_some());
        assert!(provider.fetch_cipher("caesar:1").is_none());
    }

    #[test]
    fn provider_params_report_version_and_blocksize() {
        let provider = load();
        let mut request = [
            Param::request_utf8(PARAM_VERSION),
            Param::request_uint(PARAM_BLOCKSIZE),
            Param::request_uint(PARAM_KEYLEN),
        ];
        provider.get_params(&mut request).unwrap();
        assert_eq!(request[0].as_utf8(), Some(env!("CARGO_PKG_VERSION")));
        assert_eq!(request[1].as_uint(), Some(1));
        // keylen is a context-level name; the provider leaves it untouched.
        assert!(request[2].as_uint().is_none());
    }

    #[test]
    fn buildinfo_untouched_when_empty() {
        let provider = load();
        let mut request = [Param::request_utf8(PARAM_BUILDINFO)];
        provider.get_params(&mut request).unwrap();
        match build_info() {
            "" => assert!(request[0].as_utf8().is_none()),
            info => assert_eq!(request[0].as_utf8(), Some(info)),
        }
    }

    #[test]
    fn schema_queries_need_no_live_state() {
        let gettable = Provider::gettable_params();
        assert!(gettable
            .iter()
            .any(|d| d.name == PARAM_BLOCKSIZE && d.kind == ParamKind::UnsignedInteger));
        assert!(gettable
            .iter()
            .any(|d| d.name == PARAM_VERSION && d.kind == ParamKind::Utf8String));
    }

    #[test]
    fn contexts_spawned_through_the_dispatch_surface() {
        let provider = load();
        let cipher = provider.fetch_cipher(VIGENERE_IDENTITY).unwrap();
        let mut ctx = cipher.new_context(Arc::clone(provider.handle()));
        ctx.encrypt_init(Some(b"key")).unwrap();
        let mut out = [0u8; 5];
        assert_eq!(ctx.update(&mut out, b"hello").unwrap(), 5);

        // Context parameter schemas are available straight off the algorithm.
        assert_eq!(cipher.gettable_ctx_params().len(), 1);
        assert_eq!(cipher.settable_ctx_params()[0].name, PARAM_KEYLEN);
    }
}
