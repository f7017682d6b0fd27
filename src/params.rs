//! Typed key/value parameter exchange between a host and the provider.
//!
//! The host describes what it wants to read or write as an ordered list of
//! [`Param`] descriptors. Get-style calls fill the recognized entries and leave
//! unrecognized ones untouched; set-style calls apply the recognized entries and
//! ignore the rest. Both directions fail when a recognized name carries the
//! wrong kind. Schema queries return static [`ParamDescriptor`] tables so a host
//! can introspect the surface without a live context.

use crate::error::ProviderError;

/// Provider-level parameter: the provider version string.
pub const PARAM_VERSION: &str = "version";
/// Provider-level parameter: extra build information, reported only when non-empty.
pub const PARAM_BUILDINFO: &str = "buildinfo";
/// Provider-level parameter: the cipher block size in bytes (always 1).
pub const PARAM_BLOCKSIZE: &str = "blocksize";
/// Context-level parameter: the configured key length in bytes.
pub const PARAM_KEYLEN: &str = "keylen";

/// The kinds of values the exchange protocol carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    UnsignedInteger,
    Utf8String,
}

/// A typed parameter payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    UnsignedInteger(u64),
    Utf8String(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::UnsignedInteger(_) => ParamKind::UnsignedInteger,
            ParamValue::Utf8String(_) => ParamKind::Utf8String,
        }
    }
}

/// One entry in a caller-supplied exchange list.
///
/// Names must be unique within a list. A request entry starts with no value;
/// a set entry carries the value to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    name: String,
    kind: ParamKind,
    value: Option<ParamValue>,
}

impl Param {
    /// Builds an empty request slot for an unsigned integer parameter.
    pub fn request_uint(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::UnsignedInteger,
            value: None,
        }
    }

    /// Builds an empty request slot for a UTF-8 string parameter.
    pub fn request_utf8(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Utf8String,
            value: None,
        }
    }

    /// Builds a filled unsigned integer entry, ready to be applied by a setter.
    pub fn uint(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::UnsignedInteger,
            value: Some(ParamValue::UnsignedInteger(value)),
        }
    }

    /// Builds a filled UTF-8 string entry.
    pub fn utf8(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Utf8String,
            value: Some(ParamValue::Utf8String(value.into())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn value(&self) -> Option<&ParamValue> {
        self.value.as_ref()
    }

    /// Returns the filled integer value, if any.
    pub fn as_uint(&self) -> Option<u64> {
        match self.value {
            Some(ParamValue::UnsignedInteger(v)) => Some(v),
            _ => None,
        }
    }

    /// Returns the filled string value, if any.
    pub fn as_utf8(&self) -> Option<&str> {
        match &self.value {
            Some(ParamValue::Utf8String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Fills this slot with an unsigned integer, checking the declared kind.
    pub fn fill_uint(&mut self, value: u64) -> Result<(), ProviderError> {
        if self.kind != ParamKind::UnsignedInteger {
            return Err(ProviderError::ParamKindMismatch {
                name: self.name.clone(),
                expected: ParamKind::UnsignedInteger,
                found: self.kind,
            });
        }
        self.value = Some(ParamValue::UnsignedInteger(value));
        Ok(())
    }

    /// Fills this slot with a UTF-8 string, checking the declared kind.
    pub fn fill_utf8(&mut self, value: &str) -> Result<(), ProviderError> {
        if self.kind != ParamKind::Utf8String {
            return Err(ProviderError::ParamKindMismatch {
                name: self.name.clone(),
                expected: ParamKind::Utf8String,
                found: self.kind,
            });
        }
        self.value = Some(ParamValue::Utf8String(value.to_owned()));
        Ok(())
    }

    /// Reads this entry as an unsigned integer to apply, checking kind and presence.
    pub fn apply_uint(&self) -> Result<u64, ProviderError> {
        match &self.value {
            Some(ParamValue::UnsignedInteger(v)) => Ok(*v),
            Some(other) => Err(ProviderError::ParamKindMismatch {
                name: self.name.clone(),
                expected: ParamKind::UnsignedInteger,
                found: other.kind(),
            }),
            None => Err(ProviderError::ParamMissingValue {
                name: self.name.clone(),
            }),
        }
    }
}

/// A `{name, kind}` pair in a static schema table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl ParamDescriptor {
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self { name, kind }
    }
}
