use std::{fmt, str::FromStr};

use super::Error;

/// The cipher modes an envelope can be sealed with.
///
/// Algorithms are named on the wire (and in [`Options`](super::Options)) by the same identifiers
/// OpenSSL uses, such as `aes-256-cbc`.  Parsing is case-insensitive; the canonical lowercase
/// form is what gets written into envelopes.
///
/// Keys are always 32 bytes (see [`derive_key`](super::derive_key)), so the 128- and 192-bit AES
/// variants are recognised, but sealing or opening with them fails with
/// [`Error::InvalidKeyLength`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Algorithm {
	Aes128Cbc,
	Aes192Cbc,
	#[default]
	Aes256Cbc,
	Aes128Gcm,
	Aes192Gcm,
	Aes256Gcm,
	ChaCha20Poly1305,
}

impl Algorithm {
	pub const ALL: [Algorithm; 7] = [
		Self::Aes128Cbc,
		Self::Aes192Cbc,
		Self::Aes256Cbc,
		Self::Aes128Gcm,
		Self::Aes192Gcm,
		Self::Aes256Gcm,
		Self::ChaCha20Poly1305,
	];

	pub fn name(self) -> &'static str {
		match self {
			Self::Aes128Cbc => "aes-128-cbc",
			Self::Aes192Cbc => "aes-192-cbc",
			Self::Aes256Cbc => "aes-256-cbc",
			Self::Aes128Gcm => "aes-128-gcm",
			Self::Aes192Gcm => "aes-192-gcm",
			Self::Aes256Gcm => "aes-256-gcm",
			Self::ChaCha20Poly1305 => "chacha20-poly1305",
		}
	}

	pub fn key_len(self) -> usize {
		match self {
			Self::Aes128Cbc | Self::Aes128Gcm => 16,
			Self::Aes192Cbc | Self::Aes192Gcm => 24,
			Self::Aes256Cbc | Self::Aes256Gcm | Self::ChaCha20Poly1305 => 32,
		}
	}

	/// Length of a freshly generated IV for this algorithm.
	pub fn iv_len(self) -> usize {
		match self {
			Self::ChaCha20Poly1305 => 12,
			_ => 16,
		}
	}

	/// Whether an IV of `len` bytes can be used with this algorithm.
	///
	/// GCM takes either the standard 96-bit nonce or a full 128-bit block; everything else wants
	/// exactly [`iv_len`](Self::iv_len) bytes.
	pub fn accepts_iv_len(self, len: usize) -> bool {
		if self.is_gcm() {
			len == 12 || len == 16
		} else {
			len == self.iv_len()
		}
	}

	/// Authenticated modes, which produce (and insist upon) an authentication tag.
	pub fn is_aead(self) -> bool {
		!matches!(self, Self::Aes128Cbc | Self::Aes192Cbc | Self::Aes256Cbc)
	}

	pub(crate) fn is_gcm(self) -> bool {
		matches!(self, Self::Aes128Gcm | Self::Aes192Gcm | Self::Aes256Gcm)
	}

	pub(crate) fn describe_iv_lens(self) -> String {
		if self.is_gcm() {
			"12 or 16".to_string()
		} else {
			self.iv_len().to_string()
		}
	}
}

impl fmt::Display for Algorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Algorithm {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Error> {
		Self::ALL
			.into_iter()
			.find(|a| a.name().eq_ignore_ascii_case(s))
			.ok_or_else(|| Error::unknown_algorithm(s))
	}
}
