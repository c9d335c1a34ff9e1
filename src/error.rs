#[derive(Debug, thiserror::Error, thiserror_ext::Construct)]
#[non_exhaustive]
pub enum Error {
	#[error("password required")]
	MissingPassword,

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("unknown algorithm {0:?}")]
	UnknownAlgorithm(String),

	#[error("invalid key length for {algorithm}: expected {expected} bytes, got {actual}")]
	InvalidKeyLength {
		algorithm: String,
		expected: usize,
		actual: usize,
	},

	#[error("invalid IV length for {algorithm}: expected {expected} bytes, got {actual}")]
	InvalidIvLength {
		algorithm: String,
		expected: String,
		actual: usize,
	},

	#[error("{0} does not produce an authentication tag")]
	AuthTagUnsupported(String),

	#[error("{0} requires an authentication tag")]
	AuthTagRequired(String),

	#[error("failed to encrypt plaintext")]
	Encryption,

	#[error("failed to decrypt ciphertext")]
	Decryption,

	#[error("authentication tag verification failed")]
	Authentication,

	#[error("decrypted content is not valid UTF-8")]
	InvalidUtf8,

	#[error("envelope decoding failure on {element}: {cause:?}")]
	Decoding {
		element: String,
		cause: ciborium_ll::Error<std::io::Error>,
	},

	#[error("envelope encoding failure on {element}: {cause}")]
	Encoding {
		element: String,
		cause: std::io::Error,
	},

	#[error("invalid envelope: {0}")]
	InvalidEnvelope(String),

	#[error("invalid {encoding} text: {reason}")]
	TextDecoding { encoding: String, reason: String },

	#[error("CAN'T HAPPEN: {0}")]
	Insanity(String),
}

/// The broad category an [`Error`] falls into.
///
/// This is what a caller generally wants to branch on: a [`Config`](ErrorKind::Config) error
/// means the call itself was malformed and no cryptography happened, a
/// [`Cipher`](ErrorKind::Cipher) error means the algorithm, key, IV or envelope was unusable (most
/// often: wrong password, or corrupted data), and an
/// [`Authentication`](ErrorKind::Authentication) error means an AEAD tag did not verify, which
/// is what tampering looks like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	Config,
	Cipher,
	Authentication,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::MissingPassword | Self::InvalidConfig(_) => ErrorKind::Config,
			Self::Authentication => ErrorKind::Authentication,
			Self::UnknownAlgorithm(_)
			| Self::InvalidKeyLength { .. }
			| Self::InvalidIvLength { .. }
			| Self::AuthTagUnsupported(_)
			| Self::AuthTagRequired(_)
			| Self::Encryption
			| Self::Decryption
			| Self::InvalidUtf8
			| Self::Decoding { .. }
			| Self::Encoding { .. }
			| Self::InvalidEnvelope(_)
			| Self::TextDecoding { .. }
			| Self::Insanity(_) => ErrorKind::Cipher,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kinds() {
		assert_eq!(ErrorKind::Config, Error::MissingPassword.kind());
		assert_eq!(ErrorKind::Config, Error::invalid_config("nope").kind());
		assert_eq!(ErrorKind::Cipher, Error::unknown_algorithm("rot13").kind());
		assert_eq!(ErrorKind::Cipher, Error::invalid_envelope("short").kind());
		assert_eq!(ErrorKind::Cipher, Error::Decryption.kind());
		assert_eq!(ErrorKind::Authentication, Error::Authentication.kind());
	}

	#[test]
	fn messages_name_the_problem() {
		let e = Error::invalid_key_length("aes-128-cbc", 16usize, 32usize);
		assert_eq!(
			"invalid key length for aes-128-cbc: expected 16 bytes, got 32",
			e.to_string()
		);

		let e = Error::auth_tag_unsupported("aes-256-cbc");
		assert_eq!(
			"aes-256-cbc does not produce an authentication tag",
			e.to_string()
		);
	}
}
