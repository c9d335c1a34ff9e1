use secrecy::{ExposeSecret as _, SecretString};

use super::{Algorithm, Error, TextEncoding};

/// Where the IV for an encryption comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IvPolicy {
	/// A fresh random IV for every encryption, stored in the envelope.
	#[default]
	Random,

	/// No IV in the envelope; one is derived from the key alone.
	///
	/// This makes encryption deterministic: the same plaintext and password always produce the
	/// same envelope, which tells an observer when a message repeats.
	Implicit,

	/// Exactly these bytes, stored in the envelope.  Also deterministic.
	Fixed(Vec<u8>),
}

impl From<bool> for IvPolicy {
	fn from(random: bool) -> Self {
		if random { Self::Random } else { Self::Implicit }
	}
}

impl From<Vec<u8>> for IvPolicy {
	fn from(iv: Vec<u8>) -> Self {
		Self::Fixed(iv)
	}
}

impl From<&[u8]> for IvPolicy {
	fn from(iv: &[u8]) -> Self {
		Self::Fixed(iv.to_vec())
	}
}

impl<const N: usize> From<[u8; N]> for IvPolicy {
	fn from(iv: [u8; N]) -> Self {
		Self::Fixed(iv.to_vec())
	}
}

/// How to encrypt.
///
/// The defaults (from [`Options::default`]) are AES-256-CBC with a random IV, no authentication
/// tag, and raw binary output.  There is no default password; one must be set with
/// [`Options::password`] before encrypting.
///
/// ```rust
/// use sealed_envelope::{IvPolicy, Options, TextEncoding};
///
/// let opts = Options::default()
///     .password("correct horse battery staple")
///     .algorithm("aes-256-gcm")
///     .auth_tag(true)
///     .encoding(TextEncoding::Base64);
///
/// assert_eq!("aes-256-gcm", opts.get_algorithm());
/// assert_eq!(&IvPolicy::Random, opts.get_iv());
/// ```
#[derive(Debug)]
pub struct Options {
	pub(crate) algorithm: String,
	pub(crate) iv: IvPolicy,
	pub(crate) auth_tag: bool,
	pub(crate) encoding: Option<TextEncoding>,
	pub(crate) password: Option<SecretString>,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			algorithm: Algorithm::default().to_string(),
			iv: IvPolicy::default(),
			auth_tag: false,
			encoding: None,
			password: None,
		}
	}
}

impl Options {
	pub fn password(mut self, password: impl Into<String>) -> Self {
		let password: String = password.into();
		self.password = Some(SecretString::from(password));
		self
	}

	/// The cipher to use, by name.  Unknown names are only rejected when encryption is attempted.
	pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
		self.algorithm = algorithm.into();
		self
	}

	pub fn iv(mut self, iv: impl Into<IvPolicy>) -> Self {
		self.iv = iv.into();
		self
	}

	pub fn auth_tag(mut self, auth_tag: bool) -> Self {
		self.auth_tag = auth_tag;
		self
	}

	pub fn encoding(mut self, encoding: TextEncoding) -> Self {
		self.encoding = Some(encoding);
		self
	}

	/// Produce raw bytes rather than text.
	pub fn raw(mut self) -> Self {
		self.encoding = None;
		self
	}

	pub fn get_algorithm(&self) -> &str {
		&self.algorithm
	}

	pub fn get_iv(&self) -> &IvPolicy {
		&self.iv
	}

	pub fn get_auth_tag(&self) -> bool {
		self.auth_tag
	}

	pub fn get_encoding(&self) -> Option<TextEncoding> {
		self.encoding
	}

	pub(crate) fn validated_password(&self) -> Result<&str, Error> {
		match &self.password {
			Some(p) if !p.expose_secret().is_empty() => Ok(p.expose_secret()),
			_ => Err(Error::MissingPassword),
		}
	}
}

/// Per-call changes to a bound [`Encryptor`](super::Encryptor)'s options.
///
/// Anything left unset keeps the bound value.  The password cannot be overridden.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
	pub(crate) algorithm: Option<String>,
	pub(crate) iv: Option<IvPolicy>,
	pub(crate) auth_tag: Option<bool>,
	pub(crate) encoding: Option<Option<TextEncoding>>,
}

impl Overrides {
	pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
		self.algorithm = Some(algorithm.into());
		self
	}

	pub fn iv(mut self, iv: impl Into<IvPolicy>) -> Self {
		self.iv = Some(iv.into());
		self
	}

	pub fn auth_tag(mut self, auth_tag: bool) -> Self {
		self.auth_tag = Some(auth_tag);
		self
	}

	pub fn encoding(mut self, encoding: TextEncoding) -> Self {
		self.encoding = Some(Some(encoding));
		self
	}

	pub fn raw(mut self) -> Self {
		self.encoding = Some(None);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults() {
		let opts = Options::default();

		assert_eq!("aes-256-cbc", opts.get_algorithm());
		assert_eq!(&IvPolicy::Random, opts.get_iv());
		assert!(!opts.get_auth_tag());
		assert_eq!(None, opts.get_encoding());
		assert!(matches!(opts.validated_password(), Err(Error::MissingPassword)));
	}

	#[test]
	fn empty_password_is_no_password() {
		let opts = Options::default().password("");
		assert!(matches!(opts.validated_password(), Err(Error::MissingPassword)));

		let opts = Options::default().password("hunter2");
		assert_eq!("hunter2", opts.validated_password().unwrap());
	}

	#[test]
	fn password_is_not_debug_printed() {
		let opts = Options::default().password("hunter2");
		assert!(!format!("{opts:?}").contains("hunter2"));
	}

	#[test]
	fn iv_policy_conversions() {
		assert_eq!(IvPolicy::Random, IvPolicy::from(true));
		assert_eq!(IvPolicy::Implicit, IvPolicy::from(false));
		assert_eq!(IvPolicy::Fixed(vec![0u8; 16]), IvPolicy::from([0u8; 16]));
		assert_eq!(IvPolicy::Fixed(vec![1, 2]), IvPolicy::from(vec![1u8, 2]));
	}

	#[test]
	fn encoding_can_be_switched_off() {
		let opts = Options::default().encoding(TextEncoding::Hex).raw();
		assert_eq!(None, opts.get_encoding());

		let o = Overrides::default().raw();
		assert_eq!(Some(None), o.encoding);
	}
}
