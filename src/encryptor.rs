use secrecy::{ExposeSecret as _, SecretString};
use std::sync::Arc;

use super::{Encrypted, Error, Options, Overrides, codec};

/// A password and set of [`Options`], bound together for repeated use.
///
/// The password is checked once, when the `Encryptor` is created, so every later call can just
/// get on with it.  Cloning is cheap, and clones can be used from any thread.
///
/// # Example
///
/// ```rust
/// use sealed_envelope::{Encryptor, Error, Options, Overrides, TextEncoding};
/// # fn main() -> Result<(), Error> {
///
/// let encryptor = Encryptor::new(
///     Options::default()
///         .password("Some stupid password")
///         .encoding(TextEncoding::Base64),
/// )?;
///
/// let ciphertext = encryptor.encrypt("Som string that I want to encrypt")?;
/// assert!(ciphertext.is_text());
/// assert_eq!("Som string that I want to encrypt", encryptor.decrypt(&ciphertext)?);
///
/// // Individual calls can deviate from the bound options
/// let ciphertext = encryptor.encrypt_with(
///     "Som string that I want to encrypt",
///     &Overrides::default().algorithm("aes-256-gcm").auth_tag(true).raw(),
/// )?;
/// assert!(!ciphertext.is_text());
/// assert_eq!("Som string that I want to encrypt", encryptor.decrypt(&ciphertext)?);
///
/// // No password, no encryptor
/// assert!(matches!(
///     Encryptor::new(Options::default()),
///     Err(Error::MissingPassword)
/// ));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Encryptor {
	inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
	options: Options,
	password: SecretString,
}

impl Encryptor {
	/// Bind `options` (which must include a password) into an [`Encryptor`].
	///
	/// # Errors
	///
	/// Returns [`Error::MissingPassword`] if `options` has no password, or an empty one.
	#[tracing::instrument(level = "debug", skip(options), fields(algorithm = %options.algorithm))]
	pub fn new(mut options: Options) -> Result<Self, Error> {
		options.validated_password()?;

		let password = options.password.take().ok_or(Error::MissingPassword)?;

		Ok(Self {
			inner: Arc::new(Inner { options, password }),
		})
	}

	/// Shorthand for an [`Encryptor`] using the default options.
	pub fn from_password(password: impl Into<String>) -> Result<Self, Error> {
		Self::new(Options::default().password(password))
	}

	/// The options this encryptor was bound with (minus the password).
	pub fn options(&self) -> &Options {
		&self.inner.options
	}

	/// Encrypt `plaintext` using the bound options.
	pub fn encrypt(&self, plaintext: impl AsRef<str>) -> Result<Encrypted, Error> {
		self.encrypt_with(plaintext, &Overrides::default())
	}

	/// Encrypt `plaintext`, with `overrides` taking precedence over the bound options.
	#[tracing::instrument(level = "debug", skip(self, plaintext))]
	pub fn encrypt_with(
		&self,
		plaintext: impl AsRef<str>,
		overrides: &Overrides,
	) -> Result<Encrypted, Error> {
		let options = &self.inner.options;

		codec::seal_message(
			plaintext.as_ref(),
			self.inner.password.expose_secret(),
			overrides.algorithm.as_deref().unwrap_or(&options.algorithm),
			overrides.iv.as_ref().unwrap_or(&options.iv),
			overrides.auth_tag.unwrap_or(options.auth_tag),
			overrides.encoding.unwrap_or(options.encoding),
		)
	}

	/// Decrypt a serialized envelope with the bound password.
	///
	/// Text input is decoded with the bound [`TextEncoding`](super::TextEncoding), or base64 if
	/// none was bound.
	#[tracing::instrument(level = "debug", skip(self, encrypted))]
	pub fn decrypt(&self, encrypted: impl Into<Encrypted>) -> Result<String, Error> {
		codec::decrypt_with_encoding(
			encrypted,
			self.inner.password.expose_secret(),
			self.inner.options.encoding.unwrap_or_default(),
		)
	}
}

/// Bind `options` into an [`Encryptor`]; see [`Encryptor::new`].
pub fn bind(options: Options) -> Result<Encryptor, Error> {
	Encryptor::new(options)
}
