use hkdf::Hkdf;
use sha2::{Digest as _, Sha256};

use super::{Error, Key};

const IMPLICIT_IV_INFO: &[u8] = b"sealed-envelope::implicit-iv";

/// Turn a password into a 256-bit key.
///
/// This is a single SHA-256 over the password's UTF-8 bytes, so the same password always gives the
/// same key.  An empty password is refused before any hashing happens.
///
/// # Errors
///
/// Returns [`Error::MissingPassword`] if `password` is empty.
#[tracing::instrument(level = "trace", skip_all)]
pub fn derive_key(password: &str) -> Result<Key, Error> {
	if password.is_empty() {
		return Err(Error::MissingPassword);
	}

	let mut k = Box::new([0u8; 32]);

	let mut hasher = Sha256::new();
	hasher.update(password.as_bytes());
	hasher.finalize_into((&mut k[..]).into());

	Ok(k.into())
}

/// The IV used when an envelope carries none: a function of the key alone.
pub(crate) fn derive_implicit_iv(key: &Key, len: usize) -> Result<Vec<u8>, Error> {
	let hk = Hkdf::<Sha256>::from_prk(key.expose_secret())
		.map_err(|_| Error::insanity("key shorter than SHA-256 output"))?;

	let mut iv = vec![0u8; len];

	hk.expand(IMPLICIT_IV_INFO, &mut iv)
		.map_err(|_| Error::insanity(format!("HKDF refused to produce {len} bytes")))?;

	Ok(iv)
}
