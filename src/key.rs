use secrecy::ExposeSecret as _;

/// Symmetric key material, as produced by [`derive_key`](super::derive_key).
///
/// The bytes live on the heap inside a [`secrecy::SecretBox`], so they are wiped when the key is
/// dropped, and never show up in `Debug` output.
#[derive(Debug)]
pub struct Key(secrecy::SecretBox<[u8; 32]>);

impl Key {
	pub fn expose_secret(&self) -> &[u8; 32] {
		self.0.expose_secret()
	}
}

impl From<Box<[u8; 32]>> for Key {
	fn from(k: Box<[u8; 32]>) -> Self {
		Key(k.into())
	}
}

impl PartialEq for Key {
	fn eq(&self, other: &Self) -> bool {
		constant_time_eq::constant_time_eq_n(self.expose_secret(), other.expose_secret())
	}
}

impl Eq for Key {}
