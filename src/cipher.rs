use aes::{Aes128, Aes192, Aes256};
use aes_gcm::{
	AesGcm,
	aead::{AeadCore, AeadInPlace, KeyInit, Nonce, Tag},
};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use chacha20poly1305::ChaCha20Poly1305;
use typenum::{U12, U16, Unsigned};

use super::{Algorithm, Error, Key};

/// The output of a sealing operation: the ciphertext, plus the authentication tag for AEAD modes.
#[derive(Clone, Debug)]
pub(crate) struct Sealed {
	pub(crate) content: Vec<u8>,
	pub(crate) auth_tag: Option<Vec<u8>>,
}

/// Encrypt `plaintext` in one shot.
///
/// AEAD algorithms must be asked for their tag (`with_tag`), since without it the result could
/// never be opened again; non-AEAD algorithms must not be.
#[tracing::instrument(level = "trace", skip(key, iv, plaintext))]
pub(crate) fn seal(
	algorithm: Algorithm,
	key: &Key,
	iv: &[u8],
	plaintext: &[u8],
	with_tag: bool,
) -> Result<Sealed, Error> {
	check_lengths(algorithm, key, iv)?;

	if with_tag && !algorithm.is_aead() {
		return Err(Error::auth_tag_unsupported(algorithm.name()));
	}
	if !with_tag && algorithm.is_aead() {
		return Err(Error::auth_tag_required(algorithm.name()));
	}

	let key = key.expose_secret();

	match algorithm {
		Algorithm::Aes128Cbc => cbc_seal::<cbc::Encryptor<Aes128>>(key, iv, plaintext),
		Algorithm::Aes192Cbc => cbc_seal::<cbc::Encryptor<Aes192>>(key, iv, plaintext),
		Algorithm::Aes256Cbc => cbc_seal::<cbc::Encryptor<Aes256>>(key, iv, plaintext),
		Algorithm::Aes128Gcm if iv.len() == 12 => {
			aead_seal::<AesGcm<Aes128, U12>>(key, iv, plaintext)
		}
		Algorithm::Aes128Gcm => aead_seal::<AesGcm<Aes128, U16>>(key, iv, plaintext),
		Algorithm::Aes192Gcm if iv.len() == 12 => {
			aead_seal::<AesGcm<Aes192, U12>>(key, iv, plaintext)
		}
		Algorithm::Aes192Gcm => aead_seal::<AesGcm<Aes192, U16>>(key, iv, plaintext),
		Algorithm::Aes256Gcm if iv.len() == 12 => {
			aead_seal::<AesGcm<Aes256, U12>>(key, iv, plaintext)
		}
		Algorithm::Aes256Gcm => aead_seal::<AesGcm<Aes256, U16>>(key, iv, plaintext),
		Algorithm::ChaCha20Poly1305 => aead_seal::<ChaCha20Poly1305>(key, iv, plaintext),
	}
}

/// Decrypt `content` in one shot, verifying `auth_tag` for AEAD algorithms.
///
/// A missing, mis-sized or mismatched tag is an [`Error::Authentication`], and no plaintext is
/// returned.
#[tracing::instrument(level = "trace", skip(key, iv, content, auth_tag))]
pub(crate) fn open(
	algorithm: Algorithm,
	key: &Key,
	iv: &[u8],
	content: &[u8],
	auth_tag: Option<&[u8]>,
) -> Result<Vec<u8>, Error> {
	check_lengths(algorithm, key, iv)?;

	let tag: &[u8] = match auth_tag {
		Some(_) if !algorithm.is_aead() => {
			return Err(Error::auth_tag_unsupported(algorithm.name()));
		}
		Some(tag) => tag,
		None if algorithm.is_aead() => {
			tracing::debug!(%algorithm, "Envelope has no authentication tag");
			return Err(Error::Authentication);
		}
		None => &[],
	};

	let key = key.expose_secret();

	match algorithm {
		Algorithm::Aes128Cbc => cbc_open::<cbc::Decryptor<Aes128>>(key, iv, content),
		Algorithm::Aes192Cbc => cbc_open::<cbc::Decryptor<Aes192>>(key, iv, content),
		Algorithm::Aes256Cbc => cbc_open::<cbc::Decryptor<Aes256>>(key, iv, content),
		Algorithm::Aes128Gcm if iv.len() == 12 => {
			aead_open::<AesGcm<Aes128, U12>>(key, iv, content, tag)
		}
		Algorithm::Aes128Gcm => aead_open::<AesGcm<Aes128, U16>>(key, iv, content, tag),
		Algorithm::Aes192Gcm if iv.len() == 12 => {
			aead_open::<AesGcm<Aes192, U12>>(key, iv, content, tag)
		}
		Algorithm::Aes192Gcm => aead_open::<AesGcm<Aes192, U16>>(key, iv, content, tag),
		Algorithm::Aes256Gcm if iv.len() == 12 => {
			aead_open::<AesGcm<Aes256, U12>>(key, iv, content, tag)
		}
		Algorithm::Aes256Gcm => aead_open::<AesGcm<Aes256, U16>>(key, iv, content, tag),
		Algorithm::ChaCha20Poly1305 => aead_open::<ChaCha20Poly1305>(key, iv, content, tag),
	}
}

fn check_lengths(algorithm: Algorithm, key: &Key, iv: &[u8]) -> Result<(), Error> {
	let key_len = key.expose_secret().len();

	if key_len != algorithm.key_len() {
		return Err(Error::invalid_key_length(
			algorithm.name(),
			algorithm.key_len(),
			key_len,
		));
	}

	if !algorithm.accepts_iv_len(iv.len()) {
		return Err(Error::invalid_iv_length(
			algorithm.name(),
			algorithm.describe_iv_lens(),
			iv.len(),
		));
	}

	Ok(())
}

fn cbc_seal<C: KeyIvInit + BlockEncryptMut>(
	key: &[u8],
	iv: &[u8],
	plaintext: &[u8],
) -> Result<Sealed, Error> {
	let cipher = C::new_from_slices(key, iv)
		.map_err(|_| Error::insanity("CBC rejected a checked key/IV"))?;

	Ok(Sealed {
		content: cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
		auth_tag: None,
	})
}

fn cbc_open<C: KeyIvInit + BlockDecryptMut>(
	key: &[u8],
	iv: &[u8],
	content: &[u8],
) -> Result<Vec<u8>, Error> {
	let cipher = C::new_from_slices(key, iv)
		.map_err(|_| Error::insanity("CBC rejected a checked key/IV"))?;

	// Bad padding is what a wrong key usually looks like
	cipher
		.decrypt_padded_vec_mut::<Pkcs7>(content)
		.map_err(|_| Error::Decryption)
}

fn aead_seal<A: KeyInit + AeadInPlace>(
	key: &[u8],
	iv: &[u8],
	plaintext: &[u8],
) -> Result<Sealed, Error> {
	if iv.len() != <<A as AeadCore>::NonceSize as Unsigned>::USIZE {
		return Err(Error::insanity("nonce size mismatch after IV length check"));
	}

	let cipher =
		A::new_from_slice(key).map_err(|_| Error::insanity("AEAD rejected a checked key"))?;

	let mut content = plaintext.to_vec();
	let tag = cipher
		.encrypt_in_place_detached(Nonce::<A>::from_slice(iv), b"", &mut content)
		.map_err(|_| Error::Encryption)?;

	Ok(Sealed {
		content,
		auth_tag: Some(tag.to_vec()),
	})
}

fn aead_open<A: KeyInit + AeadInPlace>(
	key: &[u8],
	iv: &[u8],
	content: &[u8],
	tag: &[u8],
) -> Result<Vec<u8>, Error> {
	if iv.len() != <<A as AeadCore>::NonceSize as Unsigned>::USIZE {
		return Err(Error::insanity("nonce size mismatch after IV length check"));
	}

	if tag.len() != <<A as AeadCore>::TagSize as Unsigned>::USIZE {
		tracing::debug!(len = tag.len(), "Authentication tag has the wrong length");
		return Err(Error::Authentication);
	}

	let cipher =
		A::new_from_slice(key).map_err(|_| Error::insanity("AEAD rejected a checked key"))?;

	let mut plaintext = content.to_vec();
	cipher
		.decrypt_in_place_detached(
			Nonce::<A>::from_slice(iv),
			b"",
			&mut plaintext,
			Tag::<A>::from_slice(tag),
		)
		.map_err(|_| Error::Authentication)?;

	Ok(plaintext)
}
