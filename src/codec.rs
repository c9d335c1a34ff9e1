use rand::{RngCore, rng};

use super::{
	Algorithm, Encrypted, Envelope, Error, IvPolicy, Key, Options, TextEncoding, cipher, kdf,
	serialize,
};

/// Encrypt `plaintext` with a key derived from the password in `options`.
///
/// Returns the serialized [`Envelope`]: raw bytes, or text if `options` asks for a
/// [`TextEncoding`].
///
/// # Errors
///
/// * [`Error::MissingPassword`] if `options` has no (or an empty) password.  This is checked
///   before anything else happens.
/// * [`Error::UnknownAlgorithm`], [`Error::InvalidKeyLength`] or [`Error::InvalidIvLength`] if
///   the algorithm or a fixed IV can't be used.
/// * [`Error::AuthTagUnsupported`] if an authentication tag was requested from a non-AEAD
///   algorithm, and [`Error::AuthTagRequired`] if an AEAD algorithm was used without one.
#[tracing::instrument(
	level = "debug",
	skip(plaintext, options),
	fields(algorithm = %options.algorithm)
)]
pub fn encrypt(plaintext: impl AsRef<str>, options: &Options) -> Result<Encrypted, Error> {
	let password = options.validated_password()?;

	seal_message(
		plaintext.as_ref(),
		password,
		&options.algorithm,
		&options.iv,
		options.auth_tag,
		options.encoding,
	)
}

/// Decrypt a serialized envelope with `password`.
///
/// Text input is assumed to be base64; use [`decrypt_with_encoding`] if the envelope was
/// stringified some other way.
///
/// # Errors
///
/// * [`Error::MissingPassword`] if `password` is empty, before the envelope is even looked at.
/// * [`Error::TextDecoding`], [`Error::Decoding`] or [`Error::InvalidEnvelope`] if the input
///   isn't a well-formed envelope.
/// * [`Error::Decryption`] if the ciphertext won't decrypt, which is what a wrong password
///   usually looks like for unauthenticated modes.
/// * [`Error::Authentication`] if an AEAD envelope's tag doesn't verify: the wrong password, or
///   the envelope was tampered with.
/// * [`Error::InvalidUtf8`] if what came out isn't text.
pub fn decrypt(
	encrypted: impl Into<Encrypted>,
	password: impl AsRef<str>,
) -> Result<String, Error> {
	decrypt_with_encoding(encrypted, password, TextEncoding::default())
}

/// Like [`decrypt`], but decoding text input with the given [`TextEncoding`].
#[tracing::instrument(level = "debug", skip(encrypted, password))]
pub fn decrypt_with_encoding(
	encrypted: impl Into<Encrypted>,
	password: impl AsRef<str>,
	encoding: TextEncoding,
) -> Result<String, Error> {
	let key = kdf::derive_key(password.as_ref())?;
	let envelope = super::deserialize(encrypted, encoding)?;

	open_envelope(&envelope, &key)
}

pub(crate) fn seal_message(
	plaintext: &str,
	password: &str,
	algorithm: &str,
	iv: &IvPolicy,
	auth_tag: bool,
	encoding: Option<TextEncoding>,
) -> Result<Encrypted, Error> {
	let key = kdf::derive_key(password)?;
	let algorithm: Algorithm = algorithm.parse()?;

	let iv = match iv {
		IvPolicy::Random => {
			let mut iv = vec![0u8; algorithm.iv_len()];
			rng().fill_bytes(&mut iv);
			Some(iv)
		}
		IvPolicy::Implicit => None,
		IvPolicy::Fixed(iv) => Some(iv.clone()),
	};

	tracing::debug!(%algorithm, explicit_iv = iv.is_some(), auth_tag, "Sealing");

	let sealed = match &iv {
		Some(iv) => cipher::seal(algorithm, &key, iv, plaintext.as_bytes(), auth_tag)?,
		None => {
			let implicit = kdf::derive_implicit_iv(&key, algorithm.iv_len())?;
			cipher::seal(algorithm, &key, &implicit, plaintext.as_bytes(), auth_tag)?
		}
	};

	let envelope = Envelope {
		algorithm: algorithm.to_string(),
		iv,
		content: sealed.content,
		auth_tag: sealed.auth_tag,
	};

	serialize(&envelope, encoding)
}

pub(crate) fn open_envelope(envelope: &Envelope, key: &Key) -> Result<String, Error> {
	let algorithm: Algorithm = envelope.algorithm.parse()?;

	tracing::debug!(
		%algorithm,
		explicit_iv = envelope.iv.is_some(),
		auth_tag = envelope.auth_tag.is_some(),
		"Opening"
	);

	let plaintext = match &envelope.iv {
		Some(iv) => cipher::open(
			algorithm,
			key,
			iv,
			&envelope.content,
			envelope.auth_tag.as_deref(),
		)?,
		None => {
			let implicit = kdf::derive_implicit_iv(key, algorithm.iv_len())?;
			cipher::open(
				algorithm,
				key,
				&implicit,
				&envelope.content,
				envelope.auth_tag.as_deref(),
			)?
		}
	};

	String::from_utf8(plaintext).map_err(|_| Error::InvalidUtf8)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ErrorKind, deserialize, test_log};
	use std::sync::Arc;

	const PASSWORD: &str = "Some stupid password";
	const MESSAGE: &str = "Som string that I want to encrypt";

	fn opts() -> Options {
		Options::default().password(PASSWORD)
	}

	fn envelope_of(encrypted: &Encrypted) -> Envelope {
		deserialize(encrypted, TextEncoding::Base64).unwrap()
	}

	fn lorem(len: usize) -> String {
		let words = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod tempor \
		             incididunt ut labore et dolore magna aliqua ";
		words.chars().cycle().take(len).collect()
	}

	#[test]
	fn default_envelope_shape() {
		test_log::init();

		let encrypted = encrypt(MESSAGE, &opts()).unwrap();
		assert!(!encrypted.is_text());

		let envelope = envelope_of(&encrypted);
		assert_eq!("aes-256-cbc", envelope.algorithm);
		assert_eq!(16, envelope.iv.as_ref().unwrap().len());
		assert!(!envelope.content.is_empty());
		assert!(envelope.auth_tag.is_none());

		assert_eq!(MESSAGE, decrypt(&encrypted, PASSWORD).unwrap());
	}

	#[test]
	fn no_password_no_encryption() {
		test_log::init();

		let result = encrypt(MESSAGE, &Options::default());
		assert!(matches!(result, Err(Error::MissingPassword)));

		let result = encrypt(MESSAGE, &Options::default().password(""));
		assert_eq!(ErrorKind::Config, result.unwrap_err().kind());
	}

	#[test]
	fn no_password_no_decryption() {
		test_log::init();

		let encrypted = encrypt(MESSAGE, &opts()).unwrap();
		let result = decrypt(&encrypted, "");
		assert!(matches!(result, Err(Error::MissingPassword)));

		// The password is checked before the (garbage) input is
		let result = decrypt("definitely not an envelope", "");
		assert!(matches!(result, Err(Error::MissingPassword)));
	}

	#[test]
	fn random_iv_gives_different_output() {
		test_log::init();

		let a = encrypt(MESSAGE, &opts()).unwrap();
		let b = encrypt(MESSAGE, &opts()).unwrap();

		assert_ne!(a, b);
		assert_ne!(envelope_of(&a).iv, envelope_of(&b).iv);
		assert_eq!(MESSAGE, decrypt(&a, PASSWORD).unwrap());
		assert_eq!(MESSAGE, decrypt(&b, PASSWORD).unwrap());
	}

	#[test]
	fn implicit_iv_is_deterministic() {
		test_log::init();

		let o = opts().iv(false).encoding(TextEncoding::Base64);
		let a = encrypt(MESSAGE, &o).unwrap();
		let b = encrypt(MESSAGE, &o).unwrap();

		assert_eq!(a, b);

		let envelope = envelope_of(&a);
		assert_eq!("aes-256-cbc", envelope.algorithm);
		assert!(envelope.iv.is_none());
		assert!(envelope.auth_tag.is_none());

		assert_eq!(MESSAGE, decrypt(&a, PASSWORD).unwrap());
	}

	#[test]
	fn fixed_iv_is_deterministic() {
		test_log::init();

		let o = opts().iv([0u8; 16]).encoding(TextEncoding::Base64);
		let a = encrypt(MESSAGE, &o).unwrap();
		let b = encrypt(MESSAGE, &o).unwrap();

		assert_eq!(a, b);
		assert_eq!(Some(vec![0u8; 16]), envelope_of(&a).iv);
		assert_eq!(MESSAGE, decrypt(&a, PASSWORD).unwrap());
	}

	#[test]
	fn fixed_iv_of_the_wrong_length() {
		test_log::init();

		let result = encrypt(MESSAGE, &opts().iv([0u8; 8]));
		assert!(matches!(result, Err(Error::InvalidIvLength { actual: 8, .. })));
		assert_eq!(ErrorKind::Cipher, result.unwrap_err().kind());
	}

	#[test]
	fn gcm_with_auth_tag() {
		test_log::init();

		let o = opts().algorithm("aes-256-gcm").auth_tag(true);
		let encrypted = encrypt(MESSAGE, &o).unwrap();

		let envelope = envelope_of(&encrypted);
		assert_eq!("aes-256-gcm", envelope.algorithm);
		assert_eq!(16, envelope.iv.as_ref().unwrap().len());
		assert_eq!(MESSAGE.len(), envelope.content.len());
		assert_eq!(16, envelope.auth_tag.as_ref().unwrap().len());

		assert_eq!(MESSAGE, decrypt(&encrypted, PASSWORD).unwrap());
	}

	#[test]
	fn chacha20_poly1305_with_auth_tag() {
		test_log::init();

		let o = opts().algorithm("chacha20-poly1305").auth_tag(true);
		let encrypted = encrypt(MESSAGE, &o).unwrap();

		let envelope = envelope_of(&encrypted);
		assert_eq!(12, envelope.iv.as_ref().unwrap().len());
		assert!(envelope.auth_tag.is_some());

		assert_eq!(MESSAGE, decrypt(&encrypted, PASSWORD).unwrap());

		// No IV works for AEAD modes too, with the same determinism caveats
		let o = opts().algorithm("chacha20-poly1305").auth_tag(true).iv(false);
		let encrypted = encrypt(MESSAGE, &o).unwrap();
		assert_eq!(encrypted, encrypt(MESSAGE, &o).unwrap());
		assert_eq!(MESSAGE, decrypt(&encrypted, PASSWORD).unwrap());
	}

	#[test]
	fn tampered_content_is_caught() {
		test_log::init();

		for algorithm in ["aes-256-gcm", "chacha20-poly1305"] {
			let o = opts().algorithm(algorithm).auth_tag(true);
			let mut envelope = envelope_of(&encrypt(MESSAGE, &o).unwrap());
			envelope.content[3] ^= 0x80;

			let tampered = serialize(&envelope, None).unwrap();
			let result = decrypt(tampered, PASSWORD);
			assert!(matches!(result, Err(Error::Authentication)), "{algorithm}");
		}
	}

	#[test]
	fn tampered_tag_is_caught() {
		test_log::init();

		let o = opts().algorithm("aes-256-gcm").auth_tag(true);
		let original = envelope_of(&encrypt(MESSAGE, &o).unwrap());

		let mut envelope = original.clone();
		if let Some(tag) = envelope.auth_tag.as_mut() {
			tag[0] ^= 0x01;
		}
		let result = decrypt(serialize(&envelope, None).unwrap(), PASSWORD);
		assert_eq!(ErrorKind::Authentication, result.unwrap_err().kind());

		// Stripping the tag doesn't get you anywhere either
		let stripped = Envelope {
			auth_tag: None,
			..original
		};
		let result = decrypt(serialize(&stripped, None).unwrap(), PASSWORD);
		assert!(matches!(result, Err(Error::Authentication)));
	}

	#[test]
	fn wrong_password() {
		test_log::init();

		let o = opts().algorithm("aes-256-gcm").auth_tag(true);
		let encrypted = encrypt(MESSAGE, &o).unwrap();
		let result = decrypt(&encrypted, "Some other password");
		assert!(matches!(result, Err(Error::Authentication)));

		// With CBC, a wrong key normally shows up as bad padding, but occasionally the padding
		// happens to check out and we get garbage instead; either way it's not our plaintext
		let encrypted = encrypt(MESSAGE, &opts()).unwrap();
		match decrypt(&encrypted, "Some other password") {
			Ok(s) => assert_ne!(MESSAGE, s),
			Err(e) => assert_eq!(ErrorKind::Cipher, e.kind()),
		}
	}

	#[test]
	fn tag_and_algorithm_must_agree() {
		test_log::init();

		let result = encrypt(MESSAGE, &opts().auth_tag(true));
		assert!(matches!(result, Err(Error::AuthTagUnsupported(_))));

		let result = encrypt(MESSAGE, &opts().algorithm("aes-256-gcm"));
		assert!(matches!(result, Err(Error::AuthTagRequired(_))));
	}

	#[test]
	fn unknown_algorithm() {
		test_log::init();

		let result = encrypt(MESSAGE, &opts().algorithm("rot13"));
		assert!(matches!(result, Err(Error::UnknownAlgorithm(_))));
		assert_eq!(ErrorKind::Cipher, result.unwrap_err().kind());

		let envelope = Envelope {
			algorithm: "rot13".to_string(),
			iv: None,
			content: vec![1, 2, 3],
			auth_tag: None,
		};
		let result = decrypt(serialize(&envelope, None).unwrap(), PASSWORD);
		assert!(matches!(result, Err(Error::UnknownAlgorithm(_))));
	}

	#[test]
	fn key_too_long_for_algorithm() {
		test_log::init();

		let result = encrypt(MESSAGE, &opts().algorithm("aes-128-cbc"));
		assert!(matches!(result, Err(Error::InvalidKeyLength { .. })));
	}

	#[test]
	fn mismatched_algorithm_fails() {
		test_log::init();

		let mut envelope = envelope_of(&encrypt(MESSAGE, &opts()).unwrap());
		envelope.algorithm = "aes-256-gcm".to_string();

		let result = decrypt(serialize(&envelope, None).unwrap(), PASSWORD);
		assert!(result.is_err());
	}

	#[test]
	fn base64_text_output() {
		test_log::init();

		let encrypted = encrypt(MESSAGE, &opts().encoding(TextEncoding::Base64)).unwrap();
		let text = encrypted.as_str().unwrap();

		let envelope = envelope_of(&encrypted);
		assert_eq!("aes-256-cbc", envelope.algorithm);
		assert_eq!(16, envelope.iv.as_ref().unwrap().len());
		assert!(envelope.auth_tag.is_none());

		assert_eq!(MESSAGE, decrypt(text, PASSWORD).unwrap());

		// Decoding the text ourselves and handing over bytes works just as well
		let bytes = encrypted.to_bytes(TextEncoding::Base64).unwrap();
		assert_eq!(MESSAGE, decrypt(bytes, PASSWORD).unwrap());
	}

	#[test]
	fn other_text_encodings() {
		test_log::init();

		for encoding in [TextEncoding::Base64Url, TextEncoding::Hex] {
			let encrypted = encrypt(MESSAGE, &opts().encoding(encoding)).unwrap();
			assert!(encrypted.is_text());

			assert_eq!(
				MESSAGE,
				decrypt_with_encoding(&encrypted, PASSWORD, encoding).unwrap()
			);
		}

		// Hex isn't base64
		let encrypted = encrypt(MESSAGE, &opts().encoding(TextEncoding::Hex)).unwrap();
		let result = decrypt(&encrypted, PASSWORD);
		assert_eq!(ErrorKind::Cipher, result.unwrap_err().kind());
	}

	#[test]
	fn garbage_input() {
		test_log::init();

		let result = decrypt("!!!", PASSWORD);
		assert!(matches!(result, Err(Error::TextDecoding { .. })));

		let result = decrypt(vec![0xffu8, 0x00, 0x13], PASSWORD);
		assert_eq!(ErrorKind::Cipher, result.unwrap_err().kind());
	}

	#[test]
	fn truncated_content() {
		test_log::init();

		let mut envelope = envelope_of(&encrypt(MESSAGE, &opts()).unwrap());
		envelope.content.truncate(envelope.content.len() - 5);

		let result = decrypt(serialize(&envelope, None).unwrap(), PASSWORD);
		assert!(matches!(result, Err(Error::Decryption)));
	}

	#[test]
	fn large_text() {
		test_log::init();

		let text = lorem(64 * 1024);

		for o in [
			opts().encoding(TextEncoding::Base64),
			opts().algorithm("aes-256-gcm").auth_tag(true),
			opts().iv(false),
		] {
			let encrypted = encrypt(&text, &o).unwrap();
			assert_eq!(text, decrypt(&encrypted, PASSWORD).unwrap());
		}
	}

	#[test]
	fn unicode_and_empty_plaintext() {
		test_log::init();

		for plaintext in ["", "héllo wörld", "日本語のテキスト", "🦀🔐"] {
			let encrypted = encrypt(plaintext, &opts()).unwrap();
			assert_eq!(plaintext, decrypt(&encrypted, PASSWORD).unwrap());
		}
	}

	#[test]
	fn non_utf8_plaintext_is_rejected() {
		test_log::init();

		let key = kdf::derive_key(PASSWORD).unwrap();
		let iv = [5u8; 16];
		let sealed =
			cipher::seal(Algorithm::Aes256Cbc, &key, &iv, &[0xff, 0xfe, 0xfd], false).unwrap();
		let envelope = Envelope {
			algorithm: "aes-256-cbc".to_string(),
			iv: Some(iv.to_vec()),
			content: sealed.content,
			auth_tag: None,
		};

		let result = decrypt(serialize(&envelope, None).unwrap(), PASSWORD);
		assert!(matches!(result, Err(Error::InvalidUtf8)));
	}

	#[test]
	fn concurrent_use() {
		test_log::init();

		let o = Arc::new(opts().algorithm("aes-256-gcm").auth_tag(true));

		let handles: Vec<_> = (0..8)
			.map(|i| {
				let o = Arc::clone(&o);
				std::thread::spawn(move || {
					let message = format!("{MESSAGE} #{i}");
					for _ in 0..25 {
						let encrypted = encrypt(&message, &o).unwrap();
						assert_eq!(message, decrypt(&encrypted, PASSWORD).unwrap());
					}
				})
			})
			.collect();

		for h in handles {
			h.join().unwrap();
		}
	}
}
