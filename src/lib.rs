//! Password-based symmetric encryption into self-describing envelopes.
//!
//! Give [`encrypt`] a password and some text, and you get back an *envelope*: a small CBOR map
//! recording the cipher that was used, the IV (if any), the ciphertext, and the authentication
//! tag (for authenticated modes).  Give that envelope and the same password to [`decrypt`], and
//! you get your text back.  Nothing else needs to be remembered alongside the ciphertext.
//!
//! The key is a SHA-256 hash of the password.  That is fast, which is nice, and also means that
//! a weak password makes for a weak key, which is not.  Choose your passwords accordingly.
//!
//! By default, envelopes are sealed with AES-256-CBC and a fresh random IV, and come out as raw
//! bytes.  All of that can be changed through [`Options`]:
//!
//! * Authenticated modes (`aes-256-gcm`, `chacha20-poly1305`) detect tampering, but must be asked
//!   for their tag with [`Options::auth_tag`].
//! * [`IvPolicy::Implicit`] and [`IvPolicy::Fixed`] make encryption deterministic: the same
//!   plaintext and password produce the same envelope every time.  Sometimes that's what you
//!   want (say, to look things up by their encrypted value), but it does reveal when two
//!   messages are the same.
//! * A [`TextEncoding`] turns the envelope into a printable string.
//!
//! If you're going to be encrypting a lot with the same password, [`bind`] it into an
//! [`Encryptor`].
//!
//! # Example
//!
//! ```rust
//! use sealed_envelope::{Error, ErrorKind, Options, TextEncoding};
//! # fn main() -> Result<(), Error> {
//!
//! let options = Options::default()
//!     .password("Some stupid password")
//!     .encoding(TextEncoding::Base64);
//!
//! let envelope = sealed_envelope::encrypt("Som string that I want to encrypt", &options)?;
//!
//! assert_eq!(
//!     "Som string that I want to encrypt",
//!     sealed_envelope::decrypt(&envelope, "Some stupid password")?
//! );
//!
//! // Without the password, there's nothing to be done
//! let result = sealed_envelope::decrypt(&envelope, "");
//! assert_eq!(ErrorKind::Config, result.unwrap_err().kind());
//! # Ok(())
//! # }
//! ```
mod algorithm;
mod cipher;
mod codec;
mod encoding;
mod encryptor;
mod envelope;
mod error;
mod kdf;
mod key;
mod options;

#[cfg(test)]
mod test_log;

pub use algorithm::Algorithm;
pub use codec::{decrypt, decrypt_with_encoding, encrypt};
pub use encoding::{Encrypted, TextEncoding};
pub use encryptor::{Encryptor, bind};
pub use envelope::{Envelope, deserialize, serialize};
pub use error::{Error, ErrorKind};
pub use kdf::derive_key;
pub use key::Key;
pub use options::{IvPolicy, Options, Overrides};
