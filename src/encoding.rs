use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use std::{fmt, str::FromStr};

use super::Error;

/// A way of turning a serialized envelope into printable text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TextEncoding {
	/// Standard, padded base64.  This is what [`decrypt`](super::decrypt) assumes for text input.
	#[default]
	Base64,
	/// URL-safe base64, without padding.
	Base64Url,
	/// Lowercase hexadecimal.
	Hex,
}

impl TextEncoding {
	pub fn name(self) -> &'static str {
		match self {
			Self::Base64 => "base64",
			Self::Base64Url => "base64url",
			Self::Hex => "hex",
		}
	}

	pub fn encode(self, bytes: &[u8]) -> String {
		match self {
			Self::Base64 => STANDARD.encode(bytes),
			Self::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
			Self::Hex => hex::encode(bytes),
		}
	}

	pub fn decode(self, text: &str) -> Result<Vec<u8>, Error> {
		match self {
			Self::Base64 => STANDARD.decode(text).map_err(|e| self.decoding_error(e)),
			Self::Base64Url => URL_SAFE_NO_PAD
				.decode(text)
				.map_err(|e| self.decoding_error(e)),
			Self::Hex => hex::decode(text).map_err(|e| self.decoding_error(e)),
		}
	}

	fn decoding_error(self, e: impl fmt::Display) -> Error {
		Error::text_decoding(self.name(), e.to_string())
	}
}

impl fmt::Display for TextEncoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for TextEncoding {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Error> {
		match s.to_ascii_lowercase().as_str() {
			"base64" => Ok(Self::Base64),
			"base64url" => Ok(Self::Base64Url),
			"hex" => Ok(Self::Hex),
			_ => Err(Error::invalid_config(format!("unknown text encoding {s:?}"))),
		}
	}
}

/// A serialized envelope, either as raw bytes or as text.
///
/// [`encrypt`](super::encrypt) produces [`Encrypted::Bytes`] unless a [`TextEncoding`] was
/// requested, in which case it produces [`Encrypted::Text`].  Anything that can be turned into an
/// `Encrypted` can be handed to [`decrypt`](super::decrypt).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Encrypted {
	Bytes(Vec<u8>),
	Text(String),
}

impl Encrypted {
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Bytes(b) => Some(b),
			Self::Text(_) => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Bytes(_) => None,
			Self::Text(s) => Some(s),
		}
	}

	pub fn is_text(&self) -> bool {
		matches!(self, Self::Text(_))
	}

	/// The raw serialized envelope, decoding text with `encoding` if need be.
	pub fn to_bytes(&self, encoding: TextEncoding) -> Result<Vec<u8>, Error> {
		match self {
			Self::Bytes(b) => Ok(b.clone()),
			Self::Text(s) => encoding.decode(s),
		}
	}
}

impl From<Vec<u8>> for Encrypted {
	fn from(b: Vec<u8>) -> Self {
		Self::Bytes(b)
	}
}

impl From<&[u8]> for Encrypted {
	fn from(b: &[u8]) -> Self {
		Self::Bytes(b.to_vec())
	}
}

impl From<String> for Encrypted {
	fn from(s: String) -> Self {
		Self::Text(s)
	}
}

impl From<&str> for Encrypted {
	fn from(s: &str) -> Self {
		Self::Text(s.to_string())
	}
}

impl From<&Encrypted> for Encrypted {
	fn from(e: &Encrypted) -> Self {
		e.clone()
	}
}
