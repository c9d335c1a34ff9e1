use ciborium_ll::{Decoder, Encoder, Header};

use super::{Encrypted, Error, TextEncoding};

const ALGORITHM: &str = "algorithm";
const IV: &str = "iv";
const CONTENT: &str = "content";
const AUTH_TAG: &str = "authTag";

/// Everything needed (apart from the password) to decrypt a message.
///
/// On the wire, an envelope is a CBOR map with text keys, written in the order `algorithm`, `iv`,
/// `content`, `authTag`.  The optional fields are simply left out when absent; there is no
/// version marker, so the presence of `iv` and `authTag` is what tells the decryptor how the
/// envelope was sealed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
	pub algorithm: String,
	pub iv: Option<Vec<u8>>,
	pub content: Vec<u8>,
	pub auth_tag: Option<Vec<u8>>,
}

impl Envelope {
	pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
		let mut v: Vec<u8> = Vec::new();

		let entries = 2 + usize::from(self.iv.is_some()) + usize::from(self.auth_tag.is_some());

		let mut enc = Encoder::from(&mut v);
		enc.push(Header::Map(Some(entries)))
			.map_err(|e| Error::encoding("map", e))?;

		enc.text(ALGORITHM, None)
			.map_err(|e| Error::encoding(ALGORITHM, e))?;
		enc.text(&self.algorithm, None)
			.map_err(|e| Error::encoding(ALGORITHM, e))?;

		if let Some(iv) = &self.iv {
			enc.text(IV, None).map_err(|e| Error::encoding(IV, e))?;
			enc.bytes(iv, None).map_err(|e| Error::encoding(IV, e))?;
		}

		enc.text(CONTENT, None)
			.map_err(|e| Error::encoding(CONTENT, e))?;
		enc.bytes(&self.content, None)
			.map_err(|e| Error::encoding(CONTENT, e))?;

		if let Some(auth_tag) = &self.auth_tag {
			enc.text(AUTH_TAG, None)
				.map_err(|e| Error::encoding(AUTH_TAG, e))?;
			enc.bytes(auth_tag, None)
				.map_err(|e| Error::encoding(AUTH_TAG, e))?;
		}

		tracing::trace!(
			algorithm = %self.algorithm,
			iv = ?self.iv.as_deref().map(hex::encode),
			auth_tag = ?self.auth_tag.as_deref().map(hex::encode),
			len = v.len(),
			"Encoded envelope"
		);

		Ok(v)
	}
}

impl TryFrom<&[u8]> for Envelope {
	type Error = Error;

	fn try_from(b: &[u8]) -> Result<Self, Self::Error> {
		let mut dec = Decoder::from(b);

		let Header::Map(Some(entries)) = dec.pull().map_err(|e| Error::decoding("map", e))? else {
			return Err(Error::invalid_envelope("expected a map"));
		};

		if entries > 4 {
			return Err(Error::invalid_envelope(format!(
				"too many fields ({entries})"
			)));
		}

		let mut algorithm: Option<String> = None;
		let mut iv: Option<Vec<u8>> = None;
		let mut content: Option<Vec<u8>> = None;
		let mut auth_tag: Option<Vec<u8>> = None;

		for _ in 0..entries {
			let field = read_text(&mut dec, "field name")?;

			match field.as_str() {
				ALGORITHM => set_once(&mut algorithm, read_text(&mut dec, ALGORITHM)?, ALGORITHM)?,
				IV => set_once(&mut iv, read_bytes(&mut dec, IV)?, IV)?,
				CONTENT => set_once(&mut content, read_bytes(&mut dec, CONTENT)?, CONTENT)?,
				AUTH_TAG => set_once(&mut auth_tag, read_bytes(&mut dec, AUTH_TAG)?, AUTH_TAG)?,
				other => {
					return Err(Error::invalid_envelope(format!(
						"unexpected field {other:?}"
					)));
				}
			}
		}

		if dec.offset() != b.len() {
			return Err(Error::invalid_envelope("trailing data after envelope"));
		}

		Ok(Self {
			algorithm: algorithm.ok_or_else(|| Error::invalid_envelope("missing algorithm"))?,
			iv,
			content: content.ok_or_else(|| Error::invalid_envelope("missing content"))?,
			auth_tag,
		})
	}
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &str) -> Result<(), Error> {
	if slot.replace(value).is_some() {
		Err(Error::invalid_envelope(format!("duplicate field {field:?}")))
	} else {
		Ok(())
	}
}

fn read_text(dec: &mut Decoder<&[u8]>, element: &str) -> Result<String, Error> {
	let Header::Text(len) = dec
		.pull()
		.map_err(|e| Error::decoding(format!("{element} header"), e))?
	else {
		return Err(Error::invalid_envelope(format!("expected text for {element}")));
	};

	let mut segments = dec.text(len);
	let mut buf = [0u8; 1024];
	let mut s = String::new();

	while let Some(mut segment) = segments.pull().map_err(|e| Error::decoding(element, e))? {
		while let Some(chunk) = segment
			.pull(&mut buf[..])
			.map_err(|e| Error::decoding(element, e))?
		{
			s.push_str(chunk);
		}
	}

	Ok(s)
}

// Byte strings may arrive chunked (indefinite length), so gather every segment
fn read_bytes(dec: &mut Decoder<&[u8]>, element: &str) -> Result<Vec<u8>, Error> {
	let Header::Bytes(len) = dec
		.pull()
		.map_err(|e| Error::decoding(format!("{element} header"), e))?
	else {
		return Err(Error::invalid_envelope(format!("expected bytes for {element}")));
	};

	let mut segments = dec.bytes(len);
	let mut buf = [0u8; 1024];
	let mut v: Vec<u8> = Vec::new();

	while let Some(mut segment) = segments.pull().map_err(|e| Error::decoding(element, e))? {
		while let Some(chunk) = segment
			.pull(&mut buf[..])
			.map_err(|e| Error::decoding(element, e))?
		{
			v.extend_from_slice(chunk);
		}
	}

	Ok(v)
}

/// Turn an [`Envelope`] into its wire form, as text if an `encoding` is given.
#[tracing::instrument(level = "trace", skip(envelope))]
pub fn serialize(envelope: &Envelope, encoding: Option<TextEncoding>) -> Result<Encrypted, Error> {
	let binary = envelope.to_bytes()?;

	Ok(match encoding {
		Some(encoding) => Encrypted::Text(encoding.encode(&binary)),
		None => Encrypted::Bytes(binary),
	})
}

/// Parse the wire form of an [`Envelope`], decoding text input with `encoding` first.
#[tracing::instrument(level = "trace", skip(encrypted))]
pub fn deserialize(
	encrypted: impl Into<Encrypted>,
	encoding: TextEncoding,
) -> Result<Envelope, Error> {
	let binary = match encrypted.into() {
		Encrypted::Bytes(b) => b,
		Encrypted::Text(s) => encoding.decode(&s)?,
	};

	Envelope::try_from(&binary[..])
}
