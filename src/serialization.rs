//! Serialization framing: a 16-byte header (magic, versions, compression
//! mode, total size) wrapped around every persisted object's body.
//!
//! Every persisted core object shares the same two-step shape: compute the
//! object's body bytes into a scratch buffer, then prepend the header this
//! module describes and optionally deflate the body. [`ByteWriter`]/
//! [`ByteReader`] are the little-endian primitive encoders the per-object
//! body layouts in `plaintext.rs`, `ciphertext.rs`, `keys.rs` and
//! `parameters/mod.rs` are built from.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::util::blake2xb::ParmsId;

/// Magic bytes identifying a stream produced by this crate's framing.
pub const MAGIC: u16 = 0xA15E;
/// Fixed header length in bytes.
pub const HEADER_SIZE: u8 = 16;
/// Header version this build writes, and the only major version it accepts
/// on read.
pub const VERSION_MAJOR: u8 = 1;
/// Minor version this build writes; readers only check the major version.
pub const VERSION_MINOR: u8 = 0;

/// The compression applied to a framed body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionMode {
	/// Body bytes are stored as-is.
	None = 0,
	/// Body bytes are deflate-compressed.
	Deflate = 1,
}

impl CompressionMode {
	fn from_u8(value: u8) -> Result<Self> {
		match value {
			0 => Ok(CompressionMode::None),
			1 => Ok(CompressionMode::Deflate),
			other => Err(Error::Corrupt(format!("unknown compression mode {other}"))),
		}
	}
}

/// A trait for converting objects into their framed byte representation.
///
/// `as_bytes` always frames with [`CompressionMode::None`]; objects that
/// want to opt into deflate expose their own `to_bytes_with_mode` inherent
/// method built on the same body encoding.
pub trait ToBytes {
	/// Returns the object as a framed byte array.
	fn as_bytes(&self) -> Result<Vec<u8>>;
}

/// A trait for reconstructing an object from its framed byte representation
/// under a given state (typically a [`crate::Context`]).
pub trait FromBytes: Sized {
	/// State needed to validate the decoded object.
	type State;
	/// Decodes and validates an object from `bytes` against `state`.
	fn from_bytes(state: &Self::State, bytes: &[u8]) -> Result<Self>;
}

/// Wraps `body` with the header, compressing it first if `mode` requests it.
pub fn frame(body: &[u8], mode: CompressionMode) -> Result<Vec<u8>> {
	let payload = match mode {
		CompressionMode::None => body.to_vec(),
		CompressionMode::Deflate => {
			let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
			encoder.write_all(body)?;
			encoder.finish()?
		}
	};

	let total_size = HEADER_SIZE as u64 + payload.len() as u64;
	let mut out = Vec::with_capacity(total_size as usize);
	out.extend_from_slice(&MAGIC.to_le_bytes());
	out.push(HEADER_SIZE);
	out.push(VERSION_MAJOR);
	out.push(VERSION_MINOR);
	out.push(mode as u8);
	out.extend_from_slice(&0u16.to_le_bytes());
	out.extend_from_slice(&total_size.to_le_bytes());
	out.extend_from_slice(&payload);
	Ok(out)
}

/// Parses and validates the header, returning the decompressed body.
pub fn unframe(bytes: &[u8]) -> Result<Vec<u8>> {
	if bytes.len() < HEADER_SIZE as usize {
		return Err(Error::Corrupt("stream shorter than the 16-byte header".into()));
	}
	let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
	if magic != MAGIC {
		return Err(Error::Corrupt(format!("bad magic {magic:#06x}, expected {MAGIC:#06x}")));
	}
	let header_size = bytes[2];
	if header_size != HEADER_SIZE {
		return Err(Error::Corrupt(format!("unexpected header size {header_size}")));
	}
	let version_major = bytes[3];
	if version_major != VERSION_MAJOR {
		return Err(Error::Corrupt(format!(
			"unsupported version {version_major}.{}, this build writes {VERSION_MAJOR}.{VERSION_MINOR}",
			bytes[4]
		)));
	}
	let mode = CompressionMode::from_u8(bytes[5])?;
	let total_size = u64::from_le_bytes(bytes[8..16].try_into().expect("8-byte slice"));
	if total_size as usize != bytes.len() {
		return Err(Error::Corrupt(format!(
			"header total_size {total_size} does not match stream length {}",
			bytes.len()
		)));
	}

	let payload = &bytes[16..];
	match mode {
		CompressionMode::None => Ok(payload.to_vec()),
		CompressionMode::Deflate => {
			let mut decoder = DeflateDecoder::new(payload);
			let mut out = Vec::new();
			decoder.read_to_end(&mut out)?;
			Ok(out)
		}
	}
}

/// A little-endian byte buffer builder for per-object body layouts.
#[derive(Debug, Default)]
pub struct ByteWriter {
	buf: Vec<u8>,
}

impl ByteWriter {
	/// Starts an empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a single byte.
	pub fn write_u8(&mut self, value: u8) {
		self.buf.push(value);
	}

	/// Appends a little-endian `u64`.
	pub fn write_u64(&mut self, value: u64) {
		self.buf.extend_from_slice(&value.to_le_bytes());
	}

	/// Appends a little-endian `f64`.
	pub fn write_f64(&mut self, value: f64) {
		self.buf.extend_from_slice(&value.to_le_bytes());
	}

	/// Appends a 32-byte `parms_id` as four little-endian `u64` words.
	pub fn write_parms_id(&mut self, parms_id: ParmsId) {
		for word in parms_id {
			self.write_u64(word);
		}
	}

	/// Appends a `u64`-length-prefixed array of little-endian `u64`s.
	pub fn write_u64_array(&mut self, values: &[u64]) {
		self.write_u64(values.len() as u64);
		for &v in values {
			self.write_u64(v);
		}
	}

	/// Consumes the writer, returning the accumulated bytes.
	pub fn into_vec(self) -> Vec<u8> {
		self.buf
	}
}

/// A little-endian byte cursor for decoding per-object body layouts.
#[derive(Debug)]
pub struct ByteReader<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> ByteReader<'a> {
	/// Wraps `bytes` for sequential little-endian decoding.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	fn take(&mut self, len: usize) -> Result<&'a [u8]> {
		if self.bytes.len().saturating_sub(self.pos) < len {
			return Err(Error::Corrupt("truncated body".into()));
		}
		let slice = &self.bytes[self.pos..self.pos + len];
		self.pos += len;
		Ok(slice)
	}

	/// Reads one byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.take(1)?[0])
	}

	/// Reads a little-endian `u64`.
	pub fn read_u64(&mut self) -> Result<u64> {
		let slice = self.take(8)?;
		Ok(u64::from_le_bytes(slice.try_into().expect("8 bytes")))
	}

	/// Reads a little-endian `f64`.
	pub fn read_f64(&mut self) -> Result<f64> {
		let slice = self.take(8)?;
		Ok(f64::from_le_bytes(slice.try_into().expect("8 bytes")))
	}

	/// Reads a 32-byte `parms_id` as four little-endian `u64` words.
	pub fn read_parms_id(&mut self) -> Result<ParmsId> {
		let mut words = [0u64; 4];
		for word in words.iter_mut() {
			*word = self.read_u64()?;
		}
		Ok(words)
	}

	/// Reads a `u64`-length-prefixed array of little-endian `u64`s.
	pub fn read_u64_array(&mut self) -> Result<Vec<u64>> {
		let len = self.read_u64()? as usize;
		(0..len).map(|_| self.read_u64()).collect()
	}

	/// Bytes left unread.
	pub fn remaining(&self) -> usize {
		self.bytes.len() - self.pos
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn frame_starts_with_magic_and_reports_exact_size() {
		// S5: first two bytes are 0x5E 0xA1 (little-endian 0xA15E).
		let body = b"hello world";
		let framed = frame(body, CompressionMode::None).unwrap();
		assert_eq!(&framed[0..2], &[0x5E, 0xA1]);
		assert_eq!(framed.len(), HEADER_SIZE as usize + body.len());
		let total_size = u64::from_le_bytes(framed[8..16].try_into().unwrap());
		assert_eq!(total_size as usize, framed.len());
	}

	#[test]
	fn unframe_round_trips_uncompressed() {
		let body = b"round trip";
		let framed = frame(body, CompressionMode::None).unwrap();
		assert_eq!(unframe(&framed).unwrap(), body);
	}

	#[test]
	fn unframe_round_trips_deflate() {
		let body = vec![7u8; 4096];
		let framed = frame(&body, CompressionMode::Deflate).unwrap();
		assert!(framed.len() < body.len());
		assert_eq!(unframe(&framed).unwrap(), body);
	}

	#[test]
	fn unframe_rejects_bad_magic() {
		let mut framed = frame(b"x", CompressionMode::None).unwrap();
		framed[0] = 0;
		assert!(matches!(unframe(&framed), Err(Error::Corrupt(_))));
	}

	#[test]
	fn unframe_rejects_truncated_stream() {
		assert!(matches!(unframe(&[0u8; 4]), Err(Error::Corrupt(_))));
	}

	#[test]
	fn unframe_rejects_size_mismatch() {
		let mut framed = frame(b"hello", CompressionMode::None).unwrap();
		framed.push(0xFF);
		assert!(matches!(unframe(&framed), Err(Error::Corrupt(_))));
	}

	#[test]
	fn byte_writer_reader_round_trip() {
		let mut w = ByteWriter::new();
		w.write_u8(7);
		w.write_u64(42);
		w.write_f64(3.25);
		w.write_parms_id([1, 2, 3, 4]);
		w.write_u64_array(&[9, 8, 7]);
		let bytes = w.into_vec();

		let mut r = ByteReader::new(&bytes);
		assert_eq!(r.read_u8().unwrap(), 7);
		assert_eq!(r.read_u64().unwrap(), 42);
		assert_eq!(r.read_f64().unwrap(), 3.25);
		assert_eq!(r.read_parms_id().unwrap(), [1, 2, 3, 4]);
		assert_eq!(r.read_u64_array().unwrap(), vec![9, 8, 7]);
		assert_eq!(r.remaining(), 0);
	}
}
