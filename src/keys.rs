//! Key material: [`SecretKey`] and [`PublicKey`], and the jagged
//! ciphertext tables ([`KSwitchKeys`], [`RelinearizationKeys`],
//! [`GaloisKeys`]) used to switch a ciphertext's encryption key without
//! decrypting it.

use serde::{Deserialize, Serialize};

use crate::ciphertext::Ciphertext;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::plaintext::Plaintext;
use crate::serialization::{frame, unframe, ByteReader, ByteWriter, CompressionMode, FromBytes, ToBytes};
use crate::util::blake2xb::ParmsId;

/// A secret key: the single RNS polynomial used to decrypt and to generate
/// the other key types. Stored as a [`Plaintext`]-shaped buffer since it
/// has exactly the same "one polynomial at one chain level" shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretKey {
	data: Plaintext,
}

impl SecretKey {
	/// An empty, unassigned secret key.
	pub fn new() -> Self {
		Self { data: Plaintext::new() }
	}

	/// Wraps an already-built secret polynomial.
	pub fn from_plaintext(data: Plaintext) -> Self {
		Self { data }
	}

	/// The underlying secret polynomial.
	pub fn data(&self) -> &Plaintext {
		&self.data
	}

	/// The underlying secret polynomial, mutably.
	pub fn data_mut(&mut self) -> &mut Plaintext {
		&mut self.data
	}

	/// The chain level this secret key is anchored to.
	pub fn parms_id(&self) -> ParmsId {
		self.data.parms_id()
	}

	/// Validates this key's shape against `context`.
	pub fn is_valid_for(&self, context: &Context) -> Result<()> {
		self.data.is_valid_for(context)
	}
}

impl Default for SecretKey {
	fn default() -> Self {
		Self::new()
	}
}

impl ToBytes for SecretKey {
	fn as_bytes(&self) -> Result<Vec<u8>> {
		self.data.as_bytes()
	}
}

impl FromBytes for SecretKey {
	type State = Context;

	fn from_bytes(context: &Context, bytes: &[u8]) -> Result<Self> {
		Ok(Self {
			data: Plaintext::from_bytes(context, bytes)?,
		})
	}
}

/// A public key: a size-2 ciphertext encrypting zero under the matching
/// secret key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicKey {
	data: Ciphertext,
}

impl PublicKey {
	/// Wraps an already-built public-key ciphertext.
	pub fn from_ciphertext(data: Ciphertext) -> Self {
		Self { data }
	}

	/// The underlying ciphertext.
	pub fn data(&self) -> &Ciphertext {
		&self.data
	}

	/// The underlying ciphertext, mutably.
	pub fn data_mut(&mut self) -> &mut Ciphertext {
		&mut self.data
	}

	/// The chain level this public key is anchored to (always the key
	/// level).
	pub fn parms_id(&self) -> ParmsId {
		self.data.parms_id()
	}

	/// Validates this key's shape against `context`.
	pub fn is_valid_for(&self, context: &Context) -> Result<()> {
		self.data.is_valid_for(context)
	}
}

impl ToBytes for PublicKey {
	fn as_bytes(&self) -> Result<Vec<u8>> {
		self.data.as_bytes()
	}
}

impl FromBytes for PublicKey {
	type State = Context;

	fn from_bytes(context: &Context, bytes: &[u8]) -> Result<Self> {
		Ok(Self {
			data: Ciphertext::from_bytes(context, bytes)?,
		})
	}
}

fn write_key_table(w: &mut ByteWriter, keys: &[Vec<Ciphertext>]) {
	w.write_u64(keys.len() as u64);
	for set in keys {
		w.write_u64(set.len() as u64);
		for ct in set {
			ct.write_body(w);
		}
	}
}

fn read_key_table(r: &mut ByteReader) -> Result<Vec<Vec<Ciphertext>>> {
	let outer = r.read_u64()? as usize;
	let mut keys = Vec::with_capacity(outer);
	for _ in 0..outer {
		let inner = r.read_u64()? as usize;
		let mut set = Vec::with_capacity(inner);
		for _ in 0..inner {
			set.push(Ciphertext::read_body(r)?);
		}
		keys.push(set);
	}
	Ok(keys)
}

/// A jagged table of ciphertext-shaped key-switching keys, anchored to the
/// key level of a chain by `parms_id`. [`RelinearizationKeys`] and
/// [`GaloisKeys`] are both built on this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KSwitchKeys {
	parms_id: ParmsId,
	keys: Vec<Vec<Ciphertext>>,
}

impl KSwitchKeys {
	/// An empty key-switching table anchored to `parms_id`.
	pub fn new(parms_id: ParmsId) -> Self {
		Self {
			parms_id,
			keys: Vec::new(),
		}
	}

	/// The chain level (always the key level) these keys are anchored to.
	pub fn parms_id(&self) -> ParmsId {
		self.parms_id
	}

	/// Number of key sets in the table.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// `true` if the table carries no key sets.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Appends one key set (one "row" of the jagged table) to the end.
	pub fn push_key_set(&mut self, ciphertexts: Vec<Ciphertext>) {
		self.keys.push(ciphertexts);
	}

	/// The key set at `index`.
	pub fn key(&self, index: usize) -> Result<&[Ciphertext]> {
		self.keys.get(index).map(Vec::as_slice).ok_or(Error::LengthMismatch {
			expected: self.keys.len(),
			actual: index,
		})
	}

	/// Validates this table against `context`: its `parms_id` must belong
	/// to the chain, and every ciphertext in every key set must validate
	/// against it too.
	pub fn is_valid_for(&self, context: &Context) -> Result<()> {
		context.get_context_data(self.parms_id)?;
		for set in &self.keys {
			for ct in set {
				ct.is_valid_for(context)?;
			}
		}
		Ok(())
	}

	pub(crate) fn write_body(&self, w: &mut ByteWriter) {
		w.write_parms_id(self.parms_id);
		write_key_table(w, &self.keys);
	}

	pub(crate) fn read_body(r: &mut ByteReader) -> Result<Self> {
		let parms_id = r.read_parms_id()?;
		let keys = read_key_table(r)?;
		Ok(Self { parms_id, keys })
	}

	/// Encodes this table to its framed byte representation, applying
	/// `mode`'s compression.
	pub fn to_bytes_with_mode(&self, mode: CompressionMode) -> Result<Vec<u8>> {
		let mut w = ByteWriter::new();
		self.write_body(&mut w);
		frame(&w.into_vec(), mode)
	}
}

impl ToBytes for KSwitchKeys {
	fn as_bytes(&self) -> Result<Vec<u8>> {
		self.to_bytes_with_mode(CompressionMode::None)
	}
}

impl FromBytes for KSwitchKeys {
	type State = Context;

	fn from_bytes(context: &Context, bytes: &[u8]) -> Result<Self> {
		let body = unframe(bytes)?;
		let mut r = ByteReader::new(&body);
		let keys = Self::read_body(&mut r)?;
		keys.is_valid_for(context)?;
		Ok(keys)
	}
}

/// Relinearization keys: the key-switching keys that bring a post-multiply,
/// size-3 ciphertext back down to size 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelinearizationKeys {
	inner: KSwitchKeys,
}

impl RelinearizationKeys {
	/// An empty relinearization-key table anchored to `parms_id`.
	pub fn new(parms_id: ParmsId) -> Self {
		Self {
			inner: KSwitchKeys::new(parms_id),
		}
	}

	/// Appends one key set.
	pub fn push_key_set(&mut self, ciphertexts: Vec<Ciphertext>) {
		self.inner.push_key_set(ciphertexts);
	}

	/// The key set at `index`.
	pub fn key(&self, index: usize) -> Result<&[Ciphertext]> {
		self.inner.key(index)
	}

	/// The chain level (always the key level) these keys are anchored to.
	pub fn parms_id(&self) -> ParmsId {
		self.inner.parms_id()
	}

	/// Validates this table against `context`.
	pub fn is_valid_for(&self, context: &Context) -> Result<()> {
		self.inner.is_valid_for(context)
	}
}

impl ToBytes for RelinearizationKeys {
	fn as_bytes(&self) -> Result<Vec<u8>> {
		self.inner.as_bytes()
	}
}

impl FromBytes for RelinearizationKeys {
	type State = Context;

	fn from_bytes(context: &Context, bytes: &[u8]) -> Result<Self> {
		Ok(Self {
			inner: KSwitchKeys::from_bytes(context, bytes)?,
		})
	}
}

/// Galois keys: key-switching keys for one or more Galois automorphisms
/// (`X -> X^elt`), used to rotate or transform batched plaintext slots.
/// Unlike [`RelinearizationKeys`], key sets are indexed by Galois element
/// rather than by position, since a caller typically only generates keys
/// for the specific rotation steps it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaloisKeys {
	inner: KSwitchKeys,
	galois_elts: Vec<u32>,
}

impl GaloisKeys {
	/// An empty Galois-key table anchored to `parms_id`.
	pub fn new(parms_id: ParmsId) -> Self {
		Self {
			inner: KSwitchKeys::new(parms_id),
			galois_elts: Vec::new(),
		}
	}

	/// Appends the key set for Galois element `elt`.
	pub fn push_key_for_elt(&mut self, elt: u32, ciphertexts: Vec<Ciphertext>) {
		self.galois_elts.push(elt);
		self.inner.push_key_set(ciphertexts);
	}

	/// `true` if a key set has been generated for Galois element `elt`.
	pub fn has_key(&self, elt: u32) -> bool {
		self.galois_elts.contains(&elt)
	}

	/// The key set for Galois element `elt`.
	pub fn key(&self, elt: u32) -> Result<&[Ciphertext]> {
		let index = self
			.galois_elts
			.iter()
			.position(|&e| e == elt)
			.ok_or_else(|| Error::InvalidForContext(format!("no Galois key generated for element {elt}")))?;
		self.inner.key(index)
	}

	/// The Galois elements this table carries keys for, in generation order.
	pub fn elts(&self) -> &[u32] {
		&self.galois_elts
	}

	/// The chain level (always the key level) these keys are anchored to.
	pub fn parms_id(&self) -> ParmsId {
		self.inner.parms_id()
	}

	/// Validates this table against `context`.
	pub fn is_valid_for(&self, context: &Context) -> Result<()> {
		self.inner.is_valid_for(context)
	}

	/// Encodes this table to its framed byte representation, applying
	/// `mode`'s compression.
	pub fn to_bytes_with_mode(&self, mode: CompressionMode) -> Result<Vec<u8>> {
		let mut w = ByteWriter::new();
		w.write_parms_id(self.inner.parms_id);
		w.write_u64_array(&self.galois_elts.iter().map(|&e| e as u64).collect::<Vec<_>>());
		write_key_table(&mut w, &self.inner.keys);
		frame(&w.into_vec(), mode)
	}
}

impl ToBytes for GaloisKeys {
	fn as_bytes(&self) -> Result<Vec<u8>> {
		self.to_bytes_with_mode(CompressionMode::None)
	}
}

impl FromBytes for GaloisKeys {
	type State = Context;

	fn from_bytes(context: &Context, bytes: &[u8]) -> Result<Self> {
		let body = unframe(bytes)?;
		let mut r = ByteReader::new(&body);
		let parms_id = r.read_parms_id()?;
		let galois_elts: Vec<u32> = r.read_u64_array()?.into_iter().map(|e| e as u32).collect();
		let keys = read_key_table(&mut r)?;
		if keys.len() != galois_elts.len() {
			return Err(Error::InvalidSerializedField {
				field: "galois_elts".into(),
				reason: format!("{} Galois elements but {} key sets", galois_elts.len(), keys.len()),
			});
		}
		let result = Self {
			inner: KSwitchKeys { parms_id, keys },
			galois_elts,
		};
		result.is_valid_for(context)?;
		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modulus::{CoefficientModulus, SecurityLevel};
	use crate::parameters::{BfvEncryptionParametersBuilder, DegreeType};

	fn bfv_context() -> Context {
		let modulus_chain = CoefficientModulus::create(DegreeType::D4096, &[36, 36]).unwrap();
		let parms = BfvEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D4096)
			.set_coefficient_modulus(modulus_chain)
			.set_plain_modulus_u64(65537)
			.unwrap()
			.build()
			.unwrap();
		Context::new(parms, true, SecurityLevel::Tc128).unwrap()
	}

	#[test]
	fn secret_key_round_trips() {
		let ctx = bfv_context();
		let sk = SecretKey::from_plaintext(Plaintext::from_coefficients(vec![1, 0, 1]));
		let bytes = sk.as_bytes().unwrap();
		let decoded = SecretKey::from_bytes(&ctx, &bytes).unwrap();
		assert_eq!(decoded, sk);
	}

	#[test]
	fn public_key_round_trips() {
		let ctx = bfv_context();
		let pk = PublicKey::from_ciphertext(Ciphertext::new(&ctx, ctx.key_parms_id(), 2).unwrap());
		let bytes = pk.as_bytes().unwrap();
		let decoded = PublicKey::from_bytes(&ctx, &bytes).unwrap();
		assert_eq!(decoded, pk);
	}

	#[test]
	fn relinearization_keys_round_trip_with_multiple_sets() {
		let ctx = bfv_context();
		let mut rlk = RelinearizationKeys::new(ctx.key_parms_id());
		for _ in 0..2 {
			let set = vec![
				Ciphertext::new(&ctx, ctx.key_parms_id(), 2).unwrap(),
				Ciphertext::new(&ctx, ctx.key_parms_id(), 2).unwrap(),
			];
			rlk.push_key_set(set);
		}
		let bytes = rlk.as_bytes().unwrap();
		let decoded = RelinearizationKeys::from_bytes(&ctx, &bytes).unwrap();
		assert_eq!(decoded, rlk);
		assert_eq!(decoded.key(1).unwrap().len(), 2);
	}

	#[test]
	fn galois_keys_round_trip_and_index_by_element() {
		let ctx = bfv_context();
		let mut gk = GaloisKeys::new(ctx.key_parms_id());
		gk.push_key_for_elt(3, vec![Ciphertext::new(&ctx, ctx.key_parms_id(), 2).unwrap()]);
		gk.push_key_for_elt(9, vec![Ciphertext::new(&ctx, ctx.key_parms_id(), 2).unwrap()]);

		assert!(gk.has_key(9));
		assert!(!gk.has_key(27));
		assert!(gk.key(27).is_err());

		let bytes = gk.as_bytes().unwrap();
		let decoded = GaloisKeys::from_bytes(&ctx, &bytes).unwrap();
		assert_eq!(decoded.elts(), gk.elts());
		assert_eq!(decoded.key(3).unwrap().len(), 1);
	}

	#[test]
	fn kswitch_keys_rejects_foreign_parms_id() {
		let ctx = bfv_context();
		let bogus = KSwitchKeys::new([1, 2, 3, 4]);
		assert!(matches!(bogus.is_valid_for(&ctx), Err(Error::UnknownParmsId)));
	}
}
