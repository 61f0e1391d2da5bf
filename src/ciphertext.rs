//! The ciphertext data model: a size-`s` (`s >= 2`) array of RNS
//! polynomials at one chain level, together with the bookkeeping scalars
//! needed to interpret it (CKKS scale, BGV correction factor, NTT form).

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::poly_array::PolyArray;
use crate::serialization::{frame, unframe, ByteReader, ByteWriter, CompressionMode, FromBytes, ToBytes};
use crate::util::blake2xb::ParmsId;

/// CKKS scale bookkeeping shared with [`crate::plaintext`]: [`rescale_scale`]
/// computes a ciphertext's post-rescale scale, [`check_scale_bounds`] checks
/// a scale is still usable at a given chain level.
pub use crate::plaintext::{check_scale_bounds, rescale_scale};

/// Minimum number of polynomials a ciphertext may carry; dropping below this
/// no longer decrypts to anything meaningful.
const MIN_SIZE: usize = 2;

/// A ciphertext: `size` RNS polynomials at one chain level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ciphertext {
	polys: PolyArray,
	parms_id: ParmsId,
	scale: f64,
	is_ntt_form: bool,
	correction_factor: u64,
}

impl Ciphertext {
	/// Allocates a zero-initialized, size-`size` ciphertext at `parms_id`,
	/// shaped from `context`'s chain data for that level.
	pub fn new(context: &Context, parms_id: ParmsId, size: usize) -> Result<Self> {
		if size < MIN_SIZE {
			return Err(Error::LengthMismatch {
				expected: MIN_SIZE,
				actual: size,
			});
		}
		let level = context.get_context_data(parms_id)?;
		let coeff_modulus_size = level.rns_base().len();
		let poly_modulus_degree = level.parms().poly_modulus_degree() as usize;
		Ok(Self {
			polys: PolyArray::new(size, coeff_modulus_size, poly_modulus_degree),
			parms_id,
			scale: 1.0,
			is_ntt_form: false,
			correction_factor: 1,
		})
	}

	/// Wraps an already-shaped [`PolyArray`] into a `Ciphertext`, rejecting
	/// shapes with fewer than [`MIN_SIZE`] polynomials.
	pub fn from_poly_array(polys: PolyArray, parms_id: ParmsId, scale: f64, is_ntt_form: bool, correction_factor: u64) -> Result<Self> {
		if polys.poly_count() < MIN_SIZE {
			return Err(Error::LengthMismatch {
				expected: MIN_SIZE,
				actual: polys.poly_count(),
			});
		}
		Ok(Self {
			polys,
			parms_id,
			scale,
			is_ntt_form,
			correction_factor,
		})
	}

	/// Number of polynomials (`2` for a fresh encryption, more after
	/// multiplication and before relinearization).
	pub fn size(&self) -> usize {
		self.polys.poly_count()
	}

	/// Ring degree `N`.
	pub fn poly_modulus_degree(&self) -> usize {
		self.polys.poly_modulus_degree()
	}

	/// Number of RNS primes each polynomial is decomposed over at this
	/// level.
	pub fn coeff_modulus_size(&self) -> usize {
		self.polys.coeff_modulus_size()
	}

	/// The backing coefficient store.
	pub fn data(&self) -> &PolyArray {
		&self.polys
	}

	/// The backing coefficient store, mutably.
	pub fn data_mut(&mut self) -> &mut PolyArray {
		&mut self.polys
	}

	/// The chain level this ciphertext lives at.
	pub fn parms_id(&self) -> ParmsId {
		self.parms_id
	}

	/// The CKKS scaling factor (`1.0` outside CKKS).
	pub fn scale(&self) -> f64 {
		self.scale
	}

	/// Sets the CKKS scaling factor.
	pub fn set_scale(&mut self, scale: f64) {
		self.scale = scale;
	}

	/// `true` if this ciphertext's polynomials are stored in NTT form.
	pub fn is_ntt_form(&self) -> bool {
		self.is_ntt_form
	}

	/// Sets whether this ciphertext's polynomials are in NTT form.
	pub fn set_is_ntt_form(&mut self, is_ntt_form: bool) {
		self.is_ntt_form = is_ntt_form;
	}

	/// The BGV correction factor (`1` outside BGV).
	pub fn correction_factor(&self) -> u64 {
		self.correction_factor
	}

	/// Sets the BGV correction factor.
	pub fn set_correction_factor(&mut self, correction_factor: u64) {
		self.correction_factor = correction_factor;
	}

	/// Validates this ciphertext's shape against `context`: its `parms_id`
	/// must name a level belonging to `context`, its coefficient-modulus
	/// size and ring degree must match that level, and it must carry at
	/// least [`MIN_SIZE`] polynomials.
	pub fn is_valid_for(&self, context: &Context) -> Result<()> {
		let level = context.get_context_data(self.parms_id)?;
		let expected_size = level.rns_base().len();
		let expected_degree = level.parms().poly_modulus_degree() as usize;
		if self.polys.coeff_modulus_size() != expected_size || self.polys.poly_modulus_degree() != expected_degree {
			return Err(Error::InvalidForContext(format!(
				"ciphertext shape (coeff_modulus_size {}, poly_modulus_degree {}) does not match its level's (coeff_modulus_size {expected_size}, poly_modulus_degree {expected_degree})",
				self.polys.coeff_modulus_size(),
				self.polys.poly_modulus_degree()
			)));
		}
		if self.polys.poly_count() < MIN_SIZE {
			return Err(Error::InvalidForContext(format!(
				"ciphertext must have at least {MIN_SIZE} polynomials, has {}",
				self.polys.poly_count()
			)));
		}
		Ok(())
	}

	pub(crate) fn write_body(&self, w: &mut ByteWriter) {
		w.write_parms_id(self.parms_id);
		w.write_u64(self.polys.poly_count() as u64);
		w.write_u64(self.polys.poly_modulus_degree() as u64);
		w.write_u64(self.polys.coeff_modulus_size() as u64);
		w.write_f64(self.scale);
		w.write_u64(self.correction_factor);
		w.write_u8(self.is_ntt_form as u8);
		w.write_u64_array(self.polys.data());
	}

	pub(crate) fn read_body(r: &mut ByteReader) -> Result<Self> {
		let parms_id = r.read_parms_id()?;
		let size = r.read_u64()? as usize;
		let poly_modulus_degree = r.read_u64()? as usize;
		let coeff_modulus_size = r.read_u64()? as usize;
		let scale = r.read_f64()?;
		let correction_factor = r.read_u64()?;
		let is_ntt_form = r.read_u8()? != 0;
		let data = r.read_u64_array()?;

		let expected = size * coeff_modulus_size * poly_modulus_degree;
		if data.len() != expected {
			return Err(Error::InvalidSerializedField {
				field: "data".into(),
				reason: format!("declared shape needs {expected} coefficients, got {}", data.len()),
			});
		}

		let mut polys = PolyArray::new(size, coeff_modulus_size, poly_modulus_degree);
		polys.data_mut().copy_from_slice(&data);

		Self::from_poly_array(polys, parms_id, scale, is_ntt_form, correction_factor)
	}

	/// Encodes this ciphertext to its framed byte representation, applying
	/// `mode`'s compression.
	pub fn to_bytes_with_mode(&self, mode: CompressionMode) -> Result<Vec<u8>> {
		let mut w = ByteWriter::new();
		self.write_body(&mut w);
		frame(&w.into_vec(), mode)
	}
}

impl ToBytes for Ciphertext {
	fn as_bytes(&self) -> Result<Vec<u8>> {
		self.to_bytes_with_mode(CompressionMode::None)
	}
}

impl FromBytes for Ciphertext {
	type State = Context;

	fn from_bytes(context: &Context, bytes: &[u8]) -> Result<Self> {
		let body = unframe(bytes)?;
		let mut r = ByteReader::new(&body);
		let ciphertext = Self::read_body(&mut r)?;
		ciphertext.is_valid_for(context)?;
		Ok(ciphertext)
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
	fn new_ciphertext_is_correctly_shaped() {
		let ctx = bfv_context();
		let ct = Ciphertext::new(&ctx, ctx.first_parms_id(), 2).unwrap();
		assert_eq!(ct.size(), 2);
		assert_eq!(ct.coeff_modulus_size(), ctx.first_context_data().rns_base().len());
		assert_eq!(ct.poly_modulus_degree(), ctx.first_context_data().parms().poly_modulus_degree() as usize);
		assert!(ct.is_valid_for(&ctx).is_ok());
	}

	#[test]
	fn new_rejects_size_below_two() {
		let ctx = bfv_context();
		assert!(matches!(
			Ciphertext::new(&ctx, ctx.first_parms_id(), 1),
			Err(Error::LengthMismatch { .. })
		));
	}

	#[test]
	fn as_bytes_round_trips_through_from_bytes() {
		let ctx = bfv_context();
		let mut ct = Ciphertext::new(&ctx, ctx.first_parms_id(), 3).unwrap();
		ct.data_mut().component_mut(0, 0).unwrap().copy_from_slice(&vec![7u64; ct.poly_modulus_degree()]);
		ct.set_scale(2.5);
		ct.set_correction_factor(3);

		let bytes = ct.as_bytes().unwrap();
		let decoded = Ciphertext::from_bytes(&ctx, &bytes).unwrap();
		assert_eq!(decoded, ct);
	}

	#[test]
	fn compressed_round_trip_matches_uncompressed() {
		let ctx = bfv_context();
		let ct = Ciphertext::new(&ctx, ctx.first_parms_id(), 2).unwrap();
		let bytes = ct.to_bytes_with_mode(CompressionMode::Deflate).unwrap();
		let decoded = Ciphertext::from_bytes(&ctx, &bytes).unwrap();
		assert_eq!(decoded, ct);
	}

	#[test]
	fn rescale_scale_updates_ciphertext_scale_on_level_drop() {
		let ctx = bfv_context();
		let mut ct = Ciphertext::new(&ctx, ctx.first_parms_id(), 2).unwrap();
		ct.set_scale(1_000_000.0);
		let dropped = ctx.key_context_data().rns_base().primes().last().unwrap();
		let new_scale = rescale_scale(ct.scale(), dropped);
		ct.set_scale(new_scale);
		assert_eq!(ct.scale(), 1_000_000.0 / dropped.value() as f64);
		assert!(check_scale_bounds(ct.scale(), ctx.first_context_data()).is_ok());
	}

	#[test]
	fn from_bytes_rejects_shape_mismatch_against_context() {
		let ctx = bfv_context();
		// Build a ciphertext shaped for the *key* level, then validate it
		// against the key level's own parms_id but with a corrupted degree
		// field so the declared shape no longer matches the decoded data.
		let mut w = ByteWriter::new();
		w.write_parms_id(ctx.key_parms_id());
		w.write_u64(2);
		w.write_u64(4); // wrong poly_modulus_degree
		w.write_u64(ctx.key_context_data().rns_base().len() as u64);
		w.write_f64(1.0);
		w.write_u64(1);
		w.write_u8(0);
		w.write_u64_array(&vec![0u64; 2 * ctx.key_context_data().rns_base().len() * 4]);
		let framed = frame(&w.into_vec(), CompressionMode::None).unwrap();
		assert!(matches!(
			Ciphertext::from_bytes(&ctx, &framed),
			Err(Error::InvalidForContext(_))
		));
	}
}
