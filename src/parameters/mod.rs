//! Encryption parameters: the immutable, scheme-specific value that
//! everything else in this crate (contexts, keys, plaintexts, ciphertexts)
//! is indexed by.
//!
//! Unlike the FFI-bound original this crate's lineage descends from,
//! `EncryptionParameters` here is a plain Rust value with no handle to
//! free: built once by a scheme-specific builder, validated eagerly, and
//! from then on immutable and `Clone`.

mod bfv;
mod bgv;
mod ckks;

pub use bfv::BfvEncryptionParametersBuilder;
pub use bgv::BgvEncryptionParametersBuilder;
pub use ckks::CkksEncryptionParametersBuilder;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::serialization::{frame, unframe, ByteReader, ByteWriter, CompressionMode, FromBytes, ToBytes};
use crate::util::blake2xb::{canonical_encoding, hash_parms_id, ParmsId, PARMS_ID_ZERO};
use crate::util::small_modulus::SmallModulus;

/// The FHE scheme an [`EncryptionParameters`] value is configured for.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemeType {
	/// Sentinel value; never a legal scheme for constructed parameters.
	None = 0x0,
	/// Brakerski/Fan-Vercauteren scheme.
	Bfv = 0x1,
	/// Cheon-Kim-Kim-Song scheme.
	Ckks = 0x2,
	/// Brakerski-Gentry-Vaikuntanathan scheme.
	Bgv = 0x3,
}

/// The polynomial-modulus degrees this engine supports, one variant per
/// power of two in `[256, 32768]`.
#[allow(missing_docs)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegreeType {
	D256,
	D512,
	D1024,
	D2048,
	D4096,
	D8192,
	D16384,
	D32768,
}

impl From<DegreeType> for u64 {
	fn from(value: DegreeType) -> Self {
		match value {
			DegreeType::D256 => 256,
			DegreeType::D512 => 512,
			DegreeType::D1024 => 1024,
			DegreeType::D2048 => 2048,
			DegreeType::D4096 => 4096,
			DegreeType::D8192 => 8192,
			DegreeType::D16384 => 16384,
			DegreeType::D32768 => 32768,
		}
	}
}

impl TryFrom<u8> for SchemeType {
	type Error = Error;

	fn try_from(value: u8) -> Result<Self> {
		match value {
			0x1 => Ok(SchemeType::Bfv),
			0x2 => Ok(SchemeType::Ckks),
			0x3 => Ok(SchemeType::Bgv),
			other => Err(Error::Corrupt(format!("unknown scheme byte {other}"))),
		}
	}
}

impl TryFrom<u64> for DegreeType {
	type Error = Error;

	fn try_from(value: u64) -> Result<Self> {
		match value {
			256 => Ok(DegreeType::D256),
			512 => Ok(DegreeType::D512),
			1024 => Ok(DegreeType::D1024),
			2048 => Ok(DegreeType::D2048),
			4096 => Ok(DegreeType::D4096),
			8192 => Ok(DegreeType::D8192),
			16384 => Ok(DegreeType::D16384),
			32768 => Ok(DegreeType::D32768),
			_ => Err(Error::InvalidPolyModulusDegree(value)),
		}
	}
}

/// An immutable, validated set of encryption parameters.
///
/// Two `EncryptionParameters` with the same scheme, degree, coefficient
/// modulus and plaintext modulus always carry the same [`ParmsId`] —
/// [`EncryptionParameters::parms_id`] is a pure function of those fields,
/// computed once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionParameters {
	scheme: SchemeType,
	poly_modulus_degree: u64,
	coeff_modulus: Vec<SmallModulus>,
	plain_modulus: SmallModulus,
	parms_id: ParmsId,
}

impl EncryptionParameters {
	/// The scheme these parameters were built for.
	pub fn scheme(&self) -> SchemeType {
		self.scheme
	}

	/// The ring degree `N`.
	pub fn poly_modulus_degree(&self) -> u64 {
		self.poly_modulus_degree
	}

	/// The coefficient-modulus prime chain, in chain order (finest level
	/// first, special/last prime last).
	pub fn coeff_modulus(&self) -> &[SmallModulus] {
		&self.coeff_modulus
	}

	/// The plaintext modulus (`SmallModulus::ZERO` for CKKS, which has no
	/// plaintext modulus).
	pub fn plain_modulus(&self) -> &SmallModulus {
		&self.plain_modulus
	}

	/// The 256-bit fingerprint identifying this exact parameter set.
	pub fn parms_id(&self) -> ParmsId {
		self.parms_id
	}

	/// Builds and validates an `EncryptionParameters`, computing its
	/// `parms_id` from the validated fields. Shared by every scheme builder.
	fn build(
		scheme: SchemeType,
		poly_modulus_degree: u64,
		coeff_modulus: Vec<SmallModulus>,
		plain_modulus: SmallModulus,
	) -> Result<Self> {
		if poly_modulus_degree == 0 || !poly_modulus_degree.is_power_of_two() || !(2..=32768).contains(&poly_modulus_degree) {
			return Err(Error::InvalidPolyModulusDegree(poly_modulus_degree));
		}

		if coeff_modulus.is_empty() {
			return Err(Error::InvalidCoeffModulus("coefficient modulus must not be empty".into()));
		}
		for (i, q) in coeff_modulus.iter().enumerate() {
			if q.is_zero() || q.bit_count() > SmallModulus::MAX_BITS {
				return Err(Error::InvalidCoeffModulus(format!(
					"coefficient modulus entry {i} ({}) is zero or exceeds {} bits",
					q.value(),
					SmallModulus::MAX_BITS
				)));
			}
		}
		for i in 0..coeff_modulus.len() {
			for j in (i + 1)..coeff_modulus.len() {
				if coeff_modulus[i].value() == coeff_modulus[j].value() {
					return Err(Error::InvalidCoeffModulus(format!(
						"coefficient modulus entries {i} and {j} are both {}",
						coeff_modulus[i].value()
					)));
				}
			}
		}

		match scheme {
			SchemeType::Bfv | SchemeType::Bgv => {
				if plain_modulus.is_zero() {
					return Err(Error::InvalidPlainModulus("BFV/BGV require a nonzero plaintext modulus".into()));
				}
				if plain_modulus.bit_count() >= coeff_modulus[0].bit_count() {
					return Err(Error::InvalidPlainModulus(
						"plaintext modulus must be smaller than the coefficient modulus".into(),
					));
				}
			}
			SchemeType::Ckks => {
				if !plain_modulus.is_zero() {
					return Err(Error::InvalidPlainModulus("CKKS does not use a plaintext modulus".into()));
				}
			}
			SchemeType::None => unreachable!("builders never construct SchemeType::None"),
		}

		let scheme_byte = scheme as u8;
		let coeff_values: Vec<u64> = coeff_modulus.iter().map(|m| m.value()).collect();
		let bytes = canonical_encoding(scheme_byte, poly_modulus_degree, plain_modulus.value(), &coeff_values);
		let parms_id = hash_parms_id(&bytes);

		Ok(Self {
			scheme,
			poly_modulus_degree,
			coeff_modulus,
			plain_modulus,
			parms_id,
		})
	}

	/// Rebuilds these parameters with a different (necessarily shorter)
	/// coefficient modulus, keeping scheme/degree/plain_modulus fixed and
	/// re-validating and re-hashing from scratch. Used by [`crate::Context`]
	/// to derive each chain node's own `EncryptionParameters` when dropping
	/// primes.
	pub(crate) fn with_coeff_modulus(&self, coeff_modulus: Vec<SmallModulus>) -> Result<Self> {
		Self::build(self.scheme, self.poly_modulus_degree, coeff_modulus, self.plain_modulus)
	}

	/// Encodes these parameters to their framed byte representation,
	/// applying `mode`'s compression.
	pub fn to_bytes_with_mode(&self, mode: CompressionMode) -> Result<Vec<u8>> {
		let mut w = ByteWriter::new();
		w.write_u8(self.scheme as u8);
		w.write_u64(self.poly_modulus_degree);
		w.write_u64(self.plain_modulus.value());
		w.write_u64(self.coeff_modulus.len() as u64);
		for q in &self.coeff_modulus {
			w.write_u64(q.value());
		}
		frame(&w.into_vec(), mode)
	}
}

impl ToBytes for EncryptionParameters {
	fn as_bytes(&self) -> Result<Vec<u8>> {
		self.to_bytes_with_mode(CompressionMode::None)
	}
}

impl FromBytes for EncryptionParameters {
	/// `EncryptionParameters` decoding needs no external context: it *is*
	/// the thing a [`crate::Context`] is built from.
	type State = ();

	fn from_bytes(_state: &(), bytes: &[u8]) -> Result<Self> {
		let body = unframe(bytes)?;
		let mut r = ByteReader::new(&body);
		let scheme = SchemeType::try_from(r.read_u8()?)?;
		let poly_modulus_degree = r.read_u64()?;
		let plain_modulus_value = r.read_u64()?;
		let k = r.read_u64()? as usize;
		let mut coeff_modulus = Vec::with_capacity(k);
		for _ in 0..k {
			coeff_modulus.push(SmallModulus::new(r.read_u64()?)?);
		}
		let plain_modulus = SmallModulus::new(plain_modulus_value)?;
		Self::build(scheme, poly_modulus_degree, coeff_modulus, plain_modulus)
	}
}

/// `parms_id` before any parameters have been assigned; used to mark "no
/// parameters" in data shapes that can exist unattached to a context.
pub const PARMS_ID_NONE: ParmsId = PARMS_ID_ZERO;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn degree_type_roundtrips() {
		for d in [256u64, 512, 1024, 2048, 4096, 8192, 16384, 32768] {
			let degree = DegreeType::try_from(d).unwrap();
			let back: u64 = degree.into();
			assert_eq!(back, d);
		}
	}

	#[test]
	fn degree_type_rejects_non_power_of_two() {
		assert!(DegreeType::try_from(1000u64).is_err());
	}

	#[test]
	fn as_bytes_round_trips_through_from_bytes() {
		use crate::modulus::CoefficientModulus;

		let modulus_chain = CoefficientModulus::create(DegreeType::D1024, &[30, 30]).unwrap();
		let parms = BfvEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.set_coefficient_modulus(modulus_chain)
			.set_plain_modulus_u64(65537)
			.unwrap()
			.build()
			.unwrap();

		let bytes = parms.as_bytes().unwrap();
		let decoded = EncryptionParameters::from_bytes(&(), &bytes).unwrap();
		assert_eq!(decoded, parms);
		assert_eq!(decoded.parms_id(), parms.parms_id());
	}

	#[test]
	fn scheme_type_round_trips_through_bytes() {
		assert_eq!(SchemeType::try_from(SchemeType::Bfv as u8).unwrap(), SchemeType::Bfv);
		assert!(SchemeType::try_from(0x7u8).is_err());
	}
}
