//! Builder for BGV [`EncryptionParameters`].
//!
//! BGV is the third scheme variant this crate carries alongside BFV/CKKS
//! (named directly in the data model: `scheme ∈ {BFV, CKKS, BGV}`,
//! `correction factor (BGV)` on [`crate::Ciphertext`]). Its parameter
//! validation is identical to BFV's — same plaintext-modulus constraint —
//! so this builder is a thin `SchemeType` variant of
//! [`super::BfvEncryptionParametersBuilder`] rather than a reimplementation.

use crate::error::{Error, Result};
use crate::util::small_modulus::SmallModulus;

use super::{EncryptionParameters, SchemeType};

/// Builds a set of BGV encryption parameters.
#[derive(Debug, Default)]
pub struct BgvEncryptionParametersBuilder {
	poly_modulus_degree: Option<u64>,
	coeff_modulus: Option<Vec<SmallModulus>>,
	plain_modulus: Option<SmallModulus>,
}

impl BgvEncryptionParametersBuilder {
	/// Starts a new, empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the ring degree `N`.
	pub fn set_poly_modulus_degree(mut self, degree: super::DegreeType) -> Self {
		self.poly_modulus_degree = Some(degree.into());
		self
	}

	/// Sets the coefficient modulus prime chain.
	pub fn set_coefficient_modulus(mut self, coeff_modulus: Vec<SmallModulus>) -> Self {
		self.coeff_modulus = Some(coeff_modulus);
		self
	}

	/// Sets the plaintext modulus.
	pub fn set_plain_modulus(mut self, plain_modulus: SmallModulus) -> Self {
		self.plain_modulus = Some(plain_modulus);
		self
	}

	/// Sets the plaintext modulus to a fixed value.
	pub fn set_plain_modulus_u64(mut self, value: u64) -> Result<Self> {
		self.plain_modulus = Some(SmallModulus::new(value)?);
		Ok(self)
	}

	/// Validates the chosen fields and builds the parameters.
	pub fn build(self) -> Result<EncryptionParameters> {
		let poly_modulus_degree = self
			.poly_modulus_degree
			.ok_or_else(|| Error::InvalidPolyModulusDegree(0))?;
		let coeff_modulus = self
			.coeff_modulus
			.ok_or_else(|| Error::InvalidCoeffModulus("coefficient modulus not set".into()))?;
		let plain_modulus = self
			.plain_modulus
			.ok_or_else(|| Error::InvalidPlainModulus("plain modulus not set".into()))?;

		EncryptionParameters::build(SchemeType::Bgv, poly_modulus_degree, coeff_modulus, plain_modulus)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modulus::CoefficientModulus;
	use crate::parameters::DegreeType;

	#[test]
	fn can_build_bgv_params() {
		let params = BgvEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.set_coefficient_modulus(CoefficientModulus::create(DegreeType::D1024, &[30]).unwrap())
			.set_plain_modulus_u64(1234)
			.unwrap()
			.build()
			.unwrap();

		assert_eq!(params.scheme(), SchemeType::Bgv);
		assert_eq!(params.plain_modulus().value(), 1234);
	}
}
