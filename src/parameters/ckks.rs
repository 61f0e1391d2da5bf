//! Builder for CKKS [`EncryptionParameters`].

use crate::error::{Error, Result};
use crate::util::small_modulus::SmallModulus;

use super::{EncryptionParameters, SchemeType};

/// Builds a set of CKKS encryption parameters. CKKS has no plaintext
/// modulus: plaintext scale is tracked per-[`crate::Plaintext`]/
/// [`crate::Ciphertext`] instead (see `scale` in both data models).
#[derive(Debug, Default)]
pub struct CkksEncryptionParametersBuilder {
	poly_modulus_degree: Option<u64>,
	coeff_modulus: Option<Vec<SmallModulus>>,
}

impl CkksEncryptionParametersBuilder {
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

	/// Validates the chosen fields and builds the parameters.
	pub fn build(self) -> Result<EncryptionParameters> {
		let poly_modulus_degree = self
			.poly_modulus_degree
			.ok_or_else(|| Error::InvalidPolyModulusDegree(0))?;
		let coeff_modulus = self
			.coeff_modulus
			.ok_or_else(|| Error::InvalidCoeffModulus("coefficient modulus not set".into()))?;

		EncryptionParameters::build(SchemeType::Ckks, poly_modulus_degree, coeff_modulus, SmallModulus::ZERO)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modulus::CoefficientModulus;
	use crate::parameters::DegreeType;

	#[test]
	fn can_build_ckks_params() {
		let bit_sizes = [60, 40, 40, 60];
		let modulus_chain = CoefficientModulus::create(DegreeType::D1024, bit_sizes.as_slice()).unwrap();

		let params = CkksEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.set_coefficient_modulus(modulus_chain)
			.build()
			.unwrap();

		assert_eq!(params.poly_modulus_degree(), 1024);
		assert_eq!(params.scheme(), SchemeType::Ckks);
		assert_eq!(params.coeff_modulus().len(), 4);
		assert!(params.plain_modulus().is_zero());
	}

	#[test]
	fn rejects_nonzero_plain_modulus_path() {
		// CKKS never exposes a plain-modulus setter; this just confirms the
		// zero sentinel build() passes through `EncryptionParameters::build`
		// validation cleanly.
		let params = CkksEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.set_coefficient_modulus(CoefficientModulus::create(DegreeType::D1024, &[30]).unwrap())
			.build()
			.unwrap();
		assert!(params.plain_modulus().is_zero());
	}
}
