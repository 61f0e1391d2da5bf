//! Builder for BFV [`EncryptionParameters`].

use crate::error::{Error, Result};
use crate::util::small_modulus::SmallModulus;

use super::{EncryptionParameters, SchemeType};

/// Builds a set of BFV encryption parameters.
///
/// Every setter takes `self` by value and returns it, so parameters are
/// assembled with a fluent chain and validated only once, in
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct BfvEncryptionParametersBuilder {
	poly_modulus_degree: Option<u64>,
	coeff_modulus: Option<Vec<SmallModulus>>,
	plain_modulus: Option<SmallModulus>,
}

impl BfvEncryptionParametersBuilder {
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

	/// Sets the plaintext modulus from a [`SmallModulus`] (use
	/// [`crate::modulus::PlainModulus::batching`] for a batching-capable one).
	pub fn set_plain_modulus(mut self, plain_modulus: SmallModulus) -> Self {
		self.plain_modulus = Some(plain_modulus);
		self
	}

	/// Sets the plaintext modulus to a fixed value with no batching
	/// congruence requirement. Not recommended for new parameter sets.
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

		EncryptionParameters::build(SchemeType::Bfv, poly_modulus_degree, coeff_modulus, plain_modulus)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modulus::{CoefficientModulus, SecurityLevel};
	use crate::parameters::DegreeType;

	#[test]
	fn can_build_params_with_literal_bfv_default() {
		let params = BfvEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.set_coefficient_modulus(CoefficientModulus::bfv_default(DegreeType::D1024, SecurityLevel::default()).unwrap())
			.set_plain_modulus_u64(1234)
			.unwrap()
			.build()
			.unwrap();

		assert_eq!(params.poly_modulus_degree(), 1024);
		assert_eq!(params.scheme(), SchemeType::Bfv);
		assert_eq!(params.plain_modulus().value(), 1234);
		assert_eq!(params.coeff_modulus().len(), 1);
		assert_eq!(params.coeff_modulus()[0].value(), 132120577);
	}

	#[test]
	fn can_build_params_with_literal_five_prime_vector() {
		let params = BfvEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.set_coefficient_modulus(CoefficientModulus::create(DegreeType::D8192, &[50, 30, 30, 50, 50]).unwrap())
			.set_plain_modulus_u64(1234)
			.unwrap()
			.build()
			.unwrap();

		let values: Vec<u64> = params.coeff_modulus().iter().map(|m| m.value()).collect();
		assert_eq!(
			values,
			vec![
				1125899905744897,
				1073643521,
				1073692673,
				1125899906629633,
				1125899906826241,
			]
		);
	}

	#[test]
	fn rejects_missing_fields() {
		assert!(BfvEncryptionParametersBuilder::new().build().is_err());
		assert!(BfvEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.build()
			.is_err());
	}
}
