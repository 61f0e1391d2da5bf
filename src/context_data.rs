//! Per-level bookkeeping attached to one node of a [`crate::Context`]'s
//! modulus chain.
//!
//! Everything a ciphertext or plaintext operation needs once it already
//! knows which chain level it lives at — the level's own RNS base, NTT
//! tables, and the handful of scalar constants used by encoding/decoding and
//! modulus switching — is precomputed once here rather than recomputed on
//! every call.

use std::sync::Arc;

use crate::error::Result;
use crate::modulus::SecurityLevel;
use crate::parameters::{EncryptionParameters, SchemeType};
use crate::util::big_uint::BigUInt;
use crate::util::blake2xb::ParmsId;
use crate::util::ntt::NttTables;
use crate::util::rns_base::RnsBase;
use crate::util::small_modulus::neg_mod;

/// Derived boolean properties of a parameter set, computed once per chain
/// level. Every successfully constructed [`ContextData`] already passed
/// eager NTT-admissibility validation, so `using_fft`/`using_ntt` are always
/// `true` here; they are kept as explicit fields for parity with the rest of
/// the qualifier set, which do vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptionParameterQualifiers {
	/// Always `true`: a `ContextData` only exists for parameters that
	/// already passed NTT validation.
	pub using_fft: bool,
	/// Always `true`, for the same reason as `using_fft`.
	pub using_ntt: bool,
	/// `true` for BFV/BGV parameters whose plaintext modulus is prime and
	/// congruent to `1 mod 2N`, i.e. admits batching (SIMD slot encoding).
	pub using_batching: bool,
	/// `true` for BFV/BGV parameters where every coefficient-modulus prime
	/// exceeds the plaintext modulus in bit length, allowing the "fast
	/// plain lift" shortcut when encoding a plaintext into ciphertext space.
	pub using_fast_plain_lift: bool,
	/// `true` if this level's total coefficient-modulus bit count is within
	/// the configured [`SecurityLevel`]'s table entry.
	pub using_he_std_security: bool,
	/// `true` if the coefficient-modulus prime bit counts are non-increasing
	/// from first to last, the order modulus switching assumes.
	pub using_descending_modulus_chain: bool,
}

/// One level ("node") of a context's modulus-switching chain: an
/// [`EncryptionParameters`] value together with everything derived from it
/// that downstream ciphertext/plaintext operations need.
#[derive(Debug, Clone)]
pub struct ContextData {
	parms: EncryptionParameters,
	qualifiers: EncryptionParameterQualifiers,
	rns_base: Arc<RnsBase>,
	small_ntt_tables: Arc<Vec<NttTables>>,
	total_coeff_modulus: BigUInt,
	total_coeff_modulus_bit_count: u32,
	coeff_div_plain_modulus: Vec<u64>,
	plain_upper_half_threshold: u64,
	plain_upper_half_increment: Vec<u64>,
	upper_half_threshold: Vec<u64>,
	upper_half_increment: Vec<u64>,
	chain_index: usize,
	prev_context_data: Option<Arc<ContextData>>,
}

impl ContextData {
	pub(crate) fn new(
		parms: EncryptionParameters,
		security_level: SecurityLevel,
		chain_index: usize,
		prev_context_data: Option<Arc<ContextData>>,
	) -> Result<Self> {
		let rns_base = Arc::new(RnsBase::new(parms.coeff_modulus())?);

		let small_ntt_tables: Vec<NttTables> = parms
			.coeff_modulus()
			.iter()
			.map(|q| NttTables::new(parms.poly_modulus_degree() as usize, *q))
			.collect::<Result<_>>()?;

		let total_coeff_modulus = rns_base.base_prod().clone();
		let total_coeff_modulus_bit_count = total_coeff_modulus.bit_count();

		let using_descending_modulus_chain = parms
			.coeff_modulus()
			.windows(2)
			.all(|w| w[0].bit_count() >= w[1].bit_count());

		let using_he_std_security = match security_level {
			SecurityLevel::None => false,
			level => level
				.max_bit_count(parms.poly_modulus_degree())
				.is_some_and(|max_bits| total_coeff_modulus_bit_count <= max_bits),
		};

		let (using_batching, using_fast_plain_lift, coeff_div_plain_modulus, plain_upper_half_threshold, plain_upper_half_increment) =
			match parms.scheme() {
				SchemeType::Bfv | SchemeType::Bgv => {
					let t = parms.plain_modulus();
					let two_n = 2 * parms.poly_modulus_degree();
					let using_batching = crate::util::is_prime(t.value()) && (t.value() - 1) % two_n == 0;
					let using_fast_plain_lift = parms.coeff_modulus().iter().all(|q| q.bit_count() > t.bit_count());

					let t_big = BigUInt::from_limbs(vec![t.value()]);
					let coeff_div_plain_modulus: Vec<u64> = parms
						.coeff_modulus()
						.iter()
						.map(|q| {
							let mut divisor = t_big.clone();
							divisor.resize(1);
							let q_big = BigUInt::from_limbs(vec![q.value()]);
							let (quotient, _) = q_big.divide(&divisor)?;
							Ok(quotient.limbs().first().copied().unwrap_or(0))
						})
						.collect::<Result<_>>()?;

					let plain_upper_half_threshold = (t.value() + 1) / 2;
					let plain_upper_half_increment: Vec<u64> = parms
						.coeff_modulus()
						.iter()
						.map(|q| neg_mod(t.value() % q.value(), q))
						.collect();

					(
						using_batching,
						using_fast_plain_lift,
						coeff_div_plain_modulus,
						plain_upper_half_threshold,
						plain_upper_half_increment,
					)
				}
				SchemeType::Ckks => (false, false, Vec::new(), 0, Vec::new()),
				SchemeType::None => unreachable!("a ContextData is never built for SchemeType::None"),
			};

		// `upper_half_threshold`/`upper_half_increment` decompose
		// `floor((Q+1)/2)` and `Q` itself into this level's RNS base; every
		// coefficient modulus prime divides `Q` exactly, so
		// `upper_half_increment` always decomposes to all zero residues —
		// it is still computed through the real decomposition path rather
		// than hardcoded, so it stays correct if a future level's base ever
		// changes that invariant.
		let one = BigUInt::from_limbs(vec![1]);
		let mut half = total_coeff_modulus.add(&one);
		half.shr(1);

		let upper_half_threshold = rns_base.decompose(&half)?;
		let upper_half_increment = rns_base.decompose(&total_coeff_modulus)?;

		let qualifiers = EncryptionParameterQualifiers {
			using_fft: true,
			using_ntt: true,
			using_batching,
			using_fast_plain_lift,
			using_he_std_security,
			using_descending_modulus_chain,
		};

		Ok(Self {
			parms,
			qualifiers,
			rns_base,
			small_ntt_tables: Arc::new(small_ntt_tables),
			total_coeff_modulus,
			total_coeff_modulus_bit_count,
			coeff_div_plain_modulus,
			plain_upper_half_threshold,
			plain_upper_half_increment,
			upper_half_threshold,
			upper_half_increment,
			chain_index,
			prev_context_data,
		})
	}

	/// The parameters this level was built from.
	pub fn parms(&self) -> &EncryptionParameters {
		&self.parms
	}

	/// This level's `parms_id`.
	pub fn parms_id(&self) -> ParmsId {
		self.parms.parms_id()
	}

	/// The derived qualifier set for this level.
	pub fn qualifiers(&self) -> EncryptionParameterQualifiers {
		self.qualifiers
	}

	/// This level's RNS base (one prime per coefficient-modulus entry).
	pub fn rns_base(&self) -> &RnsBase {
		&self.rns_base
	}

	/// Per-prime NTT tables for this level, one per coefficient-modulus
	/// entry, in the same order.
	pub fn small_ntt_tables(&self) -> &[NttTables] {
		&self.small_ntt_tables
	}

	/// The product of every prime in this level's coefficient modulus.
	pub fn total_coeff_modulus(&self) -> &BigUInt {
		&self.total_coeff_modulus
	}

	/// Bit length of [`Self::total_coeff_modulus`].
	pub fn total_coeff_modulus_bit_count(&self) -> u32 {
		self.total_coeff_modulus_bit_count
	}

	/// `floor(q_i / t)` per coefficient-modulus prime (BFV/BGV only; empty
	/// for CKKS).
	pub fn coeff_div_plain_modulus(&self) -> &[u64] {
		&self.coeff_div_plain_modulus
	}

	/// `(t + 1) / 2`, the smallest plaintext value treated as "negative"
	/// (BFV/BGV only; `0` for CKKS).
	pub fn plain_upper_half_threshold(&self) -> u64 {
		self.plain_upper_half_threshold
	}

	/// `(Q - t) mod q_i`, used to lift a centered plaintext coefficient into
	/// ciphertext space (BFV/BGV only; empty for CKKS).
	pub fn plain_upper_half_increment(&self) -> &[u64] {
		&self.plain_upper_half_increment
	}

	/// `floor((Q + 1) / 2)`, decomposed into this level's RNS base.
	pub fn upper_half_threshold(&self) -> &[u64] {
		&self.upper_half_threshold
	}

	/// `Q`, decomposed into this level's RNS base.
	pub fn upper_half_increment(&self) -> &[u64] {
		&self.upper_half_increment
	}

	/// This level's position in the chain: `0` at the last (lowest) level,
	/// increasing toward the key level.
	pub fn chain_index(&self) -> usize {
		self.chain_index
	}

	/// The chain level directly above this one (one more prime), or `None`
	/// at the key level.
	pub fn prev_context_data(&self) -> Option<&Arc<ContextData>> {
		self.prev_context_data.as_ref()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::modulus::CoefficientModulus;
	use crate::parameters::{BfvEncryptionParametersBuilder, DegreeType};

	fn bfv_parms() -> EncryptionParameters {
		let modulus_chain = CoefficientModulus::create(DegreeType::D1024, &[30]).unwrap();
		BfvEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.set_coefficient_modulus(modulus_chain)
			.set_plain_modulus_u64(65537)
			.unwrap()
			.build()
			.unwrap()
	}

	#[test]
	fn derives_batching_and_fast_plain_lift_for_bfv() {
		let data = ContextData::new(bfv_parms(), SecurityLevel::None, 0, None).unwrap();
		assert!(data.qualifiers().using_ntt);
		assert!(data.qualifiers().using_fast_plain_lift);
		assert_eq!(data.coeff_div_plain_modulus().len(), 1);
		assert_eq!(data.plain_upper_half_threshold(), (65537 + 1) / 2);
	}

	#[test]
	fn upper_half_increment_is_zero_for_a_single_prime_base() {
		// Q == q_0 exactly, so Q mod q_0 == 0.
		let data = ContextData::new(bfv_parms(), SecurityLevel::None, 0, None).unwrap();
		assert_eq!(data.upper_half_increment(), &[0]);
	}

	#[test]
	fn ckks_has_no_plaintext_bookkeeping() {
		use crate::parameters::CkksEncryptionParametersBuilder;
		let modulus_chain = CoefficientModulus::create(DegreeType::D1024, &[30, 30]).unwrap();
		let parms = CkksEncryptionParametersBuilder::new()
			.set_poly_modulus_degree(DegreeType::D1024)
			.set_coefficient_modulus(modulus_chain)
			.build()
			.unwrap();
		let data = ContextData::new(parms, SecurityLevel::None, 1, None).unwrap();
		assert!(data.coeff_div_plain_modulus().is_empty());
		assert!(!data.qualifiers().using_batching);
	}

	#[test]
	fn chain_links_to_previous_level() {
		let head = Arc::new(ContextData::new(bfv_parms(), SecurityLevel::None, 0, None).unwrap());
		let child = ContextData::new(bfv_parms(), SecurityLevel::None, 1, Some(head.clone())).unwrap();
		assert_eq!(child.prev_context_data().unwrap().parms_id(), head.parms_id());
		assert_eq!(child.chain_index(), 1);
	}
}
