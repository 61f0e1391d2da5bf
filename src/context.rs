//! The modulus-switching chain: the arena of [`ContextData`] levels derived
//! from one set of top-level [`EncryptionParameters`].
//!
//! Building a `Context` is the one place this crate validates parameters
//! eagerly against a [`SecurityLevel`] and derives every level a ciphertext
//! can be switched down to. Levels are stored in a flat `Vec` (an arena)
//! indexed by `parms_id` rather than linked through `Rc`/`Weak`, so there is
//! no reference cycle to break and no interior mutability needed to walk the
//! chain in either direction.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::context_data::ContextData;
use crate::error::{Error, Result};
use crate::modulus::SecurityLevel;
use crate::parameters::{EncryptionParameters, SchemeType};
use crate::util::blake2xb::ParmsId;

/// A validated [`EncryptionParameters`] value together with its full
/// modulus-switching chain.
///
/// The chain is built once, at construction, by repeatedly dropping the
/// current level's last coefficient-modulus prime: level `0` (the "key"
/// level) carries every prime the caller supplied; each subsequent level
/// drops one prime from the tail until either a single prime remains or a
/// trimmed parameter set fails validation, whichever comes first.
#[derive(Debug)]
pub struct Context {
	levels: Vec<Arc<ContextData>>,
	index_by_parms_id: HashMap<ParmsId, usize>,
	key_parms_id: ParmsId,
	first_parms_id: ParmsId,
	last_parms_id: ParmsId,
	security_level: SecurityLevel,
}

impl Context {
	/// Builds a `Context` from `parms`, validating every derived chain level
	/// against `security_level` (use [`SecurityLevel::None`] together with
	/// the `insecure-params` feature to skip the check).
	///
	/// When `expand_mod_chain` is `false`, the chain stops after the first
	/// level below the key level — a ciphertext never needs more than one
	/// "drop the special prime" step to reach the level it actually
	/// operates at unless modulus switching is in use.
	pub fn new(parms: EncryptionParameters, expand_mod_chain: bool, security_level: SecurityLevel) -> Result<Self> {
		if !matches!(security_level, SecurityLevel::None) {
			let total_bits = parms.coeff_modulus().iter().map(|q| q.bit_count() as u64).sum::<u64>() as u32;
			if security_level
				.max_bit_count(parms.poly_modulus_degree())
				.map_or(true, |max_bits| total_bits > max_bits)
			{
				return Err(Error::InsecureParameters(security_level));
			}
		} else if cfg!(not(feature = "insecure-params")) {
			return Err(Error::InsecureParameters(security_level));
		} else {
			warn!("constructing a Context with SecurityLevel::None; parameters are not security-checked");
		}

		let key_level_prime_count = parms.coeff_modulus().len();
		let _span = tracing::debug_span!("context_construction", prime_count = key_level_prime_count).entered();

		let key_data = Arc::new(ContextData::new(parms.clone(), security_level, key_level_prime_count - 1, None)?);

		let mut levels = vec![key_data.clone()];

		if key_level_prime_count > 1 {
			let mut current_primes = parms.coeff_modulus().to_vec();
			current_primes.pop();
			let mut prev = key_data;

			loop {
				let level_parms = match parms.with_coeff_modulus(current_primes.clone()) {
					Ok(p) => p,
					Err(e) => {
						trace!(error = %e, "stopping chain construction: trimmed parameter set failed validation");
						break;
					}
				};
				let chain_index = current_primes.len() - 1;
				let data = Arc::new(ContextData::new(level_parms, security_level, chain_index, Some(prev.clone()))?);
				trace!(chain_index, primes_remaining = current_primes.len(), "added chain level");
				levels.push(data.clone());
				prev = data;

				if current_primes.len() == 1 {
					break;
				}
				if !expand_mod_chain && levels.len() == 2 {
					break;
				}
				current_primes.pop();
			}
		}

		let mut index_by_parms_id = HashMap::with_capacity(levels.len());
		for (i, level) in levels.iter().enumerate() {
			index_by_parms_id.insert(level.parms_id(), i);
		}

		let key_parms_id = levels[0].parms_id();
		let first_parms_id = levels.get(1).map(|d| d.parms_id()).unwrap_or(key_parms_id);
		let last_parms_id = levels.last().expect("at least the key level always exists").parms_id();

		debug!(
			chain_len = levels.len(),
			key_chain_index = levels[0].chain_index(),
			last_chain_index = levels.last().unwrap().chain_index(),
			"context construction complete"
		);

		Ok(Self {
			levels,
			index_by_parms_id,
			key_parms_id,
			first_parms_id,
			last_parms_id,
			security_level,
		})
	}

	/// The security level this context was validated against.
	pub fn security_level(&self) -> SecurityLevel {
		self.security_level
	}

	/// Looks up the chain level for `parms_id`, or [`Error::UnknownParmsId`]
	/// if it does not belong to this chain.
	pub fn get_context_data(&self, parms_id: ParmsId) -> Result<&Arc<ContextData>> {
		self.index_by_parms_id
			.get(&parms_id)
			.map(|&i| &self.levels[i])
			.ok_or(Error::UnknownParmsId)
	}

	/// The key level: carries every coefficient-modulus prime the caller
	/// supplied. Key-switching keys live here; plaintexts and freshly
	/// encrypted ciphertexts do not.
	pub fn key_context_data(&self) -> &Arc<ContextData> {
		&self.levels[0]
	}

	/// The level newly encrypted ciphertexts and plaintexts are created at:
	/// the key level with its special prime already dropped, or the key
	/// level itself if the chain never had more than one prime.
	pub fn first_context_data(&self) -> &Arc<ContextData> {
		self.levels.get(1).unwrap_or(&self.levels[0])
	}

	/// The lowest level in the chain (fewest remaining primes).
	pub fn last_context_data(&self) -> &Arc<ContextData> {
		self.levels.last().expect("at least the key level always exists")
	}

	/// `parms_id` of [`Self::key_context_data`].
	pub fn key_parms_id(&self) -> ParmsId {
		self.key_parms_id
	}

	/// `parms_id` of [`Self::first_context_data`].
	pub fn first_parms_id(&self) -> ParmsId {
		self.first_parms_id
	}

	/// `parms_id` of [`Self::last_context_data`].
	pub fn last_parms_id(&self) -> ParmsId {
		self.last_parms_id
	}

	/// The scheme every level of this chain shares.
	pub fn scheme(&self) -> SchemeType {
		self.levels[0].parms().scheme()
	}

	/// Number of levels in the chain, including the key level.
	pub fn chain_len(&self) -> usize {
		self.levels.len()
	}
}
