use thiserror::Error;

/// The result type returned by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The errors that can occur while building parameters, constructing a
/// [`crate::Context`], manipulating ring elements, or serializing objects.
///
/// Every variant belongs to one of the four kinds described by the core's
/// failure model: `Argument` (caller passed something malformed), `State`
/// (an object isn't valid for the context it's being used with), `Resource`
/// (allocation or pool exhaustion), and `Corrupt`/`Crypto` (a loaded blob or
/// a parameter set failed validation). [`Error::kind`] recovers the kind for
/// callers that want to branch on it without matching every variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// A modulus value was zero, one, or did not fit in the 62-bit range
	/// small-modulus arithmetic requires.
	#[error("invalid modulus value {0}: moduli must satisfy 1 < q < 2^62")]
	InvalidModulus(u64),

	/// An inverse was requested for a value that is not coprime to the
	/// modulus.
	#[error("value {0} has no inverse modulo {1}")]
	NotInvertible(u64, u64),

	/// `poly_modulus_degree` was zero, not a power of two, or outside
	/// `[2, 32768]`.
	#[error("poly_modulus_degree {0} must be a power of two in [2, 32768]")]
	InvalidPolyModulusDegree(u64),

	/// The coefficient modulus list was empty, too large, contained a
	/// duplicate, or contained a non-prime / out-of-range entry.
	#[error("invalid coefficient modulus: {0}")]
	InvalidCoeffModulus(String),

	/// `plain_modulus` was zero or not smaller than the coefficient modulus
	/// product (BFV/BGV only).
	#[error("invalid plain modulus: {0}")]
	InvalidPlainModulus(String),

	/// The parameter set does not admit the number-theoretic transform
	/// (some prime fails `2N | q_i - 1`) where it is required.
	#[error("parameters do not support the NTT: {0}")]
	NttNotSupported(String),

	/// The requested parameters fall outside the standard's security-level
	/// table for the given `poly_modulus_degree`.
	#[error("parameters do not satisfy security level {0:?}")]
	InsecureParameters(super::modulus::SecurityLevel),

	/// A `parms_id` did not match any node of the requested modulus chain.
	#[error("no context data for the given parms_id")]
	UnknownParmsId,

	/// An operation required an object constructed under the same
	/// `parms_id` / chain but received one from a different one.
	#[error("object is not valid for the current context: {0}")]
	InvalidForContext(String),

	/// A buffer given to a kernel routine had the wrong length.
	#[error("buffer length mismatch: expected {expected}, got {actual}")]
	LengthMismatch {
		/// Length the routine required.
		expected: usize,
		/// Length actually supplied.
		actual: usize,
	},

	/// An aliased (borrowed) buffer was asked to resize, which it cannot do.
	#[error("cannot resize a borrowed buffer")]
	AliasedResize,

	/// The memory pool could not satisfy an allocation request.
	#[error("memory pool exhausted: {0}")]
	PoolExhausted(String),

	/// An item was released back to a pool other than the one that
	/// allocated it.
	#[error("item released to a pool that did not allocate it")]
	CrossPoolRelease,

	/// Serialized data failed header validation (bad magic, version, or
	/// compression mode).
	#[error("corrupt stream: {0}")]
	Corrupt(String),

	/// Serialized data decoded but failed `is_valid_for` validation against
	/// the supplied context.
	#[error("object failed context validation: field `{field}`: {reason}")]
	InvalidSerializedField {
		/// Name of the first field that failed validation.
		field: String,
		/// Human-readable reason.
		reason: String,
	},

	/// Underlying I/O failure while reading or writing a serialization
	/// stream.
	#[error("I/O error: {0}")]
	Io(String),

	/// Prime generation could not find enough primes for the requested
	/// sizes.
	#[error("could not find enough primes: {0}")]
	PrimeGenerationFailed(String),

	/// A CKKS scale was non-positive, non-finite, or too large to be
	/// represented by the ciphertext's current coefficient-modulus product.
	#[error("invalid scale: {0}")]
	InvalidScale(String),
}

/// The broad failure kind a given [`Error`] belongs to, per the core's
/// failure model (construction-time checks are eager and atomic; hot-path
/// checks are debug-only).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
	/// Malformed caller input: null/empty buffer, wrong length, invalid id.
	Argument,
	/// An object is not valid for the context it was used with.
	State,
	/// Allocation failure, pool exhaustion, or I/O failure.
	Resource,
	/// Serialized data failed structural or contextual validation.
	Corrupt,
	/// Parameters are not cryptographically admissible.
	Crypto,
}

impl Error {
	/// Classifies this error into one of the five kinds from §7 of the
	/// core's error handling design.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::LengthMismatch { .. }
			| Error::AliasedResize
			| Error::UnknownParmsId
			| Error::InvalidScale(_) => ErrorKind::Argument,
			Error::InvalidForContext(_) | Error::InvalidSerializedField { .. } => ErrorKind::State,
			Error::PoolExhausted(_) | Error::CrossPoolRelease | Error::Io(_) => ErrorKind::Resource,
			Error::Corrupt(_) => ErrorKind::Corrupt,
			Error::InvalidModulus(_)
			| Error::NotInvertible(_, _)
			| Error::InvalidPolyModulusDegree(_)
			| Error::InvalidCoeffModulus(_)
			| Error::InvalidPlainModulus(_)
			| Error::NttNotSupported(_)
			| Error::InsecureParameters(_)
			| Error::PrimeGenerationFailed(_) => ErrorKind::Crypto,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(e: std::io::Error) -> Self {
		Error::Io(e.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kinds_partition_variants_sensibly() {
		assert_eq!(Error::UnknownParmsId.kind(), ErrorKind::Argument);
		assert_eq!(Error::CrossPoolRelease.kind(), ErrorKind::Resource);
		assert_eq!(Error::Corrupt("bad magic".into()).kind(), ErrorKind::Corrupt);
		assert_eq!(Error::InvalidModulus(1).kind(), ErrorKind::Crypto);
	}
}
