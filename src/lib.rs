//! Core lattice-cryptography engine for a power-of-two cyclotomic ring
//! `R_q = Z_q[X]/(X^N+1)`, underlying the BFV, BGV and CKKS homomorphic
//! encryption schemes.
//!
//! This crate is the hard engineering concentrated under an `Encryptor`/
//! `Decryptor`/`Evaluator` API, not that API itself: modular arithmetic on
//! 62-bit prime moduli, the Residue Number System representation of ring
//! elements, the Number-Theoretic Transform, the encryption-parameter
//! validation and modulus-switching chain, and a serialization frame for
//! persisting any of the above.
//!
//! # Example
//!
//! ```rust
//! use fhe_core::{
//!     BfvEncryptionParametersBuilder, CoefficientModulus, Context, DegreeType, PlainModulus,
//!     SecurityLevel,
//! };
//!
//! fn main() -> fhe_core::Result<()> {
//!     let params = BfvEncryptionParametersBuilder::new()
//!         .set_poly_modulus_degree(DegreeType::D8192)
//!         .set_coefficient_modulus(CoefficientModulus::create(
//!             DegreeType::D8192,
//!             &[50, 30, 30, 50, 50],
//!         )?)
//!         .set_plain_modulus(PlainModulus::batching(DegreeType::D8192, 20)?)
//!         .build()?;
//!
//!     let ctx = Context::new(params, true, SecurityLevel::Tc128)?;
//!     assert_eq!(ctx.last_context_data().chain_index(), 0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod ciphertext;
pub mod context;
pub mod context_data;
pub mod error;
pub mod keys;
pub mod memory;
pub mod modulus;
pub mod parameters;
pub mod plaintext;
pub mod poly_array;
pub mod serialization;
pub mod util;

pub use ciphertext::Ciphertext;
pub use context::Context;
pub use context_data::{ContextData, EncryptionParameterQualifiers};
pub use error::{Error, ErrorKind, Result};
pub use keys::{GaloisKeys, KSwitchKeys, PublicKey, RelinearizationKeys, SecretKey};
pub use memory::MemoryPool;
pub use modulus::{CoefficientModulus, PlainModulus, SecurityLevel};
pub use parameters::{
	BfvEncryptionParametersBuilder, BgvEncryptionParametersBuilder, CkksEncryptionParametersBuilder,
	DegreeType, EncryptionParameters, SchemeType,
};
pub use plaintext::Plaintext;
pub use poly_array::PolyArray;
pub use serialization::{CompressionMode, FromBytes, ToBytes};
