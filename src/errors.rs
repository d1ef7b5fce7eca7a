//! Errors surfaced by key aggregation, nonce handling, signing and decoding.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MuSigError>;

/// Every failure the protocol can report to its caller.
///
/// A signature that does not verify is not an error: verification returns a
/// plain `bool`.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum MuSigError {
    /// The aggregate public key is the point at infinity.
    #[error("Aggregate public key is the point at infinity")]
    InvalidAggregateKey,

    /// The effective nonce R is the point at infinity.
    #[error("Effective nonce is the point at infinity")]
    InvalidEffectiveNonce,

    /// A signer supplied a different number of nonces than agreed.
    #[error("Signer {signer} supplied {actual} nonces, expected {expected}")]
    NonceCountMismatch {
        signer: usize,
        expected: usize,
        actual: usize,
    },

    /// Fewer (or more) contributions than signers were received.
    #[error("Expected contributions from {expected} signers, got {actual}")]
    IncompleteParticipation { expected: usize, actual: usize },

    /// The random source kept returning zero for a secret nonce.
    #[error("Random source returned a zero nonce")]
    ZeroNonceSampled,

    #[error("No public keys provided for aggregation")]
    EmptySignerSet,

    #[error("Nonce count must be at least 1")]
    InvalidNonceCount,

    #[error("Public key {0} appears more than once in the signer set")]
    DuplicatePublicKey(String),

    #[error("Secret key must be a nonzero scalar")]
    InvalidSecretKey,

    #[error("Point decoding failed")]
    InvalidPoint,

    #[error("Scalar is not reduced modulo the group order")]
    InvalidScalar,

    /// A partial signature failed its individual check.
    #[error("Partial signature of signer {index} is invalid")]
    InvalidPartialSignature { index: usize },

    #[error("Public key is not part of the signer set")]
    UnknownSigner,
}
