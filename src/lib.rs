//! # MuSig2 Signature Library
//!
//! This Rust library implements the MuSig2 n-of-n multi-signature scheme over secp256k1, built on the
//! `k256` crate. All signers jointly produce a single Schnorr signature that verifies against a single
//! aggregate public key.
//!
//! ## Key Aggregation
//!
//! - Signers have private keys x1, x2, …, xn with public keys X1, X2, …, Xn (Xi = xi * G).
//! - The signer set L is sorted by the big-endian x-coordinate of each key (ties broken by y).
//! - Each key gets a coefficient ai = H_agg(L, Xi); a zero hash is replaced by 1.
//! - The aggregate key is X = sum of ai * Xi.
//!
//! ## Signing
//!
//! 1. Round 1: every signer samples ν secret nonces r_i,j and broadcasts R_i,j = r_i,j * G.
//! 2. Nonces are summed per slot: R_j = sum over i of R_i,j.
//! 3. b = H_non(X, R_0..R_ν-1, m), R = sum of b^j * R_j, c = H_sig(X, R, m).
//! 4. Round 2: each signer computes si = sum of r_i,j * b^j + c * ai * xi.
//! 5. The signature is (R, s) with s = sum of si.
//!
//! Verification: s * G = R + c * X.
//!
//! Every hash is a tagged hash `SHA256(SHA256(tag) || SHA256(tag) || data) mod n`, with a distinct
//! tag per use.
//!
//! ## Usage
//!
//! The [`party`] and [`aggregator`] modules drive a whole run in process with typestate objects. The
//! free functions in [`schnorr_musig::musig_math`] and the cached contexts in
//! [`schnorr_musig::session`] expose each step on its own.
//!
//! Secret nonces are single use. A [`rand_nonce::NonceCommitmentRound`] is moved into the partial
//! signing call and cannot be reused.

pub mod config;
pub mod encoding;
pub mod errors;
pub mod keys_management;
pub mod rand_nonce;
pub mod schnorr_musig;
pub mod tagged_hash;

#[cfg(feature = "tracing")]
pub mod telemetry;

pub use crate::config::{DuplicateKeyPolicy, MuSigConfig};
pub use crate::errors::{MuSigError, Result};
pub use crate::schnorr_musig::musig_protocol::aggregator;
pub use crate::schnorr_musig::musig_protocol::party;
pub use crate::schnorr_musig::musig_protocol::protocol_messages;
pub use crate::schnorr_musig::session::{AggregateSignature, KeyAggContext, SigningSession};
