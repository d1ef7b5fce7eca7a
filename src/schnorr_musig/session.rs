//! Cached per-run state: the key aggregation result for a signer set, and the
//! nonce coefficient, effective nonce and challenge for one message.

use super::musig_math::*;
use crate::config::DuplicateKeyPolicy;
use crate::encoding::{encode_scalar, encode_x, ENCODED_LEN};
use crate::errors::{MuSigError, Result};
use crate::keys_management::KeyPair;
use crate::rand_nonce::NonceCommitmentRound;
use crate::tagged_hash::{Sha256TaggedHasher, TaggedHasher};
use k256::{ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};

/// Result of key aggregation over one signer set.
#[derive(Clone, Debug)]
pub struct KeyAggContext {
    ordered_keys: Vec<ProjectivePoint>,
    coefficients: Vec<Scalar>,
    aggregate_key: ProjectivePoint,
}

impl KeyAggContext {
    pub fn new(public_keys: &[ProjectivePoint], policy: DuplicateKeyPolicy) -> Result<Self> {
        Self::with_hasher(&Sha256TaggedHasher, public_keys, policy)
    }

    #[tracing::instrument(
        name = "Aggregating public keys",
        skip(hasher, public_keys),
        fields(signers = public_keys.len())
    )]
    pub fn with_hasher<H: TaggedHasher + ?Sized>(
        hasher: &H,
        public_keys: &[ProjectivePoint],
        policy: DuplicateKeyPolicy,
    ) -> Result<Self> {
        if public_keys.is_empty() {
            return Err(MuSigError::EmptySignerSet);
        }

        let ordered_keys = sort_public_keys(public_keys);
        if policy == DuplicateKeyPolicy::Reject {
            if let Some(pair) = ordered_keys.windows(2).find(|pair| pair[0] == pair[1]) {
                let encoded: String = encode_x(&pair[0])
                    .iter()
                    .map(|byte| format!("{:02x}", byte))
                    .collect();
                return Err(MuSigError::DuplicatePublicKey(encoded));
            }
        }

        let coefficients: Vec<Scalar> = ordered_keys
            .iter()
            .map(|public_key| key_agg_coefficient(hasher, &ordered_keys, public_key))
            .collect();
        let aggregate_key = combine_public_keys(&ordered_keys, &coefficients)?;
        tracing::debug!("Aggregate public key computed");

        Ok(KeyAggContext {
            ordered_keys,
            coefficients,
            aggregate_key,
        })
    }

    pub fn aggregate_key(&self) -> ProjectivePoint {
        self.aggregate_key
    }

    /// The canonical signer set L.
    pub fn ordered_keys(&self) -> &[ProjectivePoint] {
        &self.ordered_keys
    }

    pub fn len(&self) -> usize {
        self.ordered_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_keys.is_empty()
    }

    /// Position of the first occurrence of `public_key` in L.
    pub fn index_of(&self, public_key: &ProjectivePoint) -> Result<usize> {
        self.ordered_keys
            .iter()
            .position(|key| key == public_key)
            .ok_or(MuSigError::UnknownSigner)
    }

    /// a_i for `public_key`. Duplicate keys share one coefficient.
    pub fn coefficient(&self, public_key: &ProjectivePoint) -> Result<Scalar> {
        self.index_of(public_key).map(|index| self.coefficients[index])
    }
}

/// Round-2 values shared by every signer of one run: the aggregated nonces,
/// `b`, the effective nonce `R` and the challenge `c`.
#[derive(Clone, Debug)]
pub struct SigningSession {
    aggregate_key: ProjectivePoint,
    aggregated_nonces: Vec<ProjectivePoint>,
    nonce_coefficient: Scalar,
    effective_nonce: ProjectivePoint,
    challenge: Scalar,
}

impl SigningSession {
    pub fn new(
        key_agg: &KeyAggContext,
        aggregated_nonces: Vec<ProjectivePoint>,
        message: &[u8],
    ) -> Result<Self> {
        Self::with_hasher(&Sha256TaggedHasher, key_agg, aggregated_nonces, message)
    }

    #[tracing::instrument(
        name = "Deriving nonce coefficient, effective nonce and challenge",
        skip_all,
        fields(nonce_count = aggregated_nonces.len())
    )]
    pub fn with_hasher<H: TaggedHasher + ?Sized>(
        hasher: &H,
        key_agg: &KeyAggContext,
        aggregated_nonces: Vec<ProjectivePoint>,
        message: &[u8],
    ) -> Result<Self> {
        if aggregated_nonces.is_empty() {
            return Err(MuSigError::InvalidNonceCount);
        }
        let aggregate_key = key_agg.aggregate_key();
        let b = nonce_coefficient(hasher, &aggregate_key, &aggregated_nonces, message);
        let cap_r = effective_nonce(&b, &aggregated_nonces)?;
        let c = challenge(hasher, &aggregate_key, &cap_r, message);

        Ok(SigningSession {
            aggregate_key,
            aggregated_nonces,
            nonce_coefficient: b,
            effective_nonce: cap_r,
            challenge: c,
        })
    }

    /// Aggregates every signer's public nonces, then derives the session.
    /// Every signer in `key_agg` must have contributed exactly one round.
    pub fn from_public_nonces(
        key_agg: &KeyAggContext,
        rounds: &[Vec<ProjectivePoint>],
        nonce_count: usize,
        message: &[u8],
    ) -> Result<Self> {
        if rounds.len() != key_agg.len() {
            return Err(MuSigError::IncompleteParticipation {
                expected: key_agg.len(),
                actual: rounds.len(),
            });
        }
        let aggregated_nonces = aggregate_nonces(rounds, nonce_count)?;
        Self::new(key_agg, aggregated_nonces, message)
    }

    pub fn aggregated_nonces(&self) -> &[ProjectivePoint] {
        &self.aggregated_nonces
    }

    pub fn nonce_coefficient(&self) -> Scalar {
        self.nonce_coefficient
    }

    pub fn effective_nonce(&self) -> ProjectivePoint {
        self.effective_nonce
    }

    pub fn challenge(&self) -> Scalar {
        self.challenge
    }

    /// Round 2 for one signer. Consumes the signer's nonce round.
    #[tracing::instrument(name = "Computing partial signature", skip_all)]
    pub fn partial_sign(
        &self,
        key_agg: &KeyAggContext,
        keys: &KeyPair,
        nonces: NonceCommitmentRound,
    ) -> Result<Scalar> {
        let signer = key_agg.index_of(&keys.public_key)?;
        if nonces.len() != self.aggregated_nonces.len() {
            return Err(MuSigError::NonceCountMismatch {
                signer,
                expected: self.aggregated_nonces.len(),
                actual: nonces.len(),
            });
        }
        let a_i = key_agg.coefficients[signer];
        Ok(partial_signature(
            &keys.private_key,
            nonces,
            &self.nonce_coefficient,
            &a_i,
            &self.challenge,
        ))
    }

    /// Checks one signer's partial signature against its public nonces.
    pub fn verify_partial(
        &self,
        key_agg: &KeyAggContext,
        public_key: &ProjectivePoint,
        public_nonces: &[ProjectivePoint],
        partial_signature: &Scalar,
    ) -> bool {
        match key_agg.coefficient(public_key) {
            Ok(a_i) => {
                public_nonces.len() == self.aggregated_nonces.len()
                    && verify_partial_signature(
                        partial_signature,
                        public_nonces,
                        public_key,
                        &a_i,
                        &self.nonce_coefficient,
                        &self.challenge,
                    )
            }
            Err(_) => false,
        }
    }

    /// Sums all partial signatures. Requires one per signer in `key_agg`.
    pub fn aggregate(
        &self,
        key_agg: &KeyAggContext,
        partial_signatures: &[Scalar],
    ) -> Result<AggregateSignature> {
        if partial_signatures.len() != key_agg.len() {
            return Err(MuSigError::IncompleteParticipation {
                expected: key_agg.len(),
                actual: partial_signatures.len(),
            });
        }
        Ok(AggregateSignature {
            r: self.effective_nonce,
            s: aggregate_partial_signatures(partial_signatures),
        })
    }

    pub fn verify(&self, signature: &AggregateSignature, message: &[u8]) -> bool {
        signature.r == self.effective_nonce && signature.verify(&self.aggregate_key, message)
    }
}

/// Final MuSig2 signature (R, s).
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq)]
pub struct AggregateSignature {
    #[serde(with = "crate::encoding::point_serde")]
    pub r: ProjectivePoint,
    pub s: Scalar,
}

impl AggregateSignature {
    /// x(R) || s, the externally published form.
    pub fn to_bytes(&self) -> [u8; 2 * ENCODED_LEN] {
        let mut bytes = [0u8; 2 * ENCODED_LEN];
        bytes[..ENCODED_LEN].copy_from_slice(&encode_x(&self.r));
        bytes[ENCODED_LEN..].copy_from_slice(&encode_scalar(&self.s));
        bytes
    }

    pub fn verify(&self, aggregate_key: &ProjectivePoint, message: &[u8]) -> bool {
        verify_signature(aggregate_key, &self.r, &self.s, message)
    }
}
