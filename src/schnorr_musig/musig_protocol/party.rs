//! This module defines a Party struct representing a participant in a MuSig2
//! multi-signature run. Parties progress through different states, commit to
//! nonces, compute partial signatures, and finally hold the aggregated signature.
//!
//! Every transition consumes the party, so a nonce round can be used for
//! exactly one partial signature.

use super::protocol_messages::*;
use crate::config::MuSigConfig;
use crate::errors::{MuSigError, Result};
use crate::keys_management::KeyPair;
use crate::rand_nonce::NonceCommitmentRound;
use crate::schnorr_musig::session::{KeyAggContext, SigningSession};
use k256::Scalar;
use secrecy::Secret;
use std::borrow::Cow;

/// Party struct, which manages the role of a participant in the scheme.
pub struct Party<'a, S: PartyState> {
    keys: KeyPair,
    message: Cow<'a, [u8]>,
    config: MuSigConfig,
    state: S,
}

/// Represents the possible states of a Party.
pub trait PartyState {}
/// Initial state when creating a new Party.
pub struct NewParty;
/// State for generating random nonces.
pub struct RandomNonceGeneration;
/// State for computing partial signatures.
pub struct PartialSignatureComputation {
    key_agg: KeyAggContext,
    nonces: NonceCommitmentRound,
}
/// State when awaiting the aggregated signature.
pub struct AwaitingAggregatedSignature {
    key_agg: KeyAggContext,
    session: SigningSession,
}
/// State when the party's role is finalized.
pub struct PartyFinalized {
    key_agg: KeyAggContext,
    session: SigningSession,
    signature: AggregateSignature,
}

impl PartyState for NewParty {}
impl PartyState for RandomNonceGeneration {}
impl PartyState for PartialSignatureComputation {}
impl PartyState for AwaitingAggregatedSignature {}
impl PartyState for PartyFinalized {}

impl<S: PartyState> Party<'_, S> {
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            public_key: self.keys.public_key,
        }
    }
}

impl<'a> Party<'a, NewParty> {
    /// Create a new Party instance with a fresh key pair.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to be signed.
    /// * `config` - Settings shared by every participant of the run.
    /// * `rng` - Cryptographically secure randomness source.
    ///
    /// Returns a tuple containing:
    /// 1. A Party in the "RandomNonceGeneration" state.
    /// 2. A PublicKey associated with the Party's public key.
    pub fn new<R>(
        message: impl Into<Cow<'a, [u8]>>,
        config: MuSigConfig,
        rng: R,
    ) -> Result<(Party<'a, RandomNonceGeneration>, PublicKey)>
    where
        R: rand::CryptoRng + rand::RngCore,
    {
        let keys = KeyPair::create(rng)?;
        Self::from_key_pair(keys, message, config)
    }

    /// Create a new Party instance from a private key.
    ///
    /// # Arguments
    ///
    /// * `private_key` - The Party's private key.
    /// * `message` - The message to be signed.
    /// * `config` - Settings shared by every participant of the run.
    ///
    /// Returns a tuple containing:
    /// 1. A Party in the "RandomNonceGeneration" state.
    /// 2. A PublicKey associated with the Party's public key.
    pub fn new_from_private_key(
        private_key: Secret<Scalar>,
        message: impl Into<Cow<'a, [u8]>>,
        config: MuSigConfig,
    ) -> Result<(Party<'a, RandomNonceGeneration>, PublicKey)> {
        let keys = KeyPair::create_from_private_key(private_key)?;
        Self::from_key_pair(keys, message, config)
    }

    fn from_key_pair(
        keys: KeyPair,
        message: impl Into<Cow<'a, [u8]>>,
        config: MuSigConfig,
    ) -> Result<(Party<'a, RandomNonceGeneration>, PublicKey)> {
        config.validate()?;
        let public_key = keys.public_key;
        Ok((
            Party {
                keys,
                message: message.into(),
                config,
                state: RandomNonceGeneration,
            },
            PublicKey { public_key },
        ))
    }
}

impl<'a> Party<'a, RandomNonceGeneration> {
    /// Check the aggregated public key and run Round 1.
    ///
    /// The party recomputes key aggregation from the broadcast signer set and
    /// refuses to continue if it disagrees with the announced aggregate key or
    /// if its own key is missing.
    ///
    /// Returns a tuple containing:
    /// 1. A Party in the "PartialSignatureComputation" state.
    /// 2. A NonceCommitmentMessage with the party's public nonces.
    #[tracing::instrument(name = "Party generating nonces", skip_all)]
    pub fn generate_nonces<R>(
        self,
        key_aggregation: KeyAggregationMessage,
        rng: R,
    ) -> Result<(Party<'a, PartialSignatureComputation>, NonceCommitmentMessage)>
    where
        R: rand::CryptoRng + rand::RngCore,
    {
        let key_agg = KeyAggContext::new(&key_aggregation.ordered_keys, self.config.duplicate_keys)?;
        if key_agg.aggregate_key() != key_aggregation.aggregate_key {
            return Err(MuSigError::InvalidAggregateKey);
        }
        key_agg.index_of(&self.keys.public_key)?;

        let nonces = NonceCommitmentRound::generate(self.config.nonce_count, rng)?;
        let public_nonces = nonces.public_nonces();
        Ok((
            Party {
                keys: self.keys,
                message: self.message,
                config: self.config,
                state: PartialSignatureComputation { key_agg, nonces },
            },
            NonceCommitmentMessage { public_nonces },
        ))
    }
}

impl<'a> Party<'a, PartialSignatureComputation> {
    /// Run Round 2: derive b, R and c and compute the partial signature.
    /// The secret nonces are dropped once this returns.
    ///
    /// Returns a tuple containing:
    /// 1. A Party in the "AwaitingAggregatedSignature" state.
    /// 2. A PartialSignature containing the partial signature.
    #[tracing::instrument(name = "Party computing partial signature", skip_all)]
    pub fn generate_partial_signature(
        self,
        aggregated_nonces: AggregatedNonceMessage,
    ) -> Result<(Party<'a, AwaitingAggregatedSignature>, PartialSignature)> {
        let PartialSignatureComputation { key_agg, nonces } = self.state;
        let session =
            SigningSession::new(&key_agg, aggregated_nonces.aggregated_nonces, &self.message)?;
        let partial_signature = session.partial_sign(&key_agg, &self.keys, nonces)?;
        Ok((
            Party {
                keys: self.keys,
                message: self.message,
                config: self.config,
                state: AwaitingAggregatedSignature { key_agg, session },
            },
            PartialSignature { partial_signature },
        ))
    }
}

impl<'a> Party<'a, AwaitingAggregatedSignature> {
    /// Store the aggregated signature and move to the final state.
    pub fn set_aggregated_signature(self, signature: AggregateSignature) -> Party<'a, PartyFinalized> {
        let AwaitingAggregatedSignature { key_agg, session } = self.state;
        Party {
            keys: self.keys,
            message: self.message,
            config: self.config,
            state: PartyFinalized {
                key_agg,
                session,
                signature,
            },
        }
    }
}

impl Party<'_, PartyFinalized> {
    /// Get the aggregated signature.
    pub fn get_signature(&self) -> AggregateSignature {
        self.state.signature
    }

    /// Verify the aggregated signature against the aggregate key and the
    /// effective nonce this party derived itself.
    pub fn verify_signature(&self) -> bool {
        self.state.signature.r == self.state.session.effective_nonce()
            && self
                .state
                .signature
                .verify(&self.state.key_agg.aggregate_key(), &self.message)
    }
}
