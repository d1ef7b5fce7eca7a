//! This module defines an Aggregator struct that coordinates one in-process
//! MuSig2 run. It collects public keys, nonce commitments and partial
//! signatures from every party, enforcing each barrier (all n contributions
//! must be present), and finally computes the aggregated signature.

use super::protocol_messages::*;
use crate::config::MuSigConfig;
use crate::errors::{MuSigError, Result};
use crate::schnorr_musig::musig_math::aggregate_nonces;
use crate::schnorr_musig::session::{KeyAggContext, SigningSession};
use k256::{ProjectivePoint, Scalar};

/// Aggregator struct, which manages the aggregation process.
pub struct Aggregator<'a, S: AggregationState> {
    parties_quantity: usize,
    message: &'a [u8],
    config: MuSigConfig,
    state: S,
}

use std::fmt::{Debug, Formatter};
impl<S: AggregationState> Debug for Aggregator<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("parties_quantity", &self.parties_quantity)
            .field("message_len", &self.message.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Represents the possible states of the Aggregator.
pub trait AggregationState {}

/// Initial state when creating a new Aggregator.
pub struct NewAggregator;

/// State when waiting for public keys from parties.
pub struct AwaitingPublicKeys;

/// State when waiting for public nonces from parties.
pub struct AwaitingPublicNonces {
    key_agg: KeyAggContext,
    public_keys: Vec<ProjectivePoint>,
}

/// State when waiting for partial signatures from parties.
pub struct AwaitingPartialSignatures {
    key_agg: KeyAggContext,
    public_keys: Vec<ProjectivePoint>,
    public_nonces: Vec<Vec<ProjectivePoint>>,
    session: SigningSession,
}

/// State when calculating the aggregated signature.
pub struct CalculatingAggregatedSignature {
    key_agg: KeyAggContext,
    session: SigningSession,
    partial_signatures: Vec<Scalar>,
}

/// State when the aggregation process is finalized.
pub struct AggregationFinalized {
    key_agg: KeyAggContext,
    signature: AggregateSignature,
}

impl AggregationState for NewAggregator {}
impl AggregationState for AwaitingPublicKeys {}
impl AggregationState for AwaitingPublicNonces {}
impl AggregationState for AwaitingPartialSignatures {}
impl AggregationState for CalculatingAggregatedSignature {}
impl AggregationState for AggregationFinalized {}

impl<'a, S: AggregationState> Aggregator<'a, S> {
    fn check_participation(&self, actual: usize) -> Result<()> {
        if actual != self.parties_quantity {
            tracing::warn!(
                expected = self.parties_quantity,
                actual,
                "Contributions missing at protocol barrier"
            );
            return Err(MuSigError::IncompleteParticipation {
                expected: self.parties_quantity,
                actual,
            });
        }
        Ok(())
    }

    fn with_state<T: AggregationState>(self, state: T) -> Aggregator<'a, T> {
        Aggregator {
            parties_quantity: self.parties_quantity,
            message: self.message,
            config: self.config,
            state,
        }
    }
}

impl<'a> Aggregator<'a, NewAggregator> {
    /// Create a new Aggregator instance.
    ///
    /// # Arguments
    ///
    /// * `parties_quantity` - The number of parties involved in the aggregation.
    /// * `message` - The message being signed.
    /// * `config` - Settings shared by every participant of the run.
    ///
    /// Returns an Aggregator in the "AwaitingPublicKeys" state, or an error if
    /// `parties_quantity` is 0 or the config is invalid.
    pub fn new(
        parties_quantity: usize,
        message: &'a [u8],
        config: MuSigConfig,
    ) -> Result<Aggregator<'a, AwaitingPublicKeys>> {
        if parties_quantity == 0 {
            return Err(MuSigError::EmptySignerSet);
        }
        config.validate()?;
        Ok(Aggregator {
            parties_quantity,
            message,
            config,
            state: AwaitingPublicKeys,
        })
    }
}

impl<'a> Aggregator<'a, AwaitingPublicKeys> {
    /// Aggregate public keys from parties and prepare for the next state.
    ///
    /// Returns a tuple containing:
    /// 1. An Aggregator in the "AwaitingPublicNonces" state.
    /// 2. A KeyAggregationMessage with the canonical signer set and the
    ///    aggregate public key.
    #[tracing::instrument(name = "Aggregator collecting public keys", skip_all)]
    pub fn aggregate_public_keys(
        self,
        public_keys: Vec<PublicKey>,
    ) -> Result<(Aggregator<'a, AwaitingPublicNonces>, KeyAggregationMessage)> {
        self.check_participation(public_keys.len())?;

        let public_keys: Vec<ProjectivePoint> = public_keys
            .iter()
            .map(|public_key| public_key.public_key)
            .collect();
        let key_agg = KeyAggContext::new(&public_keys, self.config.duplicate_keys)?;
        let message = KeyAggregationMessage {
            ordered_keys: key_agg.ordered_keys().to_vec(),
            aggregate_key: key_agg.aggregate_key(),
        };

        Ok((
            self.with_state(AwaitingPublicNonces {
                key_agg,
                public_keys,
            }),
            message,
        ))
    }
}

impl<'a> Aggregator<'a, AwaitingPublicNonces> {
    /// Aggregate nonce commitments slot by slot and derive the signing session.
    ///
    /// Returns a tuple containing:
    /// 1. An Aggregator in the "AwaitingPartialSignatures" state.
    /// 2. An AggregatedNonceMessage to broadcast to every party.
    ///
    /// Fails if a party is missing, if a party committed to the wrong number
    /// of nonces, or if the effective nonce is the point at infinity.
    #[tracing::instrument(name = "Aggregator collecting nonce commitments", skip_all)]
    pub fn aggregate_nonces(
        self,
        nonces: Vec<NonceCommitmentMessage>,
    ) -> Result<(Aggregator<'a, AwaitingPartialSignatures>, AggregatedNonceMessage)> {
        self.check_participation(nonces.len())?;

        let public_nonces: Vec<Vec<ProjectivePoint>> =
            nonces.into_iter().map(|nonce| nonce.public_nonces).collect();
        let aggregated_nonces = aggregate_nonces(&public_nonces, self.config.nonce_count)?;

        let AwaitingPublicNonces {
            key_agg,
            public_keys,
        } = self.state;
        let session = SigningSession::new(&key_agg, aggregated_nonces.clone(), self.message)?;

        Ok((
            Aggregator {
                parties_quantity: self.parties_quantity,
                message: self.message,
                config: self.config,
                state: AwaitingPartialSignatures {
                    key_agg,
                    public_keys,
                    public_nonces,
                    session,
                },
            },
            AggregatedNonceMessage { aggregated_nonces },
        ))
    }
}

impl<'a> Aggregator<'a, AwaitingPartialSignatures> {
    /// Collect partial signatures and check each one individually, so a bad
    /// contribution is attributed to the party that sent it.
    ///
    /// Returns an Aggregator in the "CalculatingAggregatedSignature" state.
    #[tracing::instrument(name = "Aggregator collecting partial signatures", skip_all)]
    pub fn aggregate_signatures(
        self,
        partial_signatures: Vec<PartialSignature>,
    ) -> Result<Aggregator<'a, CalculatingAggregatedSignature>> {
        self.check_participation(partial_signatures.len())?;

        let AwaitingPartialSignatures {
            key_agg,
            public_keys,
            public_nonces,
            session,
        } = &self.state;
        for (index, ((partial_signature, public_key), nonces)) in partial_signatures
            .iter()
            .zip(public_keys)
            .zip(public_nonces)
            .enumerate()
        {
            partial_signature.verify_share(index, key_agg, session, public_key, nonces)?;
        }

        let partial_signatures = partial_signatures
            .iter()
            .map(|partial_signature| partial_signature.partial_signature)
            .collect();
        let AwaitingPartialSignatures {
            key_agg, session, ..
        } = self.state;

        Ok(Aggregator {
            parties_quantity: self.parties_quantity,
            message: self.message,
            config: self.config,
            state: CalculatingAggregatedSignature {
                key_agg,
                session,
                partial_signatures,
            },
        })
    }
}

impl<'a> Aggregator<'a, CalculatingAggregatedSignature> {
    /// Calculate the aggregated signature and prepare for the final state.
    ///
    /// Returns a tuple containing:
    /// 1. An Aggregator in the "AggregationFinalized" state.
    /// 2. The AggregateSignature to hand to every party.
    pub fn calc_aggregated_signature(
        self,
    ) -> Result<(Aggregator<'a, AggregationFinalized>, AggregateSignature)> {
        let CalculatingAggregatedSignature {
            key_agg,
            session,
            partial_signatures,
        } = &self.state;
        let signature = session.aggregate(key_agg, partial_signatures)?;
        tracing::debug!("Aggregated signature computed");

        let key_agg = self.state.key_agg.clone();
        Ok((
            self.with_state(AggregationFinalized { key_agg, signature }),
            signature,
        ))
    }
}

impl Aggregator<'_, AggregationFinalized> {
    /// Get the aggregated signature.
    pub fn get_aggregated_signature(&self) -> AggregateSignature {
        self.state.signature
    }

    pub fn aggregate_key(&self) -> ProjectivePoint {
        self.state.key_agg.aggregate_key()
    }

    /// Verify the aggregated signature.
    ///
    /// Returns true if the verification is successful; otherwise, false.
    pub fn verify_signature(&self) -> bool {
        self.state
            .signature
            .verify(&self.state.key_agg.aggregate_key(), self.message)
    }
}
