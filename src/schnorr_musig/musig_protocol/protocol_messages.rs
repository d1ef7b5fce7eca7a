// The `messages` module contains the API for the messages passed between the parties and the aggregator
// in one in-process MuSig2 run. Contributions are positional: the i-th message of every round comes
// from the same party.
use crate::errors::{MuSigError, Result};
use crate::schnorr_musig::session::{KeyAggContext, SigningSession};

use k256::{ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};

pub use crate::schnorr_musig::session::AggregateSignature;

#[derive(Serialize, Deserialize, Copy, Clone, Debug)]
pub struct PublicKey {
    #[serde(with = "crate::encoding::point_serde")]
    pub public_key: ProjectivePoint,
}

/// Sent by the aggregator once every public key is in.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct KeyAggregationMessage {
    /// The canonical signer set L.
    #[serde(with = "crate::encoding::points_serde")]
    pub ordered_keys: Vec<ProjectivePoint>,
    #[serde(with = "crate::encoding::point_serde")]
    pub aggregate_key: ProjectivePoint,
}

/// A party's Round-1 broadcast: its ν public nonces in slot order.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NonceCommitmentMessage {
    #[serde(with = "crate::encoding::points_serde")]
    pub public_nonces: Vec<ProjectivePoint>,
}

/// Sent by the aggregator once every nonce commitment is in.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AggregatedNonceMessage {
    #[serde(with = "crate::encoding::points_serde")]
    pub aggregated_nonces: Vec<ProjectivePoint>,
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug)]
pub struct PartialSignature {
    pub partial_signature: Scalar,
}

impl PartialSignature {
    pub(super) fn verify_share(
        &self,
        index: usize,
        key_agg: &KeyAggContext,
        session: &SigningSession,
        public_key: &ProjectivePoint,
        public_nonces: &[ProjectivePoint],
    ) -> Result<()> {
        if session.verify_partial(key_agg, public_key, public_nonces, &self.partial_signature) {
            Ok(())
        } else {
            Err(MuSigError::InvalidPartialSignature { index })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_serialize() {
        let g = ProjectivePoint::GENERATOR;
        let message = KeyAggregationMessage {
            ordered_keys: vec![g, g.double()],
            aggregate_key: g,
        };
        let json = serde_json::to_string(&message).unwrap();
        let decoded: KeyAggregationMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.ordered_keys, message.ordered_keys);
        assert_eq!(decoded.aggregate_key, g);

        let share = PartialSignature {
            partial_signature: Scalar::from(9u64),
        };
        let json = serde_json::to_string(&share).unwrap();
        let decoded: PartialSignature = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.partial_signature, share.partial_signature);
    }
}
