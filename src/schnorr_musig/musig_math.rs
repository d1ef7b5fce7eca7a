use crate::encoding::{encode_point, HashInput};
use crate::errors::{MuSigError, Result};
use crate::rand_nonce::NonceCommitmentRound;
use crate::tagged_hash::{
    hash_inputs, Sha256TaggedHasher, TaggedHasher, TAG_AGG_COEFF, TAG_CHALLENGE, TAG_NONCE_COEFF,
};
use k256::elliptic_curve::group::Group;
use k256::{ProjectivePoint, Scalar};
use secrecy::{ExposeSecret, Secret};

// Sorts public keys into canonical order: ascending by the big-endian
// x-coordinate, ties broken by the y-coordinate. Duplicates are kept.
//
// Inputs:
// - public_keys: the signer set as received
//
// Returns:
// - The canonical signer set L
pub fn sort_public_keys(public_keys: &[ProjectivePoint]) -> Vec<ProjectivePoint> {
    let mut ordered = public_keys.to_vec();
    ordered.sort_by_cached_key(encode_point);
    ordered
}

// Computes the key aggregation coefficient
// a_i = H_agg(L, Xi) = TaggedHash("MuSig2/AggCoeff", x(X1) || ... || x(Xn) || x(Xi))
//
// A zero hash would erase Xi from the aggregate, so it is replaced by 1.
//
// Inputs:
// - hasher: tagged hash implementation
// - ordered_keys: canonical signer set L
// - public_key: the key Xi whose coefficient is requested
//
// Returns:
// - a_i as a nonzero Scalar
pub fn key_agg_coefficient<H: TaggedHasher + ?Sized>(
    hasher: &H,
    ordered_keys: &[ProjectivePoint],
    public_key: &ProjectivePoint,
) -> Scalar {
    let mut inputs: Vec<HashInput> = ordered_keys.iter().map(HashInput::XCoordinate).collect();
    inputs.push(HashInput::XCoordinate(public_key));

    let coefficient = hash_inputs(hasher, TAG_AGG_COEFF, &inputs);
    if bool::from(coefficient.is_zero()) {
        tracing::warn!("Key aggregation coefficient hashed to zero, substituting 1");
        return Scalar::ONE;
    }
    coefficient
}

// Sums a_i * Xi over the signer set, starting from the identity.
// Fails if the result is the point at infinity.
pub(crate) fn combine_public_keys(
    ordered_keys: &[ProjectivePoint],
    coefficients: &[Scalar],
) -> Result<ProjectivePoint> {
    let aggregate_key = ordered_keys
        .iter()
        .zip(coefficients)
        .fold(ProjectivePoint::IDENTITY, |acc, (public_key, coefficient)| {
            acc + public_key * coefficient
        });

    if bool::from(aggregate_key.is_identity()) {
        return Err(MuSigError::InvalidAggregateKey);
    }
    Ok(aggregate_key)
}

// Aggregates the canonical signer set into a single public key.
// It computes:
// X = sum of all a_i * Xi
//
// Inputs:
// - hasher: tagged hash implementation
// - ordered_keys: canonical signer set L (see sort_public_keys)
//
// Returns:
// - The aggregated public key, or InvalidAggregateKey if it is the point at
//   infinity, or EmptySignerSet if L is empty
pub fn aggregate_public_keys<H: TaggedHasher + ?Sized>(
    hasher: &H,
    ordered_keys: &[ProjectivePoint],
) -> Result<ProjectivePoint> {
    if ordered_keys.is_empty() {
        return Err(MuSigError::EmptySignerSet);
    }
    let coefficients: Vec<Scalar> = ordered_keys
        .iter()
        .map(|public_key| key_agg_coefficient(hasher, ordered_keys, public_key))
        .collect();
    combine_public_keys(ordered_keys, &coefficients)
}

// Sums the public nonces of all signers slot by slot:
// R_j = sum over signers of R_{i,j}
//
// Inputs:
// - rounds: each signer's public nonces, in slot order
// - nonce_count: the agreed ν
//
// Returns:
// - ν aggregated nonces, or NonceCountMismatch naming the first signer whose
//   contribution has the wrong length
pub fn aggregate_nonces(
    rounds: &[Vec<ProjectivePoint>],
    nonce_count: usize,
) -> Result<Vec<ProjectivePoint>> {
    if rounds.is_empty() {
        return Err(MuSigError::EmptySignerSet);
    }
    if nonce_count == 0 {
        return Err(MuSigError::InvalidNonceCount);
    }
    if let Some((signer, round)) = rounds
        .iter()
        .enumerate()
        .find(|(_, round)| round.len() != nonce_count)
    {
        return Err(MuSigError::NonceCountMismatch {
            signer,
            expected: nonce_count,
            actual: round.len(),
        });
    }

    Ok((0..nonce_count)
        .map(|slot| {
            rounds
                .iter()
                .fold(ProjectivePoint::IDENTITY, |acc, round| acc + round[slot])
        })
        .collect())
}

// Computes the nonce coefficient
// b = TaggedHash("MuSig2/NonceCoeff", x(X) || x(R_0) || ... || x(R_{ν-1}) || m)
pub fn nonce_coefficient<H: TaggedHasher + ?Sized>(
    hasher: &H,
    aggregate_key: &ProjectivePoint,
    aggregated_nonces: &[ProjectivePoint],
    message: &[u8],
) -> Scalar {
    let mut inputs = Vec::with_capacity(aggregated_nonces.len() + 2);
    inputs.push(HashInput::XCoordinate(aggregate_key));
    inputs.extend(aggregated_nonces.iter().map(HashInput::XCoordinate));
    inputs.push(HashInput::Bytes(message));

    hash_inputs(hasher, TAG_NONCE_COEFF, &inputs)
}

// Yields 1, b, b^2, ... reduced mod n.
fn powers_of(b: Scalar) -> impl Iterator<Item = Scalar> {
    std::iter::successors(Some(Scalar::ONE), move |power| Some(power * &b))
}

// Computes the effective nonce
// R = sum over j of b^j * R_j, j starting at 0
//
// Returns:
// - R, or InvalidEffectiveNonce if it is the point at infinity. In that case
//   the run must be abandoned and restarted with fresh nonces.
pub fn effective_nonce(b: &Scalar, aggregated_nonces: &[ProjectivePoint]) -> Result<ProjectivePoint> {
    let cap_r = aggregated_nonces
        .iter()
        .zip(powers_of(*b))
        .fold(ProjectivePoint::IDENTITY, |acc, (nonce, power)| {
            acc + nonce * &power
        });

    if bool::from(cap_r.is_identity()) {
        return Err(MuSigError::InvalidEffectiveNonce);
    }
    Ok(cap_r)
}

// Computes the challenge
// c = TaggedHash("MuSig2/Challenge", x(X) || y(X) || x(R) || y(R) || m)
//
// Signers and verifier must use this exact encoding order.
pub fn challenge<H: TaggedHasher + ?Sized>(
    hasher: &H,
    aggregate_key: &ProjectivePoint,
    cap_r: &ProjectivePoint,
    message: &[u8],
) -> Scalar {
    hash_inputs(
        hasher,
        TAG_CHALLENGE,
        &[
            HashInput::Point(aggregate_key),
            HashInput::Point(cap_r),
            HashInput::Bytes(message),
        ],
    )
}

// Computes a signer's partial signature
// s_i = sum over j of r_{i,j} * b^j + c * a_i * x_i  (mod n)
//
// The nonce round is consumed: its secrets are zeroed when this returns.
// Signing two different messages with one round leaks the secret key.
//
// Inputs:
// - secret_key: signer's x_i
// - nonces: signer's secret nonces r_{i,0..ν}
// - b: nonce coefficient
// - key_agg_coefficient: signer's a_i
// - challenge: c
//
// Returns:
// - Partial signature s_i
pub fn partial_signature(
    secret_key: &Secret<Scalar>,
    nonces: NonceCommitmentRound,
    b: &Scalar,
    key_agg_coefficient: &Scalar,
    challenge: &Scalar,
) -> Scalar {
    let lin = nonces
        .secret_nonces()
        .zip(powers_of(*b))
        .fold(Scalar::ZERO, |acc, (r, power)| acc + r * &power);

    lin + challenge * key_agg_coefficient * secret_key.expose_secret()
}

// Sums the partial signatures into the final s (mod n).
pub fn aggregate_partial_signatures(partial_signatures: &[Scalar]) -> Scalar {
    partial_signatures
        .iter()
        .fold(Scalar::ZERO, |acc, partial_signature| acc + partial_signature)
}

// Checks one signer's contribution:
// s_i * G == sum over j of b^j * R_{i,j} + c * a_i * Xi
pub fn verify_partial_signature(
    partial_signature: &Scalar,
    public_nonces: &[ProjectivePoint],
    public_key: &ProjectivePoint,
    key_agg_coefficient: &Scalar,
    b: &Scalar,
    challenge: &Scalar,
) -> bool {
    let committed = public_nonces
        .iter()
        .zip(powers_of(*b))
        .fold(ProjectivePoint::IDENTITY, |acc, (nonce, power)| {
            acc + nonce * &power
        });
    let left = ProjectivePoint::GENERATOR * partial_signature;
    let right = committed + public_key * &(challenge * key_agg_coefficient);

    left == right
}

// Verifies the aggregated signature using the equation:
// sG = R + c * X, with c = TaggedHash("MuSig2/Challenge", X, R, m)
//
// Inputs:
// - aggregate_key: Aggregated public key X
// - cap_r: Effective nonce R
// - s: Aggregated signature scalar
// - message: Signed message m
//
// Returns:
// - true if the signature is valid, false otherwise. An identity X or R is
//   always rejected.
pub fn verify_signature(
    aggregate_key: &ProjectivePoint,
    cap_r: &ProjectivePoint,
    s: &Scalar,
    message: &[u8],
) -> bool {
    verify_signature_with_hasher(&Sha256TaggedHasher, aggregate_key, cap_r, s, message)
}

pub fn verify_signature_with_hasher<H: TaggedHasher + ?Sized>(
    hasher: &H,
    aggregate_key: &ProjectivePoint,
    cap_r: &ProjectivePoint,
    s: &Scalar,
    message: &[u8],
) -> bool {
    if bool::from(aggregate_key.is_identity() | cap_r.is_identity()) {
        return false;
    }
    let c = challenge(hasher, aggregate_key, cap_r, message);
    let left = ProjectivePoint::GENERATOR * s;
    let right = cap_r + &(aggregate_key * &c);

    left == right
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_x;
    use crate::keys_management::KeyPair;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// Returns a fixed scalar for every tag listed, real SHA-256 otherwise.
    struct FixedHasher {
        tags: &'static [&'static str],
        value: Scalar,
    }

    impl TaggedHasher for FixedHasher {
        fn tagged_hash(&self, tag: &str, data: &[u8]) -> Scalar {
            if self.tags.contains(&tag) {
                self.value
            } else {
                Sha256TaggedHasher.tagged_hash(tag, data)
            }
        }
    }

    fn point(k: u64) -> ProjectivePoint {
        ProjectivePoint::GENERATOR * Scalar::from(k)
    }

    // Runs the whole protocol through the free functions with random keys
    // and nonces and returns the verification result.
    fn run_with_n_parties(n: usize, nonce_count: usize, seed: u64) -> bool {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let message = b"Hello World";

        let key_pairs: Vec<KeyPair> = (0..n).map(|_| KeyPair::create(&mut rng).unwrap()).collect();
        let rounds: Vec<NonceCommitmentRound> = (0..n)
            .map(|_| NonceCommitmentRound::generate(nonce_count, &mut rng).unwrap())
            .collect();

        let pkeys: Vec<ProjectivePoint> = key_pairs.iter().map(|keys| keys.public_key).collect();
        let ordered = sort_public_keys(&pkeys);
        let cap_x = aggregate_public_keys(&Sha256TaggedHasher, &ordered).unwrap();

        let public_rounds: Vec<Vec<ProjectivePoint>> =
            rounds.iter().map(NonceCommitmentRound::public_nonces).collect();
        let aggregated = aggregate_nonces(&public_rounds, nonce_count).unwrap();
        let b = nonce_coefficient(&Sha256TaggedHasher, &cap_x, &aggregated, message);
        let cap_r = effective_nonce(&b, &aggregated).unwrap();
        let c = challenge(&Sha256TaggedHasher, &cap_x, &cap_r, message);

        let partial_signatures: Vec<Scalar> = key_pairs
            .iter()
            .zip(rounds)
            .zip(&public_rounds)
            .map(|((keys, round), public_nonces)| {
                let a_i = key_agg_coefficient(&Sha256TaggedHasher, &ordered, &keys.public_key);
                let s_i = partial_signature(&keys.private_key, round, &b, &a_i, &c);
                assert!(verify_partial_signature(
                    &s_i,
                    public_nonces,
                    &keys.public_key,
                    &a_i,
                    &b,
                    &c
                ));
                s_i
            })
            .collect();

        let s = aggregate_partial_signatures(&partial_signatures);
        verify_signature(&cap_x, &cap_r, &s, message)
    }

    #[test]
    fn test_single_musig_signature() {
        assert!(run_with_n_parties(1, 1, 1));
        assert!(run_with_n_parties(1, 2, 2));
    }

    #[test]
    fn test_multiple_musig_signature() {
        assert!(run_with_n_parties(3, 2, 3));
        assert!(run_with_n_parties(25, 4, 4));
    }

    #[test]
    fn test_sort_is_by_x_coordinate() {
        let keys = vec![point(5), point(1), point(3), point(2)];
        let ordered = sort_public_keys(&keys);
        for pair in ordered.windows(2) {
            assert!(encode_x(&pair[0]) <= encode_x(&pair[1]));
        }
        assert_eq!(ordered.len(), keys.len());
    }

    #[test]
    fn test_sort_ties_broken_by_y() {
        // P and -P share x; the one with the smaller y comes first.
        let p = point(9);
        let ordered = sort_public_keys(&[p, -p]);
        assert_eq!(encode_x(&ordered[0]), encode_x(&ordered[1]));
        assert!(encode_point(&ordered[0]) < encode_point(&ordered[1]));
        assert_eq!(ordered, sort_public_keys(&[-p, p]));
    }

    #[test]
    fn test_aggregate_key_independent_of_input_order() {
        let keys = vec![point(11), point(22), point(33)];
        let mut shuffled = keys.clone();
        shuffled.reverse();

        let first = aggregate_public_keys(&Sha256TaggedHasher, &sort_public_keys(&keys)).unwrap();
        let second =
            aggregate_public_keys(&Sha256TaggedHasher, &sort_public_keys(&shuffled)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_signer_set() {
        let result = aggregate_public_keys(&Sha256TaggedHasher, &[]);
        assert_eq!(result, Err(MuSigError::EmptySignerSet));
    }

    #[test]
    fn test_zero_coefficient_replaced_by_one() {
        let hasher = FixedHasher {
            tags: &[TAG_AGG_COEFF],
            value: Scalar::ZERO,
        };
        let ordered = sort_public_keys(&[point(2), point(3)]);
        for public_key in &ordered {
            assert_eq!(key_agg_coefficient(&hasher, &ordered, public_key), Scalar::ONE);
        }
        let aggregate_key = aggregate_public_keys(&hasher, &ordered).unwrap();
        assert_eq!(aggregate_key, point(5));
    }

    #[test]
    fn test_aggregate_key_at_infinity_is_rejected() {
        let hasher = FixedHasher {
            tags: &[TAG_AGG_COEFF],
            value: Scalar::ONE,
        };
        let p = point(4);
        let ordered = sort_public_keys(&[p, -p]);
        let result = aggregate_public_keys(&hasher, &ordered);
        assert_eq!(result, Err(MuSigError::InvalidAggregateKey));
    }

    #[test]
    fn test_aggregate_nonces_per_slot() {
        let rounds = vec![vec![point(1), point(10)], vec![point(2), point(20)]];
        let aggregated = aggregate_nonces(&rounds, 2).unwrap();
        assert_eq!(aggregated, vec![point(3), point(30)]);
    }

    #[test]
    fn test_nonce_count_mismatch() {
        let rounds = vec![vec![point(1), point(10)], vec![point(2)]];
        let result = aggregate_nonces(&rounds, 2);
        assert_eq!(
            result,
            Err(MuSigError::NonceCountMismatch {
                signer: 1,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_effective_nonce_powers_of_b() {
        let b = Scalar::from(3u64);
        let aggregated = vec![point(1), point(2), point(5)];
        // 1*1 + 3*2 + 9*5
        assert_eq!(effective_nonce(&b, &aggregated).unwrap(), point(52));
    }

    #[test]
    fn test_effective_nonce_at_infinity_is_rejected() {
        let p = point(6);
        assert_eq!(
            effective_nonce(&Scalar::ONE, &[p, -p]),
            Err(MuSigError::InvalidEffectiveNonce)
        );

        // Single slot, signers' nonces cancel out.
        let aggregated = aggregate_nonces(&[vec![p], vec![-p]], 1).unwrap();
        assert_eq!(
            effective_nonce(&Scalar::from(77u64), &aggregated),
            Err(MuSigError::InvalidEffectiveNonce)
        );
    }

    #[test]
    fn test_hash_derivations_are_deterministic() {
        let cap_x = point(100);
        let aggregated = vec![point(7), point(8)];
        let b1 = nonce_coefficient(&Sha256TaggedHasher, &cap_x, &aggregated, b"m");
        let b2 = nonce_coefficient(&Sha256TaggedHasher, &cap_x, &aggregated, b"m");
        assert_eq!(b1, b2);
        assert_ne!(b1, nonce_coefficient(&Sha256TaggedHasher, &cap_x, &aggregated, b"n"));

        let c1 = challenge(&Sha256TaggedHasher, &cap_x, &point(9), b"m");
        let c2 = challenge(&Sha256TaggedHasher, &cap_x, &point(9), b"m");
        assert_eq!(c1, c2);
    }

    #[test]
    fn test_challenge_binds_y_coordinate() {
        let cap_x = point(100);
        let r = point(9);
        // -R has the same x but a different y
        assert_ne!(
            challenge(&Sha256TaggedHasher, &cap_x, &r, b"m"),
            challenge(&Sha256TaggedHasher, &cap_x, &-r, b"m")
        );
    }

    #[test]
    fn test_partial_signature_formula() {
        let x = Secret::new(Scalar::from(5u64));
        let round = NonceCommitmentRound::from_secret_nonces(vec![
            Secret::new(Scalar::from(2u64)),
            Secret::new(Scalar::from(3u64)),
        ])
        .unwrap();
        let b = Scalar::from(10u64);
        let a = Scalar::from(7u64);
        let c = Scalar::from(11u64);
        // 2 + 3*10 + 11*7*5
        let s = partial_signature(&x, round, &b, &a, &c);
        assert_eq!(s, Scalar::from(417u64));
    }

    #[test]
    fn test_partial_signature_reduces_mod_order() {
        let minus_one = -Scalar::ONE;
        let x = Secret::new(minus_one);
        let round = NonceCommitmentRound::from_secret_nonces(vec![Secret::new(minus_one)]).unwrap();
        // -1 + (-1)(-1)(-1) = -2
        let s = partial_signature(&x, round, &Scalar::ONE, &minus_one, &minus_one);
        assert_eq!(s, -Scalar::from(2u64));
    }

    #[test]
    fn test_aggregate_partial_signatures_wraps() {
        let minus_one = -Scalar::ONE;
        let s = aggregate_partial_signatures(&[minus_one, Scalar::from(3u64)]);
        assert_eq!(s, Scalar::from(2u64));
        assert_eq!(aggregate_partial_signatures(&[]), Scalar::ZERO);
    }

    #[test]
    fn test_invalid_message() {
        let x = Secret::new(Scalar::from(1234u64));
        let keys = KeyPair::create_from_private_key(x).unwrap();
        let ordered = vec![keys.public_key];
        let cap_x = aggregate_public_keys(&Sha256TaggedHasher, &ordered).unwrap();
        let round = NonceCommitmentRound::from_secret_nonces(vec![Secret::new(Scalar::from(99u64))])
            .unwrap();
        let aggregated = aggregate_nonces(&[round.public_nonces()], 1).unwrap();
        let b = nonce_coefficient(&Sha256TaggedHasher, &cap_x, &aggregated, b"Hello World");
        let cap_r = effective_nonce(&b, &aggregated).unwrap();
        let c = challenge(&Sha256TaggedHasher, &cap_x, &cap_r, b"Hello World");
        let a = key_agg_coefficient(&Sha256TaggedHasher, &ordered, &keys.public_key);
        let s = partial_signature(&keys.private_key, round, &b, &a, &c);

        assert!(verify_signature(&cap_x, &cap_r, &s, b"Hello World"));
        assert!(!verify_signature(&cap_x, &cap_r, &s, b"Send 0.000001 BTC to Bob"));
        assert!(!verify_signature(&cap_x, &-cap_r, &s, b"Hello World"));
        assert!(!verify_signature(&cap_x, &cap_r, &(s + Scalar::ONE), b"Hello World"));
    }

    #[test]
    fn test_identity_inputs_never_verify() {
        let identity = ProjectivePoint::IDENTITY;
        assert!(!verify_signature(&identity, &identity, &Scalar::ZERO, b"m"));
    }
}
