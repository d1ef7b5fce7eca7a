use crate::errors::{MuSigError, Result};
use k256::elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar};
use secrecy::{ExposeSecret, Secret};

/// How many times a zero draw is resampled before giving up.
pub const MAX_NONCE_SAMPLING_ATTEMPTS: usize = 8;

/// Draws a uniformly random nonzero scalar, resampling zero draws.
///
/// Returns `None` only if the source produced zero on every attempt, which
/// for a working CSPRNG means it is broken.
pub(crate) fn sample_nonzero_scalar<R>(mut rng: R) -> Option<Scalar>
where
    R: rand::CryptoRng + rand::RngCore,
{
    (0..MAX_NONCE_SAMPLING_ATTEMPTS)
        .map(|_| Scalar::random(&mut rng))
        .find(|candidate| !bool::from(candidate.is_zero()))
}

/// One secret nonce `r` and its public point `R = r·G`.
pub struct RandomNonce {
    pub r_public: ProjectivePoint,
    pub(crate) r_private: Secret<Scalar>,
}

use std::fmt;
impl fmt::Debug for RandomNonce {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RandomNonce {{ r_public: {:?} }}", self.r_public.to_affine())
    }
}

impl RandomNonce {
    pub fn new_rand<R>(rng: R) -> Result<RandomNonce>
    where
        R: rand::CryptoRng + rand::RngCore,
    {
        let r_private = sample_nonzero_scalar(rng).ok_or(MuSigError::ZeroNonceSampled)?;
        RandomNonce::from_secret(Secret::new(r_private))
    }

    /// Wraps a caller-chosen secret nonce. Zero is rejected, never replaced.
    pub fn from_secret(r_private: Secret<Scalar>) -> Result<RandomNonce> {
        if bool::from(r_private.expose_secret().is_zero()) {
            return Err(MuSigError::ZeroNonceSampled);
        }
        let r_public = ProjectivePoint::GENERATOR * r_private.expose_secret();
        Ok(RandomNonce {
            r_public,
            r_private,
        })
    }
}

/// A signer's ν nonces for a single protocol run.
///
/// Deliberately not `Clone`: the round is moved into partial signing and
/// dropped (zeroing the secrets) right after.
#[derive(Debug)]
pub struct NonceCommitmentRound {
    nonces: Vec<RandomNonce>,
}

impl NonceCommitmentRound {
    /// Round 1: samples `nonce_count` fresh nonces.
    #[tracing::instrument(name = "Generating secret nonces", skip(rng))]
    pub fn generate<R>(nonce_count: usize, mut rng: R) -> Result<NonceCommitmentRound>
    where
        R: rand::CryptoRng + rand::RngCore,
    {
        if nonce_count == 0 {
            return Err(MuSigError::InvalidNonceCount);
        }
        let nonces = (0..nonce_count)
            .map(|_| RandomNonce::new_rand(&mut rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(NonceCommitmentRound { nonces })
    }

    /// Builds a round from known secret nonces, in slot order.
    pub fn from_secret_nonces(secrets: Vec<Secret<Scalar>>) -> Result<NonceCommitmentRound> {
        if secrets.is_empty() {
            return Err(MuSigError::InvalidNonceCount);
        }
        let nonces = secrets
            .into_iter()
            .map(RandomNonce::from_secret)
            .collect::<Result<Vec<_>>>()?;
        Ok(NonceCommitmentRound { nonces })
    }

    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    /// The points to broadcast, in slot order.
    pub fn public_nonces(&self) -> Vec<ProjectivePoint> {
        self.nonces.iter().map(|nonce| nonce.r_public).collect()
    }

    pub(crate) fn secret_nonces(&self) -> impl Iterator<Item = &Scalar> + '_ {
        self.nonces.iter().map(|nonce| nonce.r_private.expose_secret())
    }
}

/// Generates a round of `nonce_count` nonces.
pub fn generate_nonces<R>(nonce_count: usize, rng: R) -> Result<NonceCommitmentRound>
where
    R: rand::CryptoRng + rand::RngCore,
{
    NonceCommitmentRound::generate(nonce_count, rng)
}
