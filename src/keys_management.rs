use crate::errors::{MuSigError, Result};
use crate::rand_nonce::sample_nonzero_scalar;
use k256::{ProjectivePoint, Scalar};
use secrecy::{ExposeSecret, Secret};

/// A signer's secret key and its public key `X = x·G`.
///
/// The secret is zeroed when the pair is dropped.
pub struct KeyPair {
    pub(crate) private_key: Secret<Scalar>,
    pub public_key: ProjectivePoint,
}

use std::fmt;
impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Format the KeyPair struct without including private_key
        write!(f, "KeyPair {{ public_key: {:?} }}", self.public_key.to_affine())
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        KeyPair {
            private_key: Secret::new(*self.private_key.expose_secret()),
            public_key: self.public_key,
        }
    }
}

impl KeyPair {
    pub fn create<R>(rng: R) -> Result<KeyPair>
    where
        R: rand::CryptoRng + rand::RngCore,
    {
        let private_key = sample_nonzero_scalar(rng).ok_or(MuSigError::InvalidSecretKey)?;
        KeyPair::create_from_private_key(Secret::new(private_key))
    }

    /// Builds the pair for an existing secret. Zero is not a valid secret key.
    pub fn create_from_private_key(private_key: Secret<Scalar>) -> Result<KeyPair> {
        if bool::from(private_key.expose_secret().is_zero()) {
            return Err(MuSigError::InvalidSecretKey);
        }
        let public_key = ProjectivePoint::GENERATOR * private_key.expose_secret();
        Ok(KeyPair {
            private_key,
            public_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::encode_x;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_public_key_of_one_is_generator() {
        let keys = KeyPair::create_from_private_key(Secret::new(Scalar::ONE)).unwrap();
        assert_eq!(keys.public_key, ProjectivePoint::GENERATOR);
    }

    #[test]
    fn test_zero_private_key_rejected() {
        let result = KeyPair::create_from_private_key(Secret::new(Scalar::ZERO));
        assert_eq!(result.unwrap_err(), MuSigError::InvalidSecretKey);
    }

    #[test]
    fn test_seeded_keys_are_reproducible() {
        let a = KeyPair::create(ChaCha20Rng::seed_from_u64(7)).unwrap();
        let b = KeyPair::create(ChaCha20Rng::seed_from_u64(7)).unwrap();
        let c = KeyPair::create(ChaCha20Rng::seed_from_u64(8)).unwrap();
        assert_eq!(encode_x(&a.public_key), encode_x(&b.public_key));
        assert_ne!(encode_x(&a.public_key), encode_x(&c.public_key));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let keys = KeyPair::create_from_private_key(Secret::new(Scalar::from(42u64))).unwrap();
        let printed = format!("{:?}", keys);
        assert!(printed.starts_with("KeyPair { public_key:"));
        assert!(!printed.contains("private_key"));
    }
}
