#![no_main]

use libfuzzer_sys::fuzz_target;

use k256::Scalar;
use musig2_signature::aggregator::Aggregator;
use musig2_signature::party::Party;
use musig2_signature::tagged_hash::tagged_hash;
use musig2_signature::{MuSigConfig, MuSigError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use secrecy::Secret;

fuzz_target!(|data: &[u8]| {
    // Message to be signed
    let message_to_sign = b"Hello world";
    let config = MuSigConfig::default();

    // Randomness source
    let seeded_rng = StdRng::seed_from_u64(123);

    let private_key: Scalar = tagged_hash("fuzz/PrivateKey", data);

    // The first round of public keys aggregation
    let (party, pub_key_message) =
        match Party::new_from_private_key(Secret::new(private_key), &message_to_sign[..], config) {
            Ok(created) => created,
            Err(MuSigError::InvalidSecretKey) => return,
            Err(e) => panic!("{e}"),
        };
    let aggregator = Aggregator::new(1, message_to_sign, config).expect("Error");
    let (aggregator, key_aggregation) = aggregator
        .aggregate_public_keys(vec![pub_key_message])
        .expect("Error");

    // The second round of public nonces aggregation
    let (party, nonce_message) = party
        .generate_nonces(key_aggregation, seeded_rng)
        .expect("Error");
    let (aggregator, agg_nonce_message) = aggregator
        .aggregate_nonces(vec![nonce_message])
        .expect("Error");

    // The third round of signatures aggregation
    let (_party, part_sig_message) = party
        .generate_partial_signature(agg_nonce_message)
        .expect("Error");
    let aggregator = aggregator
        .aggregate_signatures(vec![part_sig_message])
        .expect("Error");
    let (aggregator, _signature) = aggregator.calc_aggregated_signature().expect("Error");

    assert!(aggregator.verify_signature());
});
