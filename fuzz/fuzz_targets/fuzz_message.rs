#![no_main]

use libfuzzer_sys::fuzz_target;

use musig2_signature::aggregator::Aggregator;
use musig2_signature::party::Party;
use musig2_signature::MuSigConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

fuzz_target!(|data: &[u8]| {
    // Any byte string is a valid message
    let config = MuSigConfig::default();

    // Randomness source
    let seeded_rng = StdRng::seed_from_u64(123);

    // The first round of public keys aggregation
    let (party, pub_key_message) = Party::new(data, config, seeded_rng.clone()).expect("Error");
    let aggregator = Aggregator::new(1, data, config).expect("Error");
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
