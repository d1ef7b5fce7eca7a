use musig2_signature::aggregator::Aggregator;
use musig2_signature::party::Party;
use musig2_signature::{MuSigConfig, Result};
use rand_core::OsRng;

const PARTIES: usize = 3;

fn main() -> Result<()> {
    #[cfg(feature = "tracing")]
    {
        use musig2_signature::telemetry::{get_subscriber, init_subscriber};
        let subscriber = get_subscriber("musig".into(), "info".into(), std::io::stdout);
        if let Err(e) = init_subscriber(subscriber) {
            eprintln!("{e}");
        }
    }

    // Message to be signed
    let message_to_sign = "Hello World".to_string();
    let config = MuSigConfig::default();

    // Randomness source
    let csprng = OsRng;

    // The first round of public keys aggregation
    let mut parties = Vec::with_capacity(PARTIES);
    let mut pub_key_messages = Vec::with_capacity(PARTIES);
    for _ in 0..PARTIES {
        let (party, pub_key_message) = Party::new(message_to_sign.as_bytes(), config, csprng)?;
        parties.push(party);
        pub_key_messages.push(pub_key_message);
    }
    let aggregator = Aggregator::new(PARTIES, message_to_sign.as_bytes(), config)?;
    let (aggregator, key_aggregation) = aggregator.aggregate_public_keys(pub_key_messages)?;

    // The second round of public nonces aggregation
    let mut nonce_parties = Vec::with_capacity(PARTIES);
    let mut nonce_messages = Vec::with_capacity(PARTIES);
    for party in parties {
        let (party, nonce_message) = party.generate_nonces(key_aggregation.clone(), csprng)?;
        nonce_parties.push(party);
        nonce_messages.push(nonce_message);
    }
    let (aggregator, agg_nonce_message) = aggregator.aggregate_nonces(nonce_messages)?;

    // The third round of signatures aggregation
    let mut signing_parties = Vec::with_capacity(PARTIES);
    let mut part_sig_messages = Vec::with_capacity(PARTIES);
    for party in nonce_parties {
        let (party, part_sig_message) =
            party.generate_partial_signature(agg_nonce_message.clone())?;
        signing_parties.push(party);
        part_sig_messages.push(part_sig_message);
    }
    let aggregator = aggregator.aggregate_signatures(part_sig_messages)?;
    let (aggregator, signature) = aggregator.calc_aggregated_signature()?;
    let result = aggregator.verify_signature();

    for party in signing_parties {
        let party = party.set_aggregated_signature(signature);
        assert!(party.verify_signature());
    }

    let bytes = signature.to_bytes();
    println!("Signature (R.x || s): {}", to_hex(&bytes));
    println!("Verification result: {:?}", result);
    assert!(result);
    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
