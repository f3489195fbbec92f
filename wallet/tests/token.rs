//! Token text compatibility: what one wallet prints, another must read back
//! to the same parameters and the same bytes.

use nova_wallet::config::{TOKEN_FLAG, WALLET_ID_LENGTH};
use nova_wallet::core::{TxId, WalletId};
use nova_wallet::crypto::{PeerId, SecretKey};
use nova_wallet::params::{
    load_receiver_params, parse_parameters, to_token_string, TokenError, TxParameterId,
    TxParameters, TxToken,
};

fn address(channel: u32) -> WalletId {
    WalletId::new(channel, SecretKey::random().public_key())
}

#[test]
fn amount_and_peer_repack_to_identical_bytes() {
    let peer = address(11);
    let mut params = TxParameters::new(None);
    params
        .set(TxParameterId::AMOUNT, &100_000_000u64)
        .set(TxParameterId::PEER_ID, &peer);

    let text = to_token_string(&params).unwrap();
    let parsed = parse_parameters(&text).unwrap();
    assert_eq!(parsed.get::<u64>(TxParameterId::AMOUNT), Some(100_000_000));
    assert_eq!(parsed.get::<WalletId>(TxParameterId::PEER_ID), Some(peer));
    assert!(parsed.tx_id().is_none());

    let original = TxToken::new(&params).unwrap().to_bytes().unwrap();
    let repacked = TxToken::new(&parsed).unwrap().to_bytes().unwrap();
    assert_eq!(original, repacked);
    assert_eq!(to_token_string(&parsed).unwrap(), text);
}

#[test]
fn tx_id_and_sub_transactions_survive_both_encodings() {
    let id = TxId::generate();
    let mut params = TxParameters::new(Some(id));
    params
        .set(TxParameterId::AMOUNT, &42u64)
        .set(TxParameterId::MESSAGE, &b"rent".to_vec())
        .set_sub(TxParameterId::FEE, &7u64, 2)
        .set_sub(TxParameterId::MIN_HEIGHT, &900u64, 3);

    let token = TxToken::new(&params).unwrap();
    for text in [token.to_hex().unwrap(), token.to_base58().unwrap()] {
        let parsed = parse_parameters(&text).unwrap();
        assert_eq!(parsed.tx_id(), Some(id));
        assert_eq!(parsed, params);
        assert_eq!(parsed.get_sub::<u64>(TxParameterId::FEE, 2), Some(7));
        assert_eq!(parsed.get_sub::<u64>(TxParameterId::MIN_HEIGHT, 3), Some(900));
    }
}

#[test]
fn flagged_buffer_at_threshold_reads_as_address() {
    let pk = SecretKey::random().public_key();
    let mut buf = vec![TOKEN_FLAG];
    buf.extend_from_slice(pk.as_bytes());
    assert_eq!(buf.len(), 33);

    let parsed = parse_parameters(&hex::encode(&buf)).unwrap();
    let peer: WalletId = parsed.get(TxParameterId::PEER_ID).unwrap();
    assert_eq!(peer.channel, u32::from(TOKEN_FLAG));
    assert_eq!(peer.pk, pk);
}

#[test]
fn full_address_with_high_channel_bit_is_not_an_address() {
    // 36 bytes whose first byte carries the flag: read as a token, and it
    // is not one.
    let peer = WalletId::new(0x8000_0001, SecretKey::random().public_key());
    let bytes = peer.to_bytes();
    assert_eq!(bytes.len(), WALLET_ID_LENGTH);
    assert!(matches!(
        parse_parameters(&hex::encode(bytes)),
        Err(TokenError::InvalidFormat)
    ));

    let plain = address(1);
    let parsed = parse_parameters(&hex::encode(plain.to_bytes())).unwrap();
    assert_eq!(parsed.get::<WalletId>(TxParameterId::PEER_ID), Some(plain));
}

#[test]
fn too_short_or_undecodable_text_is_invalid() {
    assert!(matches!(parse_parameters("ab"), Err(TokenError::InvalidFormat)));
    assert!(matches!(parse_parameters(""), Err(TokenError::InvalidFormat)));
    assert!(matches!(parse_parameters("0OIl"), Err(TokenError::InvalidFormat)));
}

#[test]
fn receiver_token_fills_sender_parameters() {
    let receiver = address(4);
    let identity = SecretKey::random().public_key();
    let mut offer = TxParameters::new(None);
    offer
        .set(TxParameterId::PEER_ID, &receiver)
        .set(TxParameterId::PEER_WALLET_IDENTITY, &identity)
        .set(TxParameterId::AMOUNT, &5u64);
    let parsed = parse_parameters(&to_token_string(&offer).unwrap()).unwrap();

    let mut send = TxParameters::new(None);
    send.set(TxParameterId::AMOUNT, &9u64);
    assert!(load_receiver_params(&parsed, &mut send));
    assert_eq!(send.get::<WalletId>(TxParameterId::PEER_ID), Some(receiver));
    assert_eq!(send.get::<PeerId>(TxParameterId::PEER_WALLET_IDENTITY), Some(identity));
    // Only the address fields are copied.
    assert_eq!(send.get::<u64>(TxParameterId::AMOUNT), Some(9));
}
