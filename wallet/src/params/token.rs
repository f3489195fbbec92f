//! # Payment Tokens
//!
//! A token is a [`TxParameters`] snapshot in a self-describing binary frame,
//! handed between wallets as hex or base-58 text:
//!
//! ```text
//! flags:u8 | has_tx_id:u8 [tx_id:16] | count:varint { id:varint len:varint bytes }*
//! ```
//!
//! The top bit of `flags` marks the frame as a token. Older clients hand out
//! raw 36-byte wallet addresses instead, so [`parse_parameters`] accepts
//! both and tells them apart by length and flag bit.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{MIN_PARSE_BUFFER_LENGTH, TOKEN_FLAG, TOKEN_MIN_LENGTH_EXCLUSIVE};
use crate::core::{TxId, WalletId};
use crate::crypto::PeerId;

use super::codec;
use super::error::TokenError;
use super::id::TxParameterId;
use super::store::{PackedTxParameters, TxParameters};

/// Wire frame of a [`TxParameters`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxToken {
    flags: u8,
    tx_id: Option<TxId>,
    parameters: PackedTxParameters,
}

impl TxToken {
    pub fn new(params: &TxParameters) -> Result<Self, TokenError> {
        Ok(Self {
            flags: TOKEN_FLAG,
            tx_id: params.tx_id(),
            parameters: params.pack()?,
        })
    }

    pub fn tx_id(&self) -> Option<TxId> {
        self.tx_id
    }

    pub fn unpack_parameters(&self) -> Result<TxParameters, TokenError> {
        TxParameters::unpack(self.tx_id, &self.parameters)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TokenError> {
        Ok(codec::encode(self)?)
    }

    /// Decode a frame. Buffers that are too short or lack the token flag
    /// are rejected before any decoding is attempted.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, TokenError> {
        if buf.len() <= TOKEN_MIN_LENGTH_EXCLUSIVE || buf[0] & TOKEN_FLAG == 0 {
            return Err(TokenError::NotAToken);
        }
        let token: Self = codec::decode(buf)?;
        if token.flags & TOKEN_FLAG == 0 {
            return Err(TokenError::NotAToken);
        }
        Ok(token)
    }

    pub fn to_base58(&self) -> Result<String, TokenError> {
        Ok(bs58::encode(self.to_bytes()?).into_string())
    }

    pub fn to_hex(&self) -> Result<String, TokenError> {
        Ok(hex::encode(self.to_bytes()?))
    }
}

/// Base-58 token text for a parameter set, the form shown to users.
pub fn to_token_string(params: &TxParameters) -> Result<String, TokenError> {
    TxToken::new(params)?.to_base58()
}

fn decode_text(text: &str) -> Option<Vec<u8>> {
    if let Ok(buf) = hex::decode(text) {
        return Some(buf);
    }
    bs58::decode(text).into_vec().ok()
}

/// Parse user-supplied text into transaction parameters.
///
/// The text is read as hex if it decodes as hex, otherwise as base-58.
/// A buffer longer than the token threshold whose first byte carries the
/// token flag must decode as a token; there is no second attempt as an
/// address. Anything else is read as a raw wallet address, which must hold
/// a valid public key, and yields a parameter set with only the peer id.
pub fn parse_parameters(text: &str) -> Result<TxParameters, TokenError> {
    let buf = decode_text(text).ok_or(TokenError::InvalidFormat)?;
    if buf.len() < MIN_PARSE_BUFFER_LENGTH {
        return Err(TokenError::InvalidFormat);
    }

    if buf.len() > TOKEN_MIN_LENGTH_EXCLUSIVE && buf[0] & TOKEN_FLAG != 0 {
        return TxToken::from_bytes(&buf)
            .and_then(|token| token.unpack_parameters())
            .map_err(|err| {
                debug!(len = buf.len(), "flagged buffer is not a token: {}", err);
                TokenError::InvalidFormat
            });
    }

    let wallet_id = WalletId::from_buf(&buf).map_err(|_| TokenError::InvalidFormat)?;
    if !wallet_id.is_valid() {
        debug!(len = buf.len(), "address does not carry a valid public key");
        return Err(TokenError::InvalidFormat);
    }
    let mut params = TxParameters::default();
    params.set(TxParameterId::PEER_ID, &wallet_id);
    Ok(params)
}

/// Copy the receiver's address and, if present, its wallet identity from a
/// parsed token into `params`. Returns whether the address was present.
pub fn load_receiver_params(receiver: &TxParameters, params: &mut TxParameters) -> bool {
    let mut found = true;
    match receiver.get::<WalletId>(TxParameterId::PEER_ID) {
        Some(peer_id) => {
            params.set(TxParameterId::PEER_ID, &peer_id);
        }
        None => found = false,
    }
    if let Some(identity) = receiver.get::<PeerId>(TxParameterId::PEER_WALLET_IDENTITY) {
        params.set(TxParameterId::PEER_WALLET_IDENTITY, &identity);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecretKey;

    fn address() -> WalletId {
        WalletId::new(0, SecretKey::random().public_key())
    }

    fn sample_params() -> TxParameters {
        let mut p = TxParameters::new(Some(TxId::generate()));
        p.set(TxParameterId::AMOUNT, &100_000_000u64)
            .set(TxParameterId::PEER_ID, &address());
        p
    }

    #[test]
    fn frame_starts_with_flag_byte() {
        let bytes = TxToken::new(&sample_params()).unwrap().to_bytes().unwrap();
        assert_eq!(bytes[0], TOKEN_FLAG);
        assert!(bytes.len() > TOKEN_MIN_LENGTH_EXCLUSIVE);
    }

    #[test]
    fn base58_and_hex_both_parse() {
        let params = sample_params();
        let token = TxToken::new(&params).unwrap();
        assert_eq!(parse_parameters(&token.to_base58().unwrap()).unwrap(), params);
        assert_eq!(parse_parameters(&token.to_hex().unwrap()).unwrap(), params);
    }

    #[test]
    fn raw_address_parses_as_peer_id() {
        let addr = address();
        let params = parse_parameters(&hex::encode(addr.to_bytes())).unwrap();
        assert_eq!(params.get::<WalletId>(TxParameterId::PEER_ID), Some(addr));
        assert_eq!(params.tx_id(), None);
    }

    #[test]
    fn short_address_is_right_aligned() {
        // Channel 0 addresses may be handed out as the bare key.
        let addr = address();
        let params = parse_parameters(&hex::encode(addr.pk.as_bytes())).unwrap();
        assert_eq!(params.get::<WalletId>(TxParameterId::PEER_ID), Some(addr));
    }

    #[test]
    fn garbage_is_invalid_format() {
        assert!(matches!(parse_parameters(""), Err(TokenError::InvalidFormat)));
        assert!(matches!(parse_parameters("0O0O"), Err(TokenError::InvalidFormat)));
        assert!(matches!(parse_parameters("ab"), Err(TokenError::InvalidFormat)));
    }

    #[test]
    fn identity_key_address_is_rejected() {
        let zero = WalletId::default().to_bytes();
        assert!(matches!(
            parse_parameters(&hex::encode(zero)),
            Err(TokenError::InvalidFormat)
        ));
    }

    #[test]
    fn flagged_long_buffer_never_falls_back_to_address() {
        let mut buf = address().to_bytes();
        buf[0] |= TOKEN_FLAG;
        assert!(matches!(
            parse_parameters(&hex::encode(buf)),
            Err(TokenError::InvalidFormat)
        ));
    }

    #[test]
    fn load_receiver_params_copies_address_and_identity() {
        let mut receiver = sample_params();
        let identity = SecretKey::random().public_key();
        receiver.set(TxParameterId::PEER_WALLET_IDENTITY, &identity);

        let mut mine = TxParameters::default();
        assert!(load_receiver_params(&receiver, &mut mine));
        assert_eq!(
            mine.get::<WalletId>(TxParameterId::PEER_ID),
            receiver.get::<WalletId>(TxParameterId::PEER_ID)
        );
        assert_eq!(mine.get::<PeerId>(TxParameterId::PEER_WALLET_IDENTITY), Some(identity));
        assert_eq!(mine.get::<u64>(TxParameterId::AMOUNT), None);

        let mut other = TxParameters::default();
        assert!(!load_receiver_params(&TxParameters::default(), &mut other));
        assert!(other.is_empty());
    }
}
