//! Message registry: type URL to encode/decode functions.
//!
//! A `Registry` is built once at start-up and only read afterwards. Signers
//! borrow it; there is no global table.

use std::collections::BTreeMap;

use crate::error::CosmosError;
use crate::messages::{Message, MsgMultiSend, MsgSend};
use crate::protobuf::Any;
use crate::tx::TxBody;

pub type EncodeFn = fn(&Message) -> Result<Vec<u8>, CosmosError>;
pub type DecodeFn = fn(&[u8]) -> Result<Message, CosmosError>;

#[derive(Clone, Copy)]
struct Codec {
    encode: EncodeFn,
    decode: DecodeFn,
}

#[derive(Clone, Default)]
pub struct Registry {
    codecs: BTreeMap<String, Codec>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bank module's `MsgSend` and `MsgMultiSend`.
    pub fn with_bank_types() -> Self {
        Self::new()
            .register(MsgSend::TYPE_URL, encode_send, decode_send)
            .register(MsgMultiSend::TYPE_URL, encode_multi_send, decode_multi_send)
    }

    /// Adds or replaces the codec for `type_url`.
    pub fn register(mut self, type_url: impl Into<String>, encode: EncodeFn, decode: DecodeFn) -> Self {
        self.codecs.insert(type_url.into(), Codec { encode, decode });
        self
    }

    pub fn is_registered(&self, type_url: &str) -> bool {
        self.codecs.contains_key(type_url)
    }

    pub fn type_urls(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    fn codec(&self, type_url: &str) -> Result<&Codec, CosmosError> {
        self.codecs
            .get(type_url)
            .ok_or_else(|| CosmosError::UnregisteredType(type_url.to_string()))
    }

    /// Encodes the message payload (no `Any` wrapper).
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>, CosmosError> {
        (self.codec(message.type_url())?.encode)(message)
    }

    pub fn encode_as_any(&self, message: &Message) -> Result<Any, CosmosError> {
        Ok(Any::new(message.type_url(), self.encode(message)?))
    }

    pub fn decode(&self, any: &Any) -> Result<Message, CosmosError> {
        (self.codec(&any.type_url)?.decode)(&any.value)
    }

    /// Builds the transaction body. A missing timeout height is encoded as 0.
    pub fn build_body(
        &self,
        messages: &[Message],
        memo: &str,
        timeout_height: Option<u64>,
    ) -> Result<TxBody, CosmosError> {
        let messages = messages
            .iter()
            .map(|m| self.encode_as_any(m))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TxBody {
            messages,
            memo: memo.to_string(),
            timeout_height: timeout_height.unwrap_or(0),
        })
    }

    pub fn encode_body(
        &self,
        messages: &[Message],
        memo: &str,
        timeout_height: Option<u64>,
    ) -> Result<Vec<u8>, CosmosError> {
        Ok(self.build_body(messages, memo, timeout_height)?.encode())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("type_urls", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn variant_mismatch(expected: &str, message: &Message) -> CosmosError {
    CosmosError::EncodingError(format!(
        "codec for {expected} cannot encode {}",
        message.type_url()
    ))
}

fn encode_send(message: &Message) -> Result<Vec<u8>, CosmosError> {
    match message {
        Message::Send(msg) => msg.encode(),
        other => Err(variant_mismatch(MsgSend::TYPE_URL, other)),
    }
}

fn decode_send(bytes: &[u8]) -> Result<Message, CosmosError> {
    MsgSend::decode(bytes).map(Message::Send)
}

fn encode_multi_send(message: &Message) -> Result<Vec<u8>, CosmosError> {
    match message {
        Message::MultiSend(msg) => msg.encode(),
        other => Err(variant_mismatch(MsgMultiSend::TYPE_URL, other)),
    }
}

fn decode_multi_send(bytes: &[u8]) -> Result<Message, CosmosError> {
    MsgMultiSend::decode(bytes).map(Message::MultiSend)
}
