//! Bank module messages (`cosmos.bank.v1beta1`).
//!
//! The set of messages the signer can place in a transaction body is closed:
//! one `Message` variant per supported kind, each with typed fields.

use serde::{Deserialize, Serialize};

use crate::error::CosmosError;
use crate::math::check_uint_string;
use crate::protobuf::{encode_length_delimited, encode_string, FieldReader};

/// A denomination and an arbitrary-precision decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CosmosError> {
        if self.denom.is_empty() {
            return Err(CosmosError::EncodingError("coin denom is empty".into()));
        }
        check_uint_string("coin amount", &self.amount)
    }

    pub fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        self.validate()?;
        let mut buf = Vec::new();
        encode_string(&mut buf, 1, &self.denom);
        encode_string(&mut buf, 2, &self.amount);
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut coin = Coin::new("", "");
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => coin.denom = value.as_string("coin.denom")?,
                2 => coin.amount = value.as_string("coin.amount")?,
                _ => {}
            }
        }
        Ok(coin)
    }
}

/// Appends each coin as an embedded message under `field_number`.
pub(crate) fn encode_coins(buf: &mut Vec<u8>, field_number: u32, coins: &[Coin]) -> Result<(), CosmosError> {
    for coin in coins {
        encode_length_delimited(buf, field_number, &coin.encode()?);
    }
    Ok(())
}

/// `MsgSend`: move `amount` from one account to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

impl MsgSend {
    pub const TYPE_URL: &'static str = "/cosmos.bank.v1beta1.MsgSend";

    pub fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        let mut buf = Vec::new();
        encode_string(&mut buf, 1, &self.from_address);
        encode_string(&mut buf, 2, &self.to_address);
        encode_coins(&mut buf, 3, &self.amount)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut msg = MsgSend {
            from_address: String::new(),
            to_address: String::new(),
            amount: Vec::new(),
        };
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => msg.from_address = value.as_string("from_address")?,
                2 => msg.to_address = value.as_string("to_address")?,
                3 => msg.amount.push(Coin::decode(value.as_bytes("amount")?)?),
                _ => {}
            }
        }
        Ok(msg)
    }
}

/// One side of a `MsgMultiSend`. Inputs and outputs share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEntry {
    pub address: String,
    pub coins: Vec<Coin>,
}

impl BankEntry {
    pub fn new(address: impl Into<String>, coins: Vec<Coin>) -> Self {
        Self {
            address: address.into(),
            coins,
        }
    }

    fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        let mut buf = Vec::new();
        encode_string(&mut buf, 1, &self.address);
        encode_coins(&mut buf, 2, &self.coins)?;
        Ok(buf)
    }

    fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut entry = BankEntry::new("", Vec::new());
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => entry.address = value.as_string("address")?,
                2 => entry.coins.push(Coin::decode(value.as_bytes("coins")?)?),
                _ => {}
            }
        }
        Ok(entry)
    }
}

/// `MsgMultiSend`: many inputs to many outputs in one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgMultiSend {
    pub inputs: Vec<BankEntry>,
    pub outputs: Vec<BankEntry>,
}

impl MsgMultiSend {
    pub const TYPE_URL: &'static str = "/cosmos.bank.v1beta1.MsgMultiSend";

    pub fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        let mut buf = Vec::new();
        for input in &self.inputs {
            encode_length_delimited(&mut buf, 1, &input.encode()?);
        }
        for output in &self.outputs {
            encode_length_delimited(&mut buf, 2, &output.encode()?);
        }
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut msg = MsgMultiSend {
            inputs: Vec::new(),
            outputs: Vec::new(),
        };
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => msg.inputs.push(BankEntry::decode(value.as_bytes("inputs")?)?),
                2 => msg.outputs.push(BankEntry::decode(value.as_bytes("outputs")?)?),
                _ => {}
            }
        }
        Ok(msg)
    }
}

/// Every message kind the signer can put in a transaction body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Send(MsgSend),
    MultiSend(MsgMultiSend),
}

impl Message {
    /// Builds a `MsgSend`.
    pub fn send(from: impl Into<String>, to: impl Into<String>, amount: Vec<Coin>) -> Self {
        Message::Send(MsgSend {
            from_address: from.into(),
            to_address: to.into(),
            amount,
        })
    }

    pub fn type_url(&self) -> &'static str {
        match self {
            Message::Send(_) => MsgSend::TYPE_URL,
            Message::MultiSend(_) => MsgMultiSend::TYPE_URL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_send() -> MsgSend {
        MsgSend {
            from_address: "cosmos1from".into(),
            to_address: "cosmos1to".into(),
            amount: vec![Coin::new("utoken", "1000")],
        }
    }

    #[test]
    fn coin_wire_layout() {
        let bytes = Coin::new("utoken", "1000").encode().unwrap();
        let mut expected = vec![0x0A, 0x06];
        expected.extend_from_slice(b"utoken");
        expected.extend_from_slice(&[0x12, 0x04]);
        expected.extend_from_slice(b"1000");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn coin_rejects_non_numeric_amount() {
        assert!(matches!(
            Coin::new("utoken", "1.5").encode(),
            Err(CosmosError::EncodingError(_))
        ));
        assert!(Coin::new("", "1").encode().is_err());
    }

    #[test]
    fn msg_send_field_order_is_fixed() {
        let bytes = sample_send().encode().unwrap();
        // from (field 1) first, to (field 2), then the coin (field 3).
        assert_eq!(bytes[0], 0x0A);
        let to_tag_at = 2 + "cosmos1from".len();
        assert_eq!(bytes[to_tag_at], 0x12);
        let coin_tag_at = to_tag_at + 2 + "cosmos1to".len();
        assert_eq!(bytes[coin_tag_at], 0x1A);
    }

    #[test]
    fn msg_send_decodes_what_it_encodes() {
        let msg = sample_send();
        assert_eq!(MsgSend::decode(&msg.encode().unwrap()).unwrap(), msg);
    }

    #[test]
    fn multi_send_decodes_what_it_encodes() {
        let msg = MsgMultiSend {
            inputs: vec![BankEntry::new("cosmos1a", vec![Coin::new("utoken", "3")])],
            outputs: vec![
                BankEntry::new("cosmos1b", vec![Coin::new("utoken", "1")]),
                BankEntry::new("cosmos1c", vec![Coin::new("utoken", "2")]),
            ],
        };
        assert_eq!(MsgMultiSend::decode(&msg.encode().unwrap()).unwrap(), msg);
    }

    #[test]
    fn message_type_urls() {
        assert_eq!(
            Message::Send(sample_send()).type_url(),
            "/cosmos.bank.v1beta1.MsgSend"
        );
        let multi = Message::MultiSend(MsgMultiSend {
            inputs: vec![],
            outputs: vec![],
        });
        assert_eq!(multi.type_url(), "/cosmos.bank.v1beta1.MsgMultiSend");
    }

    #[test]
    fn message_json_is_tagged() {
        let json = serde_json::to_value(Message::Send(sample_send())).unwrap();
        assert_eq!(json["type"], "send");
        assert_eq!(json["amount"][0]["denom"], "utoken");

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, Message::Send(sample_send()));
    }
}
