//! The signing pipeline.
//!
//! One call runs `KeyDerived -> DocumentBuilt -> Hashed -> Signed ->
//! Assembled` in order. Any failure aborts the call with the stage and the
//! public context (chain, address, account number, sequence) attached; no
//! partial result is returned and nothing is retried. The private key lives
//! only for the duration of the call.

use chain_cosmos::address::{decode_human_address_with_prefix, pubkey_to_address};
use chain_cosmos::chains::ChainConfig;
use chain_cosmos::messages::{Coin, Message};
use chain_cosmos::pubkey::PublicKey;
use chain_cosmos::registry::Registry;
use chain_cosmos::tx::{AuthInfo, Fee, SignDoc, SignMode, SignerInfo, TxRaw};
use crypto_utils::hash::sha256;
use tracing::{debug, info, warn};

use crate::collaborators::{AccountProvider, AccountState, BroadcastResponse, Broadcaster};
use crate::error::{SignerError, SigningContext, SigningStage};
use crate::hd_derivation::{derive_path, DerivationPath};
use crate::mnemonic::mnemonic_to_seed;
use crate::secp256k1::{public_key_compressed, sign_digest, SecretKey};
use crate::types::{CurveType, DerivedAccount, KeySource, SignedTx};

/// Everything the caller decides about a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    pub messages: Vec<Message>,
    pub fee: Fee,
    pub memo: String,
    pub timeout_height: Option<u64>,
    pub sign_mode: SignMode,
}

impl SignRequest {
    pub fn new(messages: Vec<Message>, fee: Fee) -> Self {
        Self {
            messages,
            fee,
            memo: String::new(),
            timeout_height: None,
            sign_mode: SignMode::default(),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_timeout_height(mut self, height: u64) -> Self {
        self.timeout_height = Some(height);
        self
    }
}

/// Account state the signature commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignerData {
    pub account_number: u64,
    pub sequence: u64,
}

impl From<&AccountState> for SignerData {
    fn from(state: &AccountState) -> Self {
        Self {
            account_number: state.account_number,
            sequence: state.sequence,
        }
    }
}

/// A signed transaction together with the chain's answer.
#[derive(Debug, Clone)]
pub struct BroadcastReceipt {
    pub tx: SignedTx,
    pub response: BroadcastResponse,
}

/// Key material for one call.
struct DerivedKey {
    secret: SecretKey,
    public_key: [u8; 33],
    address: String,
    path: Option<String>,
}

/// Signs transactions for one chain.
///
/// Holds no secrets between calls, so a single `Signer` can serve any number
/// of accounts and concurrent calls.
#[derive(Debug)]
pub struct Signer<'a> {
    registry: &'a Registry,
    chain: &'a ChainConfig,
    path: DerivationPath,
}

impl<'a> Signer<'a> {
    pub fn new(registry: &'a Registry, chain: &'a ChainConfig) -> Result<Self, SignerError> {
        chain.validate()?;
        let path = chain.derivation_path().parse()?;
        Ok(Self {
            registry,
            chain,
            path,
        })
    }

    pub fn chain(&self) -> &ChainConfig {
        self.chain
    }

    pub fn derivation_path(&self) -> &DerivationPath {
        &self.path
    }

    /// Address and public key for `key`. The private key is not returned.
    pub fn derive_account(&self, key: &KeySource) -> Result<DerivedAccount, SignerError> {
        let derived = self.derive_key(key)?;
        Ok(DerivedAccount {
            address: derived.address.clone(),
            public_key: derived.public_key,
            derivation_path: derived.path.clone(),
        })
    }

    /// Runs the pipeline offline with caller-supplied account state.
    pub fn sign(
        &self,
        key: KeySource,
        request: &SignRequest,
        signer_data: &SignerData,
    ) -> Result<SignedTx, SignerError> {
        let mut context = self.context(Some(signer_data));
        let derived = self
            .derive_key(&key)
            .map_err(|e| e.in_stage(SigningStage::KeyDerived, &context))?;
        drop(key);
        context.address = Some(derived.address.clone());
        self.sign_derived(&derived, request, signer_data, &context)
    }

    /// Fetches account state, signs and broadcasts. A non-zero delivery
    /// code comes back as `BroadcastFailure`; a stale sequence is reported
    /// as the `SequenceMismatch` class and is not retried here.
    pub fn sign_and_broadcast<A, B>(
        &self,
        key: KeySource,
        request: &SignRequest,
        accounts: &A,
        broadcaster: &B,
    ) -> Result<BroadcastReceipt, SignerError>
    where
        A: AccountProvider + ?Sized,
        B: Broadcaster + ?Sized,
    {
        let context = self.context(None);
        let derived = self
            .derive_key(&key)
            .map_err(|e| e.in_stage(SigningStage::KeyDerived, &context))?;
        drop(key);
        self.broadcast_derived(&derived, request, accounts, broadcaster)
    }

    /// Sends `amount` from the key's own address to `recipient`.
    #[allow(clippy::too_many_arguments)]
    pub fn send_tokens<A, B>(
        &self,
        key: KeySource,
        recipient: &str,
        amount: Vec<Coin>,
        fee: Fee,
        memo: &str,
        accounts: &A,
        broadcaster: &B,
    ) -> Result<BroadcastReceipt, SignerError>
    where
        A: AccountProvider + ?Sized,
        B: Broadcaster + ?Sized,
    {
        let context = self.context(None);
        decode_human_address_with_prefix(recipient, &self.chain.address_prefix)
            .map_err(|e| SignerError::from(e).in_stage(SigningStage::DocumentBuilt, &context))?;
        let derived = self
            .derive_key(&key)
            .map_err(|e| e.in_stage(SigningStage::KeyDerived, &context))?;
        drop(key);

        let request = SignRequest::new(
            vec![Message::send(derived.address.clone(), recipient, amount)],
            fee,
        )
        .with_memo(memo);
        self.broadcast_derived(&derived, &request, accounts, broadcaster)
    }

    fn context(&self, signer_data: Option<&SignerData>) -> SigningContext {
        SigningContext {
            chain_id: self.chain.chain_id.clone(),
            address: None,
            account_number: signer_data.map(|d| d.account_number),
            sequence: signer_data.map(|d| d.sequence),
        }
    }

    fn derive_key(&self, key: &KeySource) -> Result<DerivedKey, SignerError> {
        let (secret, path) = match key {
            KeySource::Mnemonic { phrase, passphrase } => {
                let seed = mnemonic_to_seed(phrase, passphrase)?;
                let xprv = derive_path(CurveType::Secp256k1, &seed, &self.path)?;
                (xprv.into_private_key(), Some(self.path.to_string()))
            }
            KeySource::PrivateKey(secret) => (SecretKey::from_slice(secret.expose())?, None),
        };
        let public_key = public_key_compressed(&secret)?;
        let address = pubkey_to_address(&public_key, &self.chain.address_prefix)?;
        Ok(DerivedKey {
            secret,
            public_key,
            address,
            path,
        })
    }

    fn broadcast_derived<A, B>(
        &self,
        derived: &DerivedKey,
        request: &SignRequest,
        accounts: &A,
        broadcaster: &B,
    ) -> Result<BroadcastReceipt, SignerError>
    where
        A: AccountProvider + ?Sized,
        B: Broadcaster + ?Sized,
    {
        let mut context = self.context(None);
        context.address = Some(derived.address.clone());

        let state = accounts
            .get_account(&derived.address)
            .map_err(|e| e.in_stage(SigningStage::DocumentBuilt, &context))?;
        if let Some(on_chain) = &state.pub_key {
            if on_chain.as_slice() != derived.public_key.as_slice() {
                warn!(
                    chain_id = %context.chain_id,
                    address = %derived.address,
                    "on-chain public key differs from the signing key"
                );
            }
        }

        let signer_data = SignerData::from(&state);
        context.account_number = Some(signer_data.account_number);
        context.sequence = Some(signer_data.sequence);

        let tx = self.sign_derived(derived, request, &signer_data, &context)?;
        let response = broadcaster
            .broadcast(&tx.to_base64())
            .map_err(|e| e.in_stage(SigningStage::Broadcast, &context))?;

        match response.into_result() {
            Ok(response) => {
                info!(
                    chain_id = %context.chain_id,
                    tx_hash = %response.hash,
                    height = response.height,
                    "transaction accepted"
                );
                Ok(BroadcastReceipt { tx, response })
            }
            Err(e) => {
                warn!(
                    chain_id = %context.chain_id,
                    address = %derived.address,
                    sequence = signer_data.sequence,
                    error = %e,
                    "broadcast rejected"
                );
                Err(e.in_stage(SigningStage::Broadcast, &context))
            }
        }
    }

    fn sign_derived(
        &self,
        key: &DerivedKey,
        request: &SignRequest,
        signer_data: &SignerData,
        context: &SigningContext,
    ) -> Result<SignedTx, SignerError> {
        debug!(
            chain_id = %context.chain_id,
            address = %key.address,
            sequence = signer_data.sequence,
            "key derived"
        );

        let (body_bytes, auth_info_bytes, sign_doc_bytes) = self
            .build_documents(key, request, signer_data)
            .map_err(|e| e.in_stage(SigningStage::DocumentBuilt, context))?;
        debug!(
            body_len = body_bytes.len(),
            auth_info_len = auth_info_bytes.len(),
            account_number = signer_data.account_number,
            "sign document built"
        );

        let digest = sha256(&sign_doc_bytes);
        debug!(sign_doc_hash = %hex::encode(digest), "sign document hashed");

        let signature = sign_digest(&key.secret, &digest)
            .map_err(|e| e.in_stage(SigningStage::Signed, context))?;
        debug!("sign document signed");

        let tx = SignedTx::new(
            TxRaw {
                body_bytes,
                auth_info_bytes,
                signatures: vec![signature.to_bytes().to_vec()],
            },
            key.public_key,
        );
        info!(
            chain_id = %context.chain_id,
            address = %key.address,
            sequence = signer_data.sequence,
            tx_hash = %tx.hash(),
            "transaction assembled"
        );
        Ok(tx)
    }

    /// `(body bytes, auth info bytes, encoded SignDoc)`.
    fn build_documents(
        &self,
        key: &DerivedKey,
        request: &SignRequest,
        signer_data: &SignerData,
    ) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), SignerError> {
        if request.messages.is_empty() {
            return Err(SignerError::EncodingError(
                "transaction must carry at least one message".into(),
            ));
        }
        let body_bytes =
            self.registry
                .encode_body(&request.messages, &request.memo, request.timeout_height)?;

        let auth_info_bytes = AuthInfo {
            signer_infos: vec![SignerInfo {
                public_key: Some(PublicKey::Secp256k1(key.public_key)),
                sign_mode: request.sign_mode,
                sequence: signer_data.sequence,
            }],
            fee: request.fee.clone(),
        }
        .encode()?;

        let sign_doc_bytes = SignDoc {
            body_bytes: body_bytes.clone(),
            auth_info_bytes: auth_info_bytes.clone(),
            chain_id: self.chain.chain_id.clone(),
            account_number: signer_data.account_number,
        }
        .encode()?;

        Ok((body_bytes, auth_info_bytes, sign_doc_bytes))
    }
}
