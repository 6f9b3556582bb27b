/// Transaction types for utxochain
use crate::blockchain::Sha256Hash;
use crate::crypto::{KeyPair, OwnerKey};
use crate::error::ChainError;
use sha2::{Digest, Sha256};
use std::fmt;

/// Value carried by an output, in indivisible units.
///
/// Signed so that a negative output can be expressed and then rejected.
pub type Amount = i64;

/// Reference to one output of one earlier transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct OutPoint {
    pub txid: Sha256Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(txid: Sha256Hash, index: u32) -> Self {
        OutPoint { txid, index }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.txid), self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TxOutput {
    pub value: Amount,
    pub owner: OwnerKey,
}

impl TxOutput {
    pub fn new(value: Amount, owner: OwnerKey) -> Self {
        TxOutput { value, owner }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TxInput {
    pub prev: OutPoint,
    pub signature: Vec<u8>,
}

/// A transfer of value: consumes the outputs named by `inputs` and creates
/// `outputs`. A transaction with no inputs is a coinbase.
///
/// Equality is structural, so two transactions compare equal exactly when
/// their [`hash`](Transaction::hash) does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Distinguishes otherwise identical transactions, e.g. two coinbases
    /// paying the same reward to the same owner.
    #[serde(default)]
    pub nonce: u64,
}

impl Transaction {
    pub fn new(nonce: u64) -> Self {
        Transaction {
            inputs: Vec::new(),
            outputs: Vec::new(),
            nonce,
        }
    }

    /// Reward transaction with a single output and no inputs.
    pub fn coinbase(reward: Amount, owner: OwnerKey, nonce: u64) -> Self {
        let mut tx = Transaction::new(nonce);
        tx.add_output(reward, owner);
        tx
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Appends an unsigned input and returns its index.
    pub fn add_input(&mut self, prev: OutPoint) -> usize {
        self.inputs.push(TxInput {
            prev,
            signature: Vec::new(),
        });
        self.inputs.len() - 1
    }

    pub fn add_output(&mut self, value: Amount, owner: OwnerKey) -> usize {
        self.outputs.push(TxOutput::new(value, owner));
        self.outputs.len() - 1
    }

    /// The bytes the owner of input `index`'s referenced output must sign:
    /// that input's out-point, every output, and the nonce.
    pub fn signable_message(&self, index: usize) -> Option<Vec<u8>> {
        let input = self.inputs.get(index)?;
        let mut message = Vec::new();
        message.extend_from_slice("SPEND:".as_bytes());
        message.extend_from_slice(&input.prev.txid);
        message.extend_from_slice(&input.prev.index.to_le_bytes());
        message.extend_from_slice(&(self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            message.extend_from_slice(&output.value.to_le_bytes());
            message.extend_from_slice(&(output.owner.as_bytes().len() as u64).to_le_bytes());
            message.extend_from_slice(output.owner.as_bytes());
        }
        message.extend_from_slice(&self.nonce.to_le_bytes());
        Some(message)
    }

    pub fn sign_input(&mut self, index: usize, signature: Vec<u8>) -> Result<(), ChainError> {
        let input = self.inputs.get_mut(index).ok_or_else(|| {
            ChainError::CryptoError(format!("No input at index {} to sign", index))
        })?;
        input.signature = signature;
        Ok(())
    }

    /// Signs input `index` with `keypair`.
    pub fn sign_with(&mut self, index: usize, keypair: &KeyPair) -> Result<(), ChainError> {
        let message = self.signable_message(index).ok_or_else(|| {
            ChainError::CryptoError(format!("No input at index {} to sign", index))
        })?;
        let signature = keypair.sign(&message)?;
        self.sign_input(index, signature.to_vec())
    }

    /// Out-point under which output `index` of this transaction is tracked.
    pub fn outpoint(&self, index: u32) -> OutPoint {
        OutPoint::new(self.hash(), index)
    }

    pub fn output_total(&self) -> i128 {
        self.outputs.iter().map(|o| o.value as i128).sum()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }

    /// Content identity: SHA-256 over every field, signatures included.
    pub fn hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update("TX".as_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.update((self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            hasher.update(input.prev.txid);
            hasher.update(input.prev.index.to_le_bytes());
            hasher.update((input.signature.len() as u64).to_le_bytes());
            hasher.update(&input.signature);
        }
        hasher.update((self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            hasher.update(output.value.to_le_bytes());
            hasher.update((output.owner.as_bytes().len() as u64).to_le_bytes());
            hasher.update(output.owner.as_bytes());
        }
        hasher.finalize().into()
    }
}
