//! # Transaction Model
//!
//! A transaction is a set of input and output commitments, one or more
//! kernels, and a blinding offset. It is balanced when
//!
//! ```text
//! Σ outputs + Σ shielded − Σ inputs + Σ fee·H₀  ==  Σ excess + offset·G
//! ```
//!
//! and every kernel carries a valid signature under its own excess. The
//! equation holds only if the values cancel per asset, because every asset
//! commits with an independent value generator.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::Identity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Rules;
use crate::core::{Amount, AssetId, Height};
use crate::crypto::{value_generator, HashProcessor, HashValue, Signature};
use crate::shielded::ShieldedTicket;

/// Why a transaction failed its internal consistency check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transaction has no kernels")]
    NoKernels,
    #[error("commitment does not decode")]
    InvalidCommitment,
    #[error("kernel {0} has a wrong id or signature")]
    InvalidKernel(usize),
    #[error("commitments do not balance")]
    Unbalanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub commitment: CompressedRistretto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub commitment: CompressedRistretto,
    pub asset_id: AssetId,
}

/// Output recoverable only by the voucher issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldedTxo {
    pub ticket: ShieldedTicket,
    pub commitment: CompressedRistretto,
    pub asset_id: AssetId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxKernel {
    pub fee: Amount,
    pub min_height: Height,
    pub max_height: Height,
    pub excess: CompressedRistretto,
    pub shielded_output: Option<ShieldedTxo>,
    pub signature: Signature,
    /// Cached [`TxKernel::compute_id`].
    pub id: HashValue,
}

impl TxKernel {
    pub fn new(fee: Amount, min_height: Height, max_height: Height) -> Self {
        Self {
            fee,
            min_height,
            max_height,
            excess: CompressedRistretto::identity(),
            shielded_output: None,
            signature: Signature::default(),
            id: [0u8; 32],
        }
    }

    /// Kernel id. Binds every field except the signature, plus the chain
    /// tag so the kernel cannot be replayed on another network.
    pub fn compute_id(&self, rules: &Rules) -> HashValue {
        let mut hp = HashProcessor::new()
            .label("nova.kernel")
            .blob(rules.chain_tag.as_bytes())
            .u64(self.fee)
            .u64(self.min_height)
            .u64(self.max_height)
            .raw(self.excess.as_bytes());
        match &self.shielded_output {
            Some(txo) => {
                hp = hp
                    .u32(1)
                    .raw(txo.ticket.serial_pub.as_bytes())
                    .raw(&txo.ticket.recovery_tag)
                    .raw(txo.commitment.as_bytes())
                    .u32(txo.asset_id);
            }
            None => hp = hp.u32(0),
        }
        hp.finalize()
    }

    /// Set the excess from `excess_sk`, refresh the id and sign it.
    pub fn sign(&mut self, excess_sk: &Scalar, rules: &Rules) {
        self.excess = RistrettoPoint::mul_base(excess_sk).compress();
        self.id = self.compute_id(rules);
        self.signature = Signature::sign(&self.id, excess_sk);
    }

    pub fn is_valid(&self, rules: &Rules) -> bool {
        if self.id != self.compute_id(rules) {
            return false;
        }
        match self.excess.decompress() {
            Some(excess) => self.signature.is_valid(&self.id, &excess),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub kernels: Vec<TxKernel>,
    pub offset: Scalar,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            kernels: Vec::new(),
            offset: Scalar::ZERO,
        }
    }
}

impl Transaction {
    pub fn fee(&self) -> Amount {
        self.kernels.iter().map(|k| k.fee).sum()
    }

    /// Full internal consistency check: kernel ids and signatures, then the
    /// balance equation.
    pub fn validate(&self, rules: &Rules) -> Result<(), ValidationError> {
        if self.kernels.is_empty() {
            return Err(ValidationError::NoKernels);
        }

        let mut lhs = RistrettoPoint::identity();
        let mut rhs = RistrettoPoint::mul_base(&self.offset);

        for out in &self.outputs {
            lhs += decompress(&out.commitment)?;
        }
        for inp in &self.inputs {
            lhs -= decompress(&inp.commitment)?;
        }
        for (i, kernel) in self.kernels.iter().enumerate() {
            if !kernel.is_valid(rules) {
                return Err(ValidationError::InvalidKernel(i));
            }
            if let Some(txo) = &kernel.shielded_output {
                lhs += decompress(&txo.commitment)?;
            }
            rhs += decompress(&kernel.excess)?;
        }
        lhs += Scalar::from(self.fee()) * value_generator(0);

        if lhs == rhs {
            Ok(())
        } else {
            Err(ValidationError::Unbalanced)
        }
    }

    pub fn is_valid(&self, rules: &Rules) -> bool {
        self.validate(rules).is_ok()
    }
}

fn decompress(c: &CompressedRistretto) -> Result<RistrettoPoint, ValidationError> {
    c.decompress().ok_or(ValidationError::InvalidCommitment)
}
