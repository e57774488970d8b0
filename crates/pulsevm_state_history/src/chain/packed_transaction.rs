use pulsevm_crypto::{Bytes, Signature};
use pulsevm_serialization::WriteError;

use crate::prunable_data::PrunableData;

use super::{Id, Transaction};

/// A signed transaction as it was pushed: the unprunable transaction body and
/// its prunable signatures and context-free data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTransaction {
    transaction: Transaction,
    prunable_data: PrunableData,

    // not serialized
    trx_id: Id,
}

impl PackedTransaction {
    pub fn new(transaction: Transaction, prunable_data: PrunableData) -> Result<Self, WriteError> {
        let trx_id = transaction.id()?;
        Ok(Self {
            transaction,
            prunable_data,
            trx_id,
        })
    }

    /// Packs a freshly signed transaction with the current prunable encoding.
    pub fn from_signed(
        transaction: Transaction,
        signatures: Vec<Signature>,
        context_free_segments: Vec<Bytes>,
    ) -> Result<Self, WriteError> {
        Self::new(
            transaction,
            PrunableData::Full {
                signatures,
                context_free_segments,
            },
        )
    }

    #[inline]
    pub fn id(&self) -> &Id {
        &self.trx_id
    }

    #[inline]
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    #[inline]
    pub fn get_prunable_data(&self) -> &PrunableData {
        &self.prunable_data
    }
}
