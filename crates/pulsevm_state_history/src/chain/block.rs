use super::{Id, PackedTransaction, TransactionReceiptHeader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionVariant {
    Id(Id),
    Packed(PackedTransaction),
}

impl TransactionVariant {
    pub fn id(&self) -> &Id {
        match self {
            TransactionVariant::Id(id) => id,
            TransactionVariant::Packed(trx) => trx.id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub header: TransactionReceiptHeader,
    pub trx: TransactionVariant,
}

impl TransactionReceipt {
    pub fn new(header: TransactionReceiptHeader, trx: TransactionVariant) -> Self {
        TransactionReceipt { header, trx }
    }
}

/// The parts of a finalized block the trace log needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignedBlock {
    pub block_num: u32,
    pub transactions: Vec<TransactionReceipt>,
}
