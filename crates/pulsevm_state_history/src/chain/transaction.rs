use pulsevm_crypto::Bytes;
use pulsevm_serialization::{NumBytes, Read, ReadError, VarUint32, Write, WriteError};
use serde::Serialize;

use super::{Action, Id};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TransactionHeader {
    /// Seconds since epoch.
    pub expiration: u32,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: VarUint32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: VarUint32,
}

impl NumBytes for TransactionHeader {
    fn num_bytes(&self) -> usize {
        self.expiration.num_bytes()
            + self.ref_block_num.num_bytes()
            + self.ref_block_prefix.num_bytes()
            + self.max_net_usage_words.num_bytes()
            + self.max_cpu_usage_ms.num_bytes()
            + self.delay_sec.num_bytes()
    }
}

impl Read for TransactionHeader {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        Ok(TransactionHeader {
            expiration: u32::read(bytes, pos)?,
            ref_block_num: u16::read(bytes, pos)?,
            ref_block_prefix: u32::read(bytes, pos)?,
            max_net_usage_words: VarUint32::read(bytes, pos)?,
            max_cpu_usage_ms: u8::read(bytes, pos)?,
            delay_sec: VarUint32::read(bytes, pos)?,
        })
    }
}

impl Write for TransactionHeader {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.expiration.write(bytes, pos)?;
        self.ref_block_num.write(bytes, pos)?;
        self.ref_block_prefix.write(bytes, pos)?;
        self.max_net_usage_words.write(bytes, pos)?;
        self.max_cpu_usage_ms.write(bytes, pos)?;
        self.delay_sec.write(bytes, pos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
    pub transaction_extensions: Vec<(u16, Bytes)>,
}

impl Transaction {
    pub fn new(header: TransactionHeader, context_free_actions: Vec<Action>, actions: Vec<Action>) -> Self {
        Self {
            header,
            context_free_actions,
            actions,
            transaction_extensions: vec![],
        }
    }

    pub fn id(&self) -> Result<Id, WriteError> {
        Ok(Id::hash(self.pack()?))
    }
}

impl NumBytes for Transaction {
    fn num_bytes(&self) -> usize {
        self.header.num_bytes()
            + self.context_free_actions.num_bytes()
            + self.actions.num_bytes()
            + self.transaction_extensions.num_bytes()
    }
}

impl Read for Transaction {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        Ok(Transaction {
            header: TransactionHeader::read(bytes, pos)?,
            context_free_actions: Vec::read(bytes, pos)?,
            actions: Vec::read(bytes, pos)?,
            transaction_extensions: Vec::read(bytes, pos)?,
        })
    }
}

impl Write for Transaction {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.header.write(bytes, pos)?;
        self.context_free_actions.write(bytes, pos)?;
        self.actions.write(bytes, pos)?;
        self.transaction_extensions.write(bytes, pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Executed,
    SoftFail,
    HardFail,
    Delayed,
    Expired,
}

impl NumBytes for TransactionStatus {
    fn num_bytes(&self) -> usize {
        1
    }
}

impl Read for TransactionStatus {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        match u8::read(bytes, pos)? {
            0 => Ok(TransactionStatus::Executed),
            1 => Ok(TransactionStatus::SoftFail),
            2 => Ok(TransactionStatus::HardFail),
            3 => Ok(TransactionStatus::Delayed),
            4 => Ok(TransactionStatus::Expired),
            _ => Err(ReadError::ParseError),
        }
    }
}

impl Write for TransactionStatus {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        (*self as u8).write(bytes, pos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransactionReceiptHeader {
    pub status: TransactionStatus,
    pub cpu_usage_us: u32,
    pub net_usage_words: VarUint32,
}

impl TransactionReceiptHeader {
    pub fn new(status: TransactionStatus, cpu_usage_us: u32, net_usage_words: u32) -> Self {
        TransactionReceiptHeader {
            status,
            cpu_usage_us,
            net_usage_words: VarUint32(net_usage_words),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_is_stable() {
        let trx = Transaction::new(
            TransactionHeader {
                expiration: 1_700_000_000,
                ref_block_num: 7,
                ..Default::default()
            },
            vec![],
            vec![],
        );
        let packed = trx.pack().unwrap();
        assert_eq!(Transaction::unpack(&packed).unwrap(), trx);
        assert_eq!(trx.id().unwrap(), Id::hash(&packed));

        let mut other = trx.clone();
        other.header.ref_block_num = 8;
        assert_ne!(other.id().unwrap(), trx.id().unwrap());
    }

    #[test]
    fn test_transaction_status_rejects_unknown_value() {
        assert_eq!(TransactionStatus::unpack(&[5]), Err(ReadError::ParseError));
        assert_eq!(
            TransactionStatus::unpack(&[2]).unwrap(),
            TransactionStatus::HardFail
        );
    }
}
