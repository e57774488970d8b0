use pulsevm_crypto::{Bytes, Digest};
use pulsevm_name::Name;
use pulsevm_serialization::{NumBytes, Read, ReadError, VarUint32, Write, WriteError};
use serde::Serialize;

use super::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AccountDelta {
    pub account: Name,
    pub delta: i64,
}

impl AccountDelta {
    pub const fn new(account: Name, delta: i64) -> Self {
        AccountDelta { account, delta }
    }
}

impl NumBytes for AccountDelta {
    fn num_bytes(&self) -> usize {
        self.account.num_bytes() + self.delta.num_bytes()
    }
}

impl Read for AccountDelta {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let account = Name::read(bytes, pos)?;
        let delta = i64::read(bytes, pos)?;
        Ok(AccountDelta { account, delta })
    }
}

impl Write for AccountDelta {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.account.write(bytes, pos)?;
        self.delta.write(bytes, pos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionReceipt {
    pub receiver: Name,
    pub act_digest: Digest,
    pub global_sequence: u64,
    pub recv_sequence: u64,
    pub auth_sequence: Vec<(Name, u64)>,
    pub code_sequence: VarUint32,
    pub abi_sequence: VarUint32,
}

/// Result of executing one action inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionTrace {
    pub action_ordinal: u32,
    pub creator_action_ordinal: u32,
    pub receipt: Option<ActionReceipt>,
    pub receiver: Name,
    pub act: Action,
    pub context_free: bool,
    pub elapsed: i64,
    pub console: String,
    pub account_ram_deltas: Vec<AccountDelta>,
    pub except: Option<String>,
    pub error_code: Option<u64>,
    pub return_value: Bytes,
}

impl ActionTrace {
    pub fn new(action_ordinal: u32, creator_action_ordinal: u32, receiver: Name, act: Action) -> Self {
        ActionTrace {
            action_ordinal,
            creator_action_ordinal,
            receiver,
            act,
            ..Default::default()
        }
    }
}
