use core::fmt;

use pulsevm_crypto::Bytes;
use pulsevm_name::Name;
use pulsevm_serialization::{NumBytes, Read, ReadError, Write, WriteError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

impl PermissionLevel {
    pub const fn new(actor: Name, permission: Name) -> Self {
        PermissionLevel { actor, permission }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.permission)
    }
}

impl NumBytes for PermissionLevel {
    fn num_bytes(&self) -> usize {
        self.actor.num_bytes() + self.permission.num_bytes()
    }
}

impl Read for PermissionLevel {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let actor = Name::read(bytes, pos)?;
        let permission = Name::read(bytes, pos)?;
        Ok(PermissionLevel { actor, permission })
    }
}

impl Write for PermissionLevel {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.actor.write(bytes, pos)?;
        self.permission.write(bytes, pos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    pub data: Bytes,
}

impl Action {
    pub fn new(
        account: Name,
        name: Name,
        authorization: Vec<PermissionLevel>,
        data: impl Into<Bytes>,
    ) -> Self {
        Action {
            account,
            name,
            authorization,
            data: data.into(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.account, self.name)
    }
}

impl NumBytes for Action {
    fn num_bytes(&self) -> usize {
        self.account.num_bytes()
            + self.name.num_bytes()
            + self.authorization.num_bytes()
            + self.data.num_bytes()
    }
}

impl Read for Action {
    fn read(bytes: &[u8], pos: &mut usize) -> Result<Self, ReadError> {
        let account = Name::read(bytes, pos)?;
        let name = Name::read(bytes, pos)?;
        let authorization = Vec::<PermissionLevel>::read(bytes, pos)?;
        let data = Bytes::read(bytes, pos)?;
        Ok(Action {
            account,
            name,
            authorization,
            data,
        })
    }
}

impl Write for Action {
    fn write(&self, bytes: &mut [u8], pos: &mut usize) -> Result<(), WriteError> {
        self.account.write(bytes, pos)?;
        self.name.write(bytes, pos)?;
        self.authorization.write(bytes, pos)?;
        self.data.write(bytes, pos)
    }
}
