use thiserror::Error;

pub const NAME_CHARS: [u8; 32] = *b".12345abcdefghijklmnopqrstuvwxyz";
pub const NAME_MAX_LEN: usize = 13;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ParseNameError {
    /// The name contains a disallowed character.
    #[error("bad character in name: '{}'", *.0 as char)]
    BadChar(u8),
    /// The name is over the maximum allowed length.
    #[error("name is too long")]
    TooLong,
}

/// Encodes a name string into its 64-bit form. Usable in const context, so
/// well-known names can be declared as constants.
pub const fn name_from_str(s: &str) -> Result<u64, ParseNameError> {
    let bytes = s.as_bytes();
    if bytes.len() > NAME_MAX_LEN {
        return Err(ParseNameError::TooLong);
    }

    let mut value = 0u64;
    let mut i = 0;
    while i < bytes.len() && i < 12 {
        let v = match char_to_value(bytes[i]) {
            Some(v) => v,
            None => return Err(ParseNameError::BadChar(bytes[i])),
        };
        value |= (v as u64) << (59 - 5 * i);
        i += 1;
    }

    if bytes.len() == NAME_MAX_LEN {
        let c = bytes[12];
        // the 13th character only has four bits, 'a' to 'j'
        match char_to_value(c) {
            Some(v) if v <= 0x0F => value |= v as u64,
            _ => return Err(ParseNameError::BadChar(c)),
        }
    }

    Ok(value)
}

#[inline]
const fn char_to_value(c: u8) -> Option<u8> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some(c - b'1' + 1),
        b'a'..=b'z' => Some(c - b'a' + 6),
        _ => None,
    }
}

#[must_use]
pub fn name_to_bytes(value: u64) -> [u8; NAME_MAX_LEN] {
    let mut chars = [b'.'; NAME_MAX_LEN];
    let mut v = value;
    for (i, c) in chars.iter_mut().enumerate() {
        let index = if i == 12 { v >> 60 } else { v >> 59 };
        *c = NAME_CHARS[(index & 0x1F) as usize];
        v <<= 5;
    }
    chars
}
