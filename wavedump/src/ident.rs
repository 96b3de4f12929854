// Copyright 2025 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
//! # Compact Identifiers
//! Every VCD variable is referred to by a short string of printable ASCII characters.
//! We write the dense variable index in base 94, using `!` to `~` as digits and putting the
//! least significant digit first.

use std::num::NonZeroU32;

const ID_CHAR_MIN: u8 = b'!';
const ID_CHAR_MAX: u8 = b'~';
const NUM_ID_CHARS: usize = (ID_CHAR_MAX - ID_CHAR_MIN + 1) as usize;

/// Identity of a declared variable. Assigned densely in declaration order, starting at zero,
/// and never changed afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct VarId(NonZeroU32);

impl VarId {
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        let raw = u32::try_from(index).ok()?.checked_add(1)?;
        NonZeroU32::new(raw).map(VarId)
    }

    #[inline]
    pub fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// The identifier string used for this variable in the VCD text.
    pub fn code(&self) -> String {
        encode(self.index())
    }
}

impl std::fmt::Display for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code())
    }
}

/// Appends the compact identifier of `index` to `out`.
#[inline]
pub fn write_id(out: &mut String, mut index: usize) {
    loop {
        out.push((ID_CHAR_MIN + (index % NUM_ID_CHARS) as u8) as char);
        index /= NUM_ID_CHARS;
        if index == 0 {
            break;
        }
    }
}

pub fn encode(index: usize) -> String {
    let mut out = String::with_capacity(4);
    write_id(&mut out, index);
    out
}

/// Inverse of [`encode`]. Returns `None` for empty strings, characters outside of `!..=~`
/// or values that do not fit into a `usize`.
pub fn decode(id: &str) -> Option<usize> {
    if id.is_empty() {
        return None;
    }
    let mut result = 0usize;
    for &c in id.as_bytes().iter().rev() {
        if !(ID_CHAR_MIN..=ID_CHAR_MAX).contains(&c) {
            return None;
        }
        let digit = (c - ID_CHAR_MIN) as usize;
        result = result
            .checked_mul(NUM_ID_CHARS)
            .and_then(|x| x.checked_add(digit))?;
    }
    Some(result)
}
