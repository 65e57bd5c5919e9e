use serde::{Deserialize, Serialize};

/// Bit widths of the host target's C integer types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSizes {
    pub char_bits: u32,
    pub short_bits: u32,
    pub int_bits: u32,
    pub long_bits: u32,
    pub long_long_bits: u32,
    pub pointer_bits: u32,
}

impl TargetSizes {
    /// LP64, the layout of every 64-bit Unix target.
    pub const LP64: TargetSizes = TargetSizes {
        char_bits: 8,
        short_bits: 16,
        int_bits: 32,
        long_bits: 64,
        long_long_bits: 64,
        pointer_bits: 64,
    };

    /// ILP32
    pub const ILP32: TargetSizes = TargetSizes {
        char_bits: 8,
        short_bits: 16,
        int_bits: 32,
        long_bits: 32,
        long_long_bits: 64,
        pointer_bits: 32,
    };
}

impl Default for TargetSizes {
    fn default() -> Self {
        Self::LP64
    }
}
