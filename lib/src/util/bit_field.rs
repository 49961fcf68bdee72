/// Contiguous run of bits inside a `u32` word
///
/// Fields are laid out from the least significant bit upwards: a field built with
/// [`BitField::after`] starts right where the previous one ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitField {
    shift: u32,
    width: u32,
}

impl BitField {
    pub const fn new(shift: u32, width: u32) -> BitField {
        assert!(width > 0, "Bit field cannot be empty");
        assert!(shift + width <= u32::BITS, "Bit field does not fit in a word");
        BitField { shift, width }
    }

    /// Field starting just above this one
    pub const fn after(self, width: u32) -> BitField {
        BitField::new(self.shift + self.width, width)
    }

    /// Field covering every bit above this one
    pub const fn remaining(self) -> BitField {
        BitField::new(self.shift + self.width, u32::BITS - self.shift - self.width)
    }

    pub const fn shift(self) -> u32 {
        self.shift
    }

    pub const fn width(self) -> u32 {
        self.width
    }

    pub const fn max_value(self) -> u32 {
        u32::MAX >> (u32::BITS - self.width)
    }

    pub const fn mask(self) -> u32 {
        self.max_value() << self.shift
    }

    pub const fn is_valid(self, value: u32) -> bool {
        value <= self.max_value()
    }

    /// Place `value` in the field, with all other bits cleared
    pub const fn encode(self, value: u32) -> u32 {
        debug_assert!(value <= self.max_value(), "Value does not fit in bit field");
        (value & self.max_value()) << self.shift
    }

    pub const fn decode(self, word: u32) -> u32 {
        (word & self.mask()) >> self.shift
    }

    /// Replace the field inside `word` with `value`
    pub const fn update(self, value: u32, word: u32) -> u32 {
        (word & !self.mask()) | self.encode(value)
    }
}

/// Number of bits needed to represent every value in `0..=value`
pub const fn minimum_bits_to_store(value: u32) -> u32 {
    u32::BITS - value.leading_zeros()
}
