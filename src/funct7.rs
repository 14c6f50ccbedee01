//! RV32I/M funct7 field values (spec §6 table).

/// 7-bit function field, occupying bits `[31:25]` of R-type instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Funct7(pub u8);

impl Funct7 {
    ///
    pub const ZERO: Self = Self(0x00);
    ///
    pub const SUB_SRA: Self = Self(0x20);
    ///
    pub const MULDIV: Self = Self(0x01);

    pub(crate) const fn into_u32(self) -> u32 {
        self.0 as u32
    }
}

#[test]
fn into_u32() {
    assert_eq!(Funct7::SUB_SRA.into_u32(), 0x20);
    assert_eq!(Funct7::MULDIV.into_u32(), 0x01);
}
