/*!
RV32 integer register indices.

Based on the calling convention in the
["RISC-V ABIs Specification"](https://github.com/riscv-non-isa/riscv-elf-psabi-doc),
RISC-V International.
*/

use std::fmt::{self, Display};

/// Number of integer registers in the RV32 base ISA.
pub const NUMBER_OF_REGISTERS: u8 = 32;

/// Hard-wired zero, ignores writes.
pub const X0: u8 = 0;
/// Return address.
pub const X1: u8 = 1;
/// Stack pointer.
pub const X2: u8 = 2;
/// Global pointer.
pub const X3: u8 = 3;
/// Thread pointer.
pub const X4: u8 = 4;
/// Temporary / alternate link register.
pub const X5: u8 = 5;
/// Temporary.
pub const X6: u8 = 6;
/// Temporary.
pub const X7: u8 = 7;
/// Saved register / frame pointer.
pub const X8: u8 = 8;
/// Saved register.
pub const X9: u8 = 9;
/// Function argument / return value.
pub const X10: u8 = 10;
/// Function argument / return value.
pub const X11: u8 = 11;
/// Function argument.
pub const X12: u8 = 12;
/// Function argument.
pub const X13: u8 = 13;
/// Function argument.
pub const X14: u8 = 14;
/// Function argument.
pub const X15: u8 = 15;
/// Function argument.
pub const X16: u8 = 16;
/// Function argument.
pub const X17: u8 = 17;
/// Saved register.
pub const X18: u8 = 18;
/// Saved register.
pub const X19: u8 = 19;
/// Saved register.
pub const X20: u8 = 20;
/// Saved register.
pub const X21: u8 = 21;
/// Saved register.
pub const X22: u8 = 22;
/// Saved register.
pub const X23: u8 = 23;
/// Saved register.
pub const X24: u8 = 24;
/// Saved register.
pub const X25: u8 = 25;
/// Saved register.
pub const X26: u8 = 26;
/// Saved register.
pub const X27: u8 = 27;
/// Temporary.
pub const X28: u8 = 28;
/// Temporary.
pub const X29: u8 = 29;
/// Temporary.
pub const X30: u8 = 30;
/// Temporary.
pub const X31: u8 = 31;

/// True if `r` is a valid 5-bit register index (0..32).
pub const fn is_valid(r: u8) -> bool {
    r < NUMBER_OF_REGISTERS
}

/// Wraps a register index for `Display` as `x<n>`, matching conventional RISC-V asm syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterName(pub u8);

impl Display for RegisterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[test]
fn register_display() {
    assert_eq!(RegisterName(5).to_string(), "x5");
    assert_eq!(RegisterName(X0).to_string(), "x0");
}

#[test]
fn valid_range() {
    assert!(is_valid(0));
    assert!(is_valid(31));
    assert!(!is_valid(32));
}
