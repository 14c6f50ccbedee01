//! Disassembly formatter (spec §4.8): a human-readable mnemonic string for diagnostics, grounded
//! in `examples/original_source/src/output.c`'s `sprint_asm`.

use crate::ir::{Instruction, InstId};

/// Formats `inst` as conventional RISC-V assembly syntax for diagnostic output (spec §4.8).
///
/// `sw`'s source register is read from `rdst` (aliased as `rsrc0` in spec §3) rather than
/// `rsrc2`, matching the original encoding's register-field reuse for that one mnemonic.
#[must_use]
pub fn sprint_asm(inst: &Instruction) -> String {
    use InstId::*;
    match inst.inst_id {
        Lui => format!("lui x{}, {:#x}", inst.rdst, inst.imm),
        Auipc => format!("auipc x{}, {:#x}", inst.rdst, inst.imm),
        Jal => format!("jal x{}, {:#014x}", inst.rdst, inst.target_address.unwrap_or(0)),
        Jalr => format!("jalr x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.imm),
        Beq => format!("beq x{}, x{}, {:#x}", inst.rsrc1, inst.rsrc2, inst.imm),
        Bne => format!("bne x{}, x{}, {:#x}", inst.rsrc1, inst.rsrc2, inst.imm),
        Blt => format!("blt x{}, x{}, {:#x}", inst.rsrc1, inst.rsrc2, inst.imm),
        Bge => format!("bge x{}, x{}, {:#x}", inst.rsrc1, inst.rsrc2, inst.imm),
        Bltu => format!("bltu x{}, x{}, {:#x}", inst.rsrc1, inst.rsrc2, inst.imm),
        Bgeu => format!("bgeu x{}, x{}, {:#x}", inst.rsrc1, inst.rsrc2, inst.imm),
        Lb => format!("lb x{}, {}[x{}]", inst.rdst, inst.imm, inst.rsrc1),
        Lh => format!("lh x{}, {}[x{}]", inst.rdst, inst.imm, inst.rsrc1),
        Lw => format!("lw x{}, {}[x{}]", inst.rdst, inst.imm, inst.rsrc1),
        Lbu => format!("lbu x{}, {}[x{}]", inst.rdst, inst.imm, inst.rsrc1),
        Lhu => format!("lhu x{}, {}[x{}]", inst.rdst, inst.imm, inst.rsrc1),
        Sb => format!("sb x{}, {}[x{}]", inst.rsrc2, inst.imm, inst.rsrc1),
        Sh => format!("sh x{}, {}[x{}]", inst.rsrc2, inst.imm, inst.rsrc1),
        // sw reads its source out of rdst ("rsrc0" in spec §3's naming).
        Sw => format!("sw x{}, {}[x{}]", inst.rdst, inst.imm, inst.rsrc1),
        Addi if inst.rdst == 0 && inst.rsrc1 == 0 && inst.imm == 0 => "nop".to_string(),
        Addi => format!("addi x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.imm),
        Slti => format!("slti x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.imm),
        Sltiu => format!("sltiu x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.imm),
        Xori => format!("xori x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.imm),
        Ori => format!("ori x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.imm),
        Andi => format!("andi x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.imm),
        Slli => format!("slli x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Srli => format!("srli x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Srai => format!("srai x{}, x{}, {:#x}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Add => format!("add x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Sub => format!("sub x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Mul => format!("mul x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Div => format!("div x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Sll => format!("sll x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Slt => format!("slt x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Sltu => format!("sltu x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Xor => format!("xor x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Srl => format!("srl x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Sra => format!("sra x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Or => format!("or x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        And => format!("and x{}, x{}, x{}", inst.rdst, inst.rsrc1, inst.rsrc2),
        Ecall => "ecall".to_string(),
        Ebreak => "ebreak".to_string(),
        J => format!("j {:#014x}", inst.target_address.unwrap_or(0)),
        Jr => format!("jr {:#014x}", inst.target_address.unwrap_or(0)),
        Ret => "ret".to_string(),
    }
}
