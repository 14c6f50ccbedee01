//! Instruction encoder (spec §4.6): a pure dispatch from an [`Instruction`] to its 32-bit word.
//!
//! Each of the six formats is a small free function built on [`merge_bitfields`], the same tool
//! the bit-placement helper in this crate's R/I/S/B/U/J encoders is built from. Encoders perform
//! no range checking; callers must supply operands already within the ISA's legal range (spec
//! §4.6).

use crate::bits::merge_bitfields;
use crate::ir::{BlockList, EntryKind, Instruction, InstId, Payload};

/// `[31:25] funct7 | [24:20] rs2 | [19:15] rs1 | [14:12] funct3 | [11:7] rd | [6:0] opcode`
const fn r_type(opcode: u8, rd: u8, funct3: u8, rs1: u8, rs2: u8, funct7: u8) -> u32 {
    merge_bitfields(&[
        (0..7, opcode as u32, 0..7),
        (7..12, rd as u32, 0..5),
        (12..15, funct3 as u32, 0..3),
        (15..20, rs1 as u32, 0..5),
        (20..25, rs2 as u32, 0..5),
        (25..32, funct7 as u32, 0..7),
    ])
}

/// `[31:20] imm[11:0] | [19:15] rs1 | [14:12] funct3 | [11:7] rd | [6:0] opcode`
const fn i_type(opcode: u8, rd: u8, funct3: u8, rs1: u8, imm: i32) -> u32 {
    merge_bitfields(&[
        (0..7, opcode as u32, 0..7),
        (7..12, rd as u32, 0..5),
        (12..15, funct3 as u32, 0..3),
        (15..20, rs1 as u32, 0..5),
        (20..32, imm as u32, 0..12),
    ])
}

/// `[31:25] imm[11:5] | [24:20] rs2 | [19:15] rs1 | [14:12] funct3 | [11:7] imm[4:0] | [6:0] opcode`
const fn s_type(opcode: u8, funct3: u8, rs1: u8, rs2: u8, imm: i32) -> u32 {
    merge_bitfields(&[
        (0..7, opcode as u32, 0..7),
        (7..12, imm as u32, 0..5),
        (12..15, funct3 as u32, 0..3),
        (15..20, rs1 as u32, 0..5),
        (20..25, rs2 as u32, 0..5),
        (25..32, imm as u32, 5..12),
    ])
}

/// `[31] imm[12] | [30:25] imm[10:5] | [24:20] rs2 | [19:15] rs1 | [14:12] funct3 | [11:8] imm[4:1]
/// | [7] imm[11] | [6:0] opcode`
const fn b_type(opcode: u8, funct3: u8, rs1: u8, rs2: u8, imm: i32) -> u32 {
    merge_bitfields(&[
        (0..7, opcode as u32, 0..7),
        (7..8, imm as u32, 11..12),
        (8..12, imm as u32, 1..5),
        (12..15, funct3 as u32, 0..3),
        (15..20, rs1 as u32, 0..5),
        (20..25, rs2 as u32, 0..5),
        (25..31, imm as u32, 5..11),
        (31..32, imm as u32, 12..13),
    ])
}

/// `[31:12] imm[19:0] | [11:7] rd | [6:0] opcode`
const fn u_type(opcode: u8, rd: u8, imm: i32) -> u32 {
    merge_bitfields(&[
        (0..7, opcode as u32, 0..7),
        (7..12, rd as u32, 0..5),
        (12..32, imm as u32, 0..20),
    ])
}

/// `[31] imm[20] | [30:21] imm[10:1] | [20] imm[11] | [19:12] imm[19:12] | [11:7] rd | [6:0] opcode`
const fn j_type(opcode: u8, rd: u8, imm: i32) -> u32 {
    merge_bitfields(&[
        (0..7, opcode as u32, 0..7),
        (7..12, rd as u32, 0..5),
        (12..20, imm as u32, 12..20),
        (20..21, imm as u32, 11..12),
        (21..31, imm as u32, 1..11),
        (31..32, imm as u32, 20..21),
    ])
}

/// Encodes a single instruction record into its 32-bit machine word, dispatching on `inst_id` to
/// one of the six format encoders (spec §4.6). Pseudo-ops lower to their canonical base-ISA
/// encoding: `j` as `jal x0, offset`, `jr` as `jalr x0, rs1, 0`, `ret` as `jalr x0, x1, 0`.
#[must_use]
pub fn encode_instruction(inst: &Instruction) -> u32 {
    use InstId::*;
    match inst.inst_id {
        Lui | Auipc => u_type(inst.opcode, inst.rdst, inst.imm),
        Jal | J => j_type(inst.opcode, inst.rdst, inst.imm),
        Jalr | Ecall | Ebreak | Jr | Ret => i_type(inst.opcode, inst.rdst, inst.funct3, inst.rsrc1, inst.imm),
        Beq | Bne | Blt | Bge | Bltu | Bgeu => b_type(inst.opcode, inst.funct3, inst.rsrc1, inst.rsrc2, inst.imm),
        Lb | Lh | Lw | Lbu | Lhu | Addi | Slti | Sltiu | Xori | Ori | Andi => {
            i_type(inst.opcode, inst.rdst, inst.funct3, inst.rsrc1, inst.imm)
        }
        Sb | Sh | Sw => s_type(inst.opcode, inst.funct3, inst.rsrc1, inst.rsrc2, inst.imm),
        // Shift-immediates reuse the R-type slot with rsrc2 carrying the shift amount.
        Slli | Srli | Srai | Add | Sub | Mul | Div | Sll | Slt | Sltu | Xor | Srl | Sra | Or | And => {
            r_type(inst.opcode, inst.rdst, inst.funct3, inst.rsrc1, inst.rsrc2, inst.funct7)
        }
    }
}

/// Walks every block and overwrites the 32-bit encoding payload of every instruction entry; other
/// entry kinds are left untouched (spec §4.6 `encode_instructions`).
pub fn encode_instructions(blocks: &mut BlockList) {
    let _span = tracing::debug_span!("encode_instructions").entered();
    for block in blocks.blocks_mut() {
        for entry in &mut block.entries {
            if entry.kind != EntryKind::Instruction {
                continue;
            }
            if let Payload::Instruction(inst) = &entry.payload {
                let word = encode_instruction(inst);
                tracing::trace!(address = %format_args!("{:#x}", entry.address), word = %format_args!("{word:#010x}"), "encoded instruction");
                entry.payload = Payload::Encoding(word);
            }
        }
    }
}
