//! Displacement resolver (spec §4.5): turns symbolic `target_name` references into concrete
//! immediate bits.

use crate::error::AssemblerError;
use crate::ir::{BlockList, EntryKind, EntryStatus, InstId};
use crate::symtab::{SymbolKind, SymbolTable};

/// `sizeof(Elf64_Ehdr) + sizeof(Elf64_Phdr) = 64 + 56`. Added to label values when materializing
/// an absolute address via `lui`+`ori` (and, correspondingly, in the ELF writer's `e_entry`).
///
/// This is only correct when exactly one program header precedes the image; with more than one
/// memory block the bias underestimates the true load offset by `56 * (N - 1)` bytes. This is a
/// known limitation of the system this was distilled from (see spec §9) and is preserved here
/// rather than silently corrected, since existing programs are written against this formula.
pub const ELF_HEADER_BIAS: u64 = 64 + 56;

/// Walks every instruction entry whose `status` is `Incomplete` and resolves its symbolic operand
/// against `symtab`, per the dispatch table in spec §4.5. Entries that are already `Complete` are
/// left untouched.
pub fn calculate_offsets(blocks: &mut BlockList, symtab: &SymbolTable) -> Result<(), AssemblerError> {
    let _span = tracing::debug_span!("calculate_offsets").entered();
    for block in blocks.blocks_mut() {
        for entry in &mut block.entries {
            if entry.kind != EntryKind::Instruction || entry.status != EntryStatus::Incomplete {
                continue;
            }
            let address = entry.address;
            let inst = entry.instruction_mut().expect("instruction entry without an Instruction payload");
            let target_name = inst
                .target_name
                .clone()
                .expect("incomplete instruction entry without a target_name");

            let target = symtab
                .lookup(&target_name)
                .ok_or_else(|| AssemblerError::UnknownSymbol(target_name.clone()))?;
            if symtab.kind_of(&target_name) != Some(SymbolKind::MemoryAddress) {
                return Err(AssemblerError::SymbolIsNotMemory(target_name));
            }

            inst.target_address = Some(target);
            #[allow(clippy::cast_possible_wrap)]
            match inst.inst_id {
                InstId::Jal | InstId::J => {
                    inst.imm = target.wrapping_sub(address) as i32;
                }
                InstId::Beq | InstId::Bne | InstId::Blt | InstId::Bge | InstId::Bltu | InstId::Bgeu => {
                    inst.imm = (target.wrapping_sub(address) & 0x1fff) as i32;
                }
                InstId::Lui => {
                    inst.imm = (((target + ELF_HEADER_BIAS) >> 12) & 0xfffff) as i32;
                }
                InstId::Ori => {
                    inst.imm = ((target + ELF_HEADER_BIAS) & 0xfff) as i32;
                }
                _ => {
                    return Err(AssemblerError::UnexpectedIncompleteInstruction { address });
                }
            }
            entry.status = EntryStatus::Complete;
            tracing::trace!(%target_name, target = %format_args!("{target:#x}"), address = %format_args!("{address:#x}"), "resolved label");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Instruction, MemEntry};

    fn block_with(inst: Instruction, address: u64) -> BlockList {
        let mut entry = MemEntry::new_instruction(inst);
        entry.address = address;
        let mut blocks = BlockList::new();
        blocks.push(vec![entry]).unwrap();
        blocks
    }

    #[test]
    fn jal_displacement_is_target_minus_address() {
        let mut inst = Instruction::new(InstId::Jal, 0x6f);
        inst.target_name = Some("label".to_string());
        let mut blocks = block_with(inst, 0x1000);

        let mut symtab = SymbolTable::with_seed(0);
        symtab.declare("label", SymbolKind::MemoryAddress).unwrap();
        symtab.update("label", 0x1100).unwrap();

        calculate_offsets(&mut blocks, &symtab).unwrap();
        let resolved = blocks.blocks()[0].entries[0].instruction().unwrap();
        assert_eq!(resolved.imm, 0x100);
    }

    #[test]
    fn branch_displacement_is_truncated_to_13_bits() {
        let mut inst = Instruction::new(InstId::Beq, 0x63);
        inst.target_name = Some("label".to_string());
        let mut blocks = block_with(inst, 0x2000);

        let mut symtab = SymbolTable::with_seed(0);
        symtab.declare("label", SymbolKind::MemoryAddress).unwrap();
        symtab.update("label", 0x2008).unwrap();

        calculate_offsets(&mut blocks, &symtab).unwrap();
        let resolved = blocks.blocks()[0].entries[0].instruction().unwrap();
        assert_eq!(resolved.imm, 8);
    }

    #[test]
    fn lui_ori_pair_recovers_biased_address() {
        let mut lui = Instruction::new(InstId::Lui, 0x37);
        lui.target_name = Some("label".to_string());
        let mut ori = Instruction::new(InstId::Ori, 0x13);
        ori.target_name = Some("label".to_string());

        let mut lui_entry = MemEntry::new_instruction(lui);
        lui_entry.address = 0x0;
        let mut ori_entry = MemEntry::new_instruction(ori);
        ori_entry.address = 0x4;

        let mut blocks = BlockList::new();
        blocks.push(vec![lui_entry, ori_entry]).unwrap();

        let mut symtab = SymbolTable::with_seed(0);
        symtab.declare("label", SymbolKind::MemoryAddress).unwrap();
        symtab.update("label", 0x1000).unwrap();

        calculate_offsets(&mut blocks, &symtab).unwrap();
        let entries = &blocks.blocks()[0].entries;
        let lui_imm = entries[0].instruction().unwrap().imm;
        let ori_imm = entries[1].instruction().unwrap().imm;
        assert_eq!(((lui_imm as u32) << 12) + (ori_imm as u32), 0x1000 + ELF_HEADER_BIAS as u32);
    }

    #[test]
    fn unknown_label_is_fatal() {
        let mut inst = Instruction::new(InstId::Jal, 0x6f);
        inst.target_name = Some("ghost".to_string());
        let mut blocks = block_with(inst, 0);
        let symtab = SymbolTable::with_seed(0);
        assert!(matches!(
            calculate_offsets(&mut blocks, &symtab),
            Err(AssemblerError::UnknownSymbol(name)) if name == "ghost"
        ));
    }

    #[test]
    fn register_target_is_fatal() {
        let mut inst = Instruction::new(InstId::Jal, 0x6f);
        inst.target_name = Some("t0".to_string());
        let mut blocks = block_with(inst, 0);
        let mut symtab = SymbolTable::with_seed(0);
        symtab.declare("t0", SymbolKind::IntegerRegister).unwrap();
        assert!(matches!(
            calculate_offsets(&mut blocks, &symtab),
            Err(AssemblerError::SymbolIsNotMemory(name)) if name == "t0"
        ));
    }
}
