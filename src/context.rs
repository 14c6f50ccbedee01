//! Top-level pipeline orchestration (spec §5/§9).
//!
//! The system this was distilled from keeps the block list, symbol table, and program counter as
//! process-wide globals, mutated by the front end and then read (and, for the block list,
//! further mutated in place) by each back-end pass in turn. Spec §9 calls this out explicitly as
//! "acceptable as a single `AssemblerContext` value threaded through the back end" rather than
//! left as singletons. `AssemblerContext` is that value: it owns the three pieces and drives them
//! through `check_mem_bounds -> calculate_offsets -> encode_instructions -> emit*` in the fixed
//! order spec §5 requires, front-to-back with no reruns.

use std::path::Path;

use crate::emit::{write_bin, write_elf, write_text};
use crate::encode::encode_instructions;
use crate::error::{or_abort, AssemblerError, ErrorSink};
use crate::ir::BlockList;
use crate::pc::ProgramCounter;
use crate::resolve::calculate_offsets;
use crate::symtab::SymbolTable;

/// Everything the back end needs, populated by the front end before any pass runs.
#[derive(Default)]
pub struct AssemblerContext {
    /// Declared labels and registers.
    pub symtab: SymbolTable,
    /// Every memory block the front end produced.
    pub blocks: BlockList,
    /// The program's entry virtual address.
    pub pc: ProgramCounter,
}

impl AssemblerContext {
    /// An empty context with a non-deterministic internal-name seed; use [`SymbolTable::with_seed`]
    /// via direct field assignment in tests that need determinism.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the three back-end passes that must complete before any emitter can run, in the fixed
    /// order spec §5 mandates: block-overlap validation, then displacement resolution, then
    /// encoding. Stops at the first failure; passes that already ran have left their in-place
    /// mutations (`imm`, `status`, the encoding payload) applied, matching spec §5's description
    /// of these fields as not rolled back on a later failure.
    pub fn resolve_and_encode(&mut self) -> Result<(), AssemblerError> {
        self.blocks.check_mem_bounds()?;
        calculate_offsets(&mut self.blocks, &self.symtab)?;
        encode_instructions(&mut self.blocks);
        Ok(())
    }

    /// Emits the ELF64 executable (spec §4.7/§6).
    pub fn write_elf(&self, path: &Path) -> Result<(), AssemblerError> {
        write_elf(&self.blocks, &self.pc, path)
    }

    /// Emits the combined hex-text dump (spec §4.7/§6).
    pub fn write_text(&self, path: &Path) -> Result<(), AssemblerError> {
        write_text(&self.blocks, path)
    }

    /// Emits one flat binary per block (spec §4.7/§6).
    pub fn write_bin(&self, file_base: &Path) -> Result<(), AssemblerError> {
        write_bin(&self.blocks, file_base)
    }

    /// Runs the full pipeline — resolve, encode, then all three emitters — handing any failure to
    /// `sink` (spec §6's `report_error` contract: the call never returns). A front end that wants
    /// only a subset of the output formats should call [`Self::resolve_and_encode`] and the
    /// individual writers directly instead.
    pub fn finish(mut self, sink: &dyn ErrorSink, elf_path: &Path, text_path: &Path, bin_base: &Path) {
        or_abort(sink, self.resolve_and_encode());
        or_abort(sink, self.write_elf(elf_path));
        or_abort(sink, self.write_text(text_path));
        or_abort(sink, self.write_bin(bin_base));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InstId, Instruction, MemEntry};
    use crate::symtab::SymbolKind;
    use std::env::temp_dir;

    #[test]
    fn full_pipeline_resolves_encodes_and_emits() {
        let mut ctx = AssemblerContext::new();
        ctx.symtab.declare("start", SymbolKind::MemoryAddress).unwrap();
        ctx.symtab.update("start", 0x0).unwrap();

        let mut jal = Instruction::new(InstId::Jal, 0x6f);
        jal.target_name = Some("start".to_string());
        let mut entry = MemEntry::new_instruction(jal);
        entry.address = 0x0;
        ctx.blocks.push(vec![entry]).unwrap();
        ctx.pc.set(0x0);

        ctx.resolve_and_encode().unwrap();

        let elf_path = temp_dir().join("rv32asm-backend-context-test.elf");
        ctx.write_elf(&elf_path).unwrap();
        assert!(elf_path.exists());
        std::fs::remove_file(&elf_path).unwrap();
    }

    #[test]
    fn overlapping_blocks_abort_before_any_emitter_runs() {
        let mut ctx = AssemblerContext::new();
        let mut a = MemEntry::new_instruction(Instruction::new(InstId::Addi, 0x13));
        a.address = 0x1000;
        a.status = crate::ir::EntryStatus::Complete;
        let mut a_tail = MemEntry::new_instruction(Instruction::new(InstId::Addi, 0x13));
        a_tail.address = 0x1004;
        a_tail.status = crate::ir::EntryStatus::Complete;
        ctx.blocks.push(vec![a, a_tail]).unwrap();

        let mut b = MemEntry::new_instruction(Instruction::new(InstId::Addi, 0x13));
        b.address = 0x1002;
        b.status = crate::ir::EntryStatus::Complete;
        let mut b_tail = MemEntry::new_instruction(Instruction::new(InstId::Addi, 0x13));
        b_tail.address = 0x1006;
        b_tail.status = crate::ir::EntryStatus::Complete;
        ctx.blocks.push(vec![b, b_tail]).unwrap();

        assert!(matches!(ctx.resolve_and_encode(), Err(AssemblerError::OverlappingBlocks { .. })));
    }
}
