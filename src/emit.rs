//! Emission pipeline (spec §4.7/§6): three back ends sharing one entry-walking traversal, grounded
//! in `examples/original_source/src/output.c`'s `write_elf`/`write_text`/`write_bin`.
//!
//! All three preserve that source's address-offset quirks rather than correcting them: ELF
//! program headers all carry `p_offset = 0` regardless of where their bytes actually land in the
//! file, and every `p_filesz`/`p_memsz` (like [`crate::resolve::ELF_HEADER_BIAS`]) assumes a
//! single program header. See spec §9.

use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use crate::error::AssemblerError;
use crate::ir::{BlockList, EntryKind, MemBlock, MemEntry, Payload};
use crate::pc::ProgramCounter;
use crate::resolve::ELF_HEADER_BIAS;

const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
const EV_CURRENT: u8 = 1;
const ELFOSABI_SYSV: u8 = 0;
const ET_EXEC: u16 = 2;
const EM_RISCV: u16 = 243;
const PT_LOAD: u32 = 1;
const PF_X: u32 = 1;
const PF_W: u32 = 2;
const PF_R: u32 = 4;
const EHDR_SIZE: u64 = 64;
const PHDR_SIZE: u64 = 56;

/// Appends a little-endian encoding of one entry's payload to `buf`, per the kind/payload pairing
/// established by [`encode_instructions`](crate::encode::encode_instructions). Definitions and
/// join nodes append nothing.
fn entry_bytes(entry: &MemEntry) -> Result<Vec<u8>, AssemblerError> {
    match entry.kind {
        EntryKind::Definition | EntryKind::JoinNode => Ok(Vec::new()),
        EntryKind::Instruction => match entry.payload {
            Payload::Encoding(word) => Ok(word.to_le_bytes().to_vec()),
            _ => Err(AssemblerError::InvalidEntryType { context: "instruction" }),
        },
        EntryKind::BData | EntryKind::HData | EntryKind::WData | EntryKind::LData => match entry.payload {
            Payload::Int(value) => Ok(value.to_le_bytes()[..entry.size as usize].to_vec()),
            _ => Err(AssemblerError::InvalidEntryType { context: "integer datum" }),
        },
        EntryKind::FData => match entry.payload {
            Payload::Float(value) => Ok(value.to_le_bytes().to_vec()),
            _ => Err(AssemblerError::InvalidEntryType { context: "float datum" }),
        },
        EntryKind::DData => match entry.payload {
            Payload::Double(value) => Ok(value.to_le_bytes().to_vec()),
            _ => Err(AssemblerError::InvalidEntryType { context: "double datum" }),
        },
        EntryKind::SData => match &entry.payload {
            Payload::Str(s) => {
                let mut bytes = s.clone().into_bytes();
                bytes.push(0);
                Ok(bytes)
            }
            _ => Err(AssemblerError::InvalidEntryType { context: "string datum" }),
        },
    }
}

/// Writes an ELF64 executable image (spec §4.7). `pc` becomes `e_entry`, biased by
/// [`ELF_HEADER_BIAS`] to account for the header bytes this function itself prepends; one
/// `PT_LOAD` program header is emitted per block, each covering the full header-plus-block span.
pub fn write_elf(blocks: &BlockList, pc: &ProgramCounter, path: &Path) -> Result<(), AssemblerError> {
    let _span = tracing::debug_span!("write_elf", path = %path.display()).entered();
    let mut file = File::create(path)?;
    let nblocks = blocks.blocks().len();

    let mut ehdr = Vec::with_capacity(EHDR_SIZE as usize);
    ehdr.extend_from_slice(&[0x7f, b'E', b'L', b'F']);
    ehdr.push(ELFCLASS64);
    ehdr.push(ELFDATA2LSB);
    ehdr.push(EV_CURRENT);
    ehdr.push(ELFOSABI_SYSV);
    ehdr.push(0); // EI_ABIVERSION
    ehdr.extend_from_slice(&[0u8; 7]); // EI_PAD
    ehdr.extend_from_slice(&ET_EXEC.to_le_bytes());
    ehdr.extend_from_slice(&EM_RISCV.to_le_bytes());
    ehdr.extend_from_slice(&(EV_CURRENT as u32).to_le_bytes());
    ehdr.extend_from_slice(&(pc.get() + ELF_HEADER_BIAS).to_le_bytes()); // e_entry
    ehdr.extend_from_slice(&EHDR_SIZE.to_le_bytes()); // e_phoff
    ehdr.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    ehdr.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    ehdr.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes()); // e_ehsize
    ehdr.extend_from_slice(&(PHDR_SIZE as u16).to_le_bytes()); // e_phentsize
    #[allow(clippy::cast_possible_truncation)]
    ehdr.extend_from_slice(&(nblocks as u16).to_le_bytes()); // e_phnum
    ehdr.extend_from_slice(&0u16.to_le_bytes()); // e_shentsize
    ehdr.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
    ehdr.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx
    debug_assert_eq!(ehdr.len() as u64, EHDR_SIZE);
    file.write_all(&ehdr)?;

    for block in blocks.blocks() {
        let span = (block.max_address - block.min_address) + ELF_HEADER_BIAS + 1;
        let mut phdr = Vec::with_capacity(PHDR_SIZE as usize);
        phdr.extend_from_slice(&PT_LOAD.to_le_bytes());
        phdr.extend_from_slice(&(PF_X | PF_R | PF_W).to_le_bytes());
        phdr.extend_from_slice(&0u64.to_le_bytes()); // p_offset
        phdr.extend_from_slice(&block.min_address.to_le_bytes()); // p_vaddr
        phdr.extend_from_slice(&block.min_address.to_le_bytes()); // p_paddr
        phdr.extend_from_slice(&span.to_le_bytes()); // p_filesz
        phdr.extend_from_slice(&span.to_le_bytes()); // p_memsz
        phdr.extend_from_slice(&4096u64.to_le_bytes()); // p_align
        debug_assert_eq!(phdr.len() as u64, PHDR_SIZE);
        file.write_all(&phdr)?;
    }

    for block in blocks.blocks() {
        for (i, entry) in block.entries.iter().enumerate() {
            file.write_all(&entry_bytes(entry)?)?;
            if let Some(next) = block.entries.get(i + 1) {
                let gap_start = entry.address + u64::from(entry.size);
                for _ in gap_start..next.address {
                    file.write_all(&[0u8])?;
                }
            }
        }
    }
    Ok(())
}

/// Builds a 16-byte-aligned little-endian image of one block, per spec §4.7's hex-text/flat-binary
/// shared buffering step. Returns `(adjusted_start_address, buffer)`.
fn rasterize_block(block: &MemBlock) -> Result<(u64, Vec<u8>), AssemblerError> {
    let adj_start = block.min_address & !0xf;
    let adj_end = (block.max_address + 16) & !0xf;
    let mut buf = vec![0u8; (adj_end - adj_start) as usize];

    for entry in &block.entries {
        let idx = (entry.address - adj_start) as usize;
        match entry.kind {
            EntryKind::Definition | EntryKind::JoinNode => {}
            EntryKind::Instruction => {
                if entry.address & 0x3 != 0 {
                    return Err(AssemblerError::Misaligned { kind: "instruction", address: entry.address, align: 4 });
                }
                let Payload::Encoding(word) = entry.payload else {
                    return Err(AssemblerError::InvalidEntryType { context: "instruction" });
                };
                buf[idx..idx + 4].copy_from_slice(&word.to_le_bytes());
            }
            EntryKind::BData => {
                let Payload::Int(value) = entry.payload else {
                    return Err(AssemblerError::InvalidEntryType { context: "byte datum" });
                };
                buf[idx] = value as u8;
            }
            EntryKind::HData => {
                if entry.address & 0x1 != 0 {
                    return Err(AssemblerError::Misaligned { kind: "half-word datum", address: entry.address, align: 2 });
                }
                let Payload::Int(value) = entry.payload else {
                    return Err(AssemblerError::InvalidEntryType { context: "half-word datum" });
                };
                buf[idx..idx + 2].copy_from_slice(&(value as u16).to_le_bytes());
            }
            EntryKind::WData => {
                if entry.address & 0x3 != 0 {
                    return Err(AssemblerError::Misaligned { kind: "word datum", address: entry.address, align: 4 });
                }
                let Payload::Int(value) = entry.payload else {
                    return Err(AssemblerError::InvalidEntryType { context: "word datum" });
                };
                buf[idx..idx + 4].copy_from_slice(&(value as u32).to_le_bytes());
            }
            EntryKind::LData => return Err(AssemblerError::UnsupportedDatum("long")),
            EntryKind::FData => return Err(AssemblerError::UnsupportedDatum("float")),
            EntryKind::DData => return Err(AssemblerError::UnsupportedDatum("double")),
            EntryKind::SData => return Err(AssemblerError::UnsupportedDatum("string")),
        }
    }
    Ok((adj_start, buf))
}

/// Writes a hex-text memory image (spec §4.7): one 16-byte-aligned row of space-separated byte
/// pairs per line, prefixed by the row's address, with a blank line separating blocks.
pub fn write_text(blocks: &BlockList, path: &Path) -> Result<(), AssemblerError> {
    let _span = tracing::debug_span!("write_text", path = %path.display()).entered();
    let mut file = File::create(path)?;
    for block in blocks.blocks() {
        let (adj_start, buf) = rasterize_block(block)?;
        for (i, byte) in buf.iter().enumerate() {
            if i % 16 == 0 {
                write!(file, "{:012x}  ", adj_start + i as u64)?;
            } else {
                write!(file, " ")?;
            }
            write!(file, "{byte:02x}")?;
            if i % 16 == 15 {
                writeln!(file)?;
            }
        }
        writeln!(file)?;
    }
    Ok(())
}

/// Writes a flat binary memory image (spec §4.7): one file per block named `{base}-{n}.bin`,
/// each an 8-byte little-endian start address followed by the raw 16-byte-aligned image.
pub fn write_bin(blocks: &BlockList, file_base: &Path) -> Result<(), AssemblerError> {
    let _span = tracing::debug_span!("write_bin", base = %file_base.display()).entered();
    for (n, block) in blocks.blocks().iter().enumerate() {
        let (adj_start, buf) = rasterize_block(block)?;
        let path = file_base.with_file_name(format!(
            "{}-{n}.bin",
            file_base.file_name().and_then(|s| s.to_str()).unwrap_or("out")
        ));
        let mut file = File::create(path)?;
        file.write_all(&adj_start.to_le_bytes())?;
        file.write_all(&buf)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EntryStatus, Instruction, InstId};
    use std::env::temp_dir;

    fn instruction_entry(address: u64, word: u32) -> MemEntry {
        MemEntry {
            status: EntryStatus::Complete,
            kind: EntryKind::Instruction,
            name: None,
            address,
            size: 4,
            payload: Payload::Encoding(word),
        }
    }

    #[test]
    fn elf_entry_is_biased_by_header_size() {
        let mut blocks = BlockList::new();
        blocks.push(vec![instruction_entry(0x1000, 0x0000_0013)]).unwrap();
        let mut pc = ProgramCounter::new();
        pc.set(0x1000);

        let path = temp_dir().join("rv32asm-backend-test.elf");
        write_elf(&blocks, &pc, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let e_entry = u64::from_le_bytes(bytes[24..32].try_into().unwrap());
        assert_eq!(e_entry, 0x1000 + ELF_HEADER_BIAS);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn elf_header_has_expected_magic_and_class() {
        let blocks = BlockList::new();
        let pc = ProgramCounter::new();
        let path = temp_dir().join("rv32asm-backend-test-empty.elf");
        write_elf(&blocks, &pc, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], &[0x7f, b'E', b'L', b'F']);
        assert_eq!(bytes[4], ELFCLASS64);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unencoded_instruction_is_invalid_entry_type() {
        let mut entry = instruction_entry(0, 0);
        entry.payload = Payload::Instruction(Instruction::new(InstId::Addi, 0x13));
        let mut block = MemBlock::default();
        block.entries.push(entry);
        let err = rasterize_block(&block).unwrap_err();
        assert!(matches!(err, AssemblerError::InvalidEntryType { .. }));
    }

    #[test]
    fn misaligned_word_datum_is_rejected() {
        let entry = MemEntry {
            status: EntryStatus::Complete,
            kind: EntryKind::WData,
            name: None,
            address: 0x1002,
            size: 4,
            payload: Payload::Int(0),
        };
        let mut block = MemBlock { min_address: 0x1002, max_address: 0x1005, ..Default::default() };
        block.entries.push(entry);
        let err = rasterize_block(&block).unwrap_err();
        assert!(matches!(err, AssemblerError::Misaligned { align: 4, .. }));
    }

    #[test]
    fn string_datum_is_unsupported_in_flat_images() {
        let entry = MemEntry {
            status: EntryStatus::Complete,
            kind: EntryKind::SData,
            name: None,
            address: 0x1000,
            size: 6,
            payload: Payload::Str("hello".to_string()),
        };
        let mut block = MemBlock { min_address: 0x1000, max_address: 0x1005, ..Default::default() };
        block.entries.push(entry);
        let err = rasterize_block(&block).unwrap_err();
        assert!(matches!(err, AssemblerError::UnsupportedDatum("string")));
    }

    #[test]
    fn rasterize_aligns_to_sixteen_bytes() {
        let entry = instruction_entry(0x1004, 0x1234_5678);
        let block = MemBlock { entries: vec![entry], min_address: 0x1004, max_address: 0x1007 };
        let (adj_start, buf) = rasterize_block(&block).unwrap();
        assert_eq!(adj_start, 0x1000);
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[4..8], &0x1234_5678u32.to_le_bytes());
    }
}
