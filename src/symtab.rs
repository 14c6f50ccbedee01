//! Symbol table (spec §4.1), grounded in `examples/original_source/src/symtab.c`: a flat list of
//! `(name, kind, value)` triples, scanned linearly on every operation.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::error::AssemblerError;

/// What a symbol's `value` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// `value` is an integer register index 0-31.
    IntegerRegister,
    /// `value` is a register index in a (currently unimplemented) float register file.
    FloatRegister,
    /// `value` is a byte address. The only kind the displacement resolver will accept as a
    /// jump/branch/load-address target.
    MemoryAddress,
}

#[derive(Debug, Clone)]
struct SymbolEntry {
    name: String,
    kind: SymbolKind,
    value: u64,
}

/// Name -> (kind, value) table, plus the seedable source for [`SymbolTable::fresh_internal_name`].
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    rng: StdRng,
}

impl SymbolTable {
    /// New, empty table whose internal-name generator is seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// New, empty table whose internal-name generator is seeded deterministically, for tests.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self { entries: Vec::new(), rng }
    }

    /// Declares a new symbol with the given kind and `value = 0`. Fails if `name` is already
    /// declared.
    pub fn declare(&mut self, name: &str, kind: SymbolKind) -> Result<(), AssemblerError> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(AssemblerError::DuplicateSymbol(name.to_string()));
        }
        self.entries.push(SymbolEntry { name: name.to_string(), kind, value: 0 });
        Ok(())
    }

    /// Sets `value` on an already-declared symbol. Fails if `name` is unknown.
    pub fn update(&mut self, name: &str, value: u64) -> Result<(), AssemblerError> {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.value = value;
                Ok(())
            }
            None => Err(AssemblerError::UnknownSymbolUpdate(name.to_string())),
        }
    }

    /// Returns the stored value, or `None` when `name` is absent.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    /// Returns the symbol's kind, or `None` when `name` is absent.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.kind)
    }

    /// Generates `__internal_` followed by 9 uniformly random lowercase letters, for naming
    /// control-flow reconvergence points. Not guaranteed unique; collision probability is
    /// negligible for realistic programs.
    pub fn fresh_internal_name(&mut self) -> String {
        let mut name = String::from("__internal_");
        for _ in 0..9 {
            let c = self.rng.gen_range(b'a'..=b'z') as char;
            name.push(c);
        }
        name
    }

    /// Debug dump of every entry, at `info` level.
    pub fn dump(&self) {
        tracing::info!("symbol table entries:");
        for (i, entry) in self.entries.iter().enumerate() {
            match entry.kind {
                SymbolKind::MemoryAddress => {
                    tracing::info!("entry[{i}]: {}\tmem\t{:#014x}", entry.name, entry.value);
                }
                _ => {
                    tracing::info!("entry[{i}]: {}\treg\t${}", entry.name, entry.value);
                }
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_and_lookup() {
        let mut table = SymbolTable::with_seed(0);
        table.declare("main", SymbolKind::MemoryAddress).unwrap();
        table.update("main", 0x1000).unwrap();
        assert_eq!(table.lookup("main"), Some(0x1000));
        assert_eq!(table.kind_of("main"), Some(SymbolKind::MemoryAddress));
    }

    #[test]
    fn lookup_absent_is_none() {
        let table = SymbolTable::with_seed(0);
        assert_eq!(table.lookup("nope"), None);
        assert_eq!(table.kind_of("nope"), None);
    }

    #[test]
    fn duplicate_declaration_is_fatal() {
        let mut table = SymbolTable::with_seed(0);
        table.declare("x", SymbolKind::IntegerRegister).unwrap();
        assert!(matches!(
            table.declare("x", SymbolKind::IntegerRegister),
            Err(AssemblerError::DuplicateSymbol(name)) if name == "x"
        ));
    }

    #[test]
    fn update_unknown_is_fatal() {
        let mut table = SymbolTable::with_seed(0);
        assert!(table.update("ghost", 1).is_err());
    }

    #[test]
    fn fresh_internal_name_is_deterministic_for_a_given_seed() {
        let mut a = SymbolTable::with_seed(42);
        let mut b = SymbolTable::with_seed(42);
        assert_eq!(a.fresh_internal_name(), b.fresh_internal_name());
    }

    #[test]
    fn fresh_internal_name_shape() {
        let mut table = SymbolTable::with_seed(7);
        let name = table.fresh_internal_name();
        assert!(name.starts_with("__internal_"));
        assert_eq!(name.len(), "__internal_".len() + 9);
        assert!(name["__internal_".len()..].chars().all(|c| c.is_ascii_lowercase()));
    }
}
