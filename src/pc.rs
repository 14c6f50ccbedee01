//! Program counter (spec §4.2): the program's entry virtual address.

/// Holds the single virtual address the emitted program should start executing at.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(u64);

impl ProgramCounter {
    /// Starts at address 0, matching an unset entry point.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Sets the entry point address.
    pub fn set(&mut self, addr: u64) {
        self.0 = addr;
    }

    /// The entry point address as currently set.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Debug dump, at `info` level.
    pub fn dump(&self) {
        tracing::info!("program counter: {:#014x}", self.0);
    }
}

#[test]
fn set_and_get() {
    let mut pc = ProgramCounter::new();
    assert_eq!(pc.get(), 0);
    pc.set(0x1000);
    assert_eq!(pc.get(), 0x1000);
}
