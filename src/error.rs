//! Error taxonomy (spec §7) and the `report_error` external contract (spec §6).

/// Every fatal condition the back end can hit. All of them are, by contract, unrecoverable: the
/// caller's [`ErrorSink`] is expected to terminate the process rather than let the pipeline
/// continue with inconsistent state.
#[derive(Debug, thiserror::Error)]
pub enum AssemblerError {
    /// A branch/jump/load-address target named a symbol that was never declared.
    #[error("symbol table lookup failed on label \"{0}\" -- name not found")]
    UnknownSymbol(String),

    /// A branch/jump/load-address target named a symbol that holds a register index, not an
    /// address.
    #[error("symbol table lookup failed on label \"{0}\" -- label refers to a register")]
    SymbolIsNotMemory(String),

    /// `declare` was called twice with the same name.
    #[error("duplicate label declaration: {0}")]
    DuplicateSymbol(String),

    /// `update` was called on a name that was never declared.
    #[error("label not declared: {0}")]
    UnknownSymbolUpdate(String),

    /// The displacement resolver reached an instruction it has no rule for; this means the front
    /// end produced an entry that should never have been marked incomplete.
    #[error("unexpected incomplete instruction at address {address:#014x}")]
    UnexpectedIncompleteInstruction {
        /// Address of the offending entry.
        address: u64,
    },

    /// A memory block's entries are not address-monotone: the last entry's address precedes the
    /// head's.
    #[error("mem() block addresses are corrupt: head {head:#014x}, tail {tail:#014x}")]
    CorruptBlock {
        /// Address of the block's first entry.
        head: u64,
        /// Address of the block's last entry.
        tail: u64,
    },

    /// Two memory blocks' `[min, max]` address ranges intersect.
    #[error(
        "the memory block starting at address {first:#014x} overlaps the memory block starting at address {second:#014x}"
    )]
    OverlappingBlocks {
        /// Start address of the first block observed.
        first: u64,
        /// Start address of the second, overlapping, block.
        second: u64,
    },

    /// An entry reached the emitter with a type the traversal does not know how to serialize.
    #[error("invalid entry type when emitting {context}")]
    InvalidEntryType {
        /// Which emitter pass hit the bad entry ("instructions", "text memory image", ...).
        context: &'static str,
    },

    /// An entry's address does not satisfy its datum's natural alignment in the text/binary
    /// writer.
    #[error("{kind} at address {address:#014x} is not {align}-byte aligned")]
    Misaligned {
        /// What was misaligned ("instruction", "half word", "word").
        kind: &'static str,
        /// The offending address.
        address: u64,
        /// Required alignment in bytes.
        align: u32,
    },

    /// L/F/D/S data reached a writer that does not support it (spec §4.7).
    #[error("writing {0} to flat text/binary files is not supported")]
    UnsupportedDatum(&'static str),

    /// `open`/`write`/`close` failed on an output file.
    #[error("I/O error writing output: {0}")]
    Io(#[from] std::io::Error),
}

/// External collaborator the core calls on any fatal condition (spec §6). The contract is that
/// this call does not return: the front end that implements it is expected to report the message
/// to the user and terminate the process.
pub trait ErrorSink {
    /// Report `message` and terminate. Never returns.
    fn report_error(&self, message: &str) -> !;
}

/// Default sink: prints the message to stderr and exits with status 1. Suitable for a
/// command-line front end with no richer diagnostic machinery of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortSink;

impl ErrorSink for AbortSink {
    fn report_error(&self, message: &str) -> ! {
        eprintln!("error: {message}");
        std::process::exit(1)
    }
}

/// Runs `f`, and on `Err`, hands the formatted error to `sink.report_error`. `sink.report_error`
/// never returns, so neither does this function in the error case.
pub(crate) fn or_abort<T>(
    sink: &dyn ErrorSink,
    result: Result<T, AssemblerError>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => sink.report_error(&err.to_string()),
    }
}
