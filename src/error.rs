use thiserror::Error;

/// Errors produced while encoding or decoding.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the source or writing the sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source held no bytes, so there is no tree to build.
    #[error("empty input: nothing to build a Huffman tree from")]
    EmptyInput,

    /// The tree text does not follow the tree grammar.
    #[error("malformed tree at byte {offset}: {message}")]
    Parse {
        /// Byte offset in the tree text where parsing stopped
        offset: usize,
        /// What was wrong there
        message: String,
    },

    /// The packed stream does not agree with itself or with the tree.
    #[error("corrupt stream: {0}")]
    Integrity(String),

    /// A byte showed up at pack time that has no code.
    #[error("byte {0} has no code in the table")]
    UnknownSymbol(u8),

    /// The packed bit count disagrees with the count implied by the scan.
    #[error("input changed while encoding: expected {expected} payload bits, packed {actual}")]
    SourceChanged { expected: u64, actual: u64 },
}

impl Error {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn integrity(message: impl Into<String>) -> Self {
        Error::Integrity(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
