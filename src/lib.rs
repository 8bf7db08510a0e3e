//! # huffpack
//!
//! Static Huffman compression. A source is scanned once for byte
//! frequencies, a prefix-code tree is built from them, and the source is
//! packed into 32-bit words behind a 64-bit payload bit count. The tree is
//! stored separately as text and is all a later decode needs.
//!
//! ```rust
//! let (stream, tree) = huffpack::encode_bytes(b"aaab")?;
//! assert_eq!(tree, "(4 36 (1 98 () ()) (3 97 () ()))");
//! assert_eq!(huffpack::decode_bytes(&stream, &tree)?, b"aaab");
//! # Ok::<(), huffpack::Error>(())
//! ```

pub mod codec;
pub mod error;
pub mod frequency;
pub mod logger;
pub mod report;
pub mod serialize;
pub mod session;
pub mod tree;

pub use codec::{PackedStream, pack, unpack};
pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use report::{DecodeReport, EncodeReport};
pub use session::{decode_bytes, decode_file, encode_bytes, encode_file};
pub use tree::{Code, CodeTable, Node, build};
