//! Bit packing of coded symbols.
//!
//! A packed stream is a `u64` payload bit count followed by `u32` words,
//! both in native byte order. Bits fill each word from the most significant
//! end; the last word is padded with zero bits that are not counted.

use std::io::{self, Read, Write};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use tracing::debug;

use crate::error::{Error, Result};
use crate::frequency::for_each_chunk;
use crate::tree::{CodeTable, Node};

pub const WORD_BITS: u64 = 32;
const WORD_LEN: usize = 4;
const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedStream {
    bit_count: u64,
    words: Vec<u32>,
}

impl PackedStream {
    pub fn new(bit_count: u64, words: Vec<u32>) -> Self {
        Self { bit_count, words }
    }

    /// Number of payload bits, padding excluded.
    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Size of the stream once written.
    pub fn byte_len(&self) -> u64 {
        (HEADER_LEN + self.words.len() * WORD_LEN) as u64
    }

    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<()> {
        sink.write_all(&self.bit_count.to_ne_bytes())?;
        for word in &self.words {
            sink.write_all(&word.to_ne_bytes())?;
        }
        sink.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut source: R) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        source.read_exact(&mut header).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                Error::integrity("stream is shorter than its 8-byte header")
            }
            _ => e.into(),
        })?;
        let bit_count = u64::from_ne_bytes(header);

        let mut payload = Vec::new();
        source.read_to_end(&mut payload)?;
        if payload.len() % WORD_LEN != 0 {
            return Err(Error::integrity(format!(
                "payload ends {} bytes into a word",
                payload.len() % WORD_LEN
            )));
        }
        let words = payload
            .chunks_exact(WORD_LEN)
            .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]))
            .collect();
        Ok(Self { bit_count, words })
    }
}

/// Encode every byte of `source` with `codes`.
pub fn pack<R: Read>(source: R, codes: &CodeTable) -> Result<PackedStream> {
    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    let mut bit_count: u64 = 0;

    for_each_chunk(source, |chunk| {
        for &byte in chunk {
            let code = codes.get(byte).ok_or(Error::UnknownSymbol(byte))?;
            for &bit in code.bits() {
                writer.write_bit(bit)?;
            }
            bit_count += code.len() as u64;
        }
        Ok(())
    })?;

    let padding = (WORD_BITS - bit_count % WORD_BITS) % WORD_BITS;
    for _ in 0..padding {
        writer.write_bit(false)?;
    }
    let words: Vec<u32> = writer
        .into_writer()
        .chunks_exact(WORD_LEN)
        .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
        .collect();

    debug!(bit_count, words = words.len(), padding, "packed payload");
    Ok(PackedStream { bit_count, words })
}

/// Decode `stream` by walking `root`, consuming exactly the declared bits.
///
/// The root weight is the number of symbols in the stream. A tree that is a
/// lone leaf has an empty code, so the stream carries no bits at all and the
/// leaf's weight alone says how often its symbol occurs.
pub fn unpack(stream: &PackedStream, root: &Node) -> Result<Vec<u8>> {
    let needed = stream.bit_count.div_ceil(WORD_BITS);
    let held = stream.words.len() as u64;
    if held < needed {
        return Err(Error::integrity(format!(
            "stream declares {} payload bits but holds only {held} words",
            stream.bit_count
        )));
    }
    if held > needed {
        return Err(Error::integrity(format!(
            "{} words of trailing data after the payload",
            held - needed
        )));
    }

    let mut out = match root {
        Node::Leaf { weight, symbol } => {
            if stream.bit_count != 0 {
                return Err(Error::integrity(format!(
                    "single-symbol tree cannot account for {} payload bits",
                    stream.bit_count
                )));
            }
            let len = usize::try_from(*weight)
                .map_err(|_| Error::integrity("symbol count does not fit in memory"))?;
            let mut out = Vec::new();
            out.try_reserve_exact(len).map_err(|e| {
                Error::integrity(format!("cannot allocate {len} bytes for a single-symbol tree: {e}"))
            })?;
            out.resize(len, *symbol);
            return Ok(out);
        }
        // every symbol costs at least one bit
        Node::Internal { weight, .. } => {
            Vec::with_capacity(usize::try_from((*weight).min(stream.bit_count)).unwrap_or(0))
        }
    };

    let bytes: Vec<u8> = stream.words.iter().flat_map(|w| w.to_be_bytes()).collect();
    let mut reader = BitReader::endian(&bytes[..], BigEndian);
    let mut node = root;
    for _ in 0..stream.bit_count {
        if let Node::Internal { left, right, .. } = node {
            node = if reader.read_bit()? { right } else { left };
        }
        if let Node::Leaf { symbol, .. } = node {
            out.push(*symbol);
            node = root;
        }
    }
    if !std::ptr::eq(node, root) {
        return Err(Error::integrity("stream ends in the middle of a code"));
    }

    // the root weight is the symbol count recorded at encode time
    if out.len() as u64 != root.weight() {
        return Err(Error::integrity(format!(
            "decoded {} symbols but the tree accounts for {}",
            out.len(),
            root.weight()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyTable;
    use crate::tree::build;

    fn encode(data: &[u8]) -> (PackedStream, Node) {
        let root = build(&FrequencyTable::from_bytes(data)).unwrap();
        let stream = pack(data, &CodeTable::from_tree(&root)).unwrap();
        (stream, root)
    }

    fn assert_integrity(result: Result<Vec<u8>>) {
        match result {
            Err(Error::Integrity(_)) => {}
            other => panic!("expected an integrity error, got {other:?}"),
        }
    }

    #[test]
    fn aaab_packs_into_one_word() {
        let (stream, root) = encode(b"aaab");
        // b = 0, a = 1
        assert_eq!(stream.bit_count(), 4);
        assert_eq!(stream.words(), &[0xE000_0000]);
        assert_eq!(unpack(&stream, &root).unwrap(), b"aaab");
    }

    #[test]
    fn bit_count_is_sum_of_code_lengths() {
        let data = b"she sells sea shells by the sea shore";
        let table = FrequencyTable::from_bytes(data);
        let root = build(&table).unwrap();
        let codes = CodeTable::from_tree(&root);
        let stream = pack(&data[..], &codes).unwrap();
        assert_eq!(stream.bit_count(), codes.payload_bits(&table));
        assert_eq!(stream.words().len() as u64, stream.bit_count().div_ceil(32));
        assert_eq!(unpack(&stream, &root).unwrap(), data);
    }

    #[test]
    fn exact_word_boundary_has_no_padding_word() {
        // 32 symbols of a two-leaf tree: exactly one word
        let data: Vec<u8> = (0..32).map(|i| if i % 4 == 0 { b'x' } else { b'y' }).collect();
        let (stream, root) = encode(&data);
        assert_eq!(stream.bit_count(), 32);
        assert_eq!(stream.words().len(), 1);
        assert_eq!(unpack(&stream, &root).unwrap(), data);
    }

    #[test]
    fn single_symbol_round_trip() {
        let data = vec![b'a'; 1000];
        let (stream, root) = encode(&data);
        assert_eq!(stream.bit_count(), 0);
        assert!(stream.words().is_empty());
        assert_eq!(unpack(&stream, &root).unwrap(), data);
    }

    #[test]
    fn single_symbol_tree_with_bits_is_rejected() {
        let root = Node::Leaf { weight: 3, symbol: b'a' };
        assert_integrity(unpack(&PackedStream::new(3, vec![0]), &root));
    }

    #[test]
    fn unknown_symbol_fails_packing() {
        let root = build(&FrequencyTable::from_bytes(b"ab")).unwrap();
        let err = pack(&b"abc"[..], &CodeTable::from_tree(&root)).unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol(b'c')));
    }

    #[test]
    fn truncated_payload_is_detected() {
        let data: Vec<u8> = (0..200u32).map(|i| (i % 13) as u8).collect();
        let (stream, root) = encode(&data);
        let mut words = stream.words().to_vec();
        words.pop();
        assert_integrity(unpack(&PackedStream::new(stream.bit_count(), words), &root));
    }

    #[test]
    fn trailing_words_are_detected() {
        let (stream, root) = encode(b"aaab");
        let mut words = stream.words().to_vec();
        words.push(0);
        assert_integrity(unpack(&PackedStream::new(stream.bit_count(), words), &root));
    }

    #[test]
    fn incomplete_final_code_is_detected() {
        // c = 0, a = 10, b = 11; a lone 1 bit stops inside a code
        let root = build(&FrequencyTable::from_bytes(b"abcc")).unwrap();
        assert_integrity(unpack(&PackedStream::new(1, vec![0x8000_0000]), &root));
    }

    #[test]
    fn oversized_single_symbol_count_is_an_error() {
        let root = Node::Leaf {
            weight: u64::MAX,
            symbol: b'a',
        };
        assert_integrity(unpack(&PackedStream::new(0, Vec::new()), &root));
    }

    #[test]
    fn lowered_bit_count_is_detected() {
        // b = 0, a = 1: three bits still decode to whole symbols ("aaa")
        let (stream, root) = encode(b"aaab");
        let lowered = PackedStream::new(3, stream.words().to_vec());
        assert_integrity(unpack(&lowered, &root));
    }

    #[test]
    fn padding_is_never_decoded() {
        // b = 0, so decoding the 28 zero padding bits would add b's
        let (stream, root) = encode(b"aaab");
        assert_eq!(unpack(&stream, &root).unwrap().len(), 4);
    }

    #[test]
    fn wire_layout_is_native_endian() {
        let (stream, _) = encode(b"aaab");
        let mut bytes = Vec::new();
        stream.write_to(&mut bytes).unwrap();
        let mut expected = 4u64.to_ne_bytes().to_vec();
        expected.extend_from_slice(&0xE000_0000u32.to_ne_bytes());
        assert_eq!(bytes, expected);
        assert_eq!(stream.byte_len(), 12);
        assert_eq!(PackedStream::read_from(&bytes[..]).unwrap(), stream);
    }

    #[test]
    fn short_header_is_an_integrity_error() {
        let err = PackedStream::read_from(&[1u8, 2, 3][..]).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn partial_word_is_an_integrity_error() {
        let mut bytes = 4u64.to_ne_bytes().to_vec();
        bytes.extend_from_slice(&[0xE0, 0]);
        let err = PackedStream::read_from(&bytes[..]).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }
}
