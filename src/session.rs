//! Encode and decode calls over files and in-memory buffers.
//!
//! Each call owns its frequency table, tree and code table and drops them
//! before returning. Outputs are written to a sibling `.tmp` file and renamed
//! into place, so a failed call leaves no partial output behind.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn};

use crate::codec::{self, PackedStream};
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::report::{DecodeReport, EncodeReport};
use crate::serialize;
use crate::tree::{self, CodeTable, Node};

const TEMP_EXT: &str = "tmp";

/// Compress `input` into a packed stream at `output` and a tree at `tree_path`.
pub fn encode_file(input: &Path, output: &Path, tree_path: &Path) -> Result<EncodeReport> {
    let span = info_span!("encode", input = %input.display());
    let _enter = span.enter();

    let table = FrequencyTable::scan(File::open(input)?)?;
    debug!(bytes = table.total(), distinct = table.distinct(), "scanned input");

    let (stream, root) = pack_checked(File::open(input)?, &table)?;
    let tree_text = serialize::to_text(&root);

    // both outputs are staged before either replaces an existing file
    let staged_stream = stage(output, |out| stream.write_to(out))?;
    let staged_tree = match stage(tree_path, |out| Ok(out.write_all(tree_text.as_bytes())?)) {
        Ok(temp) => temp,
        Err(e) => {
            discard(&staged_stream);
            return Err(e);
        }
    };
    if let Err(e) = commit(&staged_stream, output) {
        discard(&staged_tree);
        return Err(e);
    }
    if let Err(e) = commit(&staged_tree, tree_path) {
        if let Err(cleanup) = fs::remove_file(output) {
            warn!(path = %output.display(), error = %cleanup, "could not remove stream file");
        }
        return Err(e);
    }

    let report = EncodeReport {
        input_bytes: table.total(),
        distinct_symbols: table.distinct(),
        payload_bits: stream.bit_count(),
        stream_bytes: stream.byte_len(),
        tree_bytes: tree_text.len() as u64,
    };
    info!(
        output = %output.display(),
        tree = %tree_path.display(),
        payload_bits = report.payload_bits,
        "encoded"
    );
    Ok(report)
}

/// Rebuild `output` from the packed stream at `input` and the tree at `tree_path`.
pub fn decode_file(input: &Path, output: &Path, tree_path: &Path) -> Result<DecodeReport> {
    let span = info_span!("decode", input = %input.display());
    let _enter = span.enter();

    let root = serialize::read_tree(File::open(tree_path)?)?;
    debug!(leaves = root.leaf_count(), depth = root.depth(), "read tree");

    let stream = PackedStream::read_from(BufReader::new(File::open(input)?))?;
    let data = codec::unpack(&stream, &root)?;

    write_atomically(output, |out| Ok(out.write_all(&data)?))?;

    let report = DecodeReport {
        stream_bytes: stream.byte_len(),
        payload_bits: stream.bit_count(),
        leaves: root.leaf_count(),
        output_bytes: data.len() as u64,
    };
    info!(output = %output.display(), bytes = report.output_bytes, "decoded");
    Ok(report)
}

/// Encode `data`, returning the packed stream bytes and the tree text.
pub fn encode_bytes(data: &[u8]) -> Result<(Vec<u8>, String)> {
    let table = FrequencyTable::from_bytes(data);
    let (stream, root) = pack_checked(data, &table)?;
    let mut bytes = Vec::with_capacity(stream.byte_len() as usize);
    stream.write_to(&mut bytes)?;
    Ok((bytes, serialize::to_text(&root)))
}

/// Decode packed stream bytes with the tree text produced alongside them.
pub fn decode_bytes(stream: &[u8], tree_text: &str) -> Result<Vec<u8>> {
    let root = serialize::from_text(tree_text)?;
    let stream = PackedStream::read_from(stream)?;
    codec::unpack(&stream, &root)
}

/// Build the tree for `table` and pack `source` with it. The source must
/// still hold the bytes `table` was counted from.
fn pack_checked<R: Read>(source: R, table: &FrequencyTable) -> Result<(PackedStream, Node)> {
    let root = tree::build(table)?;
    let codes = CodeTable::from_tree(&root);
    let stream = codec::pack(source, &codes)?;

    let expected = codes.payload_bits(table);
    if stream.bit_count() != expected {
        return Err(Error::SourceChanged {
            expected,
            actual: stream.bit_count(),
        });
    }
    Ok((stream, root))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(TEMP_EXT);
    path.with_file_name(name)
}

/// Write `path` through a sibling temp file, renamed into place on success.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let temp = stage(path, write)?;
    commit(&temp, path)
}

/// Write the contents meant for `path` into its temp file and return the
/// temp path. Nothing is left behind on failure.
fn stage<F>(path: &Path, write: F) -> Result<PathBuf>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let temp = temp_path(path);
    let result = File::create(&temp).map_err(Error::from).and_then(|file| {
        let mut out = BufWriter::new(file);
        write(&mut out)?;
        out.flush()?;
        Ok(())
    });

    match result {
        Ok(()) => Ok(temp),
        Err(e) => {
            discard(&temp);
            Err(e)
        }
    }
}

fn commit(temp: &Path, path: &Path) -> Result<()> {
    fs::rename(temp, path).map_err(|e| {
        discard(temp);
        Error::from(e)
    })
}

fn discard(temp: &Path) {
    let _ = fs::remove_file(temp);
}
