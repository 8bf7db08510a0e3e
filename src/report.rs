use std::fmt;

use serde::Serialize;

/// Summary of one encode call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeReport {
    pub input_bytes: u64,
    pub distinct_symbols: usize,
    pub payload_bits: u64,
    pub stream_bytes: u64,
    pub tree_bytes: u64,
}

impl EncodeReport {
    /// Packed stream size over input size. Zero for an empty input.
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        self.stream_bytes as f64 / self.input_bytes as f64
    }

    /// Average code length weighted by occurrence.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        self.payload_bits as f64 / self.input_bytes as f64
    }
}

impl fmt::Display for EncodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "encoded {} into {} + {} tree ({} symbols, {:.3} bits/symbol, ratio {:.2}%)",
            format_bytes(self.input_bytes),
            format_bytes(self.stream_bytes),
            format_bytes(self.tree_bytes),
            self.distinct_symbols,
            self.bits_per_symbol(),
            self.ratio() * 100.0
        )
    }
}

/// Summary of one decode call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeReport {
    pub stream_bytes: u64,
    pub payload_bits: u64,
    pub leaves: usize,
    pub output_bytes: u64,
}

impl fmt::Display for DecodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "decoded {} into {} ({} payload bits, {} leaves)",
            format_bytes(self.stream_bytes),
            format_bytes(self.output_bytes),
            self.payload_bits,
            self.leaves
        )
    }
}

/// Format bytes into human-readable string (e.g. 1024 -> "1.00 KB")
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
