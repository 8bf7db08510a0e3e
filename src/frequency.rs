use std::io::{self, Read};

use crate::error::Result;

pub(crate) const CHUNK_SIZE: usize = 8 * 1024;

/// Feed `source` to `f` in chunks until end of data.
pub(crate) fn for_each_chunk<R, F>(mut source: R, mut f: F) -> Result<()>
where
    R: Read,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        f(&buf[..n])?;
    }
}

/// Occurrence count of every byte value in a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self { counts: [0; 256] }
    }
}

impl FrequencyTable {
    /// Count every byte of `source` in one sequential pass.
    pub fn scan<R: Read>(source: R) -> Result<Self> {
        let mut table = Self::default();
        for_each_chunk(source, |chunk| {
            table.record(chunk);
            Ok(())
        })?;
        Ok(table)
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut table = Self::default();
        table.record(data);
        table
    }

    fn record(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.counts[byte as usize] += 1;
        }
    }

    pub fn count(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    /// Number of bytes seen.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of symbols with a non-zero count.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Non-zero slots in ascending symbol order.
    pub fn present(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(symbol, &count)| (symbol as u8, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out its data a few bytes at a time and fails with
    /// `Interrupted` between chunks.
    struct Stuttering<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Stuttering<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "again"));
            }
            let n = buf.len().min(3).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"))
        }
    }

    #[test]
    fn counts_sum_to_length() {
        let data = b"abracadabra";
        let table = FrequencyTable::scan(&data[..]).unwrap();
        assert_eq!(table.total(), data.len() as u64);
        assert_eq!(table.count(b'a'), 5);
        assert_eq!(table.count(b'b'), 2);
        assert_eq!(table.count(b'r'), 2);
        assert_eq!(table.count(b'c'), 1);
        assert_eq!(table.count(b'd'), 1);
        assert_eq!(table.count(b'z'), 0);
        assert_eq!(table.distinct(), 5);
    }

    #[test]
    fn scan_crosses_chunk_boundaries() {
        let data: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let table = FrequencyTable::scan(&data[..]).unwrap();
        assert_eq!(table, FrequencyTable::from_bytes(&data));
        assert_eq!(table.total(), data.len() as u64);
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let source = Stuttering {
            data: b"hello world",
            interrupt: false,
        };
        let table = FrequencyTable::scan(source).unwrap();
        assert_eq!(table, FrequencyTable::from_bytes(b"hello world"));
    }

    #[test]
    fn read_failure_aborts() {
        let err = FrequencyTable::scan(Broken).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn present_is_sorted_by_symbol() {
        let table = FrequencyTable::from_bytes(&[200, 3, 200, 255, 0]);
        let present: Vec<_> = table.present().collect();
        assert_eq!(present, vec![(0, 1), (3, 1), (200, 2), (255, 1)]);
    }

    #[test]
    fn empty_source_is_all_zero() {
        let table = FrequencyTable::scan(io::empty()).unwrap();
        assert_eq!(table.total(), 0);
        assert_eq!(table.distinct(), 0);
    }
}
