//! Address traces: records, trace files and synthetic generators

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{SimulatorError, SimulatorResult, TraceError};
use crate::memory::AccessType;

/// A single trace entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccessRecord {
    pub address: u64,
    pub access_type: AccessType,
}

impl AccessRecord {
    pub fn read(address: u64) -> Self {
        Self { address, access_type: AccessType::Read }
    }

    pub fn write(address: u64) -> Self {
        Self { address, access_type: AccessType::Write }
    }

    /// Check a signed address coming from an untyped source.
    /// `entry` is the 1-based position reported on failure.
    pub fn from_signed(
        address: i64,
        access_type: AccessType,
        entry: usize,
    ) -> SimulatorResult<Self> {
        let address = u64::try_from(address)
            .map_err(|_| SimulatorError::InvalidAddress { address, entry })?;
        Ok(Self { address, access_type })
    }
}

impl From<u64> for AccessRecord {
    fn from(address: u64) -> Self {
        Self::read(address)
    }
}

fn parse_error(line: usize, reason: String) -> SimulatorError {
    TraceError::ParseError { line, reason }.into()
}

fn parse_address(token: &str, line_num: usize) -> SimulatorResult<u64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, token),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    }
    .map_err(|_| parse_error(line_num, format!("invalid address '{}'", token)))?;

    if negative && value != 0 {
        let address = i64::try_from(value).map_or(i64::MIN, |value| -value);
        return Err(SimulatorError::InvalidAddress { address, entry: line_num });
    }
    Ok(value)
}

/// Parse one trace line.
///
/// Accepted forms are `<op> <address>` with op `r` or `w`, or a bare
/// address read. Addresses are decimal or `0x`-prefixed hexadecimal.
/// Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, line_num: usize) -> SimulatorResult<Option<AccessRecord>> {
    let content = line.split('#').next().unwrap_or("").trim();
    if content.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = content.split_whitespace().collect();
    let (access_type, address) = match parts.as_slice() {
        [address] => (AccessType::Read, *address),
        [op, address] => {
            let access_type = match op.to_lowercase().as_str() {
                "r" => AccessType::Read,
                "w" => AccessType::Write,
                _ => {
                    return Err(parse_error(
                        line_num,
                        format!("invalid operation '{}': expected 'r' or 'w'", op),
                    ))
                }
            };
            (access_type, *address)
        }
        _ => {
            return Err(parse_error(
                line_num,
                "expected 'op address' or 'address'".to_string(),
            ))
        }
    };

    let address = parse_address(address, line_num)?;
    Ok(Some(AccessRecord { address, access_type }))
}

/// Lazily reads records from a trace, one line at a time
pub struct TraceReader<R> {
    lines: Lines<R>,
    line_num: usize,
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> SimulatorResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| TraceError::FileReadError(path.to_path_buf(), e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line_num: 0 }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = SimulatorResult<AccessRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            self.line_num += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            match parse_line(&line, self.line_num) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Fetch every record of the trace file
pub fn fetch_operations(path: impl AsRef<Path>) -> SimulatorResult<Vec<AccessRecord>> {
    TraceReader::open(path)?.collect()
}

/// `count` reads starting at `start`, `stride` bytes apart
pub fn sequential(
    start: u64,
    count: u64,
    stride: u64,
) -> impl Iterator<Item = AccessRecord> + Clone {
    (0..count).map(move |i| AccessRecord::read(start + i * stride))
}

/// The sequential range repeated `repeats` times
pub fn looping(
    start: u64,
    count: u64,
    stride: u64,
    repeats: u64,
) -> impl Iterator<Item = AccessRecord> + Clone {
    (0..repeats).flat_map(move |_| sequential(start, count, stride))
}

/// Reads of uniformly chosen words in `0..=max_word`
#[derive(Clone, Debug)]
pub struct RandomTrace {
    rng: ChaCha8Rng,
    remaining: u64,
    max_word: u64,
    word_size: u64,
}

impl RandomTrace {
    pub fn new(seed: u64, count: u64, max_word: u64, word_size: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            remaining: count,
            max_word,
            word_size,
        }
    }
}

impl Iterator for RandomTrace {
    type Item = AccessRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let word = self.rng.gen_range(0..=self.max_word);
        Some(AccessRecord::read(word * self.word_size))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

/// Mixed workload of 4-byte words: a loop over words 0..128,
/// 256 random words in 0..=4096, then a loop over words 2048..2176
pub fn synthetic(seed: u64) -> impl Iterator<Item = AccessRecord> + Clone {
    looping(0, 128, 4, 4)
        .chain(RandomTrace::new(seed, 256, 4096, 4))
        .chain(looping(2048 * 4, 128, 4, 4))
}
