//! Candidate password sources.
//!
//! Three shapes feed the worker pool: an in-memory list, a wordlist file
//! streamed line by line, and a brute-force generator that hands out
//! prefix tasks. The first two share the [`CandidateSource`] cursor; the
//! generator is consumed at task granularity so workers enumerate suffixes
//! without touching shared state.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Result, UnlockError};

/// An ordered, thread-safe producer of password candidates.
pub trait CandidateSource: Send + Sync {
    /// Next candidate in source order, `None` once exhausted.
    fn next(&self) -> Option<String>;

    /// Total candidate count, when known up front.
    fn total(&self) -> Option<usize> {
        None
    }

    /// An I/O error that cut the stream short, if any. Checked by the
    /// dispatcher after the workers drain the source.
    fn take_error(&self) -> Option<UnlockError> {
        None
    }
}

/// In-memory candidate list with an atomic cursor.
pub struct MemorySource {
    passwords: Vec<String>,
    cursor: AtomicUsize,
}

impl MemorySource {
    pub fn new(passwords: Vec<String>) -> Self {
        Self {
            passwords,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl CandidateSource for MemorySource {
    fn next(&self) -> Option<String> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.passwords.get(index).cloned()
    }

    fn total(&self) -> Option<usize> {
        Some(self.passwords.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

struct WordlistState {
    reader: BufReader<File>,
    offset: u64,
    done: bool,
    error: Option<UnlockError>,
}

/// Wordlist file streamed under a mutex, with BOM-based encoding detection.
///
/// `FF FE` selects UTF-16LE, `FE FF` UTF-16BE, `EF BB BF` UTF-8; anything
/// else is read as UTF-8 best-effort. Blank lines are skipped and a trailing
/// CR is trimmed from every line.
pub struct WordlistFile {
    path: PathBuf,
    encoding: Encoding,
    state: Mutex<WordlistState>,
}

impl WordlistFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| UnlockError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut bom = [0u8; 3];
        let mut filled = 0;
        while filled < 3 {
            match reader.read(&mut bom[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(source) => {
                    return Err(UnlockError::ReadFailed {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }

        let (encoding, skip) = if filled >= 2 && bom[0] == 0xFF && bom[1] == 0xFE {
            (Encoding::Utf16Le, 2)
        } else if filled >= 2 && bom[0] == 0xFE && bom[1] == 0xFF {
            (Encoding::Utf16Be, 2)
        } else if filled >= 3 && bom[0] == 0xEF && bom[1] == 0xBB && bom[2] == 0xBF {
            (Encoding::Utf8, 3)
        } else {
            (Encoding::Utf8, 0)
        };

        reader
            .seek(SeekFrom::Start(skip))
            .map_err(|source| UnlockError::ReadFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            encoding,
            state: Mutex::new(WordlistState {
                reader,
                offset: skip,
                done: false,
                error: None,
            }),
        })
    }

    fn read_line_utf8(&self, state: &mut WordlistState) -> Result<Option<String>> {
        use std::io::BufRead as _;

        let mut line = Vec::new();
        let read = state
            .reader
            .read_until(b'\n', &mut line)
            .map_err(|source| UnlockError::ReadFailed {
                path: self.path.clone(),
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }
        state.offset += read as u64;

        while matches!(line.last(), Some(b'\n') | Some(b'\r')) {
            line.pop();
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    fn read_line_utf16(&self, state: &mut WordlistState) -> Result<Option<String>> {
        let mut units: Vec<u16> = Vec::new();
        let mut read_any = false;

        loop {
            let Some(first) = self.read_byte(state)? else {
                break;
            };
            let Some(second) = self.read_byte(state)? else {
                // a dangling byte cannot form a code unit
                return Err(UnlockError::EncodingError {
                    path: self.path.clone(),
                    offset: state.offset,
                });
            };
            state.offset += 2;
            read_any = true;

            let unit = match self.encoding {
                Encoding::Utf16Le => u16::from_le_bytes([first, second]),
                _ => u16::from_be_bytes([first, second]),
            };

            if unit == 0x000A {
                break;
            }
            if unit == 0x000D {
                continue;
            }
            units.push(unit);
        }

        if !read_any && units.is_empty() {
            return Ok(None);
        }

        // unpaired surrogates drop the line rather than the whole stream
        Ok(Some(String::from_utf16(&units).unwrap_or_default()))
    }

    fn read_byte(&self, state: &mut WordlistState) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match state.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(UnlockError::ReadFailed {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        }
    }
}

impl CandidateSource for WordlistFile {
    fn next(&self) -> Option<String> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.done {
            return None;
        }

        loop {
            let line = match self.encoding {
                Encoding::Utf8 => self.read_line_utf8(&mut state),
                _ => self.read_line_utf16(&mut state),
            };
            match line {
                Ok(Some(line)) if line.is_empty() => continue,
                Ok(Some(line)) => return Some(line),
                Ok(None) => {
                    state.done = true;
                    return None;
                }
                Err(error) => {
                    state.error = Some(error);
                    state.done = true;
                    return None;
                }
            }
        }
    }

    fn take_error(&self) -> Option<UnlockError> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .error
            .take()
    }
}

const SPECIAL_CHARACTERS: &str = "!\"#$%&'()*+,-./:;<=>?@[]^_{|}~";

/// Character-class selection for the brute-force alphabet.
#[derive(Debug, Clone)]
pub struct AlphabetSpec {
    pub include_uppercase: bool,
    pub include_lowercase: bool,
    pub include_digits: bool,
    pub include_special: bool,
    /// When set, replaces the class selection entirely.
    pub custom_characters: Option<String>,
}

impl Default for AlphabetSpec {
    fn default() -> Self {
        Self {
            include_uppercase: true,
            include_lowercase: true,
            include_digits: true,
            include_special: true,
            custom_characters: None,
        }
    }
}

impl AlphabetSpec {
    /// Assemble the alphabet in class order: uppercase, lowercase, digits,
    /// specials.
    pub fn build(&self) -> Result<Vec<char>> {
        if let Some(custom) = &self.custom_characters {
            let alphabet: Vec<char> = custom.chars().collect();
            if alphabet.is_empty() {
                return Err(UnlockError::EmptyCandidateSource);
            }
            return Ok(alphabet);
        }

        let mut alphabet = String::new();
        if self.include_uppercase {
            alphabet.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        }
        if self.include_lowercase {
            alphabet.push_str("abcdefghijklmnopqrstuvwxyz");
        }
        if self.include_digits {
            alphabet.push_str("0123456789");
        }
        if self.include_special {
            alphabet.push_str(SPECIAL_CHARACTERS);
        }

        if alphabet.is_empty() {
            return Err(UnlockError::EmptyCandidateSource);
        }
        Ok(alphabet.chars().collect())
    }
}

pub(crate) struct BruteTask {
    pub(crate) prefix: String,
    pub(crate) target_length: usize,
}

/// Brute-force candidate space: every string over `alphabet` with length in
/// `min_length..=max_length`, enumerated lexicographically per length.
///
/// The space is materialized as short-prefix tasks (prefix length
/// `min(target_length, 2)`) dispensed by an atomic counter; workers
/// enumerate the remaining positions locally.
pub struct BruteForce {
    alphabet: Vec<char>,
    min_length: usize,
    max_length: usize,
    tasks: Vec<BruteTask>,
    next_task: AtomicUsize,
}

impl BruteForce {
    pub fn new(alphabet: Vec<char>, min_length: usize, max_length: usize) -> Result<Self> {
        if min_length == 0 || max_length < min_length {
            return Err(UnlockError::InvalidBruteForceRange {
                min: min_length,
                max: max_length,
            });
        }
        if alphabet.is_empty() {
            return Err(UnlockError::EmptyCandidateSource);
        }

        let tasks = materialize_tasks(&alphabet, min_length, max_length);
        Ok(Self {
            alphabet,
            min_length,
            max_length,
            tasks,
            next_task: AtomicUsize::new(0),
        })
    }

    pub(crate) fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub(crate) fn take_task(&self) -> Option<&BruteTask> {
        let index = self.next_task.fetch_add(1, Ordering::Relaxed);
        self.tasks.get(index)
    }

    pub(crate) fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Total combinations across the configured lengths, when it fits.
    pub fn total_combinations(&self) -> Option<usize> {
        let mut total: usize = 0;
        for length in self.min_length..=self.max_length {
            let mut per_length: usize = 1;
            for _ in 0..length {
                per_length = per_length.checked_mul(self.alphabet.len())?;
            }
            total = total.checked_add(per_length)?;
        }
        Some(total)
    }
}

fn materialize_tasks(alphabet: &[char], min_length: usize, max_length: usize) -> Vec<BruteTask> {
    let base_prefix_length = min_length.min(2).max(1);
    let mut tasks = Vec::new();

    for length in min_length..=max_length {
        let prefix_length = length.min(base_prefix_length);
        let mut indices = vec![0usize; prefix_length];

        loop {
            let prefix: String = indices.iter().map(|&i| alphabet[i]).collect();
            tasks.push(BruteTask {
                prefix,
                target_length: length,
            });

            let mut pos = prefix_length;
            while pos > 0 {
                pos -= 1;
                indices[pos] += 1;
                if indices[pos] < alphabet.len() {
                    break;
                }
                indices[pos] = 0;
            }
            if pos == 0 && indices[0] == 0 {
                break;
            }
        }
    }

    tasks
}
