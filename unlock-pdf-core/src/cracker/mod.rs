//! Parallel candidate dispatcher.
//!
//! The dispatcher parses the encryption metadata once, lets the non-password
//! handlers resolve the document if they can, and otherwise drives the
//! applicable password handlers over a candidate source with a pool of
//! worker threads. The first match wins; in-flight workers finish their
//! current candidate and exit.

mod progress;
mod source;

pub use source::{AlphabetSpec, BruteForce, CandidateSource, MemorySource, WordlistFile};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, UnlockError};
use crate::handlers::SecurityHandler;
use crate::parser::{parse_encrypt_info, EncryptInfo};
use progress::Progress;
use source::BruteTask;

/// Progress cadence for streamed and in-memory sources.
const STREAM_PROGRESS_STEP: usize = 100;
/// Progress cadence for the brute-force loops.
const BRUTE_PROGRESS_STEP: usize = 1000;

/// Outcome of a password search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrackResult {
    /// A password was recovered, or none was needed
    pub success: bool,
    /// The recovered password, empty if none
    pub password: String,
    /// Label of the handler and role that accepted it
    pub variant: String,
    /// Candidates actually tested
    pub passwords_tried: usize,
    /// Total candidates, 0 when unknown up front
    pub total_passwords: usize,
}

/// Shared search state: the found flag is release-acquire, the winning
/// candidate is published under the mutex by whichever worker gets there
/// first.
struct SearchState {
    found: AtomicBool,
    tried: AtomicUsize,
    outcome: Mutex<Option<(String, String)>>,
}

impl SearchState {
    fn new() -> Self {
        Self {
            found: AtomicBool::new(false),
            tried: AtomicUsize::new(0),
            outcome: Mutex::new(None),
        }
    }

    fn publish(&self, password: &str, variant: String) {
        let mut slot = self.outcome.lock().unwrap_or_else(|e| e.into_inner());
        if !self.found.load(Ordering::Relaxed) {
            self.found.store(true, Ordering::Release);
            println!("\nPASSWORD FOUND [{variant}]: {password}");
            *slot = Some((password.to_string(), variant));
        }
    }

    fn into_outcome(self) -> Option<(String, String)> {
        self.outcome
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// Search a candidate source for a working password.
///
/// Non-password protections (unencrypted documents, certificate-based
/// encryption) resolve before any candidate is pulled. Returns
/// [`UnlockError::UnsupportedProtection`] when no handler accepts the
/// document at all.
pub fn crack(
    pdf_bytes: &[u8],
    candidates: &dyn CandidateSource,
    handlers: &[Box<dyn SecurityHandler>],
    thread_count: usize,
) -> Result<CrackResult> {
    let info = parse_encrypt_info(pdf_bytes)?;

    if let Some(result) = resolve_without_password(&info, handlers) {
        return Ok(result);
    }

    let active = active_password_handlers(&info, handlers)?;
    if candidates.total() == Some(0) {
        return Err(UnlockError::EmptyCandidateSource);
    }

    let total = candidates.total().unwrap_or(0);
    let thread_count = effective_thread_count(thread_count, candidates.total());
    debug!(thread_count, total, "starting candidate search");

    let state = SearchState::new();
    let progress = Progress::new(total);

    thread::scope(|scope| {
        for _ in 0..thread_count {
            scope.spawn(|| {
                loop {
                    if state.found.load(Ordering::Relaxed) {
                        break;
                    }
                    let Some(candidate) = candidates.next() else {
                        break;
                    };
                    let attempt = state.tried.fetch_add(1, Ordering::Relaxed) + 1;
                    if state.found.load(Ordering::Acquire) {
                        break;
                    }

                    if let Some(variant) = check_candidate(&candidate, &info, &active) {
                        state.publish(&candidate, variant);
                        break;
                    }

                    if attempt % STREAM_PROGRESS_STEP == 0 {
                        progress.emit(attempt);
                    }
                }
            });
        }
    });

    progress.finish();

    if let Some(error) = candidates.take_error() {
        return Err(error);
    }

    Ok(finish_result(state, total))
}

/// Brute-force search over an alphabet and length range.
///
/// Prefix tasks are dispensed from an atomic counter; each worker enumerates
/// the suffix positions of its task locally, re-checking the found flag as
/// it goes.
pub fn crack_brute_force(
    pdf_bytes: &[u8],
    brute: &BruteForce,
    handlers: &[Box<dyn SecurityHandler>],
    thread_count: usize,
) -> Result<CrackResult> {
    let info = parse_encrypt_info(pdf_bytes)?;

    if let Some(result) = resolve_without_password(&info, handlers) {
        return Ok(result);
    }

    let active = active_password_handlers(&info, handlers)?;
    let thread_count = effective_thread_count(thread_count, None);
    debug!(
        thread_count,
        tasks = brute.task_count(),
        "starting brute-force search"
    );

    let state = SearchState::new();
    let progress = Progress::new(0);

    thread::scope(|scope| {
        for _ in 0..thread_count {
            scope.spawn(|| {
                while !state.found.load(Ordering::Relaxed) {
                    let Some(task) = brute.take_task() else {
                        break;
                    };
                    run_brute_task(task, brute.alphabet(), &info, &active, &state, &progress);
                }
            });
        }
    });

    progress.finish();

    Ok(finish_result(state, brute.total_combinations().unwrap_or(0)))
}

fn run_brute_task(
    task: &BruteTask,
    alphabet: &[char],
    info: &EncryptInfo,
    active: &[&dyn SecurityHandler],
    state: &SearchState,
    progress: &Progress,
) {
    let prefix_chars = task.prefix.chars().count();
    let suffix_positions = task.target_length - prefix_chars;

    if suffix_positions == 0 {
        state.tried.fetch_add(1, Ordering::Relaxed);
        if let Some(variant) = check_candidate(&task.prefix, info, active) {
            state.publish(&task.prefix, variant);
        }
        return;
    }

    let mut indices = vec![0usize; suffix_positions];
    let mut candidate = String::with_capacity(task.target_length * 4);

    while !state.found.load(Ordering::Acquire) {
        candidate.clear();
        candidate.push_str(&task.prefix);
        for &index in &indices {
            candidate.push(alphabet[index]);
        }

        let attempt = state.tried.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(variant) = check_candidate(&candidate, info, active) {
            state.publish(&candidate, variant);
            return;
        }
        if attempt % BRUTE_PROGRESS_STEP == 0 {
            progress.emit(attempt);
        }

        // odometer over the suffix positions, most significant first
        let mut pos = suffix_positions;
        while pos > 0 {
            pos -= 1;
            indices[pos] += 1;
            if indices[pos] < alphabet.len() {
                break;
            }
            indices[pos] = 0;
        }
        if pos == 0 && indices[0] == 0 {
            return;
        }
    }
}

fn check_candidate(
    candidate: &str,
    info: &EncryptInfo,
    active: &[&dyn SecurityHandler],
) -> Option<String> {
    active
        .iter()
        .find_map(|handler| handler.check(candidate, info))
}

fn resolve_without_password(
    info: &EncryptInfo,
    handlers: &[Box<dyn SecurityHandler>],
) -> Option<CrackResult> {
    for handler in handlers {
        if !handler.applies(info) || handler.requires_password() {
            continue;
        }
        if let Some(resolution) = handler.resolve_without_password(info) {
            if resolution.success {
                println!(
                    "PASSWORD FOUND [{}]: {}",
                    resolution.variant, resolution.password
                );
            } else {
                println!(
                    "Detected {}. Password search is not applicable for this protection.",
                    resolution.variant
                );
            }
            return Some(CrackResult {
                success: resolution.success,
                password: resolution.password,
                variant: resolution.variant,
                passwords_tried: 0,
                total_passwords: 0,
            });
        }
    }
    None
}

fn active_password_handlers<'a>(
    info: &EncryptInfo,
    handlers: &'a [Box<dyn SecurityHandler>],
) -> Result<Vec<&'a dyn SecurityHandler>> {
    let active: Vec<&dyn SecurityHandler> = handlers
        .iter()
        .filter(|handler| handler.requires_password() && handler.applies(info))
        .map(|handler| handler.as_ref())
        .collect();

    if active.is_empty() {
        return Err(UnlockError::UnsupportedProtection);
    }
    Ok(active)
}

/// Requested thread count, else hardware concurrency; floor 1, and capped at
/// the candidate count for bounded in-memory sources.
fn effective_thread_count(requested: usize, bounded_total: Option<usize>) -> usize {
    let mut count = if requested == 0 {
        num_cpus::get()
    } else {
        requested
    };
    count = count.max(1);
    if let Some(total) = bounded_total {
        if total > 0 {
            count = count.min(total);
        }
    }
    count
}

fn finish_result(state: SearchState, total: usize) -> CrackResult {
    let attempted = state.tried.load(Ordering::Relaxed);
    let outcome = state.into_outcome();

    let mut result = CrackResult {
        passwords_tried: attempted,
        total_passwords: if total == 0 || total < attempted {
            attempted
        } else {
            total
        },
        ..Default::default()
    };

    match outcome {
        Some((password, variant)) => {
            result.success = true;
            println!("Password found: {password}");
            result.password = password;
            result.variant = variant;
        }
        None => {
            println!("Password not found in the provided candidates");
        }
    }
    result
}
