//! Measures how far the stack pointer moves across a chain of recursive calls.

use crate::address_of;
use anyhow::{anyhow, ensure, Result};
use pagewise_addr::Address;
use serde::{Deserialize, Serialize};
use std::{hint::black_box, thread};

/// The direction the stack grows in as frames are pushed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthDirection {
    /// Towards smaller addresses.
    Down,
    /// Towards larger addresses.
    Up,
}

/// A [StackSample] records how many bytes the stack pointer moved by for a number of nested
/// calls.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StackSample {
    /// The number of nested calls.
    pub levels: u64,
    /// The distance between the caller's stack pointer and the deepest one, in bytes.
    pub bytes: u64,
    /// The direction the stack pointer moved in.
    pub direction: GrowthDirection,
}

/// Returns a location inside a fresh stack frame, standing in for the stack pointer.
#[inline(never)]
fn stack_pointer() -> Address {
    let marker = 0u8;
    address_of(black_box(&marker))
}

/// Recurse `levels` times and return the lowest and highest stack pointer seen on the way.
#[inline(never)]
fn stack_pointer_bounds(levels: u64) -> (Address, Address) {
    let here = stack_pointer();
    if levels <= 1 {
        return (here, here);
    }

    let (low, high) = stack_pointer_bounds(black_box(levels - 1));
    (low.min(here), high.max(here))
}

/// Measure the distance the stack pointer moves across `levels` nested calls. A `levels` of
/// zero is measured as a single call.
pub fn measure_stack_growth(levels: u64) -> StackSample {
    let levels = levels.max(1);
    let outer = stack_pointer();
    let (low, high) = stack_pointer_bounds(black_box(levels));

    let sample = if low < outer {
        StackSample { levels, bytes: outer - low, direction: GrowthDirection::Down }
    } else {
        StackSample { levels, bytes: high - outer, direction: GrowthDirection::Up }
    };

    tracing::trace!(target: "pagewise::host", "Measured {sample:?}");
    sample
}

/// The recursion depths to measure: every depth up to ten, then each power of ten up to
/// ten thousand.
pub fn default_schedule() -> Vec<u64> {
    (1..=10).chain([100, 1_000, 10_000]).collect()
}

/// Stack reserved on top of the recursion itself for the measuring thread's own frames.
const STACK_HEADROOM: u64 = 256 << 10;

/// Check that recursing to the deepest of `levels` fits in a stack of `stack_bytes` bytes.
/// The cost of a frame is measured on the calling thread and doubled, as optimisation may
/// lay the deepest frames out differently from the first two.
///
/// ### Takes
/// - `levels`: The recursion depths that will be measured.
/// - `stack_bytes`: The stack size of the thread that will measure them.
///
/// ### Returns
/// - `Ok(())` if the deepest recursion fits.
/// - `Err(_)` if it would overflow the stack.
pub fn ensure_fits_stack(levels: &[u64], stack_bytes: usize) -> Result<()> {
    let deepest = levels.iter().copied().max().unwrap_or(1).max(1);
    let frame_bytes =
        measure_stack_growth(2).bytes.saturating_sub(measure_stack_growth(1).bytes).max(64);

    let needed = deepest
        .checked_mul(frame_bytes * 2)
        .and_then(|bytes| bytes.checked_add(STACK_HEADROOM))
        .unwrap_or(u64::MAX);
    tracing::debug!(target: "pagewise::host", "{deepest} levels of {frame_bytes} byte frames need {needed} bytes of stack");

    ensure!(
        needed <= stack_bytes as u64,
        "Recursing {deepest} levels needs about {} MiB of stack, but only {} MiB is available; raise --stack-mib",
        needed.div_ceil(1 << 20),
        stack_bytes >> 20
    );
    Ok(())
}

/// Run `f` on a dedicated thread with a stack of `stack_bytes` bytes and return its result.
///
/// ### Takes
/// - `stack_bytes`: The stack size of the thread.
/// - `f`: The closure to run.
///
/// ### Returns
/// - `Ok(value)` with the closure's return value.
/// - `Err(_)` if the thread could not be spawned or panicked.
pub fn run_on_stack<F, T>(stack_bytes: usize, f: F) -> Result<T>
where
    F: FnOnce() -> T + Send,
    T: Send,
{
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name("pagewise-stack".to_string())
            .stack_size(stack_bytes)
            .spawn_scoped(scope, f)?;
        handle.join().map_err(|_| anyhow!("Stack probe thread panicked"))
    })
}
