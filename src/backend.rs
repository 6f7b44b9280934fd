//! Process-wide numeric backend initialization.
//!
//! The batch integrator distributes trajectories over the global rayon pool.
//! That pool can only be configured once per process and must be configured
//! before anything else touches rayon, so [`init`] should be the first call
//! in any program using this crate. Repeated calls are no-ops that return the
//! configuration recorded by the first one.

use std::num::NonZeroUsize;
use std::sync::OnceLock;

/// Configuration fixed by the first call to [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendInfo {
    /// Number of worker threads (logical devices) in the global pool.
    pub workers: usize,

    /// Floating-point precision used for every state and parameter value.
    pub precision_bits: u32,
}

/// Width of the floating-point type used for all model arithmetic.
pub const F64_BITS: u32 = (std::mem::size_of::<f64>() * 8) as u32;

static BACKEND: OnceLock<BackendInfo> = OnceLock::new();

/// Number of logical cores available to this process.
pub fn host_core_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Fix the global worker count to the host's core count.
///
/// Safe to call any number of times; only the first call has an effect.
pub fn init() -> BackendInfo {
    init_with_workers(0)
}

/// Like [`init`], but with an explicit worker count (`0` = one per core).
pub fn init_with_workers(workers: usize) -> BackendInfo {
    *BACKEND.get_or_init(|| {
        let target = if workers == 0 {
            host_core_count()
        } else {
            workers
        };

        // Fails only if some other code already built the global pool.
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(target)
            .build_global()
        {
            log::warn!("Global worker pool already initialised: {}", e);
        }

        let info = BackendInfo {
            workers: rayon::current_num_threads(),
            precision_bits: F64_BITS,
        };
        log::info!(
            "Numeric backend: {} workers, {}-bit floats",
            info.workers,
            info.precision_bits
        );
        info
    })
}

/// Configuration recorded by [`init`], if it has run.
pub fn info() -> Option<BackendInfo> {
    BACKEND.get().copied()
}
