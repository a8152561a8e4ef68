//! Host CPU capability detection.
//!
//! The parser ships several stage-1 kernels compiled for different SIMD
//! widths; which one may run is a property of the host CPU, resolved once
//! per process and cached. With the `std` feature the x86-64 probe asks the
//! OS/CPUID at runtime, so a binary built for the baseline target still
//! uses AVX2 on hosts that have it. Without `std` the probe degrades to
//! what the binary was compiled for.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// Ranked SIMD instruction-set level usable on the running host.
///
/// Within one architecture family the tiers are totally ordered
/// (`None` < `Sse42` < `Avx2` on x86-64; `None` < `Neon` on aarch64).
/// `None` is an answer, not an error: the portable pipeline handles it
/// when compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTier {
    /// No usable SIMD tier.
    None,
    /// 128-bit vectors (SSE4.2 class).
    Sse42,
    /// 256-bit vectors (AVX2 class).
    Avx2,
    /// 128-bit vectors on aarch64 (NEON is architecturally mandatory).
    Neon,
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Sse42 => "sse4.2",
            Self::Avx2 => "avx2",
            Self::Neon => "neon",
        })
    }
}

const UNRESOLVED: u8 = 0;

static CACHED: AtomicU8 = AtomicU8::new(UNRESOLVED);

fn encode(tier: CapabilityTier) -> u8 {
    match tier {
        CapabilityTier::None => 1,
        CapabilityTier::Sse42 => 2,
        CapabilityTier::Avx2 => 3,
        CapabilityTier::Neon => 4,
    }
}

fn decode(raw: u8) -> CapabilityTier {
    match raw {
        2 => CapabilityTier::Sse42,
        3 => CapabilityTier::Avx2,
        4 => CapabilityTier::Neon,
        _ => CapabilityTier::None,
    }
}

/// Reports the best capability tier of the running host.
///
/// The probe runs at most once per process; subsequent calls return the
/// cached answer. Concurrent first calls may race the probe, but every
/// racer computes the same tier, so the cache is write-once in effect.
#[must_use]
pub fn detect() -> CapabilityTier {
    match CACHED.load(Ordering::Relaxed) {
        UNRESOLVED => {
            let tier = probe();
            CACHED.store(encode(tier), Ordering::Relaxed);
            log::debug!("capability tier resolved: {tier}");
            tier
        }
        raw => decode(raw),
    }
}

/// Clears the cached tier so the next [`detect`] probes again.
///
/// Exists for tests; production code has no reason to call it.
pub fn reset() {
    CACHED.store(UNRESOLVED, Ordering::Relaxed);
}

#[cfg(target_arch = "x86_64")]
fn probe() -> CapabilityTier {
    #[cfg(feature = "std")]
    {
        if std::arch::is_x86_feature_detected!("avx2") {
            CapabilityTier::Avx2
        } else if std::arch::is_x86_feature_detected!("sse4.2") {
            CapabilityTier::Sse42
        } else {
            CapabilityTier::None
        }
    }
    #[cfg(not(feature = "std"))]
    {
        if cfg!(target_feature = "avx2") {
            CapabilityTier::Avx2
        } else if cfg!(target_feature = "sse4.2") {
            CapabilityTier::Sse42
        } else {
            CapabilityTier::None
        }
    }
}

#[cfg(target_arch = "aarch64")]
fn probe() -> CapabilityTier {
    CapabilityTier::Neon
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn probe() -> CapabilityTier {
    CapabilityTier::None
}
