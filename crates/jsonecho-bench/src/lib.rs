//! Shared fixtures for the jsonecho benchmarks.
//!
//! - request builders wrapping the small and large payloads
//! - a pre-flight echo check run before timing starts
//! - an allocation-counting global allocator

use bytes::Bytes;
use jsonecho_core::payload::SMALL_PAYLOAD;
use jsonecho_core::{EchoConfig, Method, Request, RequestBuilder, StatusCode, Value, Variant};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

// ============================================================================
// Requests
// ============================================================================

/// The small fixed payload
pub fn small_payload() -> Bytes {
    Bytes::from_static(SMALL_PAYLOAD.as_bytes())
}

/// POST `/` carrying `payload`
///
/// Cloning `Bytes` is a refcount bump, so building a request per iteration
/// does not copy the payload.
pub fn request(payload: &Bytes) -> Request {
    RequestBuilder::new(Method::Post, "/")
        .header("content-type", "application/json")
        .body(payload.clone())
        .build()
}

// ============================================================================
// Pre-flight check
// ============================================================================

/// Why a variant failed the pre-flight check
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{variant}: expected 200, got {status}: {body}")]
    Status {
        variant: Variant,
        status: StatusCode,
        body: String,
    },

    #[error("{variant}: response is not JSON: {source}")]
    NotJson {
        variant: Variant,
        #[source]
        source: serde_json::Error,
    },

    #[error("{variant}: payload is not JSON: {source}")]
    BadPayload {
        variant: Variant,
        #[source]
        source: serde_json::Error,
    },

    #[error("{variant}: echoed document differs from the payload")]
    Mismatch { variant: Variant },
}

/// Run `variant` once on `payload` and verify it echoes the document.
///
/// The timed loops discard responses, so a handler that fails every call
/// would only skew timings; this catches that before measuring.
pub fn check_echo(variant: Variant, payload: &Bytes) -> Result<(), CheckError> {
    let res = variant.handle(request(payload), EchoConfig::default());
    if res.status != StatusCode::OK {
        return Err(CheckError::Status {
            variant,
            status: res.status,
            body: res.body_string().unwrap_or_default(),
        });
    }

    let echoed: Value = serde_json::from_slice(&res.body)
        .map_err(|source| CheckError::NotJson { variant, source })?;
    let expected: Value = serde_json::from_slice(payload)
        .map_err(|source| CheckError::BadPayload { variant, source })?;

    if echoed != expected {
        return Err(CheckError::Mismatch { variant });
    }
    Ok(())
}

// ============================================================================
// Allocation Counting Allocator
// ============================================================================

/// Wraps the system allocator and counts allocations and allocated bytes.
///
/// Counts are process-wide, so the pipe relay thread's allocations are
/// included.
pub struct CountingAllocator {
    allocations: AtomicUsize,
    bytes: AtomicUsize,
}

/// Counter values at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocSnapshot {
    pub allocations: usize,
    pub bytes: usize,
}

impl CountingAllocator {
    pub const fn new() -> Self {
        Self {
            allocations: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> AllocSnapshot {
        AllocSnapshot {
            allocations: self.allocations.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }

    /// Average allocations and bytes per call of `f` over `iterations` calls
    pub fn per_iteration<F: FnMut()>(&self, iterations: usize, mut f: F) -> AllocSnapshot {
        let iterations = iterations.max(1);
        let before = self.snapshot();
        for _ in 0..iterations {
            f();
        }
        let after = self.snapshot();

        AllocSnapshot {
            allocations: (after.allocations - before.allocations) / iterations,
            bytes: (after.bytes - before.bytes) / iterations,
        }
    }

    fn record(&self, size: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(size, Ordering::Relaxed);
    }
}

impl Default for CountingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.record(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.record(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            self.record(new_size);
        }
        new_ptr
    }
}

/// Print allocations per request for every variant on `payload`
pub fn report_allocations(allocator: &CountingAllocator, label: &str, payload: &Bytes) {
    for variant in Variant::ALL {
        let stats = allocator.per_iteration(16, || {
            let res = variant.handle(request(payload), EchoConfig::default());
            std::hint::black_box(res);
        });
        eprintln!(
            "{}/{}: {} allocs/op, {} B/op",
            label, variant, stats.allocations, stats.bytes
        );
    }
}
