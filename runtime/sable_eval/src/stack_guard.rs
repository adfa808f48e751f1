//! Host-stack safety for deep interpreted recursion.
//!
//! Interpreted recursion maps directly onto host call-stack depth. The
//! frame budget in `CallStack` bounds interpreted depth with a reportable
//! failure; this module makes sure the host stack survives long enough
//! to reach that budget by growing it on demand.
//!
//! - **Native targets**: uses the `stacker` crate to grow the stack.
//! - **WASM targets**: no-op passthrough.

/// Minimum stack space to keep available (100KB red zone).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient host stack space is available before executing `f`.
///
/// Wrap recursive evaluation steps in this; if the remaining stack is
/// below the red zone the stack is grown before `f` runs.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly (WASM manages its own stack).
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_closure_result() {
        assert_eq!(ensure_sufficient_stack(|| 42), 42);
    }

    #[test]
    fn survives_deep_recursion() {
        fn descend(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { descend(n - 1) + 1 })
        }
        assert_eq!(descend(100_000), 100_000);
    }
}
