//! Thread pool scoping for one `fit` call.

/// Resolve a user-supplied `threads` value and build a scoped `rayon` pool.
/// `-1` means hardware concurrency; `0` or any other negative value falls
/// back to `1` with a warning (never raises).
pub fn resolve_thread_pool(threads_requested: i32) -> rayon::ThreadPool {
    let hw = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let n = if threads_requested == -1 {
        hw
    } else if threads_requested > 0 {
        (threads_requested as usize).min(hw)
    } else {
        log::warn!("threads={threads_requested} is invalid, defaulting to 1");
        1
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("failed to build a {n}-thread pool ({e}), falling back to a single thread");
            rayon::ThreadPoolBuilder::new().num_threads(1).build().expect("single-threaded pool always builds")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_threads_other_than_minus_one_falls_back_to_one() {
        let pool = resolve_thread_pool(-5);
        assert_eq!(pool.current_num_threads(), 1);
    }

    #[test]
    fn zero_threads_falls_back_to_one() {
        let pool = resolve_thread_pool(0);
        assert_eq!(pool.current_num_threads(), 1);
    }

    #[test]
    fn minus_one_resolves_to_hardware_concurrency() {
        let expected = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let pool = resolve_thread_pool(-1);
        assert_eq!(pool.current_num_threads(), expected);
    }
}
