//! Utility macros shared by the crate internals.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Works like `assert!`, except that a failed check becomes an `Err` instead of a panic.
///
/// ```ignore
/// ensure!(n <= len, BufferError::out_of_range(n, len));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error.into());
        }
    };
}

pub(crate) use ensure;
