//! Internal helper macros.

/// Returns `Err($error)` from the enclosing function unless `$predicate` holds.
///
/// Used for input validation on paths where peer bytes must never cause a panic.
///
/// ```ignore
/// ensure!(self.headers < limits.max_headers, ParseError::too_many_headers(limits.max_headers));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
