/// Check a structural invariant. Panics in debug builds like
/// `debug_assert!`; in release builds logs via `tracing::error!` and
/// continues, since a transfer engine mid-flight shouldn't take the whole
/// process down over a bookkeeping inconsistency.
macro_rules! safe_assert {
    ($cond:expr $(,)?) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!($cond);
        }
        #[cfg(not(debug_assertions))]
        {
            if !$cond {
                tracing::error!("invariant violated: {}", stringify!($cond));
            }
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!($cond, $($arg)+);
        }
        #[cfg(not(debug_assertions))]
        {
            if !$cond {
                tracing::error!("invariant violated: {}", format!($($arg)+));
            }
        }
    };
}

pub(crate) use safe_assert;
