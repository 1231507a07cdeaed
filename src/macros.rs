#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Debug line on stderr, only when `POP_DEBUG_DERIVE` is set.
macro_rules! trace {
    ($($arg:tt)*) => {
        if $crate::engine::debug_enabled() {
            eprintln!($($arg)*);
        }
    };
}
