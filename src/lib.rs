pub mod config;
pub mod error;
pub mod storage;
pub mod identity;
pub mod routing;
pub mod api;
pub mod server;
pub mod app;

// Test-only printing helper: expands to eprintln! during tests and debug builds and is absent otherwise.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}

/// Shorten a bearer/refresh token for log lines; never log the full value.
pub fn token_prefix(token: &str) -> &str {
    let end = token.char_indices().nth(12).map(|(i, _)| i).unwrap_or(token.len());
    &token[..end]
}
