//! Logging that a module can silence wholesale.
//!
//! A module opts in by declaring `const ENABLE_LOGS: bool` next to its
//! imports; the macros read that const at the call site, so flipping it to
//! `false` mutes the module without touching the global `env_logger` filter.
//!
//! ```ignore
//! use crate::{log_debug, log_info};
//!
//! const ENABLE_LOGS: bool = true;
//!
//! log_debug!("seek ignored: unknown activity {}", index);
//! ```

/// Shared body of the level macros below.
#[doc(hidden)]
#[macro_export]
macro_rules! gated_log {
    ($level:ident, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::$level!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::gated_log!(info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::gated_log!(warn, $($arg)*) };
}

/// Control-path chatter: ignored operations, seeks, rebuilds.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::gated_log!(debug, $($arg)*) };
}
