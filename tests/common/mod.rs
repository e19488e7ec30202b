#![allow(dead_code, unused_imports)]

pub use repairkit_test_utils::builders;
pub use repairkit_test_utils::fakes;
pub use repairkit_test_utils::{init_tracing, with_timeout};

/// Shell command that prints each argument on its own line.
#[cfg(unix)]
pub fn print_lines(lines: &[&str]) -> String {
    format!("printf '%s\\n' {}", lines.join(" "))
}
