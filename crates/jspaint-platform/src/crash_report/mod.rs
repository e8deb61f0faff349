mod report;
mod sanitize;

pub use report::{install_panic_hook, write_crash_report, CrashReport};
pub use sanitize::sanitize_report_text;
