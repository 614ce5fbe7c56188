//! Terminal output for the `quire` commands.
//!
//! Everything user-facing goes through here so step counters, colours and
//! the `--verbose` gate stay consistent between `build`, `check` and `init`.

use console::style;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Labelled detail line, only printed with `--verbose`.
///
/// ```ignore
/// debug!("post"; "{}", slug);
/// ```
#[macro_export]
macro_rules! debug {
    ($label:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::detail($label, &format!($($arg)*))
        }
    }};
}

/// Pipeline step, e.g. `[2/5] Rendering posts...`. Verbose only.
pub fn step(n: usize, total: usize, msg: &str) {
    if is_verbose() {
        println!("{} {}", style(format!("[{}/{}]", n, total)).dim(), msg);
    }
}

pub fn detail(label: &str, msg: &str) {
    println!("{} {}", style(format!("  {}", label)).dim(), msg);
}

pub fn info(msg: &str) {
    println!("{} {}", style("•").cyan(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", style("success").cyan(), msg);
}

pub fn passed(msg: &str) {
    println!("{} {}", style("✔").green(), msg);
}

pub fn warn(msg: &str) {
    println!("{} {}", style("!").yellow(), style(msg).yellow());
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("✖").red(), style(msg).red());
}

pub fn header(msg: &str) {
    println!("{}", style(msg).bold());
}
