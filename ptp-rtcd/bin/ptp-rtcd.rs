#![forbid(unsafe_code)]

use std::process;

fn main() {
    let result = ptp_rtcd::daemon_main();
    if let Err(e) = &result {
        eprintln!("ptp-rtcd: {e}");
    }
    process::exit(if result.is_ok() { 0 } else { 1 });
}
