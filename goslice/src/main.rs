//! Main binary entry point for goslice.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! so that it behaves exactly like the `goslice` binary of `goslice-cli`.

use anyhow::Result;

fn main() -> Result<()> {
    let code = goslice::entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
