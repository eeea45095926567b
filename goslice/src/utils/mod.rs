//! Utilities module for goslice.

mod paths;

pub use paths::{
    absolutize, check_destination, normalize_display_path, package_dir, resolve_report_path,
    ResolvedSource,
};
