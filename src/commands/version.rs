// This file handles the `driver-installer version` command.
// It prints the tool version along with the driver build it targets on this host.

use crate::libs::utilities::platform::PlatformTag;
use crate::schemas::driver::{DEFAULT_DRIVER_VERSION, TOOL_NAME};
use colored::Colorize;

/// Prints the tool version, the default driver version and the detected platform tag.
pub fn run() {
    println!("{} {}", env!("CARGO_PKG_NAME").bold(), env!("CARGO_PKG_VERSION").green());
    println!("default {} driver: {}", TOOL_NAME, DEFAULT_DRIVER_VERSION.cyan());

    let platform = PlatformTag::detect();
    if platform == PlatformTag::Unknown {
        println!("platform: {}", "unsupported".red());
    } else {
        println!("platform: {}", platform.as_str().cyan());
    }
}
