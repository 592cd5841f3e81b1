// This is the main module file for the `utilities` directory.
// It declares the helper submodules shared by the install pipeline.

// Downloading with mirror failover.
pub mod assets;
// Extracting zip and tar.gz bundles.
pub mod compression;
pub mod misc_utils;
// Declare the `path_helpers` module.
pub mod path_helpers;
pub mod platform;
