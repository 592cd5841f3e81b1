// Command-line surface of `driver-installer`.

// Top-level parser, global flags and subcommands.
pub mod cmd_enums;
