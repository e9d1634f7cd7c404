//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - store records or entity attributes unusable
pub const CONFIG_ERROR: i32 = 2;

/// Secrets error - conflicting or missing chart secrets
pub const SECRETS_ERROR: i32 = 3;

/// Command error - a shelled-out tool exited non-zero
pub const COMMAND_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
