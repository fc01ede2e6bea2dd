//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success (including a run that accepted no rows)       |
//! | 1    | General error (unspecified)                           |
//! | 2    | CLI usage error (bad args, missing file arguments)    |
//! | 3    | No usable data: nothing matched a known export shape  |
//! | 4    | Input read error: no input file could be read         |
//! | 5    | Invalid run config                                    |
//! | 6    | Output write error                                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-6)
// =============================================================================

/// No dataset matched a known shape, or the recognized datasets produced
/// zero candidate rows.
pub const EXIT_NO_USABLE_DATA: u8 = 3;

/// Every input file failed to read (missing, encrypted, unparseable).
/// A batch where only some files fail still succeeds with warnings.
pub const EXIT_INPUT_READ: u8 = 4;

/// Run config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// Ledger or report could not be written.
pub const EXIT_OUTPUT_WRITE: u8 = 6;
