//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | Files            | Reading and writing input/output files   |
//! | 60-69   | reprice          | Config and run outcome codes             |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into [`exit_code`] or the relevant command

use reprice_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed. Unresolved SKUs alone do not fail a run
/// unless `--strict` is given.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing positionals.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Files (3-9)
// =============================================================================

/// File could not be read or written.
pub const EXIT_IO: u8 = 3;

/// File was read but its content is malformed (missing header or column,
/// unparseable price in a report, broken mapping JSON).
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Reprice (60-69)
// =============================================================================

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// Run completed and files were written, but some SKUs stayed unresolved
/// (only with `--strict`).
pub const EXIT_UNRESOLVED: u8 = 61;

/// Map an engine error to its exit code.
pub fn exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Io(_) => EXIT_IO,
        ReconError::MissingHeader { .. }
        | ReconError::MissingColumn { .. }
        | ReconError::PriceParse { .. }
        | ReconError::Csv { .. }
        | ReconError::Mapping(_) => EXIT_PARSE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_share_a_code() {
        assert_eq!(exit_code(&ReconError::ConfigParse("x".into())), EXIT_INVALID_CONFIG);
        assert_eq!(exit_code(&ReconError::ConfigValidation("x".into())), EXIT_INVALID_CONFIG);
    }

    #[test]
    fn file_errors() {
        assert_eq!(exit_code(&ReconError::Io("gone".into())), EXIT_IO);
        let missing = ReconError::MissingColumn {
            source: "old.csv".into(),
            column: "Start price".into(),
        };
        assert_eq!(exit_code(&missing), EXIT_PARSE);
    }
}
