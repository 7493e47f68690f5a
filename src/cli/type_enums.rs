use std::fmt;
use std::str::FromStr;

/// Process exit codes. Every command handler ends with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitResult {
    Success,            // 0 - Command completed (also used for Ctrl-C)
    UnhandledException, // 1 - An error escaped every handler
    InvalidOptions,     // 2 - Malformed command line or unusable input
    NotFound,           // 4 - A named input file does not exist
    ServerError,        // 5 - Reserved for remote tool sources
    ErrorInResults,     // 6 - An external tool reported failure
    UnknownError,       // 7 - Anything else
}

impl ExitResult {
    pub fn code(self) -> i32 {
        match self {
            ExitResult::Success => 0,
            ExitResult::UnhandledException => 1,
            ExitResult::InvalidOptions => 2,
            ExitResult::NotFound => 4,
            ExitResult::ServerError => 5,
            ExitResult::ErrorInResults => 6,
            ExitResult::UnknownError => 7,
        }
    }
}

impl fmt::Display for ExitResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExitResult::Success => write!(f, "SUCCESS"),
            ExitResult::UnhandledException => write!(f, "UNHANDLED_EXCEPTION"),
            ExitResult::InvalidOptions => write!(f, "INVALID_OPTIONS"),
            ExitResult::NotFound => write!(f, "NOT_FOUND"),
            ExitResult::ServerError => write!(f, "SERVER_ERROR"),
            ExitResult::ErrorInResults => write!(f, "ERROR_IN_RESULTS"),
            ExitResult::UnknownError => write!(f, "UNKNOWN_ERROR"),
        }
    }
}

/// Heap model handed to the bytecode translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapModel {
    General, // One polymorphic heap map
    Split,   // One map per field
}

impl FromStr for HeapModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(HeapModel::General),
            "split" => Ok(HeapModel::Split),
            _ => Err(format!(
                "Invalid heap model '{s}'. Must be one of: general, split"
            )),
        }
    }
}

impl fmt::Display for HeapModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HeapModel::General => write!(f, "general"),
            HeapModel::Split => write!(f, "split"),
        }
    }
}
