// Command-line surface: the clap definitions and the small value enums they use.
pub mod cmd_enums;
pub mod type_enums;
