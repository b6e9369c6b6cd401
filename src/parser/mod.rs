// Temporal label parser module

pub mod date;
pub mod lexer;

// Public API re-exports
pub use date::{month_number, parse_temporal_fragment, TemporalFragment};
