//! Immutable lookup tables used to resolve numeric codes.
//!
//! The language table is fixed by the format. The type table changes with
//! every data release and is therefore loaded from the classificator file
//! and handed to the container explicitly.

mod languages;
mod types;

pub use languages::{Language, LANGUAGES};
pub use types::TypeTable;
