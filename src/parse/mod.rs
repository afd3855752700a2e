//! Configuration text parsing: line splicing, directive classification and
//! global option syntax.

pub mod byte_size;
pub mod directive;
pub mod option;
pub mod splicer;

pub use byte_size::parse_byte_size;
pub use directive::Directive;
pub use option::GlobalOption;
pub use splicer::{LineSplicer, LogicalLine};

/// Maximum length of a physical or logical configuration line, in bytes.
pub const MAX_LINE_LEN: usize = 4096;

/// Maximum length of stored paths (source file, rotation lock file), in bytes.
pub const MAX_PATH_LEN: usize = 1024;
