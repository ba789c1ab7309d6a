//! structcast - project C struct initializers onto trimmed view layouts
//!
//! This library parses `typedef struct` declarations from a full header and a
//! view header, flattens full-struct brace initializers into their leaf
//! values, and re-renders those values in the shape of the view struct. The
//! generated constant declarations are written into a header that can be
//! compiled for the target, with specifiers like `PROGMEM` attached.
//!
//! # Example
//!
//! ```no_run
//! use structcast::core::{parse_initializer, Projector};
//! use structcast::mapping::Mapping;
//! use structcast::parser::parse_header;
//! use std::path::Path;
//!
//! let full = parse_header(Path::new("full.h"))?;
//! let views = parse_header(Path::new("views.h"))?;
//! let mapping = Mapping::new();
//!
//! let projector = Projector::new(&full, &views, "unit", "unitView", &mapping)?;
//! let init = parse_initializer("{1, 10.5, {2, 3, 1.1, {0.5, 0.6}}}")?;
//! println!("{}", projector.project_value(&init)?);
//! # Ok::<(), structcast::error::CastError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod mapping;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use error::{CastError, CastResult};
pub use types::{ArraySize, Declaration, Field, StructDef, StructRegistry, ViewTree};
