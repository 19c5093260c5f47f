//! PDF assembly.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `geometry` | Paper formats, units, orientation, margins |
//! | `layout` | Fit-and-centre placement of one image |
//! | `assembler` | Document construction and export naming |
//!
//! # Example
//!
//! ```ignore
//! use page_capture::pdf::{PageGeometry, PaperFormat, write_pdf};
//!
//! let geometry = PageGeometry::default().with_format(PaperFormat::Letter);
//! let path = write_pdf(&records, &geometry, "./out")?;
//! ```

pub mod assembler;
pub mod geometry;
pub mod layout;

pub use assembler::{build_pdf, export_filename, write_pdf};
pub use geometry::{Orientation, PageGeometry, PaperFormat, Unit};
pub use layout::{Placement, fit_image};
