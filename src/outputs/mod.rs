//! Output generation for rendered pages.
//!
//! # Submodules
//!
//! - [`html`]: Listing and detail pages as standalone HTML documents
//! - [`json`]: Listing pages as JSON with linkified summaries
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── page-1.html
//! ├── page-1.json          # with --json
//! ├── article-65f1c0.html  # with --details, or from `show`
//! └── ...
//! ```

pub mod html;
pub mod json;
