//! Pipeline stages for PDF extraction and image resolution.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the rendering backend can change without touching the
//! builders.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine ──▶ text ──────────────▶ <module>_text.json
//! (path)    (pdfium)  └─▶ render ─▶ encode ─▶ images/page_<N>[_img_<K>].<ext>
//!                                                   │
//!                                     resolve ◀─────┘  (dataset builders)
//! ```
//!
//! 1. [`input`]   — validate the PDF path, derive the module name
//! 2. [`engine`]  — bind pdfium and open the document
//! 3. [`text`]    — per-page text, blank pages dropped
//! 4. [`render`]  — full-page renders and embedded image objects
//! 5. [`encode`]  — write a `DynamicImage` in its on-disk encoding
//! 6. [`resolve`] — pick the authoritative image for a page

pub mod encode;
pub mod engine;
pub mod input;
pub mod render;
pub mod resolve;
pub mod text;
