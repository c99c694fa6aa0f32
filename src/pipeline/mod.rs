//! Conversion pipeline stages.
//!
//! ```text
//! upload ─▶ input (workspace) ─▶ inspect (lopdf) ─▶ engine (pdf2docx)
//!                                                      │
//!                                   translate (google) ◀┘
//!                                          │
//!                                   export (soffice)
//! ```

pub mod engine;
pub mod export;
pub mod google;
pub mod input;
pub mod inspect;
pub mod translate;
