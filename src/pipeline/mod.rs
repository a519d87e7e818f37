//! Pipeline stages for transcript formatting.
//!
//! Each submodule implements one transformation step. Everything except
//! [`input`] and [`llm`] is pure and synchronous.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ llm ──▶ cleanup ──▶ scan ──▶ render
//! (txt/docx) (markup)  (repair)   (classify + spans) (document model)
//! ```
//!
//! 1. [`input`]: read `.txt`/`.md` as UTF-8, or pull paragraph text out
//!    of a `.docx`
//! 2. [`llm`]: ask the model to mark up the raw transcript, with
//!    timeout and retry
//! 3. [`cleanup`]: deterministic repairs of model output (fences, mojibake,
//!    stray ellipses, blank-line runs)
//! 4. [`scan`]: classify each line with [`classify`] and split it into
//!    styled runs with [`spans`]
//! 5. [`render`]: turn classified lines into an
//!    [`OutputDocument`](crate::document::OutputDocument)

pub mod classify;
pub mod cleanup;
pub mod input;
pub mod llm;
pub mod render;
pub mod scan;
pub mod spans;
