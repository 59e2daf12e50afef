//! Pipeline stages for transcript-to-average analysis.
//!
//! Each submodule implements one step. Stages are pure functions over text
//! and course lists except [`input`] and [`text`], which touch the
//! filesystem and pdfium.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ normalize ──▶ extract ──────────────────▶ average
//! (file)   (pdfium)  (lines)       │ period    (term headers)   │ dedup
//!                                  │ cascade   (course lines)   └ stats
//!                                  │ special   (broken rows)
//!                                  └ backup    (few courses)
//! ```
//!
//! 1. [`input`]: validate and read the user-supplied file
//! 2. [`text`]: text layer of every page; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`normalize`]: strip invisible characters, unify line breaks
//! 4. [`extract`]: the line scan driving [`period`], [`cascade`] and
//!    [`special`] (whose per-program data lives in [`registry`]), then
//!    [`backup`] and period inference
//! 5. [`average`]: cutoff, [`dedup`] merge, weighted sums
//!
//! [`summary`] reads the transcript's own approved-credit total for
//! cross-checking.

pub mod average;
pub mod backup;
pub mod cascade;
pub mod dedup;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod period;
pub mod registry;
pub mod special;
pub mod summary;
pub mod text;
