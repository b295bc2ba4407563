//! Turn scientific PDFs into narrated audio.
//!
//! Text flows through fixed stages: extraction ([`document`]), normalization
//! and reference filtering ([`text`], driven by [`pipeline`]), chunking, and
//! per-chunk narration ([`narration`]).

pub mod config;
pub mod document;
pub mod error;
pub mod narration;
pub mod output;
pub mod pipeline;
pub mod text;
