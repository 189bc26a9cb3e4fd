pub mod algorithm;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod progressive;
pub mod render;
pub mod size;
pub mod testcase;
pub mod validate;
pub mod worker;

pub use crate::{
    engine::{
        align_for_sync_scroll, classify_size, compute_inline_diff, compute_line_diff, DiffEngine, DiffOutput,
        EngineChoice,
    },
    error::WorkerError,
    render::RenderMode,
};
