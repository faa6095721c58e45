//! 裁决：把图比对结果归到具体等位基因并累加计数
//!
//! - [`read`]：read 与样本
//! - [`adjudicator`]：支持判定与置信分档
//! - [`report`]：比对报告及其收集器
//! - [`counts`]：可落盘的计数表
//! - [`pipeline`]：多线程区域驱动

pub mod adjudicator;
pub mod counts;
pub mod pipeline;
pub mod read;
pub mod report;

pub use adjudicator::{Adjudicator, AdjudicatorConfig, AlleleSupport};
pub use counts::{CountMeta, CountTable};
pub use pipeline::{process_read, run_region, PipelineConfig, RunContext, RunSummary};
pub use read::{Read, Sample};
pub use report::{AlignmentReport, ReportSink};
