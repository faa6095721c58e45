//! 单个区域的多线程裁决
//!
//! 图只读共享；每个工作线程从 [`BufferPool`] 检出私有的 DP 缓冲区，比对完一条 read 立即归还。
//! 单条 read 的失败只记录并计数，不会中断整批。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::adjudicator::{Adjudicator, AdjudicatorConfig};
use super::read::Read;
use super::report::{AlignmentReport, ReportSink};
use crate::align::{align_with_buf, BufferPool, GraphMapping, ScoringBuffer};
use crate::error::AlignError;
use crate::graph::VariantGraph;
use crate::util::dna;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 工作线程数，0 表示由 rayon 决定
    pub threads: usize,
    /// DP 缓冲区数量，0 表示与线程数相同
    pub buffers: usize,
    pub adjudicator: AdjudicatorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            buffers: 0,
            adjudicator: AdjudicatorConfig::default(),
        }
    }
}

#[derive(Debug, Default)]
struct RunStats {
    reads: AtomicU64,
    aligned: AtomicU64,
    failed: AtomicU64,
    supporting: AtomicU64,
    supports: AtomicU64,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub reads: u64,
    pub aligned: u64,
    pub failed: u64,
    /// 至少支持一个等位基因的 read 数
    pub supporting: u64,
    pub supports: u64,
}

/// 一次运行的上下文：裁决器、报告收集器和计数，由调用方创建并显式传入
#[derive(Debug, Default)]
pub struct RunContext {
    adjudicator: Adjudicator,
    reports: ReportSink,
    stats: RunStats,
}

impl RunContext {
    pub fn new(config: AdjudicatorConfig) -> Self {
        Self {
            adjudicator: Adjudicator::new(config),
            reports: ReportSink::new(),
            stats: RunStats::default(),
        }
    }

    pub fn reports(&self) -> &ReportSink {
        &self.reports
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            reads: self.stats.reads.load(Ordering::Relaxed),
            aligned: self.stats.aligned.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            supporting: self.stats.supporting.load(Ordering::Relaxed),
            supports: self.stats.supports.load(Ordering::Relaxed),
        }
    }

    /// 结束运行，交出报告收集器以便输出
    pub fn finish(self) -> (RunSummary, ReportSink) {
        let summary = self.summary();
        (summary, self.reports)
    }
}

/// 比对并裁决一条 read，返回它支持的等位基因数
pub fn process_read(
    graph: &VariantGraph,
    read: &Read,
    ctx: &RunContext,
    buf: &mut ScoringBuffer,
) -> Result<usize, AlignError> {
    let config = ctx.adjudicator.config();
    let forward = align_with_buf(graph, read.sequence(), buf);

    let (mapping, flipped, aligned): (GraphMapping, bool, Vec<u8>) = if config.align_both_strands {
        let rc = dna::revcomp(read.sequence());
        let reverse = align_with_buf(graph, &rc, buf);
        match (forward, reverse) {
            (Ok(f), Ok(r)) if r.score > f.score => (r, true, rc),
            (Ok(f), _) => (f, false, read.sequence().to_vec()),
            (Err(AlignError::NoAlignment), Ok(r)) => (r, true, rc),
            (Err(e), _) => return Err(e),
        }
    } else {
        (forward?, false, read.sequence().to_vec())
    };

    let mapping = Arc::new(mapping);
    let supports = ctx
        .adjudicator
        .adjudicate(graph, read, Arc::clone(&mapping), flipped);
    if config.collect_reports {
        let report = AlignmentReport::new(graph, read, &aligned, mapping, flipped);
        ctx.reports.submit(report);
    }
    Ok(supports.len())
}

/// 多线程处理一个区域内的全部 read
pub fn run_region(
    graph: &VariantGraph,
    reads: &[Read],
    ctx: &RunContext,
    config: &PipelineConfig,
) -> Result<RunSummary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let buffers = if config.buffers > 0 {
        config.buffers
    } else {
        pool.current_num_threads()
    };
    let buffer_pool = BufferPool::new(buffers);
    let before = ctx.summary();

    pool.install(|| {
        reads.par_iter().for_each(|read| {
            ctx.stats.reads.fetch_add(1, Ordering::Relaxed);
            let mut buf = buffer_pool.checkout();
            match process_read(graph, read, ctx, &mut buf) {
                Ok(n) => {
                    ctx.stats.aligned.fetch_add(1, Ordering::Relaxed);
                    if n > 0 {
                        ctx.stats.supporting.fetch_add(1, Ordering::Relaxed);
                        ctx.stats.supports.fetch_add(n as u64, Ordering::Relaxed);
                    } else {
                        debug!("read {} supports no allele", read.id());
                    }
                }
                Err(AlignError::NoAlignment) => {
                    ctx.stats.failed.fetch_add(1, Ordering::Relaxed);
                    debug!("read {}: {}", read.id(), AlignError::NoAlignment);
                }
                Err(e) => {
                    ctx.stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("read {}: {}", read.id(), e);
                }
            }
        });
    });

    let after = ctx.summary();
    let summary = RunSummary {
        reads: after.reads - before.reads,
        aligned: after.aligned - before.aligned,
        failed: after.failed - before.failed,
        supporting: after.supporting - before.supporting,
        supports: after.supports - before.supports,
    };
    info!(
        "{}: {} reads, {} aligned, {} failed, {} supporting ({} threads, {} buffers)",
        graph.region(),
        summary.reads,
        summary.aligned,
        summary.failed,
        summary.supporting,
        pool.current_num_threads(),
        buffer_pool.capacity()
    );
    Ok(summary)
}
