//! 演示如何在 library 模式下对一个区域做等位基因裁决。
//!
//! 运行方式：
//! ```bash
//! cargo run --example adjudicate_region
//! ```

use std::sync::Arc;

use graph_adjudicator::adjudicate::{
    run_region, AdjudicatorConfig, CountTable, PipelineConfig, Read, RunContext, Sample,
};
use graph_adjudicator::align::ScoringParams;
use graph_adjudicator::graph::VariantGraph;
use graph_adjudicator::reference::InMemoryReference;
use graph_adjudicator::region::{Based, Region};
use graph_adjudicator::variant::{Variant, VariantList};

fn main() -> anyhow::Result<()> {
    // 1. 参考序列与区域
    let seq = b"TTGACCGTAGCTGATCGTAGCTAGCTAGCTGATCGTAGCTAGCTAGCTGATC";
    let mut reference = InMemoryReference::new();
    reference.insert("ref1", seq);
    let region = Region::new("ref1", 0, seq.len() as u32, Based::Zero)
        .ok_or_else(|| anyhow::anyhow!("bad region"))?;
    println!("区域: {} ({} bp)", region, region.len());

    // 2. 两个变异：一个 SNP（C>G），一个缺失（CTG>C）
    let variants = VariantList::new(vec![
        Variant::new("ref1", 20, Based::Zero, "C", vec![b"G".to_vec()]).with_id("snp1"),
        Variant::new("ref1", 28, Based::Zero, "CTG", vec![b"C".to_vec()]).with_id("del1"),
    ]);

    // 3. 构图
    let mut cursor = variants.cursor_for(&region);
    let graph = VariantGraph::build(&reference, &mut cursor, &region, ScoringParams::default())?;
    println!("图: {} 个节点, {} 条边", graph.len(), graph.edge_count());
    graph.write_dot(&mut std::io::stdout())?;

    // 4. 构造几条 read：参考、携带 SNP、携带缺失
    let mut with_snp = seq.to_vec();
    with_snp[20] = b'G';
    let mut with_del = seq.to_vec();
    with_del.drain(29..31);
    let sample = Arc::new(Sample::new("demo", "rg1"));
    let reads = vec![
        Read::new("ref", seq[5..45].to_vec(), Arc::clone(&sample)),
        Read::new("snp", with_snp[5..45].to_vec(), Arc::clone(&sample)),
        Read::new("del", with_del[5..43].to_vec(), Arc::clone(&sample)),
    ];

    // 5. 裁决
    let config = PipelineConfig {
        threads: 2,
        buffers: 0,
        adjudicator: AdjudicatorConfig::default(),
    };
    let ctx = RunContext::new(config.adjudicator);
    let summary = run_region(&graph, &reads, &ctx, &config)?;
    println!(
        "reads: {}, 支持等位基因的 reads: {}",
        summary.reads, summary.supporting
    );

    let (_, sink) = ctx.finish();
    sink.drain(&mut std::io::stdout())?;

    // 6. 计数表
    CountTable::from_variants(graph.variants()).write_tsv(&mut std::io::stdout())?;
    Ok(())
}
