use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use super::read::Read;
use crate::align::{CigarOp, GraphMapping, NodeCigar};
use crate::graph::{NodeId, VariantGraph};
use crate::variant::{Allele, ConfidenceTier, Variant};

/// 裁决策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjudicatorConfig {
    /// 等位基因节点上允许的最大编辑数（错配 + 插入 + 缺失）
    pub max_edits: u32,
    /// 短于该长度的替代等位基因必须完全匹配才计为支持
    pub min_alt_length_for_partial: usize,
    /// 同时比对反向互补序列并取得分较高者
    pub align_both_strands: bool,
    /// 是否为每条 read 生成比对报告
    pub collect_reports: bool,
}

impl Default for AdjudicatorConfig {
    fn default() -> Self {
        Self {
            max_edits: 2,
            min_alt_length_for_partial: 4,
            align_both_strands: false,
            collect_reports: true,
        }
    }
}

/// 一条 read 对某个变异位点上某个等位基因的支持
#[derive(Debug, Clone)]
pub struct AlleleSupport {
    pub variant: Arc<Variant>,
    pub allele: Arc<Allele>,
    pub node: NodeId,
    pub is_reference: bool,
    pub tier: ConfidenceTier,
    pub reverse: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Adjudicator {
    config: AdjudicatorConfig,
}

impl Adjudicator {
    pub fn new(config: AdjudicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdjudicatorConfig {
        &self.config
    }

    /// 比对得分占 read 满分的百分比所对应的分档；有并列最优路径时为 Ambiguous
    pub fn tier(
        &self,
        graph: &VariantGraph,
        mapping: &GraphMapping,
        read_len: usize,
    ) -> ConfidenceTier {
        if mapping.ambiguous {
            return ConfidenceTier::Ambiguous;
        }
        let max = i64::from(graph.scoring().max_score(read_len));
        if max <= 0 {
            return ConfidenceTier::Low;
        }
        let percent = i64::from(mapping.score).max(0) * 100 / max;
        ConfidenceTier::from_percent(percent.min(100) as u32)
    }

    /// 计算路径上每个变异位点被支持的等位基因，不改动任何计数
    ///
    /// `flipped` 表示比对用的是 read 的反向互补序列。
    pub fn supports(
        &self,
        graph: &VariantGraph,
        read: &Read,
        mapping: &GraphMapping,
        flipped: bool,
    ) -> Vec<AlleleSupport> {
        let tier = self.tier(graph, mapping, read.len());
        let reverse = read.is_reverse() != flipped;
        let last = mapping.path.len().saturating_sub(1);

        let mut out = Vec::new();
        for (k, step) in mapping.path.iter().enumerate() {
            let node = graph.node(step.node);
            let Some(variant) = graph.variant_of(step.node) else {
                continue;
            };
            // 空等位基因只有被路径穿过时才算数；非空节点必须被完整覆盖
            let spanned = if node.is_empty() {
                k > 0 && k < last
            } else {
                step.cigar.ref_len() as usize == node.len()
            };
            if !spanned {
                debug!(
                    "read {}: node {} only partially covered",
                    read.id(),
                    step.node
                );
                continue;
            }
            // 空节点自身没有 CIGAR，改以两侧紧邻接合点的操作计编辑数
            let edits = if node.is_empty() {
                junction_edits(&mapping.path, k)
            } else {
                step.cigar.edit_count()
            };
            if edits > self.config.max_edits {
                debug!("read {}: node {} has {} edits", read.id(), step.node, edits);
                continue;
            }
            let short_alt =
                !node.is_reference() && node.len() < self.config.min_alt_length_for_partial;
            if short_alt && edits > 0 {
                continue;
            }
            out.push(AlleleSupport {
                variant: Arc::clone(variant),
                allele: Arc::clone(node.allele()),
                node: step.node,
                is_reference: node.is_reference(),
                tier,
                reverse,
            });
        }
        out
    }

    /// 把比对结果计入等位基因计数并挂到 read 上。
    ///
    /// 每条 read 只能裁决一次：内部不去重，重复调用会让计数翻倍。
    pub fn adjudicate(
        &self,
        graph: &VariantGraph,
        read: &Read,
        mapping: Arc<GraphMapping>,
        flipped: bool,
    ) -> Vec<AlleleSupport> {
        let supports = self.supports(graph, read, &mapping, flipped);
        let sample = read.sample().name();
        for s in &supports {
            s.allele.increment(sample, s.tier, s.reverse);
        }
        read.push_mappings([mapping]);
        supports
    }
}

/// 空节点 `k` 两侧接合点上的编辑数：前一个非空 CIGAR 的末个操作与后一个非空 CIGAR 的首个操作
fn junction_edits(path: &[NodeCigar], k: usize) -> u32 {
    let before = path[..k].iter().rev().find_map(|nc| nc.cigar.ops().last().copied());
    let after = path[k + 1..].iter().find_map(|nc| nc.cigar.ops().first().copied());
    [before, after]
        .into_iter()
        .flatten()
        .filter(|&(op, _)| op != CigarOp::Match)
        .map(|(_, n)| n)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjudicate::read::Sample;
    use crate::align::{self, AlignMode, Cigar, ScoringParams};
    use crate::reference::InMemoryReference;
    use crate::region::{Based, Region};
    use std::collections::VecDeque;

    const UPSTREAM: &[u8] = b"ACGTACGGCA";
    const DOWNSTREAM: &[u8] = b"GCATTCAGGA";

    fn graph_with(reference_allele: &[u8], alt: &[u8]) -> VariantGraph {
        let seq = [UPSTREAM, reference_allele, DOWNSTREAM].concat();
        let mut reference = InMemoryReference::new();
        reference.insert("chr1", &seq);
        let region = Region::new("chr1", 0, seq.len() as u32, Based::Zero).unwrap();
        let alts = vec![alt.to_vec()];
        let v = Variant::new("chr1", 10, Based::Zero, reference_allele.to_vec(), alts);
        let mut stream: VecDeque<Arc<Variant>> = vec![Arc::new(v)].into();
        VariantGraph::build(&reference, &mut stream, &region, ScoringParams::default()).unwrap()
    }

    fn read(seq: &[u8]) -> Read {
        Read::new("r1", seq.to_vec(), Arc::new(Sample::new("NA12878", "rg1")))
    }

    fn run(adj: &Adjudicator, g: &VariantGraph, r: &Read) -> Vec<AlleleSupport> {
        let mapping = align::align(g, r.sequence()).unwrap();
        adj.adjudicate(g, r, Arc::new(mapping), false)
    }

    fn step(node: u32, cigar: &str) -> NodeCigar {
        NodeCigar {
            node: NodeId(node),
            cigar: cigar.parse::<Cigar>().unwrap(),
        }
    }

    #[test]
    fn alt_read_increments_alt_allele() {
        let g = graph_with(b"T", b"G");
        let adj = Adjudicator::default();
        let r = read(&[UPSTREAM, b"G", DOWNSTREAM].concat());
        let s = run(&adj, &g, &r);
        assert_eq!(s.len(), 1);
        assert!(!s[0].is_reference);
        assert_eq!(s[0].tier, ConfidenceTier::NinetyFive);

        let alt = &g.variants()[0].alternate_alleles()[0];
        assert_eq!(alt.forward_count("NA12878", ConfidenceTier::NinetyFive), 1);
        let reference = g.variants()[0].reference_allele();
        assert_eq!(reference.total_count(ConfidenceTier::NinetyFive), 0);
        assert_eq!(r.mapping_count(), 1);
    }

    #[test]
    fn reverse_strand_uses_reverse_counter() {
        let g = graph_with(b"T", b"G");
        let adj = Adjudicator::default();
        let r = read(&[UPSTREAM, b"T", DOWNSTREAM].concat()).with_reverse(true);
        run(&adj, &g, &r);
        let reference = g.variants()[0].reference_allele();
        assert_eq!(
            reference.reverse_count("NA12878", ConfidenceTier::NinetyFive),
            1
        );
        assert_eq!(
            reference.forward_count("NA12878", ConfidenceTier::NinetyFive),
            0
        );

        // 用反向互补比上时方向再翻转一次
        let m = align::align(&g, r.sequence()).unwrap();
        let s = adj.supports(&g, &r, &m, true);
        assert!(!s[0].reverse);
    }

    #[test]
    fn deletion_read_supports_empty_alt() {
        let g = graph_with(b"T", b"");
        let adj = Adjudicator::default();
        let s = run(&adj, &g, &read(&[UPSTREAM, DOWNSTREAM].concat()));
        assert_eq!(s.len(), 1);
        assert!(!s[0].is_reference);
        assert!(s[0].allele.is_empty());

        let s = run(&adj, &g, &read(&[UPSTREAM, b"T", DOWNSTREAM].concat()));
        assert_eq!(s.len(), 1);
        assert!(s[0].is_reference);
    }

    #[test]
    fn gap_at_deletion_junction_is_not_support() {
        let g = graph_with(b"TTT", b"");
        let adj = Adjudicator::default();
        for junk in [&b"CCG"[..], b"G", b"GA"] {
            let r = read(&[UPSTREAM, junk, DOWNSTREAM].concat());
            let m = align::align(&g, r.sequence()).unwrap();
            assert_eq!(m.path[1].node, NodeId(1), "{}", m);
            assert!(adj.supports(&g, &r, &m, false).is_empty(), "{}", m);
        }

        // 空节点两侧只有缺失和插入
        let m = GraphMapping {
            start_offset: 0,
            score: -30,
            read_start: 0,
            read_end: 4,
            ambiguous: false,
            path: vec![step(0, "4I"), step(1, ""), step(3, "10D")],
        };
        assert!(adj.supports(&g, &read(b"NNNN"), &m, false).is_empty());

        // 接合点两侧都是匹配时仍然计为支持
        let m = GraphMapping {
            start_offset: 0,
            score: 20,
            read_start: 0,
            read_end: 20,
            ambiguous: false,
            path: vec![step(0, "1X9="), step(1, ""), step(3, "10=")],
        };
        assert_eq!(adj.supports(&g, &read(b""), &m, false).len(), 1);
    }

    #[test]
    fn global_mode_read_without_matches_supports_nothing() {
        let seq = [UPSTREAM, b"TTT", DOWNSTREAM].concat();
        let mut reference = InMemoryReference::new();
        reference.insert("chr1", &seq);
        let region = Region::new("chr1", 0, seq.len() as u32, Based::Zero).unwrap();
        let v = Variant::new("chr1", 10, Based::Zero, b"TTT".to_vec(), vec![Vec::new()]);
        let mut stream: VecDeque<Arc<Variant>> = vec![Arc::new(v)].into();
        let params = ScoringParams {
            mode: AlignMode::Global,
            ..ScoringParams::default()
        };
        let g = VariantGraph::build(&reference, &mut stream, &region, params).unwrap();

        let adj = Adjudicator::default();
        let r = read(b"NNNN");
        let s = run(&adj, &g, &r);
        assert!(s.iter().all(|a| !a.allele.is_empty()));
        let alt = &g.variants()[0].alternate_alleles()[0];
        assert_eq!(alt.total_count(ConfidenceTier::Low), 0);
    }

    #[test]
    fn ambiguous_mapping_goes_to_ambiguous_tier() {
        let g = graph_with(b"T", b"G");
        let adj = Adjudicator::default();
        let r = read(&[UPSTREAM, b"G", DOWNSTREAM].concat());
        let mapping = GraphMapping {
            start_offset: 0,
            score: 21,
            read_start: 0,
            read_end: 21,
            ambiguous: true,
            path: vec![step(0, "10="), step(1, "1="), step(3, "10=")],
        };
        let s = adj.adjudicate(&g, &r, Arc::new(mapping), false);
        assert_eq!(s[0].tier, ConfidenceTier::Ambiguous);
        let alt = &g.variants()[0].alternate_alleles()[0];
        assert_eq!(alt.forward_count("NA12878", ConfidenceTier::Ambiguous), 1);
        assert_eq!(alt.forward_count("NA12878", ConfidenceTier::NinetyFive), 0);
    }

    #[test]
    fn tier_follows_score_percentage() {
        let g = graph_with(b"T", b"G");
        let adj = Adjudicator::default();
        let mut m = GraphMapping {
            start_offset: 0,
            score: 20,
            read_start: 0,
            read_end: 20,
            ambiguous: false,
            path: vec![step(0, "10=")],
        };
        assert_eq!(adj.tier(&g, &m, 20), ConfidenceTier::NinetyFive);
        m.score = 18;
        assert_eq!(adj.tier(&g, &m, 20), ConfidenceTier::Ninety);
        m.score = 17;
        assert_eq!(adj.tier(&g, &m, 20), ConfidenceTier::Eighty);
        m.score = 14;
        assert_eq!(adj.tier(&g, &m, 20), ConfidenceTier::Seventy);
        m.score = 5;
        assert_eq!(adj.tier(&g, &m, 20), ConfidenceTier::Low);
        m.score = -3;
        assert_eq!(adj.tier(&g, &m, 20), ConfidenceTier::Low);
    }

    #[test]
    fn short_alt_requires_exact_match_and_long_alt_tolerates_edits() {
        let adj = Adjudicator::default();
        let r = read(b"");

        let snp = graph_with(b"T", b"G");
        let m = GraphMapping {
            start_offset: 0,
            score: 16,
            read_start: 0,
            read_end: 21,
            ambiguous: false,
            path: vec![step(0, "10="), step(1, "1X"), step(3, "10=")],
        };
        assert!(adj.supports(&snp, &r, &m, false).is_empty());

        let ins = graph_with(b"T", b"TGGAC");
        let m = GraphMapping {
            start_offset: 0,
            score: 20,
            read_start: 0,
            read_end: 25,
            ambiguous: false,
            path: vec![step(0, "10="), step(1, "2=1X2="), step(3, "10=")],
        };
        assert_eq!(adj.supports(&ins, &r, &m, false).len(), 1);

        let too_many = GraphMapping {
            path: vec![step(0, "10="), step(1, "1X1=1X1=1X"), step(3, "10=")],
            ..m
        };
        assert!(adj.supports(&ins, &r, &too_many, false).is_empty());
    }

    #[test]
    fn partially_covered_allele_is_not_evidence() {
        let adj = Adjudicator::default();
        let g = graph_with(b"T", b"TGGAC");
        let r = read(b"");
        let m = GraphMapping {
            start_offset: 0,
            score: 13,
            read_start: 0,
            read_end: 13,
            ambiguous: false,
            path: vec![step(0, "10="), step(1, "3=")],
        };
        assert!(adj.supports(&g, &r, &m, false).is_empty());
    }

    #[test]
    fn adjudicating_twice_doubles_counts() {
        let g = graph_with(b"T", b"G");
        let adj = Adjudicator::default();
        let r = read(&[UPSTREAM, b"G", DOWNSTREAM].concat());
        let m = Arc::new(align::align(&g, r.sequence()).unwrap());
        adj.adjudicate(&g, &r, Arc::clone(&m), false);
        adj.adjudicate(&g, &r, m, false);
        let alt = &g.variants()[0].alternate_alleles()[0];
        assert_eq!(alt.forward_count("NA12878", ConfidenceTier::NinetyFive), 2);
        assert_eq!(r.mapping_count(), 2);
    }
}
