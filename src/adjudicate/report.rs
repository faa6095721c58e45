//! 比对报告与报告收集器

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use super::read::Read;
use crate::align::{CigarOp, GraphMapping};
use crate::graph::{NodeKind, VariantGraph};
use crate::region::{Based, Region};
use crate::variant::{Allele, Variant};

/// 路径上一个节点的快照
#[derive(Debug, Clone)]
struct ReportNode {
    position: u32,
    kind: NodeKind,
    allele: Arc<Allele>,
}

/// 一条 read 的比对报告，提交后不可变，只用于事后输出
#[derive(Debug, Clone)]
pub struct AlignmentReport {
    read_id: String,
    sample: String,
    read_group: String,
    /// 实际参与比对的序列（可能是反向互补）
    aligned: Vec<u8>,
    flipped: bool,
    region: Region,
    mapping: Arc<GraphMapping>,
    nodes: Vec<ReportNode>,
    variants: Vec<Arc<Variant>>,
}

impl AlignmentReport {
    pub fn new(
        graph: &VariantGraph,
        read: &Read,
        aligned: &[u8],
        mapping: Arc<GraphMapping>,
        flipped: bool,
    ) -> Self {
        let nodes = mapping
            .path
            .iter()
            .map(|step| {
                let node = graph.node(step.node);
                ReportNode {
                    position: node.position(),
                    kind: node.kind(),
                    allele: Arc::clone(node.allele()),
                }
            })
            .collect();
        let variants = mapping
            .path
            .iter()
            .filter_map(|step| graph.variant_of(step.node))
            .map(Arc::clone)
            .collect();
        Self {
            read_id: read.id().to_string(),
            sample: read.sample().name().to_string(),
            read_group: read.sample().read_group().to_string(),
            aligned: aligned.to_vec(),
            flipped,
            region: graph.region().clone(),
            mapping,
            nodes,
            variants,
        }
    }

    pub fn read_id(&self) -> &str {
        &self.read_id
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn mapping(&self) -> &GraphMapping {
        &self.mapping
    }

    pub fn variants(&self) -> &[Arc<Variant>] {
        &self.variants
    }
}

/// 按 CIGAR 把节点序列和 read 逐列对齐，缺口以 `-` 表示
fn render_pair(
    node_seq: &[u8],
    mut t: usize,
    read: &[u8],
    mut q: usize,
    ops: &[(CigarOp, u32)],
) -> (String, String, usize) {
    let mut top = String::new();
    let mut bottom = String::new();
    let base = |s: &[u8], i: usize| s.get(i).map_or('?', |&b| b as char);
    for &(op, n) in ops {
        for _ in 0..n {
            match op {
                CigarOp::Match | CigarOp::Mismatch => {
                    top.push(base(node_seq, t));
                    let c = base(read, q);
                    bottom.push(if op == CigarOp::Mismatch {
                        c.to_ascii_lowercase()
                    } else {
                        c
                    });
                    t += 1;
                    q += 1;
                }
                CigarOp::Insertion => {
                    top.push('-');
                    bottom.push(base(read, q));
                    q += 1;
                }
                CigarOp::Deletion => {
                    top.push(base(node_seq, t));
                    bottom.push('-');
                    t += 1;
                }
            }
        }
    }
    (top, bottom, q)
}

impl fmt::Display for AlignmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.mapping;
        writeln!(
            f,
            "read {} sample {} rg {} region {} strand {} score {}{}",
            self.read_id,
            self.sample,
            self.read_group,
            self.region,
            if self.flipped { '-' } else { '+' },
            m.score,
            if m.ambiguous { " (ambiguous)" } else { "" }
        )?;
        let mut q = m.read_start;
        for (k, (step, node)) in m.path.iter().zip(&self.nodes).enumerate() {
            let offset = if k == 0 { m.start_offset } else { 0 };
            let kind = match node.kind {
                NodeKind::Reference => "ref",
                NodeKind::Alternate => "alt",
            };
            if step.cigar.is_empty() {
                writeln!(f, "  node {} @{} {} -", step.node, node.position, kind)?;
                continue;
            }
            writeln!(
                f,
                "  node {} @{} {} {}",
                step.node, node.position, kind, step.cigar
            )?;
            let seq = node.allele.sequence();
            let (top, bottom, next) = render_pair(seq, offset, &self.aligned, q, step.cigar.ops());
            q = next;
            writeln!(f, "    {}", top)?;
            writeln!(f, "    {}", bottom)?;
        }
        for v in &self.variants {
            let alts: Vec<String> = v
                .alternate_alleles()
                .iter()
                .map(|a| a.sequence_string())
                .collect();
            writeln!(
                f,
                "  variant {}:{} {} {}>{}",
                v.chrom(),
                v.position_in(Based::One),
                v.id(),
                v.reference_allele().sequence_string(),
                alts.join(",")
            )?;
        }
        Ok(())
    }
}

/// 线程安全地收集报告；所有比对结束后调用一次 [`ReportSink::drain`] 输出
#[derive(Debug, Default)]
pub struct ReportSink {
    reports: Mutex<Vec<AlignmentReport>>,
}

impl ReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, report: AlignmentReport) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
    }

    pub fn len(&self) -> usize {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按提交顺序写出全部报告，返回写出的条数。消费 `self`，因此只能调用一次。
    pub fn drain<W: Write>(self, out: &mut W) -> std::io::Result<usize> {
        let reports = self
            .reports
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        for r in &reports {
            writeln!(out, "{}", r)?;
        }
        Ok(reports.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjudicate::read::Sample;
    use crate::align::{self, Cigar, ScoringParams};
    use crate::reference::InMemoryReference;
    use std::collections::VecDeque;

    fn graph() -> VariantGraph {
        let seq = b"ACGTACGGCATGCATTCAGGA";
        let mut reference = InMemoryReference::new();
        reference.insert("chr1", seq);
        let region = Region::new("chr1", 0, seq.len() as u32, Based::Zero).unwrap();
        let v = Variant::new("chr1", 10, Based::Zero, "T", vec![b"G".to_vec()]).with_id("rs1");
        let mut stream: VecDeque<Arc<Variant>> = vec![Arc::new(v)].into();
        VariantGraph::build(&reference, &mut stream, &region, ScoringParams::default()).unwrap()
    }

    fn report_for(g: &VariantGraph, id: &str, seq: &[u8]) -> AlignmentReport {
        let read = Read::new(id, seq.to_vec(), Arc::new(Sample::new("s1", "rg1")));
        let m = Arc::new(align::align(g, seq).unwrap());
        AlignmentReport::new(g, &read, seq, m, false)
    }

    #[test]
    fn report_renders_path_and_variants() {
        let g = graph();
        let r = report_for(&g, "r1", b"ACGTACGGCAGGCATTCAGGA");
        let text = r.to_string();
        let header = "read r1 sample s1 rg rg1 region chr1:1-21 strand + score 21";
        assert!(text.starts_with(header));
        assert!(text.contains("  node 1 @10 alt 1="));
        assert!(text.contains("  variant chr1:11 rs1 T>G"));
        assert_eq!(r.variants().len(), 1);
        assert_eq!(r.read_id(), "r1");
        assert_eq!(r.region().to_string(), "chr1:1-21");
        assert_eq!(r.mapping().score, 21);
    }

    #[test]
    fn mismatches_render_lowercase() {
        let cigar: Cigar = "1=1X2=1I".parse().unwrap();
        let (top, bottom, q) = render_pair(b"ACGT", 0, b"AGGTT", 0, cigar.ops());
        assert_eq!(top, "ACGT-");
        assert_eq!(bottom, "AgGTT");
        assert_eq!(q, 5);
        let cigar: Cigar = "1=1D1=".parse().unwrap();
        let (top, bottom, _) = render_pair(b"ACGT", 1, b"CT", 0, cigar.ops());
        assert_eq!(top, "CGT");
        assert_eq!(bottom, "C-T");
    }

    #[test]
    fn drain_preserves_submission_order() {
        let g = graph();
        let sink = ReportSink::new();
        for id in ["a", "b", "c"] {
            sink.submit(report_for(&g, id, b"ACGTACGGCATGCATTCAGGA"));
        }
        assert_eq!(sink.len(), 3);
        let mut out = Vec::new();
        assert_eq!(sink.drain(&mut out).unwrap(), 3);
        let text = String::from_utf8(out).unwrap();
        let order: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("read "))
            .map(|l| &l[5..6])
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
