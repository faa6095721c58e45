use std::sync::Arc;

use log::debug;

use super::{AlleleSlot, NodeId, NodeKind, VariantGraph};
use crate::align::ScoringParams;
use crate::error::GraphError;
use crate::reference::ReferenceProvider;
use crate::region::Region;
use crate::variant::{Allele, Variant, VariantSource};

impl VariantGraph {
    /// 按区间和有序变异流构图。
    ///
    /// 游标 `cur` 从区间起点出发；遇到变异前先补一段 `[cur, pos)` 的参考节点把分支收拢，
    /// 再为变异的每个替代等位基因和参考等位基因各建一个节点，与当前前沿做完全二部连接。
    /// 带 skip 标记的变异被整体忽略，也不推进 `cur`。
    ///
    /// 变异位置按 `region` 的坐标系解释。任何一段参考获取失败都会使整个构图失败。
    pub fn build(
        reference: &dyn ReferenceProvider,
        variants: &mut dyn VariantSource,
        region: &Region,
        scoring: ScoringParams,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::empty(region.clone(), scoring);
        let mut cur = region.start();
        let mut frontier: Vec<NodeId> = Vec::new();
        let mut last_position: Option<u32> = None;

        while let Some(variant) = variants.next_variant() {
            if variant.should_skip() {
                debug!(
                    "skipping variant {}:{} ({})",
                    variant.chrom(),
                    variant.position(),
                    variant.id()
                );
                graph.skipped = true;
                continue;
            }
            let pos = variant.position_in(region.based());
            if let Some(previous) = last_position {
                if pos < previous {
                    return Err(GraphError::UnorderedVariant {
                        position: pos,
                        previous,
                    });
                }
            }
            if pos < region.start() || pos > region.end() {
                return Err(GraphError::VariantOutsideRegion {
                    position: pos,
                    region: region.clone(),
                });
            }
            last_position = Some(pos);

            if pos > cur {
                let node = graph.add_reference_run(reference, cur, pos, &frontier)?;
                frontier = vec![node];
                cur = pos;
            }
            let span = variant.reference_size();
            frontier = graph.add_variant_site(variant, pos, &frontier);
            cur += span;
        }

        if region.end() > cur {
            graph.add_reference_run(reference, cur, region.end(), &frontier)?;
        }

        debug!(
            "built graph for {}: {} nodes, {} edges, {} variants{}",
            region,
            graph.len(),
            graph.edge_count(),
            graph.variants.len(),
            if graph.skipped { " (some skipped)" } else { "" }
        );
        Ok(graph)
    }

    fn add_reference_run(
        &mut self,
        reference: &dyn ReferenceProvider,
        start: u32,
        end: u32,
        frontier: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        let sub = self.region.sub_region(start, end).ok_or_else(|| {
            GraphError::VariantOutsideRegion {
                position: start,
                region: self.region.clone(),
            }
        })?;
        let seq = reference.sequence(&sub)?;
        let allele = Arc::new(Allele::new(seq));
        let node = self.add_node(start, NodeKind::Reference, AlleleSlot::Fragment, allele);
        for &parent in frontier {
            self.add_edge(parent, node);
        }
        self.reference_length += end - start;
        Ok(node)
    }

    /// 替代等位基因在前、变异参考等位基因在后；返回新的前沿
    fn add_variant_site(
        &mut self,
        variant: Arc<Variant>,
        position: u32,
        frontier: &[NodeId],
    ) -> Vec<NodeId> {
        let vi = self.variants.len();
        let mut site: Vec<NodeId> = Vec::with_capacity(variant.alternate_alleles().len() + 1);
        for (k, alt) in variant.alternate_alleles().iter().enumerate() {
            let slot = AlleleSlot::Alternate(vi, k);
            let node = self.add_node(position, NodeKind::Alternate, slot, Arc::clone(alt));
            site.push(node);
        }
        site.push(self.add_node(
            position,
            NodeKind::Reference,
            AlleleSlot::Reference(vi),
            Arc::clone(variant.reference_allele()),
        ));
        for &parent in frontier {
            for &child in &site {
                self.add_edge(parent, child);
            }
        }
        self.reference_length += variant.reference_size();
        self.variants.push(variant);
        site
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReferenceError;
    use crate::reference::InMemoryReference;
    use crate::region::Based;
    use std::collections::VecDeque;

    fn reference() -> InMemoryReference {
        let mut seq = Vec::new();
        for i in 0..200u32 {
            seq.push(b"ACGTTGCAAC"[(i % 10) as usize]);
        }
        let mut r = InMemoryReference::new();
        r.insert("chr1", &seq);
        r
    }

    fn region(start: u32, end: u32) -> Region {
        Region::new("chr1", start, end, Based::Zero).unwrap()
    }

    fn stream(vs: Vec<Variant>) -> VecDeque<Arc<Variant>> {
        vs.into_iter().map(Arc::new).collect()
    }

    fn build(vs: Vec<Variant>, r: &Region) -> Result<VariantGraph, GraphError> {
        VariantGraph::build(&reference(), &mut stream(vs), r, ScoringParams::default())
    }

    fn snv(pos: u32, alts: &[&[u8]]) -> Variant {
        let alts = alts.iter().map(|a| a.to_vec()).collect();
        Variant::new("chr1", pos, Based::Zero, "T", alts)
    }

    #[test]
    fn no_variants_gives_single_reference_node() {
        let r = region(90, 120);
        let g = build(vec![], &r).unwrap();
        assert_eq!(g.len(), 1);
        assert_eq!(g.edge_count(), 0);
        let n = &g.nodes()[0];
        assert!(n.is_reference());
        assert_eq!(n.position(), 90);
        assert_eq!(n.sequence(), reference().sequence(&r).unwrap().as_slice());
        assert_eq!(g.reference_length(), 30);
    }

    #[test]
    fn variant_site_forms_diamond() {
        let g = build(vec![snv(100, &[b"G"])], &region(90, 120)).unwrap();
        // [90,100) -> {alt G, ref T} -> [101,120)
        assert_eq!(g.len(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.nodes()[0].next(), &[NodeId(1), NodeId(2)]);
        assert_eq!(g.nodes()[1].kind(), NodeKind::Alternate);
        assert_eq!(g.nodes()[2].kind(), NodeKind::Reference);
        assert_eq!(g.nodes()[3].prev(), &[NodeId(1), NodeId(2)]);
        assert_eq!(g.nodes()[3].position(), 101);
        assert_eq!(g.entry_nodes().count(), 1);
        assert_eq!(g.sink_nodes().count(), 1);
        assert_eq!(g.reference_length(), 30);
        assert_eq!(g.variant_of(NodeId(1)).unwrap().position(), 100);
        assert!(g.variant_of(NodeId(0)).is_none());
    }

    #[test]
    fn bipartite_connection_between_adjacent_sites() {
        // 第一个位点留下大小为 2 的前沿，第二个位点紧邻，3 个替代等位基因 + 参考 = 4 个节点
        let variants = vec![snv(100, &[b"G"]), snv(101, &[b"A", b"C", b"G"])];
        let g = build(variants, &region(90, 120)).unwrap();
        let site: Vec<_> = g
            .nodes()
            .iter()
            .filter(|n| n.position() == 101 && n.slot().variant() == Some(1))
            .collect();
        assert_eq!(site.len(), 4);
        let into_site: usize = site.iter().map(|n| n.prev().len()).sum();
        assert_eq!(into_site, 2 * 4);
        for n in &site {
            assert_eq!(n.prev(), &[NodeId(1), NodeId(2)]);
        }
    }

    #[test]
    fn skipped_variant_is_absent() {
        let r = region(90, 120);
        let mut skipped = Variant::new("chr1", 95, Based::Zero, "TTT", vec![b"T".to_vec()]);
        skipped.set_skip(true);
        let with_skip = build(vec![skipped, snv(100, &[b"G"])], &r).unwrap();
        let without = build(vec![snv(100, &[b"G"])], &r).unwrap();

        assert!(with_skip.has_skipped());
        assert!(!without.has_skipped());
        assert_eq!(with_skip.len(), without.len());
        for (a, b) in with_skip.nodes().iter().zip(without.nodes()) {
            assert_eq!(a.position(), b.position());
            assert_eq!(a.sequence(), b.sequence());
            assert_eq!(a.prev(), b.prev());
        }
        assert_eq!(with_skip.nodes()[0].len(), 10);
        assert_eq!(with_skip.nodes()[1].position(), 100);
    }

    #[test]
    fn variant_at_region_start_has_no_leading_run() {
        let g = build(vec![snv(90, &[b"C"])], &region(90, 120)).unwrap();
        assert_eq!(g.entry_nodes().count(), 2);
        assert_eq!(g.nodes()[0].position(), 90);
        assert_eq!(g.nodes()[2].position(), 91);
    }

    #[test]
    fn unordered_and_outside_variants_fail() {
        let r = region(90, 120);
        let err = build(vec![snv(110, &[b"G"]), snv(100, &[b"G"])], &r).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnorderedVariant {
                position: 100,
                previous: 110
            }
        ));
        let err = build(vec![snv(80, &[b"G"])], &r).unwrap_err();
        assert!(matches!(
            err,
            GraphError::VariantOutsideRegion { position: 80, .. }
        ));
    }

    #[test]
    fn reference_failure_is_fatal() {
        let err = build(vec![], &region(150, 250)).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Reference(ReferenceError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn dot_output_lists_edges() {
        let g = build(vec![snv(100, &[b"G"])], &region(90, 120)).unwrap();
        let mut out = Vec::new();
        g.write_dot(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("digraph"));
        assert_eq!(text.matches("->").count(), 4);
    }
}
