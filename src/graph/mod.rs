//! 变异图
//!
//! 节点存放在 arena（`Vec<Node>`）中，边是下标而非指针。图构建完成后只读，
//! 可在多个比对线程之间无锁共享；每条比对各自的 DP 缓冲区见 [`crate::align::buffer`]。

mod builder;
pub mod node;

use std::io::Write;
use std::sync::Arc;

use crate::align::ScoringParams;
use crate::region::Region;
use crate::variant::{Allele, Variant};

pub use node::{AlleleSlot, Node, NodeId, NodeKind};

#[derive(Debug)]
pub struct VariantGraph {
    region: Region,
    scoring: ScoringParams,
    nodes: Vec<Node>,
    /// 参与构图的变异（跳过的不在其中），按出现顺序
    variants: Vec<Arc<Variant>>,
    /// 节点 DP 列在缓冲区中的起始列号，每个节点占 len + 1 列（首列为种子列）
    col_starts: Vec<usize>,
    total_cols: usize,
    reference_length: u32,
    skipped: bool,
}

impl VariantGraph {
    fn empty(region: Region, scoring: ScoringParams) -> Self {
        Self {
            region,
            scoring,
            nodes: Vec::new(),
            variants: Vec::new(),
            col_starts: Vec::new(),
            total_cols: 0,
            reference_length: 0,
            skipped: false,
        }
    }

    fn add_node(
        &mut self,
        position: u32,
        kind: NodeKind,
        slot: AlleleSlot,
        allele: Arc<Allele>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let node = Node::new(id, position, kind, slot, allele);
        self.col_starts.push(self.total_cols);
        self.total_cols += node.len() + 1;
        self.nodes.push(node);
        id
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        debug_assert!(from < to, "edges must point forward");
        self.nodes[from.index()].next.push(to);
        self.nodes[to.index()].prev.push(from);
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn scoring(&self) -> &ScoringParams {
        &self.scoring
    }

    /// 拓扑序（即 id 序）
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn variants(&self) -> &[Arc<Variant>] {
        &self.variants
    }

    /// 节点所属的变异；参考片段返回 None
    pub fn variant_of(&self, id: NodeId) -> Option<&Arc<Variant>> {
        self.node(id)
            .slot
            .variant()
            .and_then(|v| self.variants.get(v))
    }

    pub fn entry_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_source())
    }

    pub fn sink_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_sink())
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.next.len()).sum()
    }

    /// 所有节点序列长度之和
    pub fn sequence_length(&self) -> usize {
        self.nodes.iter().map(Node::len).sum()
    }

    /// 参考片段与各变异参考跨度之和
    pub fn reference_length(&self) -> u32 {
        self.reference_length
    }

    /// 输入中是否有变异因 skip 标记被丢弃
    pub fn has_skipped(&self) -> bool {
        self.skipped
    }

    #[inline]
    pub(crate) fn col_start(&self, id: NodeId) -> usize {
        self.col_starts[id.index()]
    }

    pub(crate) fn total_cols(&self) -> usize {
        self.total_cols
    }

    /// 输出 Graphviz DOT，便于调试
    pub fn write_dot<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "digraph variant_graph {{")?;
        writeln!(out, "  rankdir=LR;")?;
        for n in &self.nodes {
            let shape = if n.is_reference() { "box" } else { "ellipse" };
            writeln!(
                out,
                "  n{} [shape={}, label=\"{}@{}\\n{}\"];",
                n.id,
                shape,
                n.id,
                n.position,
                String::from_utf8_lossy(n.sequence())
            )?;
        }
        for n in &self.nodes {
            for next in &n.next {
                writeln!(out, "  n{} -> n{};", n.id, next)?;
            }
        }
        writeln!(out, "}}")
    }
}
