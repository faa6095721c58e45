use std::fmt;
use std::sync::Arc;

use crate::util::dna;
use crate::variant::Allele;

/// 节点在图 arena 中的下标。创建顺序即拓扑顺序：边只从小 id 指向大 id。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Reference,
    Alternate,
}

/// 节点承载的等位基因来自哪里。变异下标指向 [`super::VariantGraph::variants`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleSlot {
    /// 两个变异之间的参考片段，不属于任何 Variant
    Fragment,
    /// 变异自身的参考等位基因
    Reference(usize),
    /// 变异的第 k 个替代等位基因
    Alternate(usize, usize),
}

impl AlleleSlot {
    pub fn variant(self) -> Option<usize> {
        match self {
            AlleleSlot::Fragment => None,
            AlleleSlot::Reference(v) | AlleleSlot::Alternate(v, _) => Some(v),
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) position: u32,
    pub(crate) kind: NodeKind,
    pub(crate) slot: AlleleSlot,
    pub(crate) allele: Arc<Allele>,
    /// 打分字母表编码后的序列
    pub(crate) codes: Vec<u8>,
    pub(crate) prev: Vec<NodeId>,
    pub(crate) next: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        position: u32,
        kind: NodeKind,
        slot: AlleleSlot,
        allele: Arc<Allele>,
    ) -> Self {
        let codes = dna::encode(allele.sequence());
        Self {
            id,
            position,
            kind,
            slot,
            allele,
            codes,
            prev: Vec::new(),
            next: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_reference(&self) -> bool {
        self.kind == NodeKind::Reference
    }

    pub fn slot(&self) -> AlleleSlot {
        self.slot
    }

    pub fn allele(&self) -> &Arc<Allele> {
        &self.allele
    }

    pub fn sequence(&self) -> &[u8] {
        self.allele.sequence()
    }

    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// 前驱，按 id 升序
    pub fn prev(&self) -> &[NodeId] {
        &self.prev
    }

    pub fn next(&self) -> &[NodeId] {
        &self.next
    }

    pub fn is_source(&self) -> bool {
        self.prev.is_empty()
    }

    pub fn is_sink(&self) -> bool {
        self.next.is_empty()
    }
}
