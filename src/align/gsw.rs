//! 图上的仿射空位 Smith-Waterman
//!
//! 节点按 id（拓扑序）处理。每个节点的种子列取所有前驱输出列的逐元素最大值，
//! 其余列按线性序列的 Gotoh 递推填写：
//!
//! ```text
//! E[c][i] = max(H[c-1][i] - go, E[c-1][i] - ge)     // 节点序列上的缺失（D）
//! F[c][i] = max(H[c][i-1] - go, F[c][i-1] - ge)     // read 上的插入（I）
//! H[c][i] = max(H[c-1][i-1] + s(q[i-1], t[c-1]), E[c][i], F[c][i])
//! ```
//!
//! 局部模式下 H 以 0 为下限。回溯跨节点边界时回到产生种子值的前驱，并列时取 id 最小者。

use std::fmt;

use super::buffer::{ScoringBuffer, NEG_INF};
use super::cigar::{Cigar, CigarOp};
use super::scoring::{AlignMode, ScoreMatrix, ScoringParams};
use crate::error::AlignError;
use crate::graph::{Node, NodeId, VariantGraph};
use crate::util::dna;

/// read 在单个节点上的比对片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCigar {
    pub node: NodeId,
    pub cigar: Cigar,
}

/// 一条 read 在图上的最优比对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphMapping {
    /// 起始节点内的 0-based 偏移
    pub start_offset: usize,
    pub score: i32,
    /// read 上被比对覆盖的区间 `[read_start, read_end)`；局部模式下两端可能被裁掉
    pub read_start: usize,
    pub read_end: usize,
    /// 回溯在某个分支处有并列的前驱，或同一位点的另一个等位基因取得同样的最高分
    pub ambiguous: bool,
    /// 按路径顺序排列；空等位基因节点以空 CIGAR 出现
    pub path: Vec<NodeCigar>,
}

impl GraphMapping {
    pub fn start_node(&self) -> NodeId {
        self.path.first().map_or(NodeId(0), |nc| nc.node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.path.iter().map(|nc| nc.node)
    }

    /// 整条路径的编辑数
    pub fn edit_count(&self) -> u32 {
        self.path.iter().map(|nc| nc.cigar.edit_count()).sum()
    }

    /// 各节点 CIGAR 依次拼接
    pub fn merged_cigar(&self) -> Cigar {
        let mut merged = Cigar::new();
        for nc in &self.path {
            for &(op, n) in nc.cigar.ops() {
                merged.push_back(op, n);
            }
        }
        merged
    }
}

impl fmt::Display for GraphMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "score={} start={}:{} read={}..{}",
            self.score,
            self.start_node(),
            self.start_offset,
            self.read_start,
            self.read_end
        )?;
        if self.ambiguous {
            write!(f, " ambiguous")?;
        }
        write!(f, " path=")?;
        for (k, nc) in self.path.iter().enumerate() {
            if k > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}[{}]", nc.node, nc.cigar)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    score: i32,
    node: NodeId,
    col: usize,
    row: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    H,
    E,
    F,
}

/// 使用一次性缓冲区比对
pub fn align(graph: &VariantGraph, read: &[u8]) -> Result<GraphMapping, AlignError> {
    let mut buf = ScoringBuffer::new();
    align_with_buf(graph, read, &mut buf)
}

/// 将 `read` 比对到 `graph`，打分参数取自图本身。`buf` 的内容会被覆盖。
pub fn align_with_buf(
    graph: &VariantGraph,
    read: &[u8],
    buf: &mut ScoringBuffer,
) -> Result<GraphMapping, AlignError> {
    if read.is_empty() {
        return Err(AlignError::EmptyRead);
    }
    if graph.is_empty() || graph.sequence_length() == 0 {
        return Err(AlignError::EmptyGraph);
    }
    let params = *graph.scoring();
    let matrix = params.matrix();

    buf.read.clear();
    buf.read.extend(read.iter().map(|&b| dna::to_code(b)));
    buf.prepare(graph, read.len());

    let best = fill(graph, &matrix, &params, buf).ok_or(AlignError::NoAlignment)?;
    let sibling_tie = sibling_tie(graph, buf, best);
    traceback(graph, &matrix, &params, buf, best, sibling_tie)
}

fn fill(
    graph: &VariantGraph,
    matrix: &ScoreMatrix,
    p: &ScoringParams,
    buf: &mut ScoringBuffer,
) -> Option<Cell> {
    let rows = buf.rows();
    let m = rows - 1;
    let (go, ge, mode) = (p.gap_open, p.gap_extend, p.mode);
    let ScoringBuffer {
        h,
        e,
        f,
        read,
        node_best,
        ..
    } = buf;

    let mut best: Option<Cell> = None;
    let mut offer = |score: i32, node: NodeId, col: usize, row: usize| {
        let nb = &mut node_best[node.index()];
        *nb = (*nb).max(score);
        let better = match best {
            None => mode != AlignMode::Local || score > 0,
            Some(b) => score > b.score,
        };
        if better {
            best = Some(Cell {
                score,
                node,
                col,
                row,
            });
        }
    };

    for node in graph.nodes() {
        let id = node.id();
        let n = node.len();
        let base = graph.col_start(id) * rows;

        // 种子列
        if node.is_source() {
            for i in 0..rows {
                h[base + i] = match mode {
                    AlignMode::Local => 0,
                    _ => -p.gap_cost(i),
                };
                e[base + i] = NEG_INF;
                f[base + i] = NEG_INF;
            }
        } else {
            h[base..base + rows].fill(NEG_INF);
            e[base..base + rows].fill(NEG_INF);
            f[base..base + rows].fill(NEG_INF);
            for &pid in node.prev() {
                let out = (graph.col_start(pid) + graph.node(pid).len()) * rows;
                for i in 0..rows {
                    h[base + i] = h[base + i].max(h[out + i]);
                    e[base + i] = e[base + i].max(e[out + i]);
                }
            }
        }

        for c in 1..=n {
            let col = base + c * rows;
            let prev = col - rows;
            let t = node.codes()[c - 1];

            e[col] = (h[prev] - go).max(e[prev] - ge);
            f[col] = NEG_INF;
            h[col] = if mode == AlignMode::Global { e[col] } else { 0 };

            for i in 1..rows {
                let ev = (h[prev + i] - go).max(e[prev + i] - ge);
                let fv = (h[col + i - 1] - go).max(f[col + i - 1] - ge);
                let diag = h[prev + i - 1] + matrix.score(read[i - 1], t);
                let mut v = diag.max(ev).max(fv);
                if mode == AlignMode::Local && v < 0 {
                    v = 0;
                }
                e[col + i] = ev;
                f[col + i] = fv;
                h[col + i] = v;
                if mode == AlignMode::Local {
                    offer(v, id, c, i);
                }
            }
            if mode == AlignMode::SemiGlobal {
                offer(h[col + m], id, c, m);
            }
        }

        if mode == AlignMode::Global && node.is_sink() {
            offer(h[base + n * rows + m], id, n, m);
        }
    }
    best
}

/// 同一变异的另一个等位基因节点上也取得了最高分
fn sibling_tie(graph: &VariantGraph, buf: &ScoringBuffer, best: Cell) -> bool {
    let Some(site) = graph.node(best.node).slot().variant() else {
        return false;
    };
    graph
        .nodes()
        .iter()
        .filter(|n| n.id() != best.node && n.slot().variant() == Some(site))
        .any(|n| buf.node_best[n.id().index()] == best.score)
}

fn push_diag(cigar: &mut Cigar, read: u8, target: u8) {
    // N 与任何碱基都是错配
    let op = if read == target && read != dna::UNKNOWN {
        CigarOp::Match
    } else {
        CigarOp::Mismatch
    };
    cigar.push_front(op, 1);
}

fn traceback(
    graph: &VariantGraph,
    matrix: &ScoreMatrix,
    p: &ScoringParams,
    buf: &ScoringBuffer,
    best: Cell,
    sibling_tie: bool,
) -> Result<GraphMapping, AlignError> {
    let rows = buf.rows();
    let (go, ge, mode) = (p.gap_open, p.gap_extend, p.mode);
    let (h, e, f, read) = (&buf.h, &buf.e, &buf.f, &buf.read);

    let mut node: &Node = graph.node(best.node);
    let mut col = best.col;
    let mut row = best.row;
    let mut state = State::H;
    let mut ambiguous = sibling_tie;
    let mut cur = Cigar::new();
    // 逆序收集
    let mut rev_path: Vec<NodeCigar> = Vec::new();

    let start_offset = loop {
        let base = graph.col_start(node.id()) * rows;
        let at = |c: usize, r: usize| base + c * rows + r;

        if col == 0 {
            if node.is_source() {
                if state == State::H && row > 0 && mode != AlignMode::Local {
                    // 路径起点之前 read 还有剩余，以插入补齐
                    cur.push_front(CigarOp::Insertion, row as u32);
                    row = 0;
                }
                break 0;
            }
            if state == State::H {
                let seed = h[at(0, row)];
                if (mode == AlignMode::Local && seed == 0)
                    || (mode == AlignMode::SemiGlobal && row == 0)
                {
                    break 0;
                }
            }

            let plane = if state == State::E { e } else { h };
            let target = plane[at(0, row)];
            let mut chosen: Option<NodeId> = None;
            let mut ties = 0usize;
            for &pid in node.prev() {
                let out = (graph.col_start(pid) + graph.node(pid).len()) * rows + row;
                if plane[out] == target {
                    chosen.get_or_insert(pid);
                    ties += 1;
                }
            }
            let pid = chosen.ok_or(AlignError::NoAlignment)?;
            if ties > 1 {
                ambiguous = true;
            }
            rev_path.push(NodeCigar {
                node: node.id(),
                cigar: std::mem::take(&mut cur),
            });
            node = graph.node(pid);
            col = node.len();
            continue;
        }

        match state {
            State::H => {
                let v = h[at(col, row)];
                if mode == AlignMode::Local && v == 0 {
                    break col;
                }
                if mode == AlignMode::SemiGlobal && row == 0 {
                    break col;
                }
                let t = node.codes()[col - 1];
                if row > 0 && v == h[at(col - 1, row - 1)] + matrix.score(read[row - 1], t) {
                    push_diag(&mut cur, read[row - 1], t);
                    col -= 1;
                    row -= 1;
                } else if v == e[at(col, row)] {
                    state = State::E;
                } else if row > 0 && v == f[at(col, row)] {
                    state = State::F;
                } else {
                    return Err(AlignError::NoAlignment);
                }
            }
            State::E => {
                let v = e[at(col, row)];
                cur.push_front(CigarOp::Deletion, 1);
                if v == h[at(col - 1, row)] - go {
                    state = State::H;
                } else if v != e[at(col - 1, row)] - ge {
                    return Err(AlignError::NoAlignment);
                }
                col -= 1;
            }
            State::F => {
                let v = f[at(col, row)];
                cur.push_front(CigarOp::Insertion, 1);
                if v == h[at(col, row - 1)] - go {
                    state = State::H;
                } else if v != f[at(col, row - 1)] - ge {
                    return Err(AlignError::NoAlignment);
                }
                row -= 1;
            }
        }
    };

    rev_path.push(NodeCigar {
        node: node.id(),
        cigar: cur,
    });
    rev_path.reverse();
    let mut path = rev_path;

    // 在前驱的输出列上停下时，首个元素不含任何操作
    let mut start_offset = start_offset;
    while path.len() > 1 && path[0].cigar.is_empty() {
        path.remove(0);
        start_offset = 0;
    }

    Ok(GraphMapping {
        start_offset,
        score: best.score,
        read_start: row,
        read_end: best.row,
        ambiguous,
        path,
    })
}
