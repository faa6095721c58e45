//! # graph-adjudicator
//!
//! 基于变异图的 read 等位基因裁决。
//!
//! 对一个参考区间，把已知变异编织成有向无环图：每个变异位点分叉为参考/替代等位基因节点，
//! 随后汇合。read 与图上所有路径同时做仿射空位比对，最优路径经过哪些节点，
//! 就说明这条 read 支持哪些等位基因；支持度按样本、链方向和置信分档计数。
//!
//! - **构图**：参考片段 + 变异位点的菱形结构，节点 arena 存储、创建顺序即拓扑序
//! - **图比对**：节点种子列取前驱末列最大值的 Smith-Waterman/Gotoh 推广，带确定性回溯
//! - **裁决**：编辑数阈值、短替代等位基因完全匹配、六档置信度、歧义单独计数
//! - **并发**：图只读共享，DP 缓冲区检出池，原子计数器
//!
//! ## 快速示例
//!
//! ```rust
//! use std::collections::VecDeque;
//! use std::sync::Arc;
//!
//! use graph_adjudicator::align::{self, ScoringParams};
//! use graph_adjudicator::graph::VariantGraph;
//! use graph_adjudicator::reference::InMemoryReference;
//! use graph_adjudicator::region::{Based, Region};
//! use graph_adjudicator::variant::Variant;
//!
//! let mut reference = InMemoryReference::new();
//! reference.insert("chr1", b"ACGTACGGCATGCATTCAGGA");
//! let region = Region::new("chr1", 0, 21, Based::Zero).unwrap();
//!
//! let snp = Variant::new("chr1", 10, Based::Zero, "T", vec![b"G".to_vec()]);
//! let mut variants: VecDeque<Arc<Variant>> = vec![Arc::new(snp)].into();
//! let params = ScoringParams::default();
//! let graph = VariantGraph::build(&reference, &mut variants, &region, params).unwrap();
//!
//! let mapping = align::align(&graph, b"ACGTACGGCAGGCATTCAGGA").unwrap();
//! assert_eq!(mapping.score, 21);
//! assert!(!graph.node(mapping.path[1].node).is_reference());
//! ```
//!
//! ## 模块说明
//!
//! - [`region`]：基因组区间
//! - [`variant`]：变异、等位基因与支持度计数
//! - [`reference`]：参考序列提供者
//! - [`graph`]：变异图及其构建
//! - [`align`]：图比对（打分、CIGAR、DP 缓冲区、回溯）
//! - [`adjudicate`]：裁决、报告、计数表与多线程驱动
//! - [`io`]：FASTA / FASTQ / VCF 解析
//! - [`util`]：DNA 编码 / 反向互补等工具函数
//! - [`error`]：错误类型

pub mod adjudicate;
pub mod align;
pub mod error;
pub mod graph;
pub mod io;
pub mod reference;
pub mod region;
pub mod util;
pub mod variant;
