//! 图比对
//!
//! - [`scoring`]：打分参数与替换矩阵
//! - [`cigar`]：扩展 CIGAR
//! - [`buffer`]：每条比对私有的 DP 缓冲区及其检出池
//! - [`gsw`]：图上的仿射空位动态规划与回溯

pub mod buffer;
pub mod cigar;
pub mod gsw;
pub mod scoring;

pub use buffer::{BufferPool, PooledBuffer, ScoringBuffer};
pub use cigar::{Cigar, CigarOp};
pub use gsw::{align, align_with_buf, GraphMapping, NodeCigar};
pub use scoring::{AlignMode, ScoreMatrix, ScoringParams};
