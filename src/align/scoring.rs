use serde::{Deserialize, Serialize};

use crate::util::dna::SIGMA;

/// 比对边界条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AlignMode {
    /// Smith-Waterman：得分下限为 0，最优单元可在任意节点任意位置
    ///
    /// 默认模式，沿用局部 Smith-Waterman 行为，read 两端可被软截断；
    /// 需要整条 read 比上时传 `--mode semi-global`。
    #[default]
    Local,
    /// read 必须整体比上，图上起止自由
    SemiGlobal,
    /// read 整体比上，且路径必须从源节点走到汇节点
    Global,
}

/// 打分参数。罚分均以正数给出，长度为 k 的空位罚 `gap_open + (k - 1) * gap_extend`。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringParams {
    pub match_score: i32,
    pub mismatch_penalty: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
    pub mode: AlignMode,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            match_score: 1,
            mismatch_penalty: 4,
            gap_open: 6,
            gap_extend: 1,
            mode: AlignMode::Local,
        }
    }
}

impl ScoringParams {
    /// 长度为 `len` 的 read 能取得的最高分
    pub fn max_score(&self, len: usize) -> i32 {
        self.match_score * len as i32
    }

    pub fn gap_cost(&self, len: usize) -> i32 {
        if len == 0 {
            0
        } else {
            self.gap_open + (len as i32 - 1) * self.gap_extend
        }
    }

    pub fn matrix(&self) -> ScoreMatrix {
        ScoreMatrix::new(self.match_score, self.mismatch_penalty)
    }
}

/// SIGMA×SIGMA 替换矩阵；未知碱基与任何碱基（包括自身）都记为错配
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreMatrix {
    cells: [[i32; SIGMA]; SIGMA],
}

impl ScoreMatrix {
    pub fn new(match_score: i32, mismatch_penalty: i32) -> Self {
        let mut cells = [[-mismatch_penalty; SIGMA]; SIGMA];
        for (i, row) in cells.iter_mut().enumerate().take(SIGMA - 1) {
            row[i] = match_score;
        }
        Self { cells }
    }

    #[inline]
    pub fn score(&self, a: u8, b: u8) -> i32 {
        self.cells[a as usize][b as usize]
    }
}
