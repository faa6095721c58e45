//! DP 工作缓冲区与检出池
//!
//! 图拓扑只读共享，而每条比对的 H/E/F 三个平面必须私有。缓冲区按图的总列数 ×（read 长 + 1）
//! 分配，跨 read 复用；池中缓冲区的数量就是并发比对的上限。

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, PoisonError};

use crate::graph::VariantGraph;

pub(crate) const NEG_INF: i32 = i32::MIN / 4;

/// 一次图比对的 DP 工作区，可跨调用复用
#[derive(Debug, Default)]
pub struct ScoringBuffer {
    pub(crate) h: Vec<i32>,
    pub(crate) e: Vec<i32>,
    pub(crate) f: Vec<i32>,
    pub(crate) read: Vec<u8>,
    /// 每个节点上可作为终点的单元的最高分，用于判断同一位点的等位基因是否打平
    pub(crate) node_best: Vec<i32>,
    rows: usize,
}

impl ScoringBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为 `graph` 和长度为 `read_len` 的 read 准备空间；只增不减
    pub(crate) fn prepare(&mut self, graph: &VariantGraph, read_len: usize) {
        self.rows = read_len + 1;
        let size = graph.total_cols() * self.rows;
        if self.h.len() < size {
            self.h.resize(size, 0);
            self.e.resize(size, NEG_INF);
            self.f.resize(size, NEG_INF);
        }
        self.node_best.clear();
        self.node_best.resize(graph.len(), NEG_INF);
    }

    #[inline]
    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    /// 当前占用的单元数（三个平面各自）
    pub fn capacity(&self) -> usize {
        self.h.len()
    }
}

/// 固定数量的 [`ScoringBuffer`]，按需检出、用完归还
#[derive(Debug)]
pub struct BufferPool {
    slots: Mutex<Vec<ScoringBuffer>>,
    returned: Condvar,
    capacity: usize,
}

impl BufferPool {
    /// `capacity` 至少为 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Mutex::new((0..capacity).map(|_| ScoringBuffer::new()).collect()),
            returned: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 取出一个缓冲区；池空时阻塞直到有缓冲区归还
    pub fn checkout(&self) -> PooledBuffer<'_> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(buf) = slots.pop() {
                return PooledBuffer { pool: self, buf };
            }
            slots = self
                .returned
                .wait(slots)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn try_checkout(&self) -> Option<PooledBuffer<'_>> {
        let buf = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()?;
        Some(PooledBuffer { pool: self, buf })
    }

    fn give_back(&self, buf: ScoringBuffer) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(buf);
        self.returned.notify_one();
    }
}

/// 检出中的缓冲区；drop 时自动归还
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: ScoringBuffer,
}

impl Deref for PooledBuffer<'_> {
    type Target = ScoringBuffer;

    fn deref(&self) -> &ScoringBuffer {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut ScoringBuffer {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buf));
    }
}
