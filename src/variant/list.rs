use std::sync::Arc;

use crate::region::{Based, Region};

use super::variant::Variant;
use super::VariantId;

/// 按位置非降序逐个交付变异的流；`next_variant` 推进，`peek_variant` 只看不推进
pub trait VariantSource {
    fn next_variant(&mut self) -> Option<Arc<Variant>>;
    fn peek_variant(&self) -> Option<Arc<Variant>>;
}

/// 已排序的变异集合，构造时为每个等位基因登记所属 [`VariantId`]
#[derive(Debug, Default)]
pub struct VariantList {
    variants: Vec<Arc<Variant>>,
}

impl VariantList {
    pub fn new(mut variants: Vec<Variant>) -> Self {
        variants.sort_by(|a, b| {
            (a.chrom(), a.position_in(Based::Zero)).cmp(&(b.chrom(), b.position_in(Based::Zero)))
        });
        let variants: Vec<Arc<Variant>> = variants
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                for allele in v.alleles() {
                    allele.set_variant(VariantId(i as u32));
                }
                Arc::new(v)
            })
            .collect();
        Self { variants }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn get(&self, id: VariantId) -> Option<&Arc<Variant>> {
        self.variants.get(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Variant>> {
        self.variants.iter()
    }

    /// 全部变异的流
    pub fn cursor(&self) -> VariantCursor {
        VariantCursor {
            variants: self.variants.clone(),
            next: 0,
        }
    }

    /// 只包含起点落在 `region` 内的变异的流
    pub fn cursor_for(&self, region: &Region) -> VariantCursor {
        let variants = self
            .variants
            .iter()
            .filter(|v| {
                v.chrom() == region.reference_id()
                    && region.contains(v.position_in(region.based()))
            })
            .map(Arc::clone)
            .collect();
        VariantCursor { variants, next: 0 }
    }
}

/// [`VariantList`] 上的一次性游标
#[derive(Debug, Clone)]
pub struct VariantCursor {
    variants: Vec<Arc<Variant>>,
    next: usize,
}

impl VariantSource for VariantCursor {
    fn next_variant(&mut self) -> Option<Arc<Variant>> {
        let v = self.variants.get(self.next)?;
        self.next += 1;
        Some(Arc::clone(v))
    }

    fn peek_variant(&self) -> Option<Arc<Variant>> {
        self.variants.get(self.next).map(Arc::clone)
    }
}

/// 直接由内存中的 Variant 序列构成的流，主要用于测试和小规模调用
impl VariantSource for std::collections::VecDeque<Arc<Variant>> {
    fn next_variant(&mut self) -> Option<Arc<Variant>> {
        self.pop_front()
    }

    fn peek_variant(&self) -> Option<Arc<Variant>> {
        self.front().map(Arc::clone)
    }
}
