use std::sync::{Arc, Mutex, PoisonError};

use crate::align::GraphMapping;

/// 样本（读段组）身份
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sample {
    name: String,
    read_group: String,
}

impl Sample {
    pub fn new(name: impl Into<String>, read_group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_group: read_group.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_group(&self) -> &str {
        &self.read_group
    }
}

/// 一条待裁决的 read。
///
/// 比对结果列表由单个非重入锁保护；裁决先算好所有更新，再一次性加锁追加。
#[derive(Debug)]
pub struct Read {
    id: String,
    sequence: Vec<u8>,
    reverse: bool,
    sample: Arc<Sample>,
    mappings: Mutex<Vec<Arc<GraphMapping>>>,
}

impl Read {
    pub fn new(id: impl Into<String>, sequence: impl Into<Vec<u8>>, sample: Arc<Sample>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
            reverse: false,
            sample,
            mappings: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn sample(&self) -> &Arc<Sample> {
        &self.sample
    }

    pub(crate) fn push_mappings(&self, new: impl IntoIterator<Item = Arc<GraphMapping>>) {
        self.mappings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(new);
    }

    pub fn mappings(&self) -> Vec<Arc<GraphMapping>> {
        self.mappings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
