use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::VariantId;

/// 支持度置信分档：由比对得分占满分的百分比决定，平局单独计入 Ambiguous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceTier {
    NinetyFive = 0,
    Ninety = 1,
    Eighty = 2,
    Seventy = 3,
    Low = 4,
    Ambiguous = 5,
}

pub const TIER_COUNT: usize = 6;

impl ConfidenceTier {
    pub const ALL: [ConfidenceTier; TIER_COUNT] = [
        ConfidenceTier::NinetyFive,
        ConfidenceTier::Ninety,
        ConfidenceTier::Eighty,
        ConfidenceTier::Seventy,
        ConfidenceTier::Low,
        ConfidenceTier::Ambiguous,
    ];

    /// 百分比 → 分档（永远不会返回 Ambiguous）
    pub fn from_percent(percent: u32) -> Self {
        if percent >= 95 {
            ConfidenceTier::NinetyFive
        } else if percent >= 90 {
            ConfidenceTier::Ninety
        } else if percent >= 80 {
            ConfidenceTier::Eighty
        } else if percent >= 70 {
            ConfidenceTier::Seventy
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn short_name(self) -> &'static str {
        match self {
            ConfidenceTier::NinetyFive => "NFP",
            ConfidenceTier::Ninety => "NP",
            ConfidenceTier::Eighty => "EP",
            ConfidenceTier::Seventy => "SP",
            ConfidenceTier::Low => "LP",
            ConfidenceTier::Ambiguous => "AP",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfidenceTier::NinetyFive => "NinetyFivePercent",
            ConfidenceTier::Ninety => "NinetyPercent",
            ConfidenceTier::Eighty => "EightyPercent",
            ConfidenceTier::Seventy => "SeventyPercent",
            ConfidenceTier::Low => "LowPercent",
            ConfidenceTier::Ambiguous => "Ambiguous",
        };
        f.write_str(name)
    }
}

/// 单个样本的计数：[正向/反向][分档]
#[derive(Debug, Default)]
struct SampleCounts {
    forward: [AtomicU32; TIER_COUNT],
    reverse: [AtomicU32; TIER_COUNT],
}

impl SampleCounts {
    fn bucket(&self, reverse: bool, tier: ConfidenceTier) -> &AtomicU32 {
        if reverse {
            &self.reverse[tier.index()]
        } else {
            &self.forward[tier.index()]
        }
    }
}

/// 某样本计数的快照，`[0]` 为正向，`[1]` 为反向
pub type CountSnapshot = [[u32; TIER_COUNT]; 2];

/// 等位基因：构建后序列不可变；计数只增不减，可被多线程并发累加。
///
/// 指回所属 Variant 的是一个非拥有的 [`VariantId`]，由 `VariantList` 在登记时设置一次。
#[derive(Debug)]
pub struct Allele {
    sequence: Vec<u8>,
    variant: OnceLock<VariantId>,
    counts: RwLock<HashMap<Arc<str>, Arc<SampleCounts>>>,
}

impl Allele {
    pub fn new(sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            sequence: sequence.into(),
            variant: OnceLock::new(),
            counts: RwLock::new(HashMap::new()),
        }
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn sequence_string(&self) -> String {
        String::from_utf8_lossy(&self.sequence).into_owned()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// 重复设置返回 false，原值保留
    pub fn set_variant(&self, id: VariantId) -> bool {
        self.variant.set(id).is_ok()
    }

    pub fn variant(&self) -> Option<VariantId> {
        self.variant.get().copied()
    }

    fn sample_counts(&self, sample: &str) -> Arc<SampleCounts> {
        // 读锁快路径；样本首次出现时才取写锁
        if let Ok(map) = self.counts.read() {
            if let Some(c) = map.get(sample) {
                return Arc::clone(c);
            }
        }
        let mut map = self.counts.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(Arc::from(sample)).or_default())
    }

    pub fn increment(&self, sample: &str, tier: ConfidenceTier, reverse: bool) {
        self.sample_counts(sample)
            .bucket(reverse, tier)
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn forward_count(&self, sample: &str, tier: ConfidenceTier) -> u32 {
        self.load(sample, false, tier)
    }

    pub fn reverse_count(&self, sample: &str, tier: ConfidenceTier) -> u32 {
        self.load(sample, true, tier)
    }

    fn load(&self, sample: &str, reverse: bool, tier: ConfidenceTier) -> u32 {
        let map = self.counts.read().unwrap_or_else(PoisonError::into_inner);
        map.get(sample)
            .map(|c| c.bucket(reverse, tier).load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// 所有样本、两个方向在该分档上的总和
    pub fn total_count(&self, tier: ConfidenceTier) -> u32 {
        let map = self.counts.read().unwrap_or_else(PoisonError::into_inner);
        map.values()
            .map(|c| {
                c.bucket(false, tier).load(Ordering::Relaxed)
                    + c.bucket(true, tier).load(Ordering::Relaxed)
            })
            .sum()
    }

    /// 按样本名排序的计数快照
    pub fn snapshot(&self) -> Vec<(String, CountSnapshot)> {
        let map = self.counts.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<(String, CountSnapshot)> = map
            .iter()
            .map(|(name, c)| {
                let mut snap = [[0u32; TIER_COUNT]; 2];
                for tier in ConfidenceTier::ALL {
                    snap[0][tier.index()] = c.bucket(false, tier).load(Ordering::Relaxed);
                    snap[1][tier.index()] = c.bucket(true, tier).load(Ordering::Relaxed);
                }
                (name.to_string(), snap)
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(
            ConfidenceTier::from_percent(100),
            ConfidenceTier::NinetyFive
        );
        assert_eq!(ConfidenceTier::from_percent(95), ConfidenceTier::NinetyFive);
        assert_eq!(ConfidenceTier::from_percent(94), ConfidenceTier::Ninety);
        assert_eq!(ConfidenceTier::from_percent(80), ConfidenceTier::Eighty);
        assert_eq!(ConfidenceTier::from_percent(70), ConfidenceTier::Seventy);
        assert_eq!(ConfidenceTier::from_percent(69), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::Ambiguous.short_name(), "AP");
        assert_eq!(ConfidenceTier::ALL.len(), TIER_COUNT);
    }

    #[test]
    fn counts_are_bucketed_by_sample_direction_and_tier() {
        let a = Allele::new(b"ACG".to_vec());
        a.increment("s1", ConfidenceTier::NinetyFive, false);
        a.increment("s1", ConfidenceTier::NinetyFive, false);
        a.increment("s1", ConfidenceTier::Low, true);
        a.increment("s2", ConfidenceTier::NinetyFive, true);

        assert_eq!(a.forward_count("s1", ConfidenceTier::NinetyFive), 2);
        assert_eq!(a.reverse_count("s1", ConfidenceTier::NinetyFive), 0);
        assert_eq!(a.reverse_count("s1", ConfidenceTier::Low), 1);
        assert_eq!(a.forward_count("missing", ConfidenceTier::Low), 0);
        assert_eq!(a.total_count(ConfidenceTier::NinetyFive), 3);

        let snap = a.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].0, "s1");
        assert_eq!(snap[1].1[1][ConfidenceTier::NinetyFive.index()], 1);
    }

    #[test]
    fn variant_handle_is_set_once() {
        let a = Allele::new(b"T".to_vec());
        assert_eq!(a.variant(), None);
        assert!(a.set_variant(VariantId(3)));
        assert!(!a.set_variant(VariantId(4)));
        assert_eq!(a.variant(), Some(VariantId(3)));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let a = Arc::new(Allele::new(b"A".to_vec()));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let a = Arc::clone(&a);
                std::thread::spawn(move || {
                    let sample = if t % 2 == 0 { "even" } else { "odd" };
                    for _ in 0..1000 {
                        a.increment(sample, ConfidenceTier::Ninety, t % 4 == 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(a.total_count(ConfidenceTier::Ninety), 8000);
    }
}
