//! 变异与等位基因模型

pub mod allele;
pub mod list;
#[allow(clippy::module_inception)]
pub mod variant;

use serde::{Deserialize, Serialize};

pub use allele::{Allele, ConfidenceTier, CountSnapshot, TIER_COUNT};
pub use list::{VariantCursor, VariantList, VariantSource};
pub use variant::Variant;

/// Variant 在所属 [`VariantList`] 中的下标，用作 Allele 的非拥有反向引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantId(pub u32);
