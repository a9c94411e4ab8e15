//! Tree policy: the knobs for behaviour the domain rules leave open.
//!
//! Defaults reproduce the long-standing behaviour of the service: only direct
//! children are inspected for parts, only direct self-parenting is rejected,
//! and a text search without matches is reported as not found.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// How far below a category the "parts in children" check looks.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildDepth {
    /// Direct children only.
    #[default]
    Direct,
    /// The whole subtree.
    Transitive,
}

/// Which parent assignments count as a cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleCheck {
    /// Reject only a category naming itself as parent.
    #[default]
    SelfOnly,
    /// Also reject a parent whose ancestor chain contains the category.
    Ancestry,
}

/// What a text search with zero matches returns.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySearch {
    #[default]
    NotFound,
    EmptyList,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePolicy {
    pub children_depth: ChildDepth,
    pub cycles: CycleCheck,
    pub empty_search: EmptySearch,
}

/// Unrecognised policy value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value {value:?} (expected one of: {expected})")]
pub struct ParsePolicyError {
    pub value: String,
    pub expected: &'static str,
}

macro_rules! impl_from_str {
    ($t:ty, $expected:literal, { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $t {
            type Err = ParsePolicyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    _ => Err(ParsePolicyError {
                        value: s.to_string(),
                        expected: $expected,
                    }),
                }
            }
        }
    };
}

impl_from_str!(ChildDepth, "direct, transitive", {
    "direct" => ChildDepth::Direct,
    "transitive" => ChildDepth::Transitive,
});

impl_from_str!(CycleCheck, "self, ancestry", {
    "self" => CycleCheck::SelfOnly,
    "ancestry" => CycleCheck::Ancestry,
});

impl_from_str!(EmptySearch, "not_found, empty", {
    "not_found" => EmptySearch::NotFound,
    "empty" => EmptySearch::EmptyList,
});
