use std::sync::OnceLock;

use thiserror::Error;

use lcasm_core::cpu::opcode::Opcode32;

use super::instruction::{InstructionDescriptor, LCA_INSTRUCTIONS};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("`{second}` shares its encoding with `{first}` and can never be dispatched")]
    Collision {
        first: &'static str,
        second: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

pub type DescriptorPair = (&'static InstructionDescriptor, &'static InstructionDescriptor);

/// Ordered descriptor set. Dispatch scans in registration order and the
/// first descriptor whose fixed bits match wins.
#[derive(Debug)]
pub struct Catalog {
    descriptors: Vec<&'static InstructionDescriptor>,
}

impl Catalog {
    /// Builds a catalog, logging any descriptor shadowed by an earlier one.
    pub fn new(descriptors: impl IntoIterator<Item = &'static InstructionDescriptor>) -> Self {
        let catalog = Self {
            descriptors: descriptors.into_iter().collect(),
        };
        for (first, second) in catalog.collisions() {
            tracing::warn!(
                "{} is shadowed by {}: both match {:#010X}",
                second.mnemonic(),
                first.mnemonic(),
                first.fixed_bits()
            );
        }
        catalog
    }

    /// Like [`Catalog::new`], but refuses descriptor sets with collisions.
    pub fn strict(
        descriptors: impl IntoIterator<Item = &'static InstructionDescriptor>,
    ) -> Result<Self> {
        let catalog = Self {
            descriptors: descriptors.into_iter().collect(),
        };
        match catalog.collisions().first() {
            Some((first, second)) => Err(CatalogError::Collision {
                first: first.mnemonic(),
                second: second.mnemonic(),
            }),
            None => Ok(catalog),
        }
    }

    /// The Lobotomy Corporation Assembly instruction set.
    pub fn lca() -> &'static Catalog {
        static LCA: OnceLock<Catalog> = OnceLock::new();
        LCA.get_or_init(|| Catalog::new(LCA_INSTRUCTIONS.iter()))
    }

    pub fn find(&self, word: Opcode32) -> Option<&'static InstructionDescriptor> {
        self.descriptors.iter().copied().find(|desc| desc.matches(word))
    }

    pub fn by_mnemonic(&self, mnemonic: &str) -> Option<&'static InstructionDescriptor> {
        self.descriptors
            .iter()
            .copied()
            .find(|desc| desc.mnemonic().eq_ignore_ascii_case(mnemonic))
    }

    /// Pairs `(earlier, later)` where `later` can match a word that
    /// `earlier` already claims.
    pub fn collisions(&self) -> Vec<DescriptorPair> {
        let mut pairs = Vec::new();
        for (idx, first) in self.descriptors.iter().enumerate() {
            for second in &self.descriptors[idx + 1..] {
                if first.overlaps(second) {
                    pairs.push((*first, *second));
                }
            }
        }
        pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static InstructionDescriptor> + '_ {
        self.descriptors.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
