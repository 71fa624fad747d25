//! Typed per-species statistics tree built from detailed report blocks

use crate::entry::{parse_entry, CategoryEntry};
use crate::error::{Error, Result};
use crate::markup::Element;
use crate::sections::{split_sections, EntityBlock, TrailingPolicy};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const ROOT_TAG: &str = "stats";
const ENTITY_TAG: &str = "pokemon";
const SPECIES_TAG: &str = "species";
const NAME_TAG: &str = "name";
const PROBABILITY_TAG: &str = "probability";

/// Statistic grouping within a species block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Ability,
    Item,
    Nature,
    EvSpread,
    Move,
    Teammate,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Ability,
        Category::Item,
        Category::Nature,
        Category::EvSpread,
        Category::Move,
        Category::Teammate,
    ];

    /// Look up a section label such as "Abilities" or "EV Spreads"
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "abilities" => Some(Category::Ability),
            "items" => Some(Category::Item),
            "natures" => Some(Category::Nature),
            "ev spreads" => Some(Category::EvSpread),
            "moves" => Some(Category::Move),
            "teammates" => Some(Category::Teammate),
            _ => None,
        }
    }

    /// Lowercased section label, e.g. "ev spreads"
    pub fn plural(self) -> &'static str {
        match self {
            Category::Ability => "abilities",
            Category::Item => "items",
            Category::Nature => "natures",
            Category::EvSpread => "ev spreads",
            Category::Move => "moves",
            Category::Teammate => "teammates",
        }
    }

    /// Singular name, e.g. "ev spread"
    pub fn singular(self) -> &'static str {
        match self {
            Category::Ability => "ability",
            Category::Item => "item",
            Category::Nature => "nature",
            Category::EvSpread => "ev spread",
            Category::Move => "move",
            Category::Teammate => "teammate",
        }
    }

    /// Element name of the category: the plural with spaces replaced by underscores
    pub fn tag(self) -> &'static str {
        match self {
            Category::EvSpread => "ev_spreads",
            other => other.plural(),
        }
    }

    /// Element name of each entry: the singular with spaces replaced by underscores
    pub fn entry_tag(self) -> &'static str {
        match self {
            Category::EvSpread => "ev_spread",
            other => other.singular(),
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }
}

/// Entries of one category, "Other" excluded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: Category,
    pub entries: Vec<CategoryEntry>,
}

/// All categories reported for one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStats {
    pub name: String,
    pub categories: Vec<CategoryStats>,
}

/// Root of the detailed statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsTree {
    pub entities: Vec<EntityStats>,
}

impl StatsTree {
    /// Number of species in the tree
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Find a species by name
    pub fn find_entity(&self, name: &str) -> Option<&EntityStats> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Flatten to (species, category, label, probability) tuples
    pub fn tuples(&self) -> Vec<(&str, Category, &str, f64)> {
        self.entities
            .iter()
            .flat_map(|entity| {
                entity.categories.iter().flat_map(move |stats| {
                    stats.entries.iter().map(move |entry| {
                        (
                            entity.name.as_str(),
                            stats.category,
                            entry.label.as_str(),
                            entry.probability,
                        )
                    })
                })
            })
            .collect()
    }

    /// Convert to the generic element tree used for markup output
    pub fn to_element(&self) -> Element {
        let mut root = Element::new(ROOT_TAG);
        for entity in &self.entities {
            let mut node =
                Element::new(ENTITY_TAG).with_child(Element::leaf(SPECIES_TAG, &entity.name));
            for stats in &entity.categories {
                let mut category = Element::new(stats.category.tag());
                for entry in &stats.entries {
                    category.children.push(
                        Element::new(stats.category.entry_tag())
                            .with_child(Element::leaf(NAME_TAG, &entry.label))
                            .with_child(Element::leaf(
                                PROBABILITY_TAG,
                                entry.probability.to_string(),
                            )),
                    );
                }
                node.children.push(category);
            }
            root.children.push(node);
        }
        root
    }

    /// Rebuild a tree from an element tree produced by [`StatsTree::to_element`]
    pub fn from_element(root: &Element) -> Result<Self> {
        expect_tag(root, ROOT_TAG)?;

        let mut entities = Vec::new();
        for node in &root.children {
            expect_tag(node, ENTITY_TAG)?;
            let (species, categories) = node.children.split_first().ok_or_else(|| {
                Error::UnexpectedElement {
                    expected: SPECIES_TAG.to_string(),
                    found: format!("/{}", ENTITY_TAG),
                }
            })?;
            expect_tag(species, SPECIES_TAG)?;

            let mut entity = EntityStats {
                name: species.text.clone(),
                categories: Vec::new(),
            };
            for category_node in categories {
                let category = Category::from_tag(&category_node.tag).ok_or_else(|| {
                    Error::UnknownCategory {
                        entity: entity.name.clone(),
                        label: category_node.tag.clone(),
                    }
                })?;
                let entries = category_node
                    .children
                    .iter()
                    .map(|node| entry_from_element(node, category))
                    .collect::<Result<Vec<_>>>()?;
                entity.categories.push(CategoryStats { category, entries });
            }
            entities.push(entity);
        }

        Ok(StatsTree { entities })
    }
}

fn expect_tag(element: &Element, expected: &str) -> Result<()> {
    if element.tag == expected {
        Ok(())
    } else {
        Err(Error::UnexpectedElement {
            expected: expected.to_string(),
            found: element.tag.clone(),
        })
    }
}

fn entry_from_element(node: &Element, category: Category) -> Result<CategoryEntry> {
    expect_tag(node, category.entry_tag())?;
    match node.children.as_slice() {
        [name, probability] => {
            expect_tag(name, NAME_TAG)?;
            expect_tag(probability, PROBABILITY_TAG)?;
            let value: f64 = probability.text.parse().map_err(|_| Error::MalformedEntry {
                content: probability.text.clone(),
                reason: "probability is not a number".to_string(),
            })?;
            Ok(CategoryEntry::new(name.text.clone(), value))
        }
        _ => Err(Error::UnexpectedElement {
            expected: format!("{} and {}", NAME_TAG, PROBABILITY_TAG),
            found: format!("{} child element(s)", node.children.len()),
        }),
    }
}

/// Build the statistics tree from split report blocks
pub fn build_tree(blocks: &[EntityBlock]) -> Result<StatsTree> {
    let mut entities = Vec::with_capacity(blocks.len());

    for block in blocks {
        let name = block.name().to_string();
        let mut categories = Vec::new();

        for section in block.categories() {
            let label = section.title().unwrap_or_default();
            let category = Category::from_label(label).ok_or_else(|| Error::UnknownCategory {
                entity: name.clone(),
                label: label.to_string(),
            })?;

            let mut entries = Vec::new();
            for line in section.body() {
                let entry = parse_entry(line)?;
                if !entry.is_other() {
                    entries.push(entry);
                }
            }
            categories.push(CategoryStats { category, entries });
        }

        debug!("Built '{}' with {} categories", name, categories.len());
        entities.push(EntityStats { name, categories });
    }

    Ok(StatsTree { entities })
}

/// Parse a detailed report file into a statistics tree
pub fn parse_detailed<P: AsRef<Path>>(path: P, policy: TrailingPolicy) -> Result<StatsTree> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_detailed_str(&content, policy)
}

/// Parse detailed report text into a statistics tree
pub fn parse_detailed_str(content: &str, policy: TrailingPolicy) -> Result<StatsTree> {
    let blocks = split_sections(content, policy)?;
    build_tree(&blocks)
}
