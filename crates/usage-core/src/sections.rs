//! Section splitter for the detailed per-species report
//!
//! The detailed report is a sequence of boxed sections:
//!
//! ```text
//!  +----------------------------------------+
//!  | Tyranitar                              |
//!  +----------------------------------------+
//!  | Abilities                              |
//!  | Sand Stream 100.000%                   |
//!  +----------------------------------------+
//!  +----------------------------------------+
//! ```
//!
//! Every line loses its wrapper characters, the 40-dash line separates
//! sections, and an empty section closes the current species block.

use crate::error::{Error, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator line after wrapper stripping
pub const SEPARATOR: &str = "----------------------------------------";

/// Strip surrounding whitespace and one wrapper character from each end
pub fn strip_wrapper(line: &str) -> &str {
    let mut chars = line.trim().chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return "";
    }
    chars.as_str().trim()
}

/// Lines between two consecutive separators
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    pub lines: Vec<String>,
}

impl Section {
    /// First line of the section: species name or category label
    pub fn title(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    /// Lines after the title
    pub fn body(&self) -> &[String] {
        self.lines.get(1..).unwrap_or_default()
    }
}

/// All sections belonging to one species, in report order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityBlock {
    pub sections: Vec<Section>,
}

impl EntityBlock {
    /// Display name taken from the first section
    pub fn name(&self) -> &str {
        self.sections
            .first()
            .and_then(Section::title)
            .unwrap_or_default()
    }

    /// Category sections following the name section
    pub fn categories(&self) -> &[Section] {
        self.sections.get(1..).unwrap_or_default()
    }
}

/// What to do with a block that is never closed by an empty section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingPolicy {
    /// Fail with `Error::UnterminatedEntity`
    #[default]
    Reject,
    /// Silently discard the block
    Drop,
    /// Keep the block as if it had been closed
    Close,
}

impl fmt::Display for TrailingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrailingPolicy::Reject => "reject",
            TrailingPolicy::Drop => "drop",
            TrailingPolicy::Close => "close",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TrailingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(TrailingPolicy::Reject),
            "drop" => Ok(TrailingPolicy::Drop),
            "close" => Ok(TrailingPolicy::Close),
            _ => Err(format!(
                "unknown trailing policy '{}', expected reject, drop or close",
                s
            )),
        }
    }
}

/// Accumulates sections into blocks as separators are encountered
#[derive(Debug, Default)]
struct Splitter {
    /// Lines of the section being read; `None` before the first separator
    open: Option<Vec<String>>,
    /// Non-empty sections of the current species
    pending: Vec<Section>,
    blocks: Vec<EntityBlock>,
}

impl Splitter {
    fn on_separator(&mut self) {
        if let Some(lines) = self.open.take() {
            if lines.is_empty() {
                self.close_block();
            } else {
                self.pending.push(Section { lines });
            }
        }
        self.open = Some(Vec::new());
    }

    fn on_line(&mut self, line: &str) {
        // Text outside any separator pair is ignored
        if let Some(lines) = self.open.as_mut() {
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
    }

    fn close_block(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let block = EntityBlock {
            sections: std::mem::take(&mut self.pending),
        };
        debug!(
            "Split block '{}' with {} section(s)",
            block.name(),
            block.sections.len()
        );
        self.blocks.push(block);
    }

    fn finish(mut self, policy: TrailingPolicy) -> Result<Vec<EntityBlock>> {
        if !self.pending.is_empty() {
            let entity = self.pending[0].title().unwrap_or_default().to_string();
            match policy {
                TrailingPolicy::Reject => return Err(Error::UnterminatedEntity { entity }),
                TrailingPolicy::Drop => {
                    warn!("Dropping unterminated block '{}'", entity);
                }
                TrailingPolicy::Close => self.close_block(),
            }
        }
        Ok(self.blocks)
    }
}

/// Split detailed report text into per-species blocks
pub fn split_sections(content: &str, policy: TrailingPolicy) -> Result<Vec<EntityBlock>> {
    let mut splitter = Splitter::default();

    for raw in content.lines() {
        let line = strip_wrapper(raw);
        if line == SEPARATOR {
            splitter.on_separator();
        } else {
            splitter.on_line(line);
        }
    }

    splitter.finish(policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(lines: &[&str]) -> String {
        lines
            .iter()
            .map(|l| {
                if *l == "sep" {
                    format!(" +{}+ \n", SEPARATOR)
                } else {
                    format!(" | {:<38} | \n", l)
                }
            })
            .collect()
    }

    #[test]
    fn test_strip_wrapper() {
        assert_eq!(strip_wrapper(" | Abilities   | "), "Abilities");
        assert_eq!(strip_wrapper("\"quoted\""), "quoted");
        assert_eq!(strip_wrapper("|"), "");
        assert_eq!(strip_wrapper("   "), "");
        assert_eq!(strip_wrapper(&format!(" +{}+ ", SEPARATOR)), SEPARATOR);
    }

    #[test]
    fn test_separator_length() {
        assert_eq!(SEPARATOR.len(), 40);
        assert!(SEPARATOR.chars().all(|c| c == '-'));
    }

    #[test]
    fn test_split_two_blocks() {
        let content = boxed(&[
            "sep", "A", "sep", "Abilities", "Levitate 100.00%", "sep", "Items", "Leftovers 50.00%",
            "sep", "sep", "B", "sep", "Moves", "Tackle 10.00%", "sep", "sep",
        ]);
        let blocks = split_sections(&content, TrailingPolicy::Reject).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name(), "A");
        assert_eq!(blocks[0].categories().len(), 2);
        assert_eq!(blocks[0].categories()[1].title(), Some("Items"));
        assert_eq!(blocks[0].categories()[1].body(), ["Leftovers 50.00%"]);
        assert_eq!(blocks[1].name(), "B");
        assert_eq!(blocks[1].categories().len(), 1);
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split_sections("", TrailingPolicy::Reject).unwrap().is_empty());
        let only_seps = boxed(&["sep", "sep", "sep"]);
        assert!(split_sections(&only_seps, TrailingPolicy::Reject)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_text_outside_separators_ignored() {
        let mut content = String::from("Header text\n");
        content.push_str(&boxed(&["sep", "A", "sep", "sep", "trailing junk"]));
        let blocks = split_sections(&content, TrailingPolicy::Reject).unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].sections[0].lines, vec!["A".to_string()]);
    }

    #[test]
    fn test_blank_lines_do_not_count_as_content() {
        let content = format!(
            "{}   \n{}",
            boxed(&["sep", "A", "sep"]),
            boxed(&["sep", "B", "sep", "sep"])
        );
        let blocks = split_sections(&content, TrailingPolicy::Reject).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].name(), "B");
    }

    #[test]
    fn test_unterminated_block_rejected() {
        let content = boxed(&["sep", "A", "sep", "sep", "B", "sep", "Items", "x 1.00%", "sep"]);
        match split_sections(&content, TrailingPolicy::Reject) {
            Err(Error::UnterminatedEntity { entity }) => assert_eq!(entity, "B"),
            other => panic!("expected UnterminatedEntity, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_block_dropped() {
        let content = boxed(&["sep", "A", "sep", "sep", "B", "sep", "Items", "x 1.00%", "sep"]);
        let blocks = split_sections(&content, TrailingPolicy::Drop).unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name(), "A");
    }

    #[test]
    fn test_unterminated_block_closed() {
        let content = boxed(&["sep", "A", "sep", "sep", "B", "sep", "Items", "x 1.00%", "sep"]);
        let blocks = split_sections(&content, TrailingPolicy::Close).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].name(), "B");
        assert_eq!(blocks[1].categories()[0].body(), ["x 1.00%"]);
    }

    #[test]
    fn test_trailing_policy_from_str() {
        assert_eq!("drop".parse::<TrailingPolicy>(), Ok(TrailingPolicy::Drop));
        assert_eq!("CLOSE".parse::<TrailingPolicy>(), Ok(TrailingPolicy::Close));
        assert!("keep".parse::<TrailingPolicy>().is_err());
        assert_eq!(TrailingPolicy::default().to_string(), "reject");
    }
}
