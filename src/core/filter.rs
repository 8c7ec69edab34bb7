// LogWire - core/filter.rs
//
// Category filter engine: maps dot-separated category paths to minimum
// levels with longest-prefix inheritance.
// Core layer: pure logic, no I/O.
//
// Layout: overrides are sorted once and flattened into a layered index. Each
// node holds one path segment, an optional level, and the contiguous range of
// its children in `nodes`. Siblings are stored in ascending name order, so a
// lookup is one binary search per category segment. Segment names live in a
// single string arena rather than one allocation per node.

use crate::core::model::{category_segments, CategoryOverride, Level};
use std::collections::VecDeque;
use std::ops::Range;

#[derive(Debug, Clone)]
struct Node {
    /// Byte range of the segment name in `CategoryFilter::names`.
    name: Range<usize>,
    /// Level set by an override ending at this node.
    level: Option<Level>,
    /// Index range of the children in `CategoryFilter::nodes`.
    children: Range<usize>,
}

/// Immutable category-to-level lookup table.
///
/// Construction contract:
/// - empty path segments are dropped (`"a..b"` is `"a.b"`);
/// - a path with no segments overrides the default level;
/// - when two overrides share a path, the one supplied last wins.
///
/// Not `Clone`: a handler owns its filter exclusively, and changing the
/// filtering of a handler means building a new handler.
#[derive(Debug)]
pub struct CategoryFilter {
    level: Level,
    names: String,
    nodes: Vec<Node>,
    roots: Range<usize>,
}

/// A normalised override awaiting placement in the index.
struct PendingPath<'a> {
    segments: Vec<&'a str>,
    level: Level,
}

impl CategoryFilter {
    /// Filter with a default level and no category overrides.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            names: String::new(),
            nodes: Vec::new(),
            roots: 0..0,
        }
    }

    /// Build a filter from overrides and a default level.
    pub fn build(overrides: &[CategoryOverride], default_level: Level) -> Self {
        let mut filter = Self::new(default_level);
        if overrides.is_empty() {
            return filter;
        }

        let mut paths: Vec<PendingPath<'_>> = overrides
            .iter()
            .map(|o| PendingPath {
                segments: category_segments(&o.category).collect(),
                level: o.level,
            })
            .collect();

        // Stable sort keeps supply order among equal paths; keep the last one.
        paths.sort_by(|a, b| a.segments.cmp(&b.segments));
        let mut deduped: Vec<PendingPath<'_>> = Vec::with_capacity(paths.len());
        for path in paths {
            match deduped.last_mut() {
                Some(prev) if prev.segments == path.segments => *prev = path,
                _ => deduped.push(path),
            }
        }

        // A root override replaces the default level and sorts first.
        let mut start = 0;
        if let Some(first) = deduped.first() {
            if first.segments.is_empty() {
                filter.level = first.level;
                start = 1;
            }
        }

        filter.index(&deduped[start..]);
        filter
    }

    /// Lay out the sorted, de-duplicated paths breadth-first so that every
    /// node's children occupy one contiguous, name-ordered range.
    fn index(&mut self, paths: &[PendingPath<'_>]) {
        // Each queue entry is (parent node, depth, slice of paths under it).
        let mut queue: VecDeque<(Option<usize>, usize, Range<usize>)> = VecDeque::new();
        queue.push_back((None, 0, 0..paths.len()));

        while let Some((parent, depth, group)) = queue.pop_front() {
            let first_child = self.nodes.len();
            let mut i = group.start;
            while i < group.end {
                // Paths ending exactly at `depth` belong to the parent itself.
                if paths[i].segments.len() <= depth {
                    i += 1;
                    continue;
                }
                let segment = paths[i].segments[depth];
                let mut j = i;
                let mut level = None;
                while j < group.end
                    && paths[j].segments.len() > depth
                    && paths[j].segments[depth] == segment
                {
                    if paths[j].segments.len() == depth + 1 {
                        level = Some(paths[j].level);
                    }
                    j += 1;
                }

                let name_start = self.names.len();
                self.names.push_str(segment);
                let node_index = self.nodes.len();
                self.nodes.push(Node {
                    name: name_start..self.names.len(),
                    level,
                    children: 0..0,
                });
                queue.push_back((Some(node_index), depth + 1, i..j));
                i = j;
            }

            let children = first_child..self.nodes.len();
            match parent {
                Some(p) => self.nodes[p].children = children,
                None => self.roots = children,
            }
        }
    }

    /// Default level, used when no override matches.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Effective level for a category.
    ///
    /// Returns the level of the longest override path that is a
    /// segment-aligned prefix of `category`, or the default level. `"net"`
    /// prefixes `"net.tcp"` but not `"network"`.
    pub fn level_for(&self, category: Option<&str>) -> Level {
        let Some(category) = category else {
            return self.level;
        };

        let mut level = self.level;
        let mut siblings = self.roots.clone();
        for segment in category_segments(category) {
            if siblings.is_empty() {
                break;
            }
            match self.find(siblings.clone(), segment) {
                Some(index) => {
                    let node = &self.nodes[index];
                    if let Some(l) = node.level {
                        level = l;
                    }
                    siblings = node.children.clone();
                }
                None => break,
            }
        }
        level
    }

    /// Number of distinct override paths below the root.
    pub fn override_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.level.is_some()).count()
    }

    fn find(&self, siblings: Range<usize>, segment: &str) -> Option<usize> {
        let offset = siblings.start;
        self.nodes[siblings]
            .binary_search_by(|node| self.name(node).cmp(segment))
            .ok()
            .map(|i| i + offset)
    }

    fn name(&self, node: &Node) -> &str {
        &self.names[node.name.clone()]
    }
}
