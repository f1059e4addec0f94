//! Bounding-box index: a height-balanced R-tree over axis-aligned rectangles.
//!
//! The tree maintains two structural invariants after every mutation: each
//! node's rectangle is the minimum rectangle enclosing its children, and node
//! occupancy stays within the configured fanout bounds. Search prunes whole
//! subtrees by rectangle overlap, so a violated containment invariant corrupts
//! results silently; mutation paths therefore carry debug assertions, and
//! [`RTree::check_invariants`] walks the full structure for tests and
//! diagnostics.
//!
//! Three construction paths exist: single insertion (least-enlargement descent
//! with margin/overlap-driven node splits), batch bulk loading (sort-tile
//! packing, which produces lower trees with less overlap than repeated
//! insertion), and removal (identity-filtered descent with bottom-up
//! condensing and re-insertion of under-filled leaves).

use crate::bbox::BBox;
use crate::types::Config;

/// Bounds injection seam: anything stored in the tree reports its envelope.
///
/// Axis comparators and area measures are derived from the envelope, so this
/// single method is the whole customization surface.
pub trait SpatialObject {
    fn envelope(&self) -> BBox;
}

#[derive(Debug, Clone)]
enum Node<T> {
    Leaf { entries: Vec<T>, bbox: BBox },
    Internal { children: Vec<Node<T>>, bbox: BBox },
}

/// Payload for the shared descent routine: a fresh item bound for a leaf, or
/// a whole subtree joining at its matching level during bulk-load merges.
enum Slot<T> {
    Item(T),
    Node(Node<T>),
}

/// Shape statistics for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct TreeStats {
    pub depth: usize,
    pub node_count: usize,
    pub leaf_count: usize,
}

impl<T> Node<T> {
    fn empty_leaf() -> Self {
        Node::Leaf {
            entries: Vec::new(),
            bbox: BBox::EMPTY,
        }
    }

    fn bbox(&self) -> BBox {
        match self {
            Node::Leaf { bbox, .. } => *bbox,
            Node::Internal { bbox, .. } => *bbox,
        }
    }

    fn len(&self) -> usize {
        match self {
            Node::Leaf { entries, .. } => entries.len(),
            Node::Internal { children, .. } => children.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn height(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            // All children share one height; the tree is balanced by
            // construction.
            Node::Internal { children, .. } => {
                1 + children.first().map_or(0, |child| child.height())
            }
        }
    }

    fn internal_from(children: Vec<Node<T>>) -> Self {
        let bbox = union_of(&children, |child: &Node<T>| child.bbox());
        Node::Internal { children, bbox }
    }
}

impl<T: SpatialObject> Node<T> {
    fn leaf_from(entries: Vec<T>) -> Self {
        let bbox = union_of(&entries, |entry: &T| entry.envelope());
        Node::Leaf { entries, bbox }
    }
}

/// R-tree over items carrying axis-aligned bounds.
///
/// Fanout defaults to `M = 9`, `m = 4` ([`Config`]). The tree assumes
/// well-formed rectangles; the query pipeline rejects malformed input before
/// it reaches this layer.
#[derive(Debug, Clone)]
pub struct RTree<T> {
    root: Node<T>,
    size: usize,
    max_entries: usize,
    min_entries: usize,
}

impl<T: SpatialObject> RTree<T> {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            root: Node::empty_leaf(),
            size: 0,
            max_entries: config.max_node_entries,
            min_entries: config.min_node_entries(),
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Insert one item.
    ///
    /// Descends by minimal bounding-rectangle enlargement (ties broken by
    /// smallest resulting area, then smallest existing area, then first in
    /// iteration order), appends at the chosen leaf, and splits overflowing
    /// nodes upward, growing a new root when the split reaches it.
    pub fn insert(&mut self, item: T) {
        self.insert_slot(Slot::Item(item));
        self.size += 1;
    }

    /// Bulk load a batch of items in O(N log N) by sort-tile packing.
    ///
    /// Loading into a non-empty tree merges the packed subtree at its
    /// matching level instead of discarding previous entries; batches smaller
    /// than the minimum fill degrade to repeated insertion.
    pub fn bulk_load(&mut self, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        if items.len() < self.min_entries {
            for item in items {
                self.insert(item);
            }
            return;
        }

        let count = items.len();
        let node = self.build_subtree(items);

        if self.size == 0 {
            self.root = node;
        } else if self.root.height() == node.height() {
            // Equal heights: join both trees under a fresh root.
            let old = std::mem::replace(&mut self.root, Node::empty_leaf());
            let bbox = old.bbox().union(&node.bbox());
            self.root = Node::Internal {
                children: vec![old, node],
                bbox,
            };
        } else if self.root.height() > node.height() {
            self.insert_slot(Slot::Node(node));
        } else {
            // The packed tree is taller; insert the old root into it.
            let old = std::mem::replace(&mut self.root, node);
            self.insert_slot(Slot::Node(old));
        }

        self.size += count;
    }

    /// All items whose envelope overlaps `rect` (boundary-inclusive), in
    /// traversal order. Subtrees whose rectangle misses `rect` are pruned.
    pub fn search(&self, rect: &BBox) -> Vec<&T> {
        let mut found = Vec::new();
        if self.size > 0 {
            Self::search_node(&self.root, rect, &mut found);
        }
        found
    }

    /// Remove the first item matching `matches`, located by descending only
    /// into subtrees whose rectangle covers `target` (the item's envelope).
    ///
    /// Leaves dropping below the minimum fill surrender their remaining
    /// entries for re-insertion from the root; emptied nodes are unlinked and
    /// ancestor rectangles shrink to tightly bound what remains. Returns
    /// `None` without touching the tree when nothing matches.
    pub fn remove_with<F>(&mut self, target: &BBox, matches: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        if self.size == 0 {
            return None;
        }

        let mut orphans = Vec::new();
        let removed = Self::remove_node(
            &mut self.root,
            target,
            &matches,
            self.min_entries,
            true,
            &mut orphans,
        )?;
        self.size -= 1;

        // Collapse single-child internal chains left by condensing.
        loop {
            let promoted = match &mut self.root {
                Node::Internal { children, .. } if children.len() == 1 => children.pop(),
                _ => None,
            };
            match promoted {
                Some(node) => self.root = node,
                None => break,
            }
        }
        if self.root.is_empty() {
            self.root = Node::empty_leaf();
        }

        for item in orphans {
            self.insert_slot(Slot::Item(item));
        }

        Some(removed)
    }

    /// Shape statistics for diagnostics.
    pub fn stats(&self) -> TreeStats {
        if self.size == 0 {
            return TreeStats {
                depth: 0,
                node_count: 0,
                leaf_count: 0,
            };
        }
        Self::stats_node(&self.root)
    }

    /// Walk the whole tree asserting the structural invariants: exact
    /// bounding rectangles, fanout upper bound, balanced depth. When
    /// `enforce_leaf_min` is set, non-root leaves must also satisfy the
    /// minimum fill (holds for insertion/removal-built trees; bulk loading
    /// packs leaves up to `M` without a lower bound).
    ///
    /// Panics on violation; intended for tests and debugging.
    pub fn check_invariants(&self, enforce_leaf_min: bool) {
        if self.size == 0 {
            return;
        }
        Self::check_node(
            &self.root,
            true,
            self.min_entries,
            self.max_entries,
            enforce_leaf_min,
        );
    }

    fn insert_slot(&mut self, slot: Slot<T>) {
        let level = match &slot {
            Slot::Item(_) => self.root.height() - 1,
            Slot::Node(node) => self.root.height() - node.height() - 1,
        };

        if let Some(sibling) =
            Self::insert_node(&mut self.root, slot, level, self.min_entries, self.max_entries)
        {
            // Root split: grow the tree by one level.
            let old = std::mem::replace(&mut self.root, Node::empty_leaf());
            let bbox = old.bbox().union(&sibling.bbox());
            self.root = Node::Internal {
                children: vec![old, sibling],
                bbox,
            };
        }
    }

    fn insert_node(
        node: &mut Node<T>,
        slot: Slot<T>,
        level: usize,
        min: usize,
        max: usize,
    ) -> Option<Node<T>> {
        let slot_bbox = match &slot {
            Slot::Item(item) => item.envelope(),
            Slot::Node(subtree) => subtree.bbox(),
        };

        if level == 0 {
            match (&mut *node, slot) {
                (Node::Leaf { entries, bbox }, Slot::Item(item)) => {
                    bbox.expand(&slot_bbox);
                    entries.push(item);
                }
                (Node::Internal { children, bbox }, Slot::Node(subtree)) => {
                    bbox.expand(&slot_bbox);
                    children.push(subtree);
                }
                _ => unreachable!("insertion level does not match node kind"),
            }
        } else {
            let Node::Internal { children, bbox } = &mut *node else {
                unreachable!("descent reached a leaf above the target level")
            };
            bbox.expand(&slot_bbox);
            let chosen = choose_subtree(children, &slot_bbox);
            if let Some(sibling) = Self::insert_node(&mut children[chosen], slot, level - 1, min, max)
            {
                children.push(sibling);
            }
        }

        (node.len() > max).then(|| Self::split_node(node, min))
    }

    fn split_node(node: &mut Node<T>, min: usize) -> Node<T> {
        match node {
            Node::Leaf { entries, bbox } => {
                let spilled = split_items(entries, |entry: &T| entry.envelope(), min);
                debug_assert!(entries.len() >= min && spilled.len() >= min);
                *bbox = union_of(entries, |entry: &T| entry.envelope());
                Node::leaf_from(spilled)
            }
            Node::Internal { children, bbox } => {
                let spilled = split_items(children, |child: &Node<T>| child.bbox(), min);
                debug_assert!(children.len() >= min && spilled.len() >= min);
                *bbox = union_of(children, |child: &Node<T>| child.bbox());
                Node::internal_from(spilled)
            }
        }
    }

    fn build_subtree(&self, mut items: Vec<T>) -> Node<T> {
        let max = self.max_entries;

        // Pack leaves: sort by one axis, cut into ceil(sqrt(N/M)) vertical
        // slices, sort each slice by the other axis, fill leaves up to M.
        let mut level: Vec<Node<T>> = if items.len() <= max {
            vec![Node::leaf_from(items)]
        } else {
            items.sort_by(|a, b| a.envelope().min_x.total_cmp(&b.envelope().min_x));
            let slice_count = ((items.len() as f64 / max as f64).sqrt().ceil()) as usize;
            let slice_size = items.len().div_ceil(slice_count);

            let mut leaves = Vec::with_capacity(items.len().div_ceil(max));
            while !items.is_empty() {
                let rest = items.split_off(items.len().min(slice_size));
                let mut slice = std::mem::replace(&mut items, rest);
                slice.sort_by(|a, b| a.envelope().min_y.total_cmp(&b.envelope().min_y));
                while !slice.is_empty() {
                    let rest = slice.split_off(slice.len().min(max));
                    let chunk = std::mem::replace(&mut slice, rest);
                    leaves.push(Node::leaf_from(chunk));
                }
            }
            leaves
        };

        // Pack upward until a single root remains.
        while level.len() > 1 {
            let mut upper = Vec::with_capacity(level.len().div_ceil(max));
            while !level.is_empty() {
                let rest = level.split_off(level.len().min(max));
                let group = std::mem::replace(&mut level, rest);
                upper.push(Node::internal_from(group));
            }
            level = upper;
        }

        match level.pop() {
            Some(root) => root,
            None => unreachable!("bulk build requires a non-empty batch"),
        }
    }

    fn search_node<'a>(node: &'a Node<T>, rect: &BBox, found: &mut Vec<&'a T>) {
        if !node.bbox().intersects(rect) {
            return;
        }
        match node {
            Node::Leaf { entries, .. } => {
                for entry in entries {
                    if entry.envelope().intersects(rect) {
                        found.push(entry);
                    }
                }
            }
            Node::Internal { children, .. } => {
                for child in children {
                    Self::search_node(child, rect, found);
                }
            }
        }
    }

    fn remove_node<F>(
        node: &mut Node<T>,
        target: &BBox,
        matches: &F,
        min: usize,
        is_root: bool,
        orphans: &mut Vec<T>,
    ) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        match node {
            Node::Leaf { entries, bbox } => {
                let position = entries.iter().position(|entry| matches(entry))?;
                let removed = entries.remove(position);
                if !is_root && entries.len() < min {
                    // Underflow: surrender the survivors for re-insertion.
                    orphans.append(entries);
                }
                *bbox = union_of(entries, |entry: &T| entry.envelope());
                Some(removed)
            }
            Node::Internal { children, bbox } => {
                let mut removed = None;
                for i in 0..children.len() {
                    if !children[i].bbox().contains(target) {
                        continue;
                    }
                    if let Some(item) =
                        Self::remove_node(&mut children[i], target, matches, min, false, orphans)
                    {
                        if children[i].is_empty() {
                            children.remove(i);
                        }
                        removed = Some(item);
                        break;
                    }
                }
                let removed = removed?;
                debug_assert!(children.iter().all(|child| !child.is_empty()));
                *bbox = union_of(children, |child: &Node<T>| child.bbox());
                Some(removed)
            }
        }
    }

    fn stats_node(node: &Node<T>) -> TreeStats {
        match node {
            Node::Leaf { .. } => TreeStats {
                depth: 1,
                node_count: 1,
                leaf_count: 1,
            },
            Node::Internal { children, .. } => {
                let mut stats = TreeStats {
                    depth: 1,
                    node_count: 1,
                    leaf_count: 0,
                };
                for child in children {
                    let child_stats = Self::stats_node(child);
                    stats.depth = stats.depth.max(1 + child_stats.depth);
                    stats.node_count += child_stats.node_count;
                    stats.leaf_count += child_stats.leaf_count;
                }
                stats
            }
        }
    }

    /// Returns subtree height so siblings can be checked for balance.
    fn check_node(
        node: &Node<T>,
        is_root: bool,
        min: usize,
        max: usize,
        enforce_leaf_min: bool,
    ) -> usize {
        match node {
            Node::Leaf { entries, bbox } => {
                assert!(entries.len() <= max, "leaf overflow: {}", entries.len());
                if enforce_leaf_min && !is_root {
                    assert!(
                        entries.len() >= min,
                        "leaf underflow: {} < {}",
                        entries.len(),
                        min
                    );
                }
                let exact = union_of(entries, |entry: &T| entry.envelope());
                assert_eq!(*bbox, exact, "leaf rectangle is not minimal");
                1
            }
            Node::Internal { children, bbox } => {
                assert!(!children.is_empty(), "empty internal node survived condense");
                assert!(children.len() <= max, "node overflow: {}", children.len());
                let exact = union_of(children, |child: &Node<T>| child.bbox());
                assert_eq!(*bbox, exact, "internal rectangle is not minimal");

                let mut height = None;
                for child in children {
                    let child_height =
                        Self::check_node(child, false, min, max, enforce_leaf_min);
                    match height {
                        None => height = Some(child_height),
                        Some(h) => assert_eq!(h, child_height, "unbalanced subtree"),
                    }
                }
                1 + height.unwrap_or(0)
            }
        }
    }
}

impl<T: SpatialObject> Default for RTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimum rectangle covering every item in `items`.
fn union_of<C, F>(items: &[C], bounds: F) -> BBox
where
    F: Fn(&C) -> BBox,
{
    let mut merged = BBox::EMPTY;
    for item in items {
        merged.expand(&bounds(item));
    }
    merged
}

/// Least-enlargement child choice with a deterministic tie-break chain:
/// smallest resulting area, then smallest existing area, then first in
/// iteration order.
fn choose_subtree<T>(children: &[Node<T>], target: &BBox) -> usize {
    let mut best = 0;
    let mut best_enlargement = f64::INFINITY;
    let mut best_enlarged_area = f64::INFINITY;
    let mut best_area = f64::INFINITY;

    for (i, child) in children.iter().enumerate() {
        let area = child.bbox().area();
        let enlarged_area = child.bbox().union(target).area();
        let enlargement = enlarged_area - area;

        let better = enlargement < best_enlargement
            || (enlargement == best_enlargement
                && (enlarged_area < best_enlarged_area
                    || (enlarged_area == best_enlarged_area && area < best_area)));
        if better {
            best = i;
            best_enlargement = enlargement;
            best_enlarged_area = enlarged_area;
            best_area = area;
        }
    }

    best
}

/// Split an overflowing collection in two, leaving the first group in place
/// and returning the second.
///
/// The split axis is the one whose sorted distributions have the smallest
/// total margin; the split position minimizes pairwise overlap, then combined
/// area, over all positions leaving at least `min` on each side.
fn split_items<C, F>(items: &mut Vec<C>, bounds: F, min: usize) -> Vec<C>
where
    F: Fn(&C) -> BBox,
{
    let x_margin = all_dist_margin(items, &bounds, min, true);
    let y_margin = all_dist_margin(items, &bounds, min, false);
    // Items are left sorted by min_y; re-sort when the x axis packs tighter.
    if x_margin < y_margin {
        items.sort_by(|a, b| bounds(a).min_x.total_cmp(&bounds(b).min_x));
    }

    let index = choose_split_index(items, &bounds, min);
    items.split_off(index)
}

/// Total margin of all legal left/right distributions along one axis,
/// sorting `items` by that axis as a side effect.
fn all_dist_margin<C, F>(items: &mut [C], bounds: &F, min: usize, by_x: bool) -> f64
where
    F: Fn(&C) -> BBox,
{
    if by_x {
        items.sort_by(|a, b| bounds(a).min_x.total_cmp(&bounds(b).min_x));
    } else {
        items.sort_by(|a, b| bounds(a).min_y.total_cmp(&bounds(b).min_y));
    }

    let len = items.len();
    let mut left = union_of(&items[..min], bounds);
    let mut right = union_of(&items[len - min..], bounds);
    let mut margin = left.margin() + right.margin();

    for item in &items[min..len - min] {
        left.expand(&bounds(item));
        margin += left.margin();
    }
    for item in items[min..len - min].iter().rev() {
        right.expand(&bounds(item));
        margin += right.margin();
    }

    margin
}

fn choose_split_index<C, F>(items: &[C], bounds: &F, min: usize) -> usize
where
    F: Fn(&C) -> BBox,
{
    let len = items.len();
    let mut best = min;
    let mut best_overlap = f64::INFINITY;
    let mut best_area = f64::INFINITY;

    for i in min..=len - min {
        let first = union_of(&items[..i], bounds);
        let second = union_of(&items[i..], bounds);
        let overlap = first.intersection_area(&second);
        let area = first.area() + second.area();

        if overlap < best_overlap || (overlap == best_overlap && area < best_area) {
            best = i;
            best_overlap = overlap;
            best_area = area;
        }
    }

    best
}
