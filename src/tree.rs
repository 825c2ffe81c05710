//! Groups the manifest into the category tree shown in the side panel.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. The
//! synthetic `ModPacks` node is always allocated; in item mode it is the
//! first root and holds one childless node per pack, in mod-pack mode it is
//! hidden and the pack nodes themselves are the roots.

use crate::error::ClassificationError;
use crate::item::{classify, GenericItem};
use crate::mod_model::{Manifest, ModEntry};
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use tracing::{debug, warn};

pub const MOD_PACKS: &str = "ModPacks";
pub const STANDALONE: &str = "Standalone (Non-ModPack)";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    Item,
    ModPack,
}

impl FilterMode {
    pub fn as_setting(self) -> &'static str {
        match self {
            FilterMode::Item => "Item",
            FilterMode::ModPack => "ModPack",
        }
    }

    pub fn from_setting(value: &str) -> Self {
        if value == "ModPack" {
            FilterMode::ModPack
        } else {
            FilterMode::Item
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Name,
    Date,
}

impl SortMode {
    pub fn as_setting(self) -> &'static str {
        match self {
            SortMode::Name => "NameSort",
            SortMode::Date => "DateSort",
        }
    }

    pub fn from_setting(value: &str) -> Self {
        if value == "DateSort" {
            SortMode::Date
        } else {
            SortMode::Name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Branch(Vec<NodeId>),
    Leaf(GenericItem),
}

#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
}

impl CategoryNode {
    pub fn item(&self) -> Option<&GenericItem> {
        match &self.kind {
            NodeKind::Leaf(item) => Some(item),
            NodeKind::Branch(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

#[derive(Debug, Clone)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    roots: Vec<NodeId>,
    mod_packs: NodeId,
    standalone: NodeId,
    filter: FilterMode,
}

/// A finished build. Mods that failed classification have no leaf and are
/// listed in `errors`.
#[derive(Debug)]
pub struct TreeBuild {
    pub tree: CategoryTree,
    pub errors: Vec<ClassificationError>,
}

/// category -> mod name -> item, in first-seen order.
type Groups = IndexMap<String, IndexMap<String, GenericItem>>;

fn name_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn group<'a>(
    mods: impl Iterator<Item = &'a ModEntry>,
    errors: &mut Vec<ClassificationError>,
) -> Groups {
    let mut groups = Groups::new();
    for entry in mods.filter(|m| m.is_visible()) {
        let names = groups.entry(entry.category.clone()).or_default();
        if names.contains_key(&entry.name) {
            continue;
        }
        match classify(entry) {
            Ok(item) => {
                names.insert(entry.name.clone(), item);
            }
            Err(e) => {
                warn!("{e}");
                errors.push(e);
            }
        }
    }
    // A category whose only mods failed classification stays out of the tree.
    groups.retain(|_, names| !names.is_empty());
    groups
}

pub fn build_tree(manifest: &Manifest, filter: FilterMode, sort: SortMode) -> TreeBuild {
    let mut tree = CategoryTree {
        nodes: Vec::new(),
        roots: Vec::new(),
        mod_packs: NodeId(0),
        standalone: NodeId(0),
        filter,
    };
    let mut errors = Vec::new();

    tree.mod_packs = tree.push(MOD_PACKS, NodeKind::Branch(Vec::new()), None);

    let mut packs: IndexSet<&str> = IndexSet::new();
    packs.extend(manifest.mod_packs.iter().map(|p| p.name.as_str()));
    packs.extend(manifest.visible_mods().filter_map(ModEntry::mod_pack_name));

    tree.standalone = tree.push(STANDALONE, NodeKind::Branch(Vec::new()), Some(tree.mod_packs));
    let mut pack_nodes = vec![(tree.standalone, None)];
    for name in packs {
        let id = tree.push(name, NodeKind::Branch(Vec::new()), Some(tree.mod_packs));
        pack_nodes.push((id, Some(name)));
    }

    let pack_ids: Vec<NodeId> = pack_nodes.iter().map(|(id, _)| *id).collect();
    tree.set_children(tree.mod_packs, pack_ids, sort);

    match filter {
        FilterMode::Item => {
            tree.roots.push(tree.mod_packs);
            let groups = group(manifest.mods.iter(), &mut errors);
            let categories = tree.attach(groups, None, sort);
            let mut roots = std::mem::take(&mut tree.roots);
            roots.extend(categories);
            if sort == SortMode::Name {
                tree.sort_ids(&mut roots);
            }
            tree.roots = roots;
        }
        FilterMode::ModPack => {
            for (id, pack) in &pack_nodes {
                let groups = group(manifest.mods_in_pack(*pack), &mut errors);
                let categories = tree.attach(groups, Some(*id), sort);
                tree.set_children(*id, categories, sort);
            }
            tree.roots = tree.children(tree.mod_packs).to_vec();
        }
    }

    debug!(
        "Built {:?} tree: {} roots, {} leaves, {} classification errors",
        filter,
        tree.roots.len(),
        tree.leaf_count(),
        errors.len()
    );

    TreeBuild { tree, errors }
}

impl CategoryTree {
    fn push(&mut self, name: &str, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CategoryNode {
            name: name.to_string(),
            kind,
            parent,
        });
        id
    }

    fn sort_ids(&self, ids: &mut [NodeId]) {
        ids.sort_by(|a, b| name_order(&self.nodes[a.0].name, &self.nodes[b.0].name));
    }

    fn set_children(&mut self, id: NodeId, mut children: Vec<NodeId>, sort: SortMode) {
        if sort == SortMode::Name {
            self.sort_ids(&mut children);
        }
        self.nodes[id.0].kind = NodeKind::Branch(children);
    }

    /// Adds one branch per category with its leaves; returns the branches.
    fn attach(&mut self, groups: Groups, parent: Option<NodeId>, sort: SortMode) -> Vec<NodeId> {
        let mut categories = Vec::with_capacity(groups.len());
        for (category, names) in groups {
            let branch = self.push(&category, NodeKind::Branch(Vec::new()), parent);
            let leaves = names
                .into_iter()
                .map(|(name, item)| self.push(&name, NodeKind::Leaf(item), Some(branch)))
                .collect();
            self.set_children(branch, leaves, sort);
            categories.push(branch);
        }
        categories
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &CategoryNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&CategoryNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Branch(children) => children,
            NodeKind::Leaf(_) => &[],
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn mod_packs_node(&self) -> NodeId {
        self.mod_packs
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.roots.contains(&id)
    }

    /// True for the per-pack nodes, including the standalone bucket.
    pub fn is_mod_pack_node(&self, id: NodeId) -> bool {
        self.parent(id) == Some(self.mod_packs)
    }

    /// The pack node `id` sits under, or is.
    pub fn enclosing_pack(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_mod_pack_node(node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Pack name of a pack node; `Some(None)` for the standalone bucket.
    pub fn pack_name(&self, pack: NodeId) -> Option<Option<&str>> {
        if !self.is_mod_pack_node(pack) {
            None
        } else if pack == self.standalone {
            Some(None)
        } else {
            Some(Some(self.nodes[pack.0].name.as_str()))
        }
    }

    /// Walks `names` down from the roots.
    pub fn find(&self, names: &[&str]) -> Option<NodeId> {
        let (first, rest) = names.split_first()?;
        let mut current = *self.roots.iter().find(|id| self.nodes[id.0].name == *first)?;
        for name in rest {
            current = *self
                .children(current)
                .iter()
                .find(|id| self.nodes[id.0].name == *name)?;
        }
        Some(current)
    }

    /// Reachable leaves in display order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            match &self.nodes[id.0].kind {
                NodeKind::Leaf(_) => out.push(id),
                NodeKind::Branch(children) => stack.extend(children.iter().rev()),
            }
        }
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Removes a leaf, and its category branch once that is empty. Pack
    /// nodes are never pruned. Returns false when `id` is not an attached leaf.
    pub fn remove_leaf(&mut self, id: NodeId) -> bool {
        if !self.nodes.get(id.0).is_some_and(CategoryNode::is_leaf) {
            return false;
        }
        let Some(parent) = self.nodes[id.0].parent else {
            return false;
        };
        self.detach(id, parent);

        let emptied = self.children(parent).is_empty();
        if emptied && parent != self.mod_packs && !self.is_mod_pack_node(parent) {
            match self.nodes[parent.0].parent {
                Some(grandparent) => self.detach(parent, grandparent),
                None => {
                    self.roots.retain(|r| *r != parent);
                }
            }
        }
        true
    }

    fn detach(&mut self, id: NodeId, parent: NodeId) {
        if let NodeKind::Branch(children) = &mut self.nodes[parent.0].kind {
            children.retain(|c| *c != id);
        }
        self.nodes[id.0].parent = None;
    }
}
