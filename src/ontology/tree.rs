//! Arena-owned class hierarchy
//!
//! Classes live in a `Vec` and reference each other through [`ClassId`]
//! indices. Every class except the root has exactly one primary parent, so the
//! structure is a rooted tree; additional `subClassOf` parents are kept as
//! mixin names and never take part in ancestor walks.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::casing::to_lower_sentence_case;
use super::error::{OntologyError, OntologyResult};
use super::loader::{local_name, RawHierarchy};

/// Stable index of a class inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(usize);

/// One ontology class
#[derive(Debug, Clone)]
pub struct OntologyClass {
    name: String,
    accession: Option<String>,
    iri: Option<String>,
    parent: Option<ClassId>,
    children: Vec<ClassId>,
    mixins: Vec<String>,
}

impl OntologyClass {
    /// Canonical lower sentence case name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identifying field not used as name (IRI local name or label)
    pub fn accession(&self) -> Option<&str> {
        self.accession.as_deref()
    }

    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    pub fn children(&self) -> &[ClassId] {
        &self.children
    }

    /// Names of secondary `subClassOf` parents
    pub fn mixins(&self) -> &[String] {
        &self.mixins
    }
}

/// Rooted class hierarchy assembled from one or more ontologies
#[derive(Debug, Clone)]
pub struct OntologyTree {
    classes: Vec<OntologyClass>,
    index: HashMap<String, ClassId>,
    accessions: HashMap<String, ClassId>,
    root: ClassId,
    source: String,
}

impl OntologyTree {
    /// Tree holding only a root class
    pub fn with_root(root: &str) -> Self {
        let mut tree = Self {
            classes: Vec::new(),
            index: HashMap::new(),
            accessions: HashMap::new(),
            root: ClassId(0),
            source: "<memory>".to_string(),
        };
        tree.root = tree.insert(to_lower_sentence_case(root), None, None, None);
        tree
    }

    /// Extract the subtree below `root_node` from a parsed document
    ///
    /// With `switch_label_and_id` the `rdfs:label` becomes the class name and
    /// the IRI local name the accession; otherwise the roles are swapped.
    /// When a class has several parents inside the subtree, the primary one is
    /// the parent closest to the root, ties broken by name.
    pub fn from_hierarchy(
        hierarchy: &RawHierarchy,
        root_node: &str,
        switch_label_and_id: bool,
        url: &str,
    ) -> OntologyResult<Self> {
        let names: HashMap<&str, (String, Option<String>)> = hierarchy
            .iter()
            .map(|(iri, label)| (iri, class_names(iri, label, switch_label_and_id)))
            .collect();

        let wanted = to_lower_sentence_case(root_node);
        let root_iri = hierarchy
            .iter()
            .map(|(iri, _)| iri)
            .find(|iri| {
                *iri == root_node || local_name(iri) == root_node || names[iri].0 == wanted
            })
            .ok_or_else(|| OntologyError::RootNotFound {
                url: url.to_string(),
                root: root_node.to_string(),
            })?;

        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for (iri, _) in hierarchy.iter() {
            for parent in hierarchy.parents(iri) {
                children.entry(parent).or_default().push(iri);
            }
        }
        for kids in children.values_mut() {
            kids.sort_by(|a, b| names[a].0.cmp(&names[b].0));
        }

        // Breadth-first from the root gives each class its distance to the root
        let mut depth: HashMap<&str, usize> = HashMap::from([(root_iri, 0)]);
        let mut order = vec![root_iri];
        let mut queue = VecDeque::from([root_iri]);
        while let Some(current) = queue.pop_front() {
            let next_depth = depth[current] + 1;
            for &child in children.get(current).into_iter().flatten() {
                if !depth.contains_key(child) {
                    depth.insert(child, next_depth);
                    order.push(child);
                    queue.push_back(child);
                }
            }
        }

        let (root_name, root_accession) = names[root_iri].clone();
        let mut tree = Self {
            classes: Vec::with_capacity(order.len()),
            index: HashMap::with_capacity(order.len()),
            accessions: HashMap::new(),
            root: ClassId(0),
            source: url.to_string(),
        };
        tree.root = tree.insert(root_name, root_accession, Some(root_iri.to_string()), None);

        let mut ids: HashMap<&str, ClassId> = HashMap::from([(root_iri, tree.root)]);
        for &iri in order.iter().skip(1) {
            let primary = hierarchy
                .parents(iri)
                .filter(|p| depth.contains_key(p))
                .min_by(|a, b| depth[a].cmp(&depth[b]).then_with(|| names[a].0.cmp(&names[b].0)));
            let Some(primary) = primary else { continue };
            let parent_id = ids[primary];

            let (name, accession) = names[iri].clone();
            if let Some(&existing) = tree.index.get(&name) {
                tracing::warn!(
                    class = %name,
                    iri,
                    kept = tree.classes[existing.0].iri.as_deref().unwrap_or_default(),
                    "Two classes share a name, merging them"
                );
                ids.insert(iri, existing);
                continue;
            }

            let id = tree.insert(name, accession, Some(iri.to_string()), Some(parent_id));
            tree.classes[id.0].mixins = hierarchy
                .parents(iri)
                .filter(|p| *p != primary)
                .map(|p| names[p].0.clone())
                .collect();
            ids.insert(iri, id);
        }

        tracing::debug!(
            url,
            root = %tree.root().name(),
            classes = tree.len(),
            "Extracted ontology subtree"
        );
        Ok(tree)
    }

    fn insert(
        &mut self,
        name: String,
        accession: Option<String>,
        iri: Option<String>,
        parent: Option<ClassId>,
    ) -> ClassId {
        let id = ClassId(self.classes.len());
        if let Some(acc) = &accession {
            self.accessions.entry(acc.clone()).or_insert(id);
        }
        self.index.insert(name.clone(), id);
        self.classes.push(OntologyClass {
            name,
            accession,
            iri,
            parent,
            children: Vec::new(),
            mixins: Vec::new(),
        });
        if let Some(parent) = parent {
            self.classes[parent.0].children.push(id);
        }
        id
    }

    /// Resolve a class by canonical name or accession
    pub fn id(&self, name: &str) -> Option<ClassId> {
        self.index
            .get(&to_lower_sentence_case(name))
            .or_else(|| self.accessions.get(name))
            .copied()
    }

    pub fn class(&self, id: ClassId) -> &OntologyClass {
        &self.classes[id.0]
    }

    pub fn get(&self, name: &str) -> Option<&OntologyClass> {
        self.id(name).map(|id| self.class(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.id(name).is_some()
    }

    pub fn root(&self) -> &OntologyClass {
        self.class(self.root)
    }

    pub fn root_id(&self) -> ClassId {
        self.root
    }

    /// Location the head ontology was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// A tree always holds at least its root
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OntologyClass> {
        self.classes.iter()
    }

    /// Ids from `id` up to the root, `id` first
    pub fn ancestor_ids(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut current = self.class(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.class(parent).parent;
        }
        chain
    }

    /// Names from `name` up to the root, `name` first
    pub fn ancestors(&self, name: &str) -> Option<Vec<&str>> {
        let id = self.id(name)?;
        Some(
            self.ancestor_ids(id)
                .into_iter()
                .map(|a| self.class(a).name())
                .collect(),
        )
    }

    /// All classes below `name`, breadth-first, excluding `name` itself
    pub fn descendants(&self, name: &str) -> Option<Vec<&str>> {
        let id = self.id(name)?;
        let mut out = Vec::new();
        let mut queue: VecDeque<ClassId> = self.class(id).children.iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            out.push(self.class(current).name());
            queue.extend(self.class(current).children.iter().copied());
        }
        Some(out)
    }

    /// Whether `name` equals `ancestor` or lies below it
    pub fn is_a(&self, name: &str, ancestor: &str) -> bool {
        match (self.id(name), self.id(ancestor)) {
            (Some(id), Some(anc)) => self.ancestor_ids(id).contains(&anc),
            _ => false,
        }
    }

    /// Attach `name` below `parent`; an existing class is left where it is
    pub fn graft(&mut self, name: &str, parent: &str) -> OntologyResult<ClassId> {
        if let Some(existing) = self.id(name) {
            return Ok(existing);
        }
        let parent_id = self
            .id(parent)
            .ok_or_else(|| OntologyError::unknown_class(parent))?;
        Ok(self.insert(to_lower_sentence_case(name), None, None, Some(parent_id)))
    }

    /// Splice `tail` (rooted at its join node) into this tree
    ///
    /// Without `merge_nodes` the tail root becomes a child of
    /// `head_join_node`; with it the tail root is identified with
    /// `head_join_node`. Tail classes whose name already exists keep their
    /// head placement. Returns the number of classes added.
    pub fn splice(
        &mut self,
        head_join_node: &str,
        tail: OntologyTree,
        merge_nodes: bool,
    ) -> OntologyResult<usize> {
        let join = self.id(head_join_node).ok_or_else(|| {
            OntologyError::join_node_not_found("head", head_join_node, self.source.clone())
        })?;

        let before = self.len();
        let mut mapped: BTreeMap<ClassId, ClassId> = BTreeMap::new();
        let mut queue = VecDeque::from([tail.root]);
        while let Some(tail_id) = queue.pop_front() {
            let class = tail.class(tail_id);
            let target = if tail_id == tail.root && merge_nodes {
                join
            } else if let Some(existing) = self.id(class.name()) {
                existing
            } else {
                let parent = class.parent.map_or(join, |p| mapped[&p]);
                let id = self.insert(
                    class.name.clone(),
                    class.accession.clone(),
                    class.iri.clone(),
                    Some(parent),
                );
                self.classes[id.0].mixins = class.mixins.clone();
                id
            };
            mapped.insert(tail_id, target);
            queue.extend(class.children.iter().copied());
        }

        let added = self.len() - before;
        tracing::info!(
            head_join_node,
            tail_root = %tail.root().name(),
            tail_source = %tail.source,
            merge_nodes,
            added,
            "Joined tail ontology"
        );
        Ok(added)
    }

    /// Indented text view of the hierarchy; `only` restricts output to an
    /// ancestor-closed set of classes
    pub fn render(&self, only: Option<&HashSet<ClassId>>) -> String {
        let mut out = String::new();
        out.push_str(self.root().name());
        out.push('\n');
        self.render_children(self.root, "", only, &mut out);
        out
    }

    fn render_children(
        &self,
        id: ClassId,
        prefix: &str,
        only: Option<&HashSet<ClassId>>,
        out: &mut String,
    ) {
        let mut kids: Vec<ClassId> = self
            .class(id)
            .children
            .iter()
            .copied()
            .filter(|kid| only.map_or(true, |set| set.contains(kid)))
            .collect();
        kids.sort_by(|a, b| self.class(*a).name.cmp(&self.class(*b).name));

        for (i, kid) in kids.iter().enumerate() {
            let last = i + 1 == kids.len();
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(self.class(*kid).name());
            out.push('\n');
            let next = format!("{prefix}{}", if last { "    " } else { "│   " });
            self.render_children(*kid, &next, only, out);
        }
    }
}

/// Canonical name and accession of a class
fn class_names(iri: &str, label: Option<&str>, switch_label_and_id: bool) -> (String, Option<String>) {
    let local = local_name(iri).to_string();
    let (name, accession) = match (switch_label_and_id, label) {
        (true, Some(label)) => (label.to_string(), Some(local)),
        (true, None) => (local, None),
        (false, label) => (local, label.map(str::to_string)),
    };
    (to_lower_sentence_case(&name), accession)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BL: &str = "https://w3id.org/biolink/vocab/";

    fn hierarchy() -> RawHierarchy {
        let mut h = RawHierarchy::default();
        let class = |n: &str| format!("{BL}{n}");
        h.set_label(&class("Entity"), "entity", true);
        h.set_label(&class("NamedThing"), "named thing", true);
        h.set_label(&class("BiologicalEntity"), "biological entity", true);
        h.set_label(&class("Protein"), "protein", true);
        h.set_label(&class("Gene"), "gene", true);
        h.set_label(&class("GeneProductMixin"), "gene product mixin", true);
        h.set_label(&class("Unrelated"), "unrelated", true);
        h.add_subclass(&class("NamedThing"), &class("Entity"));
        h.add_subclass(&class("BiologicalEntity"), &class("NamedThing"));
        h.add_subclass(&class("Protein"), &class("BiologicalEntity"));
        h.add_subclass(&class("Protein"), &class("GeneProductMixin"));
        h.add_subclass(&class("Gene"), &class("BiologicalEntity"));
        h
    }

    #[test]
    fn test_subtree_extraction() {
        let tree = OntologyTree::from_hierarchy(&hierarchy(), "entity", true, "test").unwrap();
        assert_eq!(tree.root().name(), "entity");
        assert_eq!(tree.len(), 5);
        assert!(!tree.contains("unrelated"));
        assert!(!tree.contains("gene product mixin"));
        assert_eq!(
            tree.ancestors("protein").unwrap(),
            vec!["protein", "biological entity", "named thing", "entity"]
        );
        assert_eq!(tree.get("Protein").unwrap().mixins(), ["gene product mixin"]);
        assert_eq!(tree.get("protein").unwrap().accession(), Some("Protein"));
    }

    #[test]
    fn test_root_by_local_name() {
        let tree = OntologyTree::from_hierarchy(&hierarchy(), "NamedThing", true, "test").unwrap();
        assert_eq!(tree.root().name(), "named thing");
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_missing_root() {
        let err = OntologyTree::from_hierarchy(&hierarchy(), "nothing", true, "test").unwrap_err();
        assert!(matches!(err, OntologyError::RootNotFound { .. }));
    }

    #[test]
    fn test_switch_label_and_id() {
        let tree = OntologyTree::from_hierarchy(&hierarchy(), "Entity", false, "test").unwrap();
        // names come from the local names, canonicalized
        assert!(tree.contains("biological entity"));
        assert_eq!(tree.get("biological entity").unwrap().accession(), Some("biological entity"));
        assert_eq!(tree.root().name(), "entity");
    }

    #[test]
    fn test_primary_parent_is_closest_to_root() {
        let mut h = hierarchy();
        h.add_subclass(&format!("{BL}Gene"), &format!("{BL}NamedThing"));
        let tree = OntologyTree::from_hierarchy(&h, "entity", true, "test").unwrap();
        assert_eq!(tree.ancestors("gene").unwrap(), vec!["gene", "named thing", "entity"]);
        assert_eq!(tree.get("gene").unwrap().mixins(), ["biological entity"]);
    }

    #[test]
    fn test_same_name_classes_are_merged() {
        let mut h = hierarchy();
        let other = "http://example.org/Protein";
        h.set_label(other, "protein", true);
        h.add_subclass(other, &format!("{BL}BiologicalEntity"));
        h.set_label("http://example.org/Isoform", "isoform", true);
        h.add_subclass("http://example.org/Isoform", other);

        let tree = OntologyTree::from_hierarchy(&h, "entity", true, "test").unwrap();
        assert_eq!(tree.len(), 6);
        assert_eq!(
            tree.ancestors("isoform").unwrap(),
            vec!["isoform", "protein", "biological entity", "named thing", "entity"]
        );
    }

    #[test]
    fn test_cycles_do_not_loop() {
        let mut h = hierarchy();
        h.add_subclass(&format!("{BL}NamedThing"), &format!("{BL}Protein"));
        let tree = OntologyTree::from_hierarchy(&h, "entity", true, "test").unwrap();
        assert_eq!(tree.ancestors("named thing").unwrap(), vec!["named thing", "entity"]);
    }

    #[test]
    fn test_graft() {
        let mut tree = OntologyTree::from_hierarchy(&hierarchy(), "entity", true, "test").unwrap();
        tree.graft("binding", "named thing").unwrap();
        assert_eq!(tree.ancestors("binding").unwrap(), vec!["binding", "named thing", "entity"]);
        assert!(tree.graft("x", "nowhere").is_err());
        // existing classes stay put
        let id = tree.graft("protein", "entity").unwrap();
        assert_eq!(tree.class(id).parent(), tree.id("biological entity"));
    }

    #[test]
    fn test_splice_as_child() {
        let mut head = OntologyTree::from_hierarchy(&hierarchy(), "entity", true, "head").unwrap();
        let mut tail_h = RawHierarchy::default();
        tail_h.set_label("http://so/SO_1", "sequence_variant", true);
        tail_h.set_label("http://so/SO_2", "snv", true);
        tail_h.add_subclass("http://so/SO_2", "http://so/SO_1");
        let tail = OntologyTree::from_hierarchy(&tail_h, "sequence_variant", true, "tail").unwrap();

        let added = head.splice("biological entity", tail, false).unwrap();
        assert_eq!(added, 2);
        assert_eq!(
            head.ancestors("snv").unwrap(),
            vec!["snv", "sequence variant", "biological entity", "named thing", "entity"]
        );
    }

    #[test]
    fn test_splice_merge_nodes() {
        let mut head = OntologyTree::from_hierarchy(&hierarchy(), "entity", true, "head").unwrap();
        let mut tail_h = RawHierarchy::default();
        tail_h.add_subclass("http://t/Leaf", "http://t/Top");
        let tail = OntologyTree::from_hierarchy(&tail_h, "Top", true, "tail").unwrap();

        head.splice("gene", tail, true).unwrap();
        assert!(!head.contains("top"));
        assert_eq!(head.ancestors("leaf").unwrap()[1], "gene");
    }

    #[test]
    fn test_splice_missing_head_join() {
        let mut head = OntologyTree::with_root("entity");
        let tail = OntologyTree::with_root("thing");
        let err = head.splice("missing", tail, false).unwrap_err();
        assert!(matches!(err, OntologyError::JoinNodeNotFound { side: "head", .. }));
    }

    #[test]
    fn test_descendants_and_render() {
        let tree = OntologyTree::from_hierarchy(&hierarchy(), "entity", true, "test").unwrap();
        let desc = tree.descendants("named thing").unwrap();
        assert_eq!(desc, vec!["biological entity", "gene", "protein"]);

        let rendered = tree.render(None);
        assert!(rendered.starts_with("entity\n└── named thing\n"));
        assert!(rendered.contains("        ├── gene\n"));
        assert!(rendered.contains("        └── protein\n"));
    }
}
