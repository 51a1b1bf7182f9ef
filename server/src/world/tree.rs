use log::warn;

use meridian_shared::BigMap;

use crate::{
    error::WorldError,
    user::UserKey,
    world::{element::Element, element_kind::ElementKind, ElementKey},
};

/// What a destroy operation actually did: the keys removed from the tree, in
/// the order they were removed, and any protected descendants (players,
/// consoles) that were rescued by reparenting them to root instead.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DestroyOutcome {
    pub destroyed: Vec<ElementKey>,
    pub rescued: Vec<ElementKey>,
}

/// The single-rooted element tree. All structural mutation goes through this
/// type so the invariants hold at every step: exactly one root, every other
/// element has exactly one parent, and no cycles.
pub struct ElementTree {
    elements: BigMap<ElementKey, Element>,
    root: ElementKey,
}

impl ElementTree {
    pub fn new() -> Self {
        let mut elements = BigMap::new();
        let root = elements.insert(Element::new(ElementKind::Root, "root", None));
        Self { elements, root }
    }

    pub fn root(&self) -> ElementKey {
        self.root
    }

    pub fn contains(&self, key: &ElementKey) -> bool {
        self.elements.contains_key(key)
    }

    pub fn get(&self, key: &ElementKey) -> Option<&Element> {
        self.elements.get(key)
    }

    pub fn get_mut(&mut self, key: &ElementKey) -> Option<&mut Element> {
        self.elements.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.elements.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementKey, &Element)> {
        self.elements.iter()
    }

    /// Iterate over every element, mutably. Structural fields are not
    /// reachable through this iterator.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ElementKey, &mut Element)> {
        self.elements.iter_mut()
    }

    /// Create a new element under the given parent. Root elements cannot be
    /// created (there is exactly one), and player elements must carry the
    /// user they belong to.
    pub fn create(
        &mut self,
        kind: ElementKind,
        id: &str,
        parent: ElementKey,
        user: Option<UserKey>,
    ) -> Result<ElementKey, WorldError> {
        if kind == ElementKind::Root {
            return Err(WorldError::Protected);
        }
        if kind == ElementKind::Player && user.is_none() {
            return Err(WorldError::Protected);
        }
        if !self.elements.contains_key(&parent) {
            return Err(WorldError::NotFound);
        }

        let mut element = Element::new(kind, id, user);
        element.parent = Some(parent);
        let key = self.elements.insert(element);
        self.elements
            .get_mut(&parent)
            .expect("parent checked above")
            .children
            .push(key);
        Ok(key)
    }

    /// Destroy an element and its subtree. Fails `Protected` for root,
    /// players, consoles and the structural roots owned by resources.
    /// Protected descendants are not destroyed with the subtree; they are
    /// reparented to root and reported in the outcome.
    pub fn destroy(&mut self, key: ElementKey) -> Result<DestroyOutcome, WorldError> {
        let element = self.elements.get(&key).ok_or(WorldError::NotFound)?;
        if element.kind().is_protected() || element.kind().is_structural() {
            return Err(WorldError::Protected);
        }
        Ok(self.destroy_subtree(key))
    }

    /// Destroy a subtree without the protection check on the top element.
    /// Used by resource teardown (map/dynamic roots) and user disconnect
    /// (player elements). Protected descendants are still rescued to root.
    pub(crate) fn destroy_subtree(&mut self, key: ElementKey) -> DestroyOutcome {
        let mut outcome = DestroyOutcome::default();
        self.collect_subtree(key, &mut outcome);

        // rescue before removal, so the rescued elements' subtrees survive
        for rescued in outcome.rescued.clone() {
            self.move_to_parent(rescued, self.root);
        }

        if let Some(parent) = self.elements.get(&key).and_then(|element| element.parent) {
            if let Some(parent_element) = self.elements.get_mut(&parent) {
                parent_element.children.retain(|child| *child != key);
            }
        }

        for destroyed in &outcome.destroyed {
            self.elements.remove(destroyed);
        }
        outcome
    }

    fn collect_subtree(&self, key: ElementKey, outcome: &mut DestroyOutcome) {
        outcome.destroyed.push(key);
        let Some(element) = self.elements.get(&key) else {
            warn!("collect_subtree: dangling child key {:?}", key);
            return;
        };
        for child in element.children.clone() {
            let protected = self
                .elements
                .get(&child)
                .map(|child_element| child_element.kind().is_protected())
                .unwrap_or(false);
            if protected {
                outcome.rescued.push(child);
            } else {
                self.collect_subtree(child, outcome);
            }
        }
    }

    /// Change an element's parent. Valid targets are root, a map root, or a
    /// dynamic root; the element's transform is untouched.
    pub fn set_parent(
        &mut self,
        key: ElementKey,
        new_parent: ElementKey,
    ) -> Result<(), WorldError> {
        let element = self.elements.get(&key).ok_or(WorldError::NotFound)?;
        if element.kind().is_structural() {
            return Err(WorldError::Protected);
        }
        let parent_element = self.elements.get(&new_parent).ok_or(WorldError::NotFound)?;
        if !parent_element.kind().is_structural() {
            return Err(WorldError::InvalidParent);
        }
        // structural roots sit directly under root, so this cannot introduce
        // a cycle; the assertion guards against that ever changing
        debug_assert!(!self.is_ancestor(&key, &new_parent));

        self.move_to_parent(key, new_parent);
        Ok(())
    }

    fn move_to_parent(&mut self, key: ElementKey, new_parent: ElementKey) {
        let old_parent = self
            .elements
            .get(&key)
            .and_then(|element| element.parent);
        if old_parent == Some(new_parent) {
            return;
        }
        if let Some(old_parent) = old_parent {
            if let Some(old_parent_element) = self.elements.get_mut(&old_parent) {
                old_parent_element.children.retain(|child| *child != key);
            }
        }
        if let Some(element) = self.elements.get_mut(&key) {
            element.parent = Some(new_parent);
        }
        if let Some(parent_element) = self.elements.get_mut(&new_parent) {
            parent_element.children.push(key);
        }
    }

    /// Direct children, insertion order.
    pub fn children(&self, parent: &ElementKey) -> &[ElementKey] {
        self.elements
            .get(parent)
            .map(|element| element.children())
            .unwrap_or(&[])
    }

    /// Direct children whose kind name matches the given filter.
    pub fn children_of_kind(&self, parent: &ElementKey, kind_name: &str) -> Vec<ElementKey> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|child| {
                self.elements
                    .get(child)
                    .map(|element| element.kind().name() == kind_name)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Walk from the element's parent up to root.
    pub fn ancestors(&self, key: &ElementKey) -> Vec<ElementKey> {
        let mut out = Vec::new();
        let mut current = self.elements.get(key).and_then(|element| element.parent);
        while let Some(ancestor) = current {
            out.push(ancestor);
            current = self
                .elements
                .get(&ancestor)
                .and_then(|element| element.parent);
        }
        out
    }

    /// Preorder walk of the subtree below the element (the element itself is
    /// not included).
    pub fn descendants(&self, key: &ElementKey) -> Vec<ElementKey> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementKey> = self.children(key).to_vec();
        stack.reverse();
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.children(&current).to_vec();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Whether `ancestor` lies on the parent chain of `key`.
    pub fn is_ancestor(&self, ancestor: &ElementKey, key: &ElementKey) -> bool {
        let mut current = self.elements.get(key).and_then(|element| element.parent);
        while let Some(parent) = current {
            if parent == *ancestor {
                return true;
            }
            current = self
                .elements
                .get(&parent)
                .and_then(|element| element.parent);
        }
        false
    }

    /// First element with the given script id, if any.
    pub fn find_by_id(&self, id: &str) -> Option<ElementKey> {
        self.elements
            .iter()
            .find(|(_, element)| element.id() == id)
            .map(|(key, _)| key)
    }
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}
