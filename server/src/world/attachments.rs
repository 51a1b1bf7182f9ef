use std::collections::HashMap;

use glam::Vec3;

use meridian_shared::{resolve_attachment, Transform};

use crate::{
    error::WorldError,
    world::{tree::ElementTree, ElementKey},
};

/// A single "follows the movement of" edge. Offsets are in the object space
/// of the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attachment {
    pub target: ElementKey,
    pub pos_offset: Vec3,
    pub rot_offset: Vec3,
}

/// The attachment relation layered over the tree: at most one outgoing edge
/// per element, any number of incoming edges.
pub struct AttachmentGraph {
    outgoing: HashMap<ElementKey, Attachment>,
    // reverse index, insertion-ordered per target
    incoming: HashMap<ElementKey, Vec<ElementKey>>,
}

impl AttachmentGraph {
    pub fn new() -> Self {
        Self {
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        }
    }

    /// Attach `child` to `target` with the given object-space offsets.
    ///
    /// If the reverse edge `target -> child` exists it is dropped first (last
    /// writer wins on symmetric conflicts). Any previous outgoing edge of
    /// `child` is replaced, old offsets discarded. Fails without mutating
    /// state when the kinds are incompatible or a longer attachment chain
    /// would loop back to `child`.
    pub fn attach(
        &mut self,
        child: ElementKey,
        target: ElementKey,
        pos_offset: Vec3,
        rot_offset: Vec3,
        tree: &ElementTree,
    ) -> Result<(), WorldError> {
        if child == target {
            return Err(WorldError::WouldCycle);
        }
        let child_element = tree.get(&child).ok_or(WorldError::NotFound)?;
        let target_element = tree.get(&target).ok_or(WorldError::NotFound)?;
        if !child_element.kind().can_be_attached()
            || !target_element.kind().can_be_attachment_target()
        {
            return Err(WorldError::IncompatibleTypes);
        }

        let reverse_edge = self
            .outgoing
            .get(&target)
            .map(|attachment| attachment.target == child)
            .unwrap_or(false);

        if !reverse_edge {
            // walk the chain above target; the direct reverse edge would be
            // dropped below, but anything longer is rejected
            let mut current = self.outgoing.get(&target).map(|attachment| attachment.target);
            while let Some(ancestor) = current {
                if ancestor == child {
                    return Err(WorldError::WouldCycle);
                }
                current = self
                    .outgoing
                    .get(&ancestor)
                    .map(|attachment| attachment.target);
            }
        }

        if reverse_edge {
            self.remove_edge(target);
        }
        self.remove_edge(child);

        self.outgoing.insert(
            child,
            Attachment {
                target,
                pos_offset,
                rot_offset,
            },
        );
        self.incoming.entry(target).or_default().push(child);
        Ok(())
    }

    /// Detach `child`. When `target` is given the edge is removed only if it
    /// currently points at that element; otherwise nothing changes.
    pub fn detach(
        &mut self,
        child: ElementKey,
        target: Option<ElementKey>,
    ) -> Result<(), WorldError> {
        let Some(attachment) = self.outgoing.get(&child) else {
            return Err(WorldError::NotFound);
        };
        if let Some(expected) = target {
            if attachment.target != expected {
                return Err(WorldError::NotFound);
            }
        }
        self.remove_edge(child);
        Ok(())
    }

    pub fn attached_to(&self, child: &ElementKey) -> Option<&Attachment> {
        self.outgoing.get(child)
    }

    /// Elements currently attached to the given target, insertion order.
    pub fn attached_children(&self, target: &ElementKey) -> &[ElementKey] {
        self.incoming
            .get(target)
            .map(|children| children.as_slice())
            .unwrap_or(&[])
    }

    /// Remove every edge touching the given element, typically because it is
    /// being destroyed. Returns the elements that were attached to it.
    pub fn sever_all(&mut self, key: ElementKey) -> Vec<ElementKey> {
        self.remove_edge(key);
        let orphans = self.incoming.remove(&key).unwrap_or_default();
        for orphan in &orphans {
            self.outgoing.remove(orphan);
        }
        orphans
    }

    /// Resolve the world-space transform of an element, following its
    /// attachment chain. Unattached elements report their own transform.
    pub fn world_transform(&self, key: &ElementKey, tree: &ElementTree) -> Option<Transform> {
        let element = tree.get(key)?;
        match self.outgoing.get(key) {
            Some(attachment) => {
                let base = self.world_transform(&attachment.target, tree)?;
                Some(resolve_attachment(
                    &base,
                    attachment.pos_offset,
                    attachment.rot_offset,
                ))
            }
            None => Some(element.transform),
        }
    }

    fn remove_edge(&mut self, child: ElementKey) {
        if let Some(attachment) = self.outgoing.remove(&child) {
            if let Some(children) = self.incoming.get_mut(&attachment.target) {
                children.retain(|entry| *entry != child);
                if children.is_empty() {
                    self.incoming.remove(&attachment.target);
                }
            }
        }
    }
}

impl Default for AttachmentGraph {
    fn default() -> Self {
        Self::new()
    }
}
