use std::collections::{HashMap, HashSet};

use meridian_shared::Value;

use crate::world::{tree::ElementTree, ElementKey};

/// Priority tier for event handlers. All `High` handlers run before any
/// `Normal`, and all `Normal` before any `Low`. Within a tier the order is
/// deliberately shuffled per dispatch so callers cannot grow a dependency on
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventPriority {
    High,
    Normal,
    Low,
}

/// Identity of a registered handler, used for removal. Closures have no
/// comparable identity in Rust, so registration hands one of these out.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct HandlerId(u64);

/// Dispatch state threaded through every handler invocation. Cancellation is
/// advisory: it never stops remaining handlers, it is read by the caller
/// from the [`DispatchOutcome`] after dispatch completes.
pub struct EventContext {
    name: String,
    source: ElementKey,
    anchor: ElementKey,
    args: Vec<Value>,
    cancelled: bool,
    reason: Option<String>,
}

impl EventContext {
    /// The name the event was fired with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element the event was fired on.
    pub fn source(&self) -> ElementKey {
        self.source
    }

    /// The element the currently running handler was registered on.
    pub fn anchor(&self) -> ElementKey {
        self.anchor
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn cancel(&mut self, reason: Option<&str>) {
        self.cancelled = true;
        if let Some(reason) = reason {
            self.reason = Some(reason.to_string());
        }
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// Result of a full dispatch.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub handlers_run: usize,
    pub cancelled: bool,
    pub reason: Option<String>,
}

type HandlerFn = Box<dyn FnMut(&mut EventContext)>;

struct HandlerRecord {
    id: HandlerId,
    anchor: ElementKey,
    priority: EventPriority,
    propagated: bool,
    func: HandlerFn,
}

/// Tree-aware publish/dispatch. An event fired on an element reaches
/// handlers registered on that element, on its ancestors, and on its
/// descendants; handlers registered with `propagated = false` fire only when
/// their anchor is the source itself.
pub struct EventBus {
    handlers: HashMap<String, Vec<HandlerRecord>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn add_handler(
        &mut self,
        name: &str,
        anchor: ElementKey,
        priority: EventPriority,
        propagated: bool,
        func: HandlerFn,
    ) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(name.to_string())
            .or_default()
            .push(HandlerRecord {
                id,
                anchor,
                priority,
                propagated,
                func,
            });
        id
    }

    /// Remove a handler by the id returned at registration. Returns whether
    /// anything was removed.
    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        for records in self.handlers.values_mut() {
            let before = records.len();
            records.retain(|record| record.id != id);
            if records.len() != before {
                return true;
            }
        }
        false
    }

    /// Drop every handler anchored on the given element, typically because
    /// it is being destroyed.
    pub fn remove_anchored(&mut self, element: &ElementKey) {
        for records in self.handlers.values_mut() {
            records.retain(|record| record.anchor != *element);
        }
        self.handlers.retain(|_, records| !records.is_empty());
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers
            .get(name)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    /// Fire a named event on `source` and run every eligible handler to
    /// completion. Firing on root fans out to the entire tree; that is the
    /// expensive case, not a forbidden one.
    pub fn dispatch(
        &mut self,
        name: &str,
        source: ElementKey,
        args: Vec<Value>,
        tree: &ElementTree,
    ) -> DispatchOutcome {
        let Some(records) = self.handlers.get_mut(name) else {
            return DispatchOutcome::default();
        };

        let mut lineage: HashSet<ElementKey> = HashSet::new();
        lineage.insert(source);
        lineage.extend(tree.ancestors(&source));
        lineage.extend(tree.descendants(&source));

        let mut tiers: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for (index, record) in records.iter().enumerate() {
            let eligible = if record.propagated {
                lineage.contains(&record.anchor)
            } else {
                record.anchor == source
            };
            if !eligible {
                continue;
            }
            let tier = match record.priority {
                EventPriority::High => 0,
                EventPriority::Normal => 1,
                EventPriority::Low => 2,
            };
            tiers[tier].push(index);
        }

        let mut context = EventContext {
            name: name.to_string(),
            source,
            anchor: source,
            args,
            cancelled: false,
            reason: None,
        };

        let mut handlers_run = 0;
        for tier in tiers.iter_mut() {
            // within a tier, order is unspecified; shuffle so nobody relies
            // on registration order
            fastrand::shuffle(tier);
            for index in tier.iter() {
                let record = &mut records[*index];
                context.anchor = record.anchor;
                (record.func)(&mut context);
                handlers_run += 1;
            }
        }

        DispatchOutcome {
            handlers_run,
            cancelled: context.cancelled,
            reason: context.reason,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
