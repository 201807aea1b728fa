//! The identity-indexed entity store.
//!
//! Entities are keyed by their unique string id, iterate in insertion
//! order, and notify subscribers of structural changes. Suspending
//! events batches any number of mutations into at most one aggregated
//! notification, so a bulk load never exposes a half-applied state to
//! change listeners.

use std::ops::{Deref, DerefMut};

use crate::entity::Entity;
use crate::event::Event;
use crate::time::IntervalSet;
use crate::util::{AssociativeArray, Error, Result};

/// The payload of a collection-changed notification: which entity ids
/// were added, removed, and changed since the last notification.
#[derive(Clone, Debug, Default)]
pub struct CollectionChanged {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl CollectionChanged {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// An ordered, id-indexed collection of entities.
#[derive(Debug)]
pub struct EntityCollection {
    entities: AssociativeArray<String, Entity>,
    collection_changed: Event<CollectionChanged>,
    suspend_count: u32,
    pending: CollectionChanged,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self {
            entities: AssociativeArray::new(),
            collection_changed: Event::new(),
            suspend_count: 0,
            pending: CollectionChanged::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains(id)
    }

    /// The event raised on structural or definition changes. At most
    /// one aggregated notification is raised per suspended batch.
    pub fn collection_changed(&self) -> &Event<CollectionChanged> {
        &self.collection_changed
    }

    /// Look up an entity by id.
    pub fn get_by_id(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Iterate entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterate entity ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Add a fully formed entity. The id must not already be present.
    pub fn add(&mut self, entity: Entity) -> Result<()> {
        let id = entity.id().to_string();
        if self.entities.contains(id.as_str()) {
            return Err(Error::DuplicateId(id));
        }
        self.entities.set(id.clone(), entity);
        self.note(|p| push_unique(&mut p.added, id));
        Ok(())
    }

    /// Fetch an entity for mutation, creating it on first mention.
    ///
    /// The returned guard marks the entity as changed (or added, when
    /// freshly created) when it is dropped.
    pub fn get_or_create(&mut self, id: &str) -> EntityMut<'_> {
        let created = if self.entities.contains(id) {
            false
        } else {
            self.entities.set(id.to_string(), Entity::new(id));
            true
        };
        match self.guard(id, created) {
            Some(guard) => guard,
            // Unreachable: the entity was just inserted or found
            None => unreachable!("get_or_create lost entity '{id}'"),
        }
    }

    /// Fetch an existing entity for mutation. The returned guard marks
    /// the entity as changed when it is dropped.
    pub fn entity_mut(&mut self, id: &str) -> Option<EntityMut<'_>> {
        self.guard(id, false)
    }

    fn guard(&mut self, id: &str, created: bool) -> Option<EntityMut<'_>> {
        let Self {
            entities,
            collection_changed,
            suspend_count,
            pending,
        } = self;
        let entity = entities.get_mut(id)?;
        Some(EntityMut {
            id: id.to_string(),
            created,
            entity,
            suspended: *suspend_count > 0,
            pending,
            event: collection_changed,
        })
    }

    /// Remove an entity, returning it if it was present.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        let id = id.to_string();
        self.note(|p| {
            // An add and remove inside one batch cancel out
            p.added.retain(|a| *a != id);
            p.changed.retain(|c| *c != id);
            push_unique(&mut p.removed, id);
        });
        Some(entity)
    }

    /// Remove every entity, raising a single aggregated notification.
    pub fn clear(&mut self) {
        if self.entities.is_empty() {
            return;
        }
        let removed: Vec<String> = self.entities.keys().cloned().collect();
        self.entities.clear();
        self.note(|p| {
            for id in removed {
                p.added.retain(|a| *a != id);
                p.changed.retain(|c| *c != id);
                push_unique(&mut p.removed, id);
            }
        });
    }

    // ------------------------------------------------------------------
    // Event batching
    // ------------------------------------------------------------------

    /// Begin batching change notifications. Calls nest.
    pub fn suspend_events(&mut self) {
        self.suspend_count += 1;
    }

    /// End batching. When the outermost suspension ends, a single
    /// aggregated notification is raised if anything changed.
    pub fn resume_events(&mut self) {
        debug_assert!(self.suspend_count > 0, "resume_events without suspend");
        self.suspend_count = self.suspend_count.saturating_sub(1);
        if self.suspend_count == 0 && !self.pending.is_empty() {
            let batch = std::mem::take(&mut self.pending);
            self.collection_changed.raise(&batch);
        }
    }

    /// Record a mutation, either into the pending batch or as an
    /// immediate single-mutation notification.
    fn note(&mut self, apply: impl FnOnce(&mut CollectionChanged)) {
        if self.suspend_count > 0 {
            apply(&mut self.pending);
        } else {
            let mut single = CollectionChanged::default();
            apply(&mut single);
            if !single.is_empty() {
                self.collection_changed.raise(&single);
            }
        }
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    /// The union of every entity's explicit availability. Entities
    /// without explicit availability are "always available" and do not
    /// bound the union; if no entity has explicit availability the
    /// result is the unbounded set.
    pub fn compute_availability(&self) -> IntervalSet {
        let mut union = IntervalSet::new();
        let mut any = false;
        for entity in self.iter() {
            if let Some(availability) = entity.availability() {
                if !availability.is_empty() {
                    any = true;
                    union.union_with(availability);
                }
            }
        }
        if any {
            union
        } else {
            IntervalSet::unbounded()
        }
    }

    /// Resolve an entity's parent through this collection.
    pub fn parent_of(&self, entity: &Entity) -> Option<&Entity> {
        self.get_by_id(entity.parent_id()?)
    }
}

impl Default for EntityCollection {
    fn default() -> Self {
        Self::new()
    }
}

fn push_unique(list: &mut Vec<String>, id: String) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// Mutable borrow of one entity that reports the mutation to the
/// collection's change machinery when dropped.
pub struct EntityMut<'a> {
    id: String,
    created: bool,
    entity: &'a mut Entity,
    suspended: bool,
    pending: &'a mut CollectionChanged,
    event: &'a Event<CollectionChanged>,
}

impl Deref for EntityMut<'_> {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        self.entity
    }
}

impl DerefMut for EntityMut<'_> {
    fn deref_mut(&mut self) -> &mut Entity {
        self.entity
    }
}

impl Drop for EntityMut<'_> {
    fn drop(&mut self) {
        let id = std::mem::take(&mut self.id);
        let created = self.created;
        let record = |p: &mut CollectionChanged| {
            if created {
                push_unique(&mut p.added, id.clone());
            } else if !p.added.contains(&id) {
                // Entities added earlier in the same batch are not
                // separately "changed"
                push_unique(&mut p.changed, id.clone());
            }
        };
        if self.suspended {
            record(self.pending);
        } else {
            let mut single = CollectionChanged::default();
            record(&mut single);
            if !single.is_empty() {
                self.event.raise(&single);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn notification_counter(collection: &EntityCollection) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        collection.collection_changed().subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_add_get_remove() {
        let mut c = EntityCollection::new();
        c.add(Entity::new("a")).unwrap();
        assert!(matches!(c.add(Entity::new("a")), Err(Error::DuplicateId(_))));
        assert!(c.get_by_id("a").is_some());

        assert!(c.remove_by_id("a").is_some());
        assert!(c.get_by_id("a").is_none());
        assert!(c.remove_by_id("a").is_none());
    }

    #[test]
    fn test_insertion_order_iteration() {
        let mut c = EntityCollection::new();
        for id in ["c", "a", "b"] {
            c.add(Entity::new(id)).unwrap();
        }
        let ids: Vec<_> = c.ids().collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut c = EntityCollection::new();
        c.get_or_create("x");
        c.get_or_create("x");
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_unbatched_mutations_notify_each() {
        let mut c = EntityCollection::new();
        let count = notification_counter(&c);

        c.add(Entity::new("a")).unwrap();
        c.add(Entity::new("b")).unwrap();
        c.remove_by_id("a");
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_suspended_batch_notifies_once() {
        let mut c = EntityCollection::new();
        let count = notification_counter(&c);

        let batch = Arc::new(parking_lot::Mutex::new(CollectionChanged::default()));
        let b = Arc::clone(&batch);
        c.collection_changed().subscribe(move |args| {
            *b.lock() = args.clone();
        });

        c.suspend_events();
        c.add(Entity::new("a")).unwrap();
        c.add(Entity::new("b")).unwrap();
        c.get_or_create("a").set_name(Some("renamed".into()));
        c.resume_events();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        let batch = batch.lock();
        assert_eq!(batch.added, vec!["a", "b"]);
        // "a" was added in this batch, so it is not separately changed
        assert!(batch.changed.is_empty());
    }

    #[test]
    fn test_nested_suspension() {
        let mut c = EntityCollection::new();
        let count = notification_counter(&c);

        c.suspend_events();
        c.suspend_events();
        c.add(Entity::new("a")).unwrap();
        c.resume_events();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        c.resume_events();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_batch_notifies_nothing() {
        let mut c = EntityCollection::new();
        let count = notification_counter(&c);
        c.suspend_events();
        c.resume_events();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_add_then_remove_in_batch_cancels() {
        let mut c = EntityCollection::new();
        let batch = Arc::new(parking_lot::Mutex::new(CollectionChanged::default()));
        let b = Arc::clone(&batch);
        let count = notification_counter(&c);
        c.collection_changed().subscribe(move |args| {
            *b.lock() = args.clone();
        });

        c.suspend_events();
        c.add(Entity::new("ghost")).unwrap();
        c.remove_by_id("ghost");
        c.add(Entity::new("kept")).unwrap();
        c.resume_events();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        let batch = batch.lock();
        assert_eq!(batch.added, vec!["kept"]);
        assert_eq!(batch.removed, vec!["ghost"]);
    }

    #[test]
    fn test_compute_availability_union() {
        use crate::time::{IntervalSet, TimeInterval};

        let mut c = EntityCollection::new();
        c.add(Entity::new("always")).unwrap();

        let mut bounded = Entity::new("bounded");
        let mut set = IntervalSet::new();
        set.add(TimeInterval::from_iso8601("2012/2013").unwrap());
        bounded.set_availability(Some(set));
        c.add(bounded).unwrap();

        let availability = c.compute_availability();
        assert!(!availability.is_unbounded());
        assert_eq!(
            availability.start(),
            Some(crate::time::TimeStamp::from_iso8601("2012").unwrap())
        );
    }

    #[test]
    fn test_compute_availability_all_unbounded() {
        let mut c = EntityCollection::new();
        c.add(Entity::new("a")).unwrap();
        assert!(c.compute_availability().is_unbounded());
    }

    #[test]
    fn test_parent_resolution() {
        let mut c = EntityCollection::new();
        c.get_or_create("child")
            .set_parent_id(Some("parent".into()))
            .unwrap();
        // Forward reference: parent not loaded yet
        let child = c.get_by_id("child").unwrap();
        assert!(c.parent_of(child).is_none());

        c.get_or_create("parent");
        let child = c.get_by_id("child").unwrap();
        assert_eq!(c.parent_of(child).unwrap().id(), "parent");
    }
}
