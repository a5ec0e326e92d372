//! Observer and delegate notification.
//!
//! Two mechanisms surround every lifecycle transition:
//!
//! - **Observers** are informational callbacks, many per event, invoked in
//!   registration order; their return values are ignored.
//! - A **delegate** is a single typed capability object consulted
//!   synchronously; the `will_*` hooks return a bool that can veto the
//!   pending operation, and default to permitting it.
//!
//! [`Observers`] is the shared registry used by both [`Model`] and
//! [`Instance`]; the event and callback types differ per owner.

use std::rc::Rc;

use crate::instance::Instance;
use crate::model::Model;
use crate::value::Value;

/// Model lifecycle events observable via [`Model::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEvent {
    /// A validated save is about to hit the datasource.
    WillSave,
    /// The datasource accepted the save; the instance is persisted.
    DidSave,
    /// A destroy is about to hit the datasource.
    WillDestroy,
    /// The datasource processed the destroy; the instance is terminal.
    DidDestroy,
}

/// Instance-level events observable via [`Instance::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceEvent {
    /// `commit` found fields whose values changed since the last snapshot.
    ValuesDidUpdate,
}

/// Observer callback for model events.
pub type ModelObserver = dyn Fn(&Model, &Instance);

/// Observer callback for instance events; receives the changed field names.
pub type InstanceObserver = dyn Fn(&Instance, &[String]);

/// Ordered registry of observer callbacks, keyed by event.
///
/// Generic over the event type `E` and the (unsized) callback type `F`, so
/// models and instances share one implementation. Registration order is
/// preserved per event; the same callback may be registered twice.
pub struct Observers<E, F: ?Sized> {
    entries: Vec<(E, Rc<F>)>,
}

impl<E: PartialEq + Copy, F: ?Sized> Observers<E, F> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a callback for an event. No de-duplication.
    pub fn add(&mut self, event: E, observer: Rc<F>) {
        self.entries.push((event, observer));
    }

    /// Number of callbacks registered for an event.
    pub fn count(&self, event: E) -> usize {
        self.entries.iter().filter(|(e, _)| *e == event).count()
    }

    /// Clone out the callbacks for an event, in registration order.
    ///
    /// Snapshotting before invocation keeps re-entrant registration (an
    /// observer adding another observer) from aliasing the registry.
    pub fn snapshot(&self, event: E) -> Vec<Rc<F>> {
        self.entries
            .iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, f)| Rc::clone(f))
            .collect()
    }
}

impl<E: PartialEq + Copy, F: ?Sized> Default for Observers<E, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: std::fmt::Debug, F: ?Sized> std::fmt::Debug for Observers<E, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Lifecycle hooks consulted by a [`Model`] around save and destroy.
///
/// All hooks default to permissive no-ops, so a delegate only overrides
/// what it cares about. The `will_*` hooks run after validation and before
/// anything reaches the datasource; returning `false` aborts the operation
/// with no datasource call and no further notifications.
pub trait ModelDelegate {
    /// Permit or veto a pending save.
    fn will_save(&self, model: &Model, instance: &Instance) -> bool {
        let _ = (model, instance);
        true
    }

    /// Called after a save completed, before `DidSave` observers run.
    fn did_save(&self, model: &Model, instance: &Instance) {
        let _ = (model, instance);
    }

    /// Permit or veto a pending destroy.
    fn will_destroy(&self, model: &Model, instance: &Instance) -> bool {
        let _ = (model, instance);
        true
    }

    /// Called after a destroy completed, with the destroyed primary key.
    fn did_destroy(&self, model: &Model, pk: &Value) {
        let _ = (model, pk);
    }
}

/// Informational hooks consulted by an [`Instance`].
pub trait InstanceDelegate {
    /// Called by `commit` when field values changed since the last snapshot.
    fn values_did_update(&self, instance: &Instance, changed: &[String]) {
        let _ = (instance, changed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestEvent {
        A,
        B,
    }

    type TestObserver = dyn Fn(&str);

    #[test]
    fn observers_preserve_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observers: Observers<TestEvent, TestObserver> = Observers::new();

        for tag in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            observers.add(
                TestEvent::A,
                Rc::new(move |arg: &str| seen.borrow_mut().push(format!("{tag}:{arg}"))),
            );
        }
        observers.add(TestEvent::B, Rc::new(|_arg: &str| {}));

        assert_eq!(observers.count(TestEvent::A), 3);
        assert_eq!(observers.count(TestEvent::B), 1);

        for observer in observers.snapshot(TestEvent::A) {
            (*observer)("x");
        }
        assert_eq!(
            seen.borrow().as_slice(),
            ["first:x", "second:x", "third:x"]
        );
    }

    #[test]
    fn duplicate_registration_is_kept() {
        let hits = Rc::new(RefCell::new(0));
        let mut observers: Observers<TestEvent, TestObserver> = Observers::new();
        let observer: Rc<TestObserver> = {
            let hits = Rc::clone(&hits);
            Rc::new(move |_arg: &str| *hits.borrow_mut() += 1)
        };
        observers.add(TestEvent::A, Rc::clone(&observer));
        observers.add(TestEvent::A, observer);

        for observer in observers.snapshot(TestEvent::A) {
            (*observer)("x");
        }
        assert_eq!(*hits.borrow(), 2);
    }
}
