//! `navigated` notification fan-out.

use std::cell::Cell;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Handle returned by [`NavigationEvents::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn()>;

/// Listeners for completed navigations. Carries no payload: listeners read
/// the document or URL themselves.
#[derive(Default)]
pub struct NavigationEvents {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
}

impl fmt::Debug for NavigationEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationEvents")
            .field("listeners", &self.len())
            .finish()
    }
}

impl NavigationEvents {
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every listener registered at the time of the call, in order.
    /// Listeners may subscribe or unsubscribe while being notified.
    pub fn emit(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NavigationEvents;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn emits_to_subscribers_until_unsubscribed() {
        let events = NavigationEvents::default();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let id = events.subscribe(move || counter.set(counter.get() + 1));
        events.emit();
        events.emit();
        assert_eq!(hits.get(), 2);

        assert!(events.unsubscribe(id));
        assert!(!events.unsubscribe(id));
        events.emit();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let events = Rc::new(NavigationEvents::default());
        let hits = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));

        let handle = Rc::clone(&events);
        let counter = Rc::clone(&hits);
        let slot = Rc::clone(&own_id);
        let id = events.subscribe(move || {
            counter.set(counter.get() + 1);
            if let Some(id) = slot.get() {
                handle.unsubscribe(id);
            }
        });
        own_id.set(Some(id));

        events.emit();
        events.emit();
        assert_eq!(hits.get(), 1);
        assert!(events.is_empty());
    }
}
