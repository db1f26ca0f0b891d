//! Synchronous observer lists.
//!
//! Trait managers and stats each own a [`Subscribers`] list; agent nodes own
//! a [`Hooks`] list that sees each new relationship edge mutably. Callbacks
//! run in-line with the mutating call, in the order they were registered.

use core::fmt;

/// An ordered list of callbacks interested in events of type `T`.
pub struct Subscribers<T: ?Sized> {
    callbacks: Vec<Box<dyn FnMut(&T)>>,
}

impl<T: ?Sized> Subscribers<T> {
    /// Create an empty subscriber list.
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Register a callback. It runs after all previously registered ones.
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Deliver an event to every subscriber.
    pub fn notify(&mut self, event: &T) {
        for callback in &mut self.callbacks {
            callback(event);
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<T: ?Sized> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

/// An ordered list of callbacks that receive newly created values mutably,
/// typically to subscribe to them before anything else happens.
pub struct Hooks<T: ?Sized> {
    callbacks: Vec<Box<dyn FnMut(&mut T)>>,
}

impl<T: ?Sized> Hooks<T> {
    /// Create an empty hook list.
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Register a hook. It runs after all previously registered ones.
    pub fn subscribe(&mut self, callback: impl FnMut(&mut T) + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Run every hook against `value`.
    pub fn run(&mut self, value: &mut T) {
        for callback in &mut self.callbacks {
            callback(value);
        }
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<T: ?Sized> Default for Hooks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Hooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn callbacks_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subs: Subscribers<str> = Subscribers::new();

        let first = Rc::clone(&log);
        subs.subscribe(move |event: &str| first.borrow_mut().push(format!("a:{event}")));
        let second = Rc::clone(&log);
        subs.subscribe(move |event: &str| second.borrow_mut().push(format!("b:{event}")));

        subs.notify("x");
        subs.notify("y");

        assert_eq!(*log.borrow(), vec!["a:x", "b:x", "a:y", "b:y"]);
        assert_eq!(subs.len(), 2);
    }

    #[test]
    fn hooks_may_mutate_the_value() {
        let mut hooks: Hooks<Vec<u32>> = Hooks::new();
        hooks.subscribe(|value: &mut Vec<u32>| value.push(1));
        hooks.subscribe(|value: &mut Vec<u32>| value.push(2));

        let mut value = Vec::new();
        hooks.run(&mut value);
        assert_eq!(value, vec![1, 2]);
        assert_eq!(hooks.len(), 2);
    }

    #[test]
    fn notify_without_subscribers_is_noop() {
        let mut subs: Subscribers<u32> = Subscribers::default();
        subs.notify(&7);
        assert!(subs.is_empty());
    }
}
