/// Synchronous change notification for the UI-thread models.
///
/// Subscribers run inside `notify`, so they have seen every change by the
/// time the mutating call returns.
pub struct Notifier<P> {
    next_id: usize,
    subscribers: Vec<(usize, Box<dyn FnMut(&P)>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(usize);

impl<P> Default for Notifier<P> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<P> Notifier<P> {
    pub fn subscribe(&mut self, callback: impl FnMut(&P) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        Subscription(id)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscribers.retain(|(id, _)| *id != subscription.0);
    }

    pub fn notify(&mut self, property: &P) {
        for (_, callback) in &mut self.subscribers {
            callback(property);
        }
    }
}

impl<P> std::fmt::Debug for Notifier<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
