// A single-slot work mailbox: a condition-variable-guarded `Option<T>`
// with a monotonic write counter. `put` always fills the slot (replacing any
// pending value), `take` blocks until filled and empties it, `wait_new`
// blocks until a write that happens-after the call, so the preemption
// race in the supervisor's mining loop never fires on the write that
// started the current job.
use std::sync::{Condvar, Mutex};

struct State<T> {
    slot: Option<T>,
    generation: u64,
}

pub struct Mailbox<T> {
    state: Mutex<State<T>>,
    condvar: Condvar,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Mailbox {
            state: Mutex::new(State {
                slot: None,
                generation: 0,
            }),
            condvar: Condvar::new(),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replace the slot's contents. Never blocks.
    pub fn put(&self, value: T) {
        let mut state = self.state.lock().unwrap();
        state.slot = Some(value);
        state.generation += 1;
        self.condvar.notify_all();
    }

    /// Block until the slot is non-empty, then consume and return its
    /// contents along with the generation it was written at. Returning
    /// both under the same lock acquisition lets callers arm `wait_new`
    /// without a second lock that a concurrent `put` could slip between.
    pub fn take(&self) -> (T, u64) {
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(value) = state.slot.take() {
                return (value, state.generation);
            }
            state = self.condvar.wait(state).unwrap();
        }
    }

    /// Returns the current write generation, to be passed to `wait_new`.
    pub fn generation(&self) -> u64 {
        self.state.lock().unwrap().generation
    }

    /// Block until a `put` happens-after generation `after` was observed.
    /// Never fires on a write that has already been accounted for.
    pub fn wait_new(&self, after: u64) {
        let mut state = self.state.lock().unwrap();
        while state.generation <= after {
            state = self.condvar.wait(state).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn take_blocks_until_put() {
        let mailbox: Arc<Mailbox<u32>> = Arc::new(Mailbox::new());
        let reader = {
            let mailbox = mailbox.clone();
            thread::spawn(move || mailbox.take())
        };

        thread::sleep(Duration::from_millis(20));
        mailbox.put(42);
        assert_eq!(reader.join().unwrap(), (42, 1));
    }

    #[test]
    fn put_replaces_pending_value() {
        let mailbox: Mailbox<u32> = Mailbox::new();
        mailbox.put(1);
        mailbox.put(2);
        assert_eq!(mailbox.take(), (2, 2));
    }

    #[test]
    fn wait_new_does_not_fire_on_the_originating_write() {
        let mailbox: Arc<Mailbox<u32>> = Arc::new(Mailbox::new());
        mailbox.put(1);
        let gen_after_first_put = mailbox.generation();

        let waiter = {
            let mailbox = mailbox.clone();
            thread::spawn(move || {
                mailbox.wait_new(gen_after_first_put);
            })
        };

        // Give the waiter a chance to block; it must not have returned
        // yet, since no write has happened since `gen_after_first_put`.
        thread::sleep(Duration::from_millis(30));
        assert!(!waiter.is_finished());

        mailbox.put(2);
        waiter.join().unwrap();
    }

    #[test]
    fn take_empties_the_slot() {
        let mailbox: Mailbox<u32> = Mailbox::new();
        mailbox.put(1);
        assert_eq!(mailbox.take(), (1, 1));

        let mailbox: Arc<Mailbox<u32>> = Arc::new(mailbox);
        let reader = {
            let mailbox = mailbox.clone();
            thread::spawn(move || mailbox.take())
        };
        thread::sleep(Duration::from_millis(10));
        assert!(!reader.is_finished());
        mailbox.put(7);
        assert_eq!(reader.join().unwrap(), (7, 2));
    }
}
