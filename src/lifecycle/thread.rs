use std::collections::HashMap;
use std::thread::{self, ThreadId};
use uuid::Uuid;

/// Identity of a logical thread of execution: the calling OS thread by
/// default, or a named bucket bound to it with `switch_thread` when a
/// runner multiplexes logical tests over its worker threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ThreadKey {
    Os(ThreadId),
    Named(String),
}

#[derive(Debug, Default)]
struct ThreadState {
    container: Option<Uuid>,
    stack: Vec<Uuid>,
}

/// Per-logical-thread bookkeeping: the single active container and the
/// stack of currently running tests, fixtures and steps. No operation
/// here fails; absence is `None`.
#[derive(Debug, Default)]
pub(crate) struct ThreadContext {
    aliases: HashMap<ThreadId, String>,
    states: HashMap<ThreadKey, ThreadState>,
}

impl ThreadContext {
    fn key(&self) -> ThreadKey {
        let id = thread::current().id();
        match self.aliases.get(&id) {
            Some(name) => ThreadKey::Named(name.clone()),
            None => ThreadKey::Os(id),
        }
    }

    fn state(&self) -> Option<&ThreadState> {
        self.states.get(&self.key())
    }

    fn state_mut(&mut self) -> &mut ThreadState {
        let key = self.key();
        self.states.entry(key).or_default()
    }

    pub fn switch_thread(&mut self, name: Option<&str>) {
        let id = thread::current().id();
        match name {
            Some(name) => {
                self.aliases.insert(id, name.to_owned());
            }
            None => {
                self.aliases.remove(&id);
            }
        }
    }

    pub fn set_container(&mut self, uuid: Uuid) {
        self.state_mut().container = Some(uuid);
    }

    pub fn container(&self) -> Option<Uuid> {
        self.state().and_then(|state| state.container)
    }

    pub fn reset_container(&mut self) {
        self.state_mut().container = None;
    }

    pub fn push(&mut self, uuid: Uuid) {
        self.state_mut().stack.push(uuid);
    }

    pub fn pop(&mut self) {
        self.state_mut().stack.pop();
    }

    pub fn reset(&mut self) {
        self.state_mut().stack.clear();
    }

    /// The root of the stack: the test or fixture everything else on
    /// this thread currently nests under.
    pub fn current_test(&self) -> Option<Uuid> {
        self.state().and_then(|state| state.stack.first().copied())
    }

    /// The innermost step, if anything nests below the root.
    pub fn current_step(&self) -> Option<Uuid> {
        self.state().and_then(|state| {
            if state.stack.len() > 1 {
                state.stack.last().copied()
            } else {
                None
            }
        })
    }

    pub fn current_test_or_step(&self) -> Option<Uuid> {
        self.state().and_then(|state| state.stack.last().copied())
    }
}

#[cfg(test)]
mod tests {

    use uuid::Uuid;

    use super::ThreadContext;

    #[test]
    fn test_stack_peeks_distinguish_root_and_steps() {
        let mut context = ThreadContext::default();
        let test = Uuid::new_v4();
        let step = Uuid::new_v4();

        context.push(test);
        assert_eq!(context.current_test(), Some(test));
        assert_eq!(context.current_step(), None);
        assert_eq!(context.current_test_or_step(), Some(test));

        context.push(step);
        assert_eq!(context.current_test(), Some(test));
        assert_eq!(context.current_step(), Some(step));
        assert_eq!(context.current_test_or_step(), Some(step));

        context.pop();
        assert_eq!(context.current_step(), None);
    }

    #[test]
    fn test_pop_on_empty_stack_is_a_no_op() {
        let mut context = ThreadContext::default();

        context.pop();

        assert_eq!(context.current_test(), None);
    }

    #[test]
    fn test_reset_discards_stale_entries() {
        let mut context = ThreadContext::default();
        context.push(Uuid::new_v4());
        context.push(Uuid::new_v4());

        context.reset();

        assert_eq!(context.current_test_or_step(), None);
    }

    #[test]
    fn test_named_buckets_isolate_state_on_one_os_thread() {
        let mut context = ThreadContext::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        context.switch_thread(Some("worker-1"));
        context.set_container(first);
        context.push(first);

        context.switch_thread(Some("worker-2"));
        assert_eq!(context.container(), None);
        assert_eq!(context.current_test(), None);
        context.set_container(second);

        context.switch_thread(Some("worker-1"));
        assert_eq!(context.container(), Some(first));
        assert_eq!(context.current_test(), Some(first));

        context.switch_thread(None);
        assert_eq!(context.container(), None);
    }
}
