use derivative::*;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::model::{AttachmentResult, ContainerResult, FixtureResult, Shared, StepResult, TestResult};

/// A lifecycle failure as observers see it.
pub type HookError = dyn StdError + Send + Sync;

/// Observer of lifecycle transitions. Every method defaults to a no-op;
/// implementations override the subset they care about.
///
/// Before-hooks fire ahead of the guarded mutation and cannot veto it.
/// After-hooks receive the outcome: `None` when the mutation succeeded,
/// the causing error otherwise.
pub trait LifecycleHooks: Send + Sync {
    fn before_container_start(&self, _container: &Shared<ContainerResult>) {}
    fn after_container_start(
        &self,
        _container: &Shared<ContainerResult>,
        _error: Option<&HookError>,
    ) {
    }

    fn before_container_update(&self, _container: &Shared<ContainerResult>) {}
    fn after_container_update(
        &self,
        _container: &Shared<ContainerResult>,
        _error: Option<&HookError>,
    ) {
    }

    fn before_container_stop(&self, _container: &Shared<ContainerResult>) {}
    fn after_container_stop(
        &self,
        _container: &Shared<ContainerResult>,
        _error: Option<&HookError>,
    ) {
    }

    fn before_container_write(&self, _container: &Shared<ContainerResult>) {}
    fn after_container_write(
        &self,
        _container: &Shared<ContainerResult>,
        _error: Option<&HookError>,
    ) {
    }

    fn before_fixture_start(&self, _fixture: &Shared<FixtureResult>) {}
    fn after_fixture_start(&self, _fixture: &Shared<FixtureResult>, _error: Option<&HookError>) {}

    fn before_fixture_update(&self, _fixture: &Shared<FixtureResult>) {}
    fn after_fixture_update(&self, _fixture: &Shared<FixtureResult>, _error: Option<&HookError>) {}

    fn before_fixture_stop(&self, _fixture: &Shared<FixtureResult>) {}
    fn after_fixture_stop(&self, _fixture: &Shared<FixtureResult>, _error: Option<&HookError>) {}

    fn before_test_schedule(&self, _test: &Shared<TestResult>) {}
    fn after_test_schedule(&self, _test: &Shared<TestResult>, _error: Option<&HookError>) {}

    fn before_test_start(&self, _test: &Shared<TestResult>) {}
    fn after_test_start(&self, _test: &Shared<TestResult>, _error: Option<&HookError>) {}

    fn before_test_update(&self, _test: &Shared<TestResult>) {}
    fn after_test_update(&self, _test: &Shared<TestResult>, _error: Option<&HookError>) {}

    fn before_test_stop(&self, _test: &Shared<TestResult>) {}
    fn after_test_stop(&self, _test: &Shared<TestResult>, _error: Option<&HookError>) {}

    fn before_test_write(&self, _test: &Shared<TestResult>) {}
    fn after_test_write(&self, _test: &Shared<TestResult>, _error: Option<&HookError>) {}

    fn before_step_start(&self, _step: &Shared<StepResult>) {}
    fn after_step_start(&self, _step: &Shared<StepResult>, _error: Option<&HookError>) {}

    fn before_step_update(&self, _step: &Shared<StepResult>) {}
    fn after_step_update(&self, _step: &Shared<StepResult>, _error: Option<&HookError>) {}

    fn before_step_stop(&self, _step: &Shared<StepResult>) {}
    fn after_step_stop(&self, _step: &Shared<StepResult>, _error: Option<&HookError>) {}

    fn before_attachment_write(&self, _attachment: &Shared<AttachmentResult>) {}
    fn after_attachment_write(
        &self,
        _attachment: &Shared<AttachmentResult>,
        _error: Option<&HookError>,
    ) {
    }
}

macro_rules! notify_pair {
    ($before: ident, $after: ident, $result: ty) => {
        pub(crate) fn $before(&self, result: &Shared<$result>) {
            for hook in &self.hooks {
                hook.$before(result);
            }
        }

        pub(crate) fn $after(&self, result: &Shared<$result>, error: Option<&HookError>) {
            for hook in &self.hooks {
                hook.$after(result, error);
            }
        }
    };
}

/// Fans lifecycle notifications out to every registered observer, in
/// registration order.
#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct HooksNotifier {
    #[derivative(Debug = "ignore")]
    hooks: Vec<Arc<dyn LifecycleHooks>>,
}

impl HooksNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hooks(hooks: Vec<Arc<dyn LifecycleHooks>>) -> Self {
        Self { hooks }
    }

    pub fn add(&mut self, hook: Arc<dyn LifecycleHooks>) {
        self.hooks.push(hook);
    }

    notify_pair!(before_container_start, after_container_start, ContainerResult);
    notify_pair!(before_container_update, after_container_update, ContainerResult);
    notify_pair!(before_container_stop, after_container_stop, ContainerResult);
    notify_pair!(before_container_write, after_container_write, ContainerResult);
    notify_pair!(before_fixture_start, after_fixture_start, FixtureResult);
    notify_pair!(before_fixture_update, after_fixture_update, FixtureResult);
    notify_pair!(before_fixture_stop, after_fixture_stop, FixtureResult);
    notify_pair!(before_test_schedule, after_test_schedule, TestResult);
    notify_pair!(before_test_start, after_test_start, TestResult);
    notify_pair!(before_test_update, after_test_update, TestResult);
    notify_pair!(before_test_stop, after_test_stop, TestResult);
    notify_pair!(before_test_write, after_test_write, TestResult);
    notify_pair!(before_step_start, after_step_start, StepResult);
    notify_pair!(before_step_update, after_step_update, StepResult);
    notify_pair!(before_step_stop, after_step_stop, StepResult);
    notify_pair!(before_attachment_write, after_attachment_write, AttachmentResult);
}

#[cfg(test)]
mod tests {

    use std::sync::{Arc, Mutex};

    use super::{HookError, HooksNotifier, LifecycleHooks};
    use crate::model::{ContainerResult, Shared};

    #[derive(Default)]
    struct NamedHook {
        name: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl LifecycleHooks for NamedHook {
        fn before_container_start(&self, _container: &Shared<ContainerResult>) {
            lock!(self.seen).push(self.name);
        }
    }

    struct AfterOnlyHook {
        errors: Mutex<Vec<bool>>,
    }

    impl LifecycleHooks for AfterOnlyHook {
        fn after_container_start(
            &self,
            _container: &Shared<ContainerResult>,
            error: Option<&HookError>,
        ) {
            lock!(self.errors).push(error.is_some());
        }
    }

    #[test]
    fn test_observers_fire_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = HooksNotifier::new();
        notifier.add(Arc::new(NamedHook {
            name: "first",
            seen: seen.clone(),
        }));
        notifier.add(Arc::new(NamedHook {
            name: "second",
            seen: seen.clone(),
        }));

        notifier.before_container_start(&Shared::new(ContainerResult::new()));

        assert_eq!(*lock!(seen), vec!["first", "second"]);
    }

    #[test]
    fn test_observers_may_implement_only_some_hooks() {
        let hook = Arc::new(AfterOnlyHook {
            errors: Mutex::new(Vec::new()),
        });
        let notifier = HooksNotifier::with_hooks(vec![hook.clone()]);
        let container = Shared::new(ContainerResult::new());

        notifier.before_container_start(&container);
        notifier.after_container_start(&container, None);

        assert_eq!(*lock!(hook.errors), vec![false]);
    }
}
