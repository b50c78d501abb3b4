pub mod error;
pub mod hooks;
mod storage;
mod thread;

use derivative::*;
use std::error::Error as StdError;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::io::{BoxError, Clock, DataSource, ErrorContext, Logger, ResultsWriter};
use crate::model::{
    AttachmentResult, ContainerResult, ExecutableItem, ExecutionContext, FixtureResult, ResultItem,
    ResultNode, Shared, Stage, StepResult, TestResult,
};

use self::error::Error;
use self::hooks::HooksNotifier;
use self::storage::ResultStorage;
use self::thread::ThreadContext;

/// Orchestrates the start/update/stop/write protocol for every result
/// kind. Operations never fail from the caller's point of view: every
/// internal failure is logged, handed to the after-hooks and folded into
/// a `None` return value, so instrumentation embedded in test bodies
/// cannot crash the test run.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Lifecycle {
    #[derivative(Debug = "ignore")]
    logger: Arc<dyn Logger>,
    #[derivative(Debug = "ignore")]
    clock: Arc<dyn Clock>,
    #[derivative(Debug = "ignore")]
    writer: Arc<dyn ResultsWriter>,
    notifier: HooksNotifier,
    storage: Mutex<ResultStorage>,
    threads: Mutex<ThreadContext>,
}

impl Lifecycle {
    pub fn new(
        logger: Arc<dyn Logger>,
        clock: Arc<dyn Clock>,
        writer: Arc<dyn ResultsWriter>,
        notifier: HooksNotifier,
    ) -> Self {
        Self {
            logger,
            clock,
            writer,
            notifier,
            storage: Mutex::new(ResultStorage::default()),
            threads: Mutex::new(ThreadContext::default()),
        }
    }

    /// Rebinds the calling OS thread to a named logical thread, or back
    /// to its own default with `None`.
    pub fn switch_thread(&self, thread: Option<&str>) {
        lock!(self.threads).switch_thread(thread);
    }

    pub fn current_test(&self) -> Option<Uuid> {
        lock!(self.threads).current_test()
    }

    pub fn current_step(&self) -> Option<Uuid> {
        lock!(self.threads).current_step()
    }

    pub fn current_test_or_step(&self) -> Option<Uuid> {
        lock!(self.threads).current_test_or_step()
    }

    pub fn start_container(&self, container: ContainerResult) {
        let container = Shared::new(container);
        self.notifier.before_container_start(&container);
        let error = (|| -> Result<(), BoxError> {
            let now = self.clock.now()?;
            container.with(|c| c.set_start(now));
            lock!(self.storage).set(container.clone());
            lock!(self.threads).set_container(container.uuid());
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Container (UUID: {uuid}) not started",
                &[("uuid", Some(container.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_container_start(&container, error.as_deref());
    }

    pub fn update_container<F>(&self, update: F, uuid: Option<Uuid>) -> Option<Uuid>
    where
        F: FnOnce(&mut ContainerResult) -> Result<(), BoxError>,
    {
        let resolved = uuid.or_else(|| lock!(self.threads).container());
        let container = match resolved
            .ok_or(Error::NoActiveContainer)
            .and_then(|uuid| lock!(self.storage).container(uuid))
        {
            Ok(container) => container,
            Err(error) => {
                self.log_failure(
                    "Container (UUID: {uuid}) not updated",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        self.notifier.before_container_update(&container);
        let error = container.with(|c| update(c)).err();
        if let Some(error) = &error {
            self.log_failure(
                "Container (UUID: {uuid}) not updated",
                &[("uuid", Some(container.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_container_update(&container, error.as_deref());
        Some(container.uuid())
    }

    pub fn stop_container(&self, uuid: Option<Uuid>) -> Option<Uuid> {
        let resolved = uuid.or_else(|| lock!(self.threads).container());
        let container = match resolved
            .ok_or(Error::NoActiveContainer)
            .and_then(|uuid| lock!(self.storage).container(uuid))
        {
            Ok(container) => container,
            Err(error) => {
                self.log_failure(
                    "Container (UUID: {uuid}) not stopped",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        self.notifier.before_container_stop(&container);
        let error = (|| -> Result<(), BoxError> {
            let now = self.clock.now()?;
            container.with(|c| c.set_stop(now));
            lock!(self.threads).reset_container();
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Container (UUID: {uuid}) not stopped",
                &[("uuid", Some(container.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_container_stop(&container, error.as_deref());
        Some(container.uuid())
    }

    pub fn write_container(&self, uuid: Uuid) {
        let container = match lock!(self.storage).container(uuid) {
            Ok(container) => container,
            Err(error) => {
                self.log_failure(
                    "Container (UUID: {uuid}) not written",
                    &[("uuid", Some(uuid))],
                    &error,
                );
                return;
            }
        };
        self.notifier.before_container_write(&container);
        let error = (|| -> Result<(), BoxError> {
            let nested = container.with(|c| c.nested_results());
            if container.with(|c| c.excluded()) {
                self.exclude_nested_results(&nested);
            }
            self.remove_excluded_nested_results(&nested);
            if !container.with(|c| c.excluded()) {
                container.with(|c| self.writer.write_container(c))?;
            }
            lock!(self.storage).unset(container.uuid());
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Container (UUID: {uuid}) not written",
                &[("uuid", Some(container.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_container_write(&container, error.as_deref());
    }

    pub fn start_set_up_fixture(&self, fixture: FixtureResult, container_uuid: Option<Uuid>) {
        let fixture = Shared::new(fixture);
        self.notifier.before_fixture_start(&fixture);
        let resolved = container_uuid.or_else(|| lock!(self.threads).container());
        let error = (|| -> Result<(), BoxError> {
            let container = resolved
                .ok_or(Error::NoActiveContainer)
                .and_then(|uuid| lock!(self.storage).container(uuid))?;
            container.with(|c| c.add_set_ups(vec![fixture.clone()]));
            self.start_fixture(&fixture)
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Fixture (setUp, UUID: {uuid}) not started",
                &[("uuid", resolved)],
                error.as_ref(),
            );
        }
        self.notifier.after_fixture_start(&fixture, error.as_deref());
    }

    pub fn start_tear_down_fixture(&self, fixture: FixtureResult, container_uuid: Option<Uuid>) {
        let fixture = Shared::new(fixture);
        self.notifier.before_fixture_start(&fixture);
        let resolved = container_uuid.or_else(|| lock!(self.threads).container());
        let error = (|| -> Result<(), BoxError> {
            let container = resolved
                .ok_or(Error::NoActiveContainer)
                .and_then(|uuid| lock!(self.storage).container(uuid))?;
            container.with(|c| c.add_tear_downs(vec![fixture.clone()]));
            self.start_fixture(&fixture)
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Fixture (tearDown, UUID: {uuid}) not started",
                &[("uuid", resolved)],
                error.as_ref(),
            );
        }
        self.notifier.after_fixture_start(&fixture, error.as_deref());
    }

    /// Fixtures and tests are stack roots: starting one discards any
    /// stale nested state left on the thread.
    fn start_fixture(&self, fixture: &Shared<FixtureResult>) -> Result<(), BoxError> {
        let now = self.clock.now()?;
        fixture.with(|f| {
            f.item_mut().set_stage(Stage::Running);
            f.item_mut().set_start(now);
        });
        lock!(self.storage).set(fixture.clone());
        let uuid = fixture.uuid();
        let mut threads = lock!(self.threads);
        threads.reset();
        threads.push(uuid);
        Ok(())
    }

    pub fn update_fixture<F>(&self, update: F, uuid: Option<Uuid>) -> Option<Uuid>
    where
        F: FnOnce(&mut FixtureResult) -> Result<(), BoxError>,
    {
        let resolved = uuid.or_else(|| self.current_test());
        let fixture = match resolved
            .ok_or(Error::NoActiveTest)
            .and_then(|uuid| lock!(self.storage).fixture(uuid))
        {
            Ok(fixture) => fixture,
            Err(error) => {
                self.log_failure(
                    "Fixture (UUID: {uuid}) not updated",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        self.notifier.before_fixture_update(&fixture);
        let error = fixture.with(|f| update(f)).err();
        if let Some(error) = &error {
            self.log_failure(
                "Fixture (UUID: {uuid}) not updated",
                &[("uuid", Some(fixture.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_fixture_update(&fixture, error.as_deref());
        Some(fixture.uuid())
    }

    pub fn stop_fixture(&self, uuid: Option<Uuid>) -> Option<Uuid> {
        let resolved = uuid.or_else(|| self.current_test());
        let fixture = match resolved
            .ok_or(Error::NoActiveTest)
            .and_then(|uuid| lock!(self.storage).fixture(uuid))
        {
            Ok(fixture) => fixture,
            Err(error) => {
                self.log_failure(
                    "Fixture (UUID: {uuid}) not stopped",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        self.notifier.before_fixture_stop(&fixture);
        let error = (|| -> Result<(), BoxError> {
            let now = self.clock.now()?;
            fixture.with(|f| {
                f.item_mut().set_stage(Stage::Finished);
                f.item_mut().set_stop(now);
            });
            lock!(self.storage).unset(fixture.uuid());
            lock!(self.threads).reset();
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Fixture (UUID: {uuid}) not stopped",
                &[("uuid", Some(fixture.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_fixture_stop(&fixture, error.as_deref());
        Some(fixture.uuid())
    }

    pub fn schedule_test(&self, test: TestResult, container_uuid: Option<Uuid>) {
        let test = Shared::new(test);
        self.notifier.before_test_schedule(&test);
        let resolved = container_uuid.or_else(|| lock!(self.threads).container());
        let error = (|| -> Result<(), BoxError> {
            if let Some(container_uuid) = resolved {
                let container = lock!(self.storage).container(container_uuid)?;
                container.with(|c| c.add_children(vec![test.clone()]));
            }
            test.with(|t| t.item_mut().set_stage(Stage::Scheduled));
            lock!(self.storage).set(test.clone());
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Test (UUID: {uuid}) not scheduled (container UUID: {containerUuid})",
                &[("uuid", Some(test.uuid())), ("containerUuid", resolved)],
                error.as_ref(),
            );
        }
        self.notifier.after_test_schedule(&test, error.as_deref());
    }

    pub fn start_test(&self, uuid: Uuid) {
        let test = match lock!(self.storage).test(uuid) {
            Ok(test) => test,
            Err(error) => {
                self.log_failure(
                    "Test (UUID: {uuid}) not started",
                    &[("uuid", Some(uuid))],
                    &error,
                );
                return;
            }
        };
        self.notifier.before_test_start(&test);
        let error = (|| -> Result<(), BoxError> {
            let now = self.clock.now()?;
            test.with(|t| {
                t.item_mut().set_stage(Stage::Running);
                t.item_mut().set_start(now);
            });
            let mut threads = lock!(self.threads);
            threads.reset();
            threads.push(uuid);
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Test (UUID: {uuid}) not started",
                &[("uuid", Some(test.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_test_start(&test, error.as_deref());
    }

    pub fn update_test<F>(&self, update: F, uuid: Option<Uuid>) -> Option<Uuid>
    where
        F: FnOnce(&mut TestResult) -> Result<(), BoxError>,
    {
        let resolved = uuid.or_else(|| self.current_test());
        let test = match resolved
            .ok_or(Error::NoActiveTest)
            .and_then(|uuid| lock!(self.storage).test(uuid))
        {
            Ok(test) => test,
            Err(error) => {
                self.log_failure(
                    "Test (UUID: {uuid}) not updated",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        self.notifier.before_test_update(&test);
        let error = test.with(|t| update(t)).err();
        if let Some(error) = &error {
            self.log_failure(
                "Test (UUID: {uuid}) not updated",
                &[("uuid", Some(test.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_test_update(&test, error.as_deref());
        Some(test.uuid())
    }

    pub fn stop_test(&self, uuid: Option<Uuid>) -> Option<Uuid> {
        let resolved = uuid.or_else(|| self.current_test());
        let test = match resolved
            .ok_or(Error::NoActiveTest)
            .and_then(|uuid| lock!(self.storage).test(uuid))
        {
            Ok(test) => test,
            Err(error) => {
                self.log_failure(
                    "Test (UUID: {uuid}) not stopped",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        self.notifier.before_test_stop(&test);
        let error = (|| -> Result<(), BoxError> {
            let now = self.clock.now()?;
            test.with(|t| {
                t.item_mut().set_stage(Stage::Finished);
                t.item_mut().set_stop(now);
            });
            lock!(self.threads).reset();
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Test (UUID: {uuid}) not stopped",
                &[("uuid", Some(test.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_test_stop(&test, error.as_deref());
        Some(test.uuid())
    }

    pub fn write_test(&self, uuid: Uuid) {
        let test = match lock!(self.storage).test(uuid) {
            Ok(test) => test,
            Err(error) => {
                self.log_failure(
                    "Test (UUID: {uuid}) not written",
                    &[("uuid", Some(uuid))],
                    &error,
                );
                return;
            }
        };
        self.notifier.before_test_write(&test);
        let error = (|| -> Result<(), BoxError> {
            let nested = test.with(|t| t.nested_results());
            if test.with(|t| t.excluded()) {
                self.exclude_nested_results(&nested);
            }
            self.remove_excluded_nested_results(&nested);
            if !test.with(|t| t.excluded()) {
                test.with(|t| self.writer.write_test(t))?;
            }
            lock!(self.storage).unset(test.uuid());
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Test (UUID: {uuid}) not written",
                &[("uuid", Some(test.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_test_write(&test, error.as_deref());
    }

    pub fn start_step(&self, step: StepResult, parent_uuid: Option<Uuid>) {
        let step = Shared::new(step);
        self.notifier.before_step_start(&step);
        let resolved = parent_uuid.or_else(|| self.current_test_or_step());
        let error = (|| -> Result<(), BoxError> {
            let parent = resolved
                .ok_or(Error::NoActiveExecutionContext)
                .and_then(|uuid| lock!(self.storage).execution_context(uuid))?;
            parent.add_steps(vec![step.clone()]);
            let now = self.clock.now()?;
            step.with(|s| {
                s.item_mut().set_stage(Stage::Running);
                s.item_mut().set_start(now);
            });
            lock!(self.storage).set(step.clone());
            lock!(self.threads).push(step.uuid());
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Step (UUID: {uuid}) not started (parent UUID: {parentUuid})",
                &[("uuid", Some(step.uuid())), ("parentUuid", resolved)],
                error.as_ref(),
            );
        }
        self.notifier.after_step_start(&step, error.as_deref());
    }

    pub fn update_step<F>(&self, update: F, uuid: Option<Uuid>) -> Option<Uuid>
    where
        F: FnOnce(&mut StepResult) -> Result<(), BoxError>,
    {
        let resolved = uuid.or_else(|| self.current_step());
        let step = match resolved
            .ok_or(Error::NoActiveStep)
            .and_then(|uuid| lock!(self.storage).step(uuid))
        {
            Ok(step) => step,
            Err(error) => {
                self.log_failure(
                    "Step (UUID: {uuid}) not updated",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        self.notifier.before_step_update(&step);
        let error = step.with(|s| update(s)).err();
        if let Some(error) = &error {
            self.log_failure(
                "Step (UUID: {uuid}) not updated",
                &[("uuid", Some(step.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_step_update(&step, error.as_deref());
        Some(step.uuid())
    }

    /// Updates whatever is current (or explicitly addressed) without the
    /// caller knowing its kind, dispatching to the matching update
    /// operation so kind-specific hooks still fire.
    pub fn update_execution_context<F>(&self, update: F, uuid: Option<Uuid>) -> Option<Uuid>
    where
        F: FnOnce(&mut ExecutableItem) -> Result<(), BoxError>,
    {
        let resolved = uuid.or_else(|| self.current_test_or_step());
        let context = match resolved
            .ok_or(Error::NoActiveExecutionContext)
            .and_then(|uuid| lock!(self.storage).execution_context(uuid))
        {
            Ok(context) => context,
            Err(error) => {
                self.log_failure(
                    "Execution context (UUID: {uuid}) not updated",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        match context {
            ExecutionContext::Fixture(fixture) => {
                let uuid = fixture.uuid();
                self.update_fixture(|f| update(f.item_mut()), Some(uuid))
            }
            ExecutionContext::Test(test) => {
                let uuid = test.uuid();
                self.update_test(|t| update(t.item_mut()), Some(uuid))
            }
            ExecutionContext::Step(step) => {
                let uuid = step.uuid();
                self.update_step(|s| update(s.item_mut()), Some(uuid))
            }
        }
    }

    pub fn stop_step(&self, uuid: Option<Uuid>) -> Option<Uuid> {
        let resolved = uuid.or_else(|| self.current_step());
        let step = match resolved
            .ok_or(Error::NoActiveStep)
            .and_then(|uuid| lock!(self.storage).step(uuid))
        {
            Ok(step) => step,
            Err(error) => {
                self.log_failure(
                    "Step (UUID: {uuid}) not stopped",
                    &[("uuid", resolved)],
                    &error,
                );
                return None;
            }
        };
        self.notifier.before_step_stop(&step);
        let error = (|| -> Result<(), BoxError> {
            let now = self.clock.now()?;
            step.with(|s| {
                s.item_mut().set_stage(Stage::Finished);
                s.item_mut().set_stop(now);
            });
            lock!(self.storage).unset(step.uuid());
            lock!(self.threads).pop();
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Step (UUID: {uuid}) not stopped",
                &[("uuid", Some(step.uuid()))],
                error.as_ref(),
            );
        }
        self.notifier.after_step_stop(&step, error.as_deref());
        Some(step.uuid())
    }

    /// Attaches to the current test or step and writes the payload right
    /// away, unless the attachment is excluded. There is no explicit
    /// parent parameter and no stack entry: attachments are leaves.
    pub fn add_attachment(&self, attachment: AttachmentResult, data: DataSource) {
        let attachment = Shared::new(attachment);
        let parent_uuid = self.current_test_or_step();
        let context = match parent_uuid
            .ok_or(Error::NoActiveExecutionContext)
            .and_then(|uuid| lock!(self.storage).execution_context(uuid))
        {
            Ok(context) => context,
            Err(error) => {
                self.log_failure(
                    "Attachment (UUID: {uuid}) not added (parent UUID: {parentUuid})",
                    &[("uuid", Some(attachment.uuid())), ("parentUuid", parent_uuid)],
                    &error,
                );
                return;
            }
        };
        context.add_attachments(vec![attachment.clone()]);
        self.notifier.before_attachment_write(&attachment);
        let error = (|| -> Result<(), BoxError> {
            if !attachment.with(|a| a.excluded()) {
                attachment.with(|a| self.writer.write_attachment(a, &data))?;
            }
            Ok(())
        })()
        .err();
        if let Some(error) = &error {
            self.log_failure(
                "Attachment (UUID: {uuid}) not added (parent UUID: {parentUuid})",
                &[
                    ("uuid", Some(attachment.uuid())),
                    ("parentUuid", Some(context.uuid())),
                ],
                error.as_ref(),
            );
        }
        self.notifier.after_attachment_write(&attachment, error.as_deref());
    }

    /// Exclusion only ever flows downward: parents are marked before
    /// their children, and marking twice is harmless.
    fn exclude_nested_results(&self, nested: &[ResultNode]) {
        for node in nested {
            node.set_excluded(true);
            self.exclude_nested_results(&node.nested_results());
        }
    }

    /// Removes every excluded nested result from the durable writer,
    /// children before parents, left to right. Only attachments and
    /// tests have a durable form to remove; an excluded fixture or step
    /// simply vanishes with its parent, which is worth a record in the
    /// log if one is ever reached here.
    fn remove_excluded_nested_results(&self, nested: &[ResultNode]) {
        for node in nested {
            self.remove_excluded_nested_results(&node.nested_results());
            if node.excluded() {
                match node {
                    ResultNode::Attachment(attachment) => self.remove_attachment(attachment),
                    ResultNode::Test(test) => self.remove_test(test),
                    other => self.logger.error(
                        "Result not removed",
                        &ErrorContext {
                            fields: vec![("kind", Some(other.kind().to_string()))],
                            exception: None,
                        },
                    ),
                }
            }
        }
    }

    fn remove_test(&self, test: &Shared<TestResult>) {
        let removed = test.with(|t| self.writer.remove_test(t));
        if let Err(error) = removed {
            self.log_failure(
                "Test (UUID: {uuid}) not removed",
                &[("uuid", Some(test.uuid()))],
                error.as_ref(),
            );
        }
    }

    fn remove_attachment(&self, attachment: &Shared<AttachmentResult>) {
        let removed = attachment.with(|a| self.writer.remove_attachment(a));
        if let Err(error) = removed {
            self.log_failure(
                "Attachment (UUID: {uuid}) not removed",
                &[("uuid", Some(attachment.uuid()))],
                error.as_ref(),
            );
        }
    }

    fn log_failure(
        &self,
        template: &'static str,
        fields: &[(&'static str, Option<Uuid>)],
        error: &(dyn StdError + Send + Sync),
    ) {
        let fields = fields
            .iter()
            .map(|(key, uuid)| (*key, uuid.map(|uuid| uuid.to_string())))
            .collect();
        self.logger.error(
            template,
            &ErrorContext {
                fields,
                exception: Some(error),
            },
        );
    }
}
