use serde_derive::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::attachment::AttachmentResult;
use super::label::Label;
use super::link::Link;
use super::parameter::Parameter;
use super::stage::Stage;
use super::status::{Status, StatusDetails};

/// Cloneable handle to a live result. The registry and the owning parent
/// hold the same handle, so a result evicted from the registry on stop
/// keeps its finished state inside the parent that reports it.
pub struct Shared<T>(Arc<Mutex<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Shared(Arc::new(Mutex::new(value)))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut value = lock!(self.0);
        f(&mut *value)
    }
}

impl<T: ResultItem> Shared<T> {
    pub fn uuid(&self) -> Uuid {
        self.with(|value| value.uuid())
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Shared(self.0.clone())
    }
}

impl<T: serde::Serialize> serde::Serialize for Shared<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let value = lock!(self.0);
        value.serialize(serializer)
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.try_lock() {
            Ok(value) => fmt::Debug::fmt(&*value, f),
            Err(_) => f.write_str("<locked>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Container,
    Fixture,
    Test,
    Step,
    Attachment,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ResultKind::Container => "container",
            ResultKind::Fixture => "fixture",
            ResultKind::Test => "test",
            ResultKind::Step => "step",
            ResultKind::Attachment => "attachment",
        };
        f.write_str(name)
    }
}

/// Common surface of every result entity.
pub trait ResultItem {
    fn uuid(&self) -> Uuid;
    fn kind(&self) -> ResultKind;
    fn excluded(&self) -> bool;
    fn set_excluded(&mut self, excluded: bool);
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    /// Directly nested results, in reporting order. The exclusion
    /// cascade walks this.
    fn nested_results(&self) -> Vec<ResultNode>;
}

/// A result that can appear nested under another one. There is no
/// container variant: containers are always roots.
#[derive(Debug, Clone)]
pub enum ResultNode {
    Fixture(Shared<FixtureResult>),
    Test(Shared<TestResult>),
    Step(Shared<StepResult>),
    Attachment(Shared<AttachmentResult>),
}

impl ResultNode {
    pub fn uuid(&self) -> Uuid {
        match self {
            ResultNode::Fixture(fixture) => fixture.uuid(),
            ResultNode::Test(test) => test.uuid(),
            ResultNode::Step(step) => step.uuid(),
            ResultNode::Attachment(attachment) => attachment.uuid(),
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            ResultNode::Fixture(_) => ResultKind::Fixture,
            ResultNode::Test(_) => ResultKind::Test,
            ResultNode::Step(_) => ResultKind::Step,
            ResultNode::Attachment(_) => ResultKind::Attachment,
        }
    }

    pub fn excluded(&self) -> bool {
        match self {
            ResultNode::Fixture(fixture) => fixture.with(|f| f.excluded()),
            ResultNode::Test(test) => test.with(|t| t.excluded()),
            ResultNode::Step(step) => step.with(|s| s.excluded()),
            ResultNode::Attachment(attachment) => attachment.with(|a| a.excluded()),
        }
    }

    pub fn set_excluded(&self, excluded: bool) {
        match self {
            ResultNode::Fixture(fixture) => fixture.with(|f| f.set_excluded(excluded)),
            ResultNode::Test(test) => test.with(|t| t.set_excluded(excluded)),
            ResultNode::Step(step) => step.with(|s| s.set_excluded(excluded)),
            ResultNode::Attachment(attachment) => attachment.with(|a| a.set_excluded(excluded)),
        }
    }

    pub fn nested_results(&self) -> Vec<ResultNode> {
        match self {
            ResultNode::Fixture(fixture) => fixture.with(|f| f.nested_results()),
            ResultNode::Test(test) => test.with(|t| t.nested_results()),
            ResultNode::Step(step) => step.with(|s| s.nested_results()),
            ResultNode::Attachment(attachment) => attachment.with(|a| a.nested_results()),
        }
    }
}

/// What can be "current" on a thread and own nested steps and
/// attachments: a fixture, a test or a step.
#[derive(Debug, Clone)]
pub enum ExecutionContext {
    Fixture(Shared<FixtureResult>),
    Test(Shared<TestResult>),
    Step(Shared<StepResult>),
}

impl ExecutionContext {
    pub fn uuid(&self) -> Uuid {
        match self {
            ExecutionContext::Fixture(fixture) => fixture.uuid(),
            ExecutionContext::Test(test) => test.uuid(),
            ExecutionContext::Step(step) => step.uuid(),
        }
    }

    pub(crate) fn add_steps(&self, steps: Vec<Shared<StepResult>>) {
        match self {
            ExecutionContext::Fixture(fixture) => fixture.with(|f| f.item_mut().add_steps(steps)),
            ExecutionContext::Test(test) => test.with(|t| t.item_mut().add_steps(steps)),
            ExecutionContext::Step(step) => step.with(|s| s.item_mut().add_steps(steps)),
        }
    }

    pub(crate) fn add_attachments(&self, attachments: Vec<Shared<AttachmentResult>>) {
        match self {
            ExecutionContext::Fixture(fixture) => {
                fixture.with(|f| f.item_mut().add_attachments(attachments))
            }
            ExecutionContext::Test(test) => test.with(|t| t.item_mut().add_attachments(attachments)),
            ExecutionContext::Step(step) => step.with(|s| s.item_mut().add_attachments(attachments)),
        }
    }
}

/// Body shared by fixtures, tests and steps: name, outcome, timing and
/// the nested steps/attachments/parameters.
#[derive(Debug, Serialize, Default, Clone, Builder)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableItem {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default = "None")]
    status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default = "None")]
    status_details: Option<StatusDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default = "None")]
    stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default = "None")]
    description: Option<String>,
    #[builder(default = "Vec::new()")]
    steps: Vec<Shared<StepResult>>,
    #[builder(default = "Vec::new()")]
    attachments: Vec<Shared<AttachmentResult>>,
    #[builder(default = "Vec::new()")]
    parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default = "None")]
    start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default = "None")]
    stop: Option<i64>,
    #[serde(skip)]
    #[builder(default = "false")]
    excluded: bool,
    #[serde(skip)]
    #[builder(default = "false")]
    muted: bool,
}

impl ExecutableItem {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn builder() -> ExecutableItemBuilder {
        ExecutableItemBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn set_status(&mut self, status: Option<Status>) {
        self.status = status;
    }

    pub fn status_details(&self) -> Option<&StatusDetails> {
        self.status_details.as_ref()
    }

    pub fn set_status_details(&mut self, status_details: Option<StatusDetails>) {
        self.status_details = status_details;
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = Some(stage);
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn start(&self) -> Option<i64> {
        self.start
    }

    pub fn set_start(&mut self, start: i64) {
        self.start = Some(start);
    }

    pub fn stop(&self) -> Option<i64> {
        self.stop
    }

    pub fn set_stop(&mut self, stop: i64) {
        self.stop = Some(stop);
    }

    pub fn steps(&self) -> &[Shared<StepResult>] {
        &self.steps
    }

    pub fn add_steps(&mut self, steps: Vec<Shared<StepResult>>) {
        self.steps.extend(steps);
    }

    pub fn attachments(&self) -> &[Shared<AttachmentResult>] {
        &self.attachments
    }

    pub fn add_attachments(&mut self, attachments: Vec<Shared<AttachmentResult>>) {
        self.attachments.extend(attachments);
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn add_parameters(&mut self, parameters: Vec<Parameter>) {
        self.parameters.extend(parameters);
    }

    fn nested(&self) -> Vec<ResultNode> {
        let mut nested: Vec<ResultNode> = self
            .steps
            .iter()
            .cloned()
            .map(ResultNode::Step)
            .collect();
        nested.extend(self.attachments.iter().cloned().map(ResultNode::Attachment));
        nested
    }
}

#[derive(Debug, Serialize, Clone, Builder)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    #[serde(flatten)]
    #[builder(default = "ExecutableItem::default()")]
    item: ExecutableItem,
    #[builder(default = "Uuid::new_v4()")]
    uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default = "None")]
    history_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default = "None")]
    full_name: Option<String>,
    #[builder(default = "Vec::new()")]
    labels: Vec<Label>,
    #[builder(default = "Vec::new()")]
    links: Vec<Link>,
}

impl TestResult {
    pub fn new(name: String) -> Self {
        Self::with_uuid(Uuid::new_v4(), name)
    }

    pub fn with_uuid(uuid: Uuid, name: String) -> Self {
        Self {
            item: ExecutableItem::new(name),
            uuid,
            history_id: None,
            full_name: None,
            labels: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn builder() -> TestResultBuilder {
        TestResultBuilder::default()
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn item(&self) -> &ExecutableItem {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut ExecutableItem {
        &mut self.item
    }

    pub fn history_id(&self) -> Option<Uuid> {
        self.history_id
    }

    pub fn set_history_id(&mut self, history_id: Option<Uuid>) {
        self.history_id = history_id;
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn set_full_name(&mut self, full_name: Option<String>) {
        self.full_name = full_name;
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn add_labels(&mut self, labels: Vec<Label>) {
        self.labels.extend(labels);
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn add_links(&mut self, links: Vec<Link>) {
        self.links.extend(links);
    }
}

impl ResultItem for TestResult {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Test
    }

    fn excluded(&self) -> bool {
        self.item.excluded
    }

    fn set_excluded(&mut self, excluded: bool) {
        self.item.excluded = excluded;
    }

    fn muted(&self) -> bool {
        self.item.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.item.muted = muted;
    }

    fn nested_results(&self) -> Vec<ResultNode> {
        self.item.nested()
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FixtureResult {
    #[serde(flatten)]
    item: ExecutableItem,
    #[serde(skip)]
    uuid: Uuid,
}

impl FixtureResult {
    pub fn new(name: String) -> Self {
        Self::with_uuid(Uuid::new_v4(), name)
    }

    pub fn with_uuid(uuid: Uuid, name: String) -> Self {
        Self {
            item: ExecutableItem::new(name),
            uuid,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn item(&self) -> &ExecutableItem {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut ExecutableItem {
        &mut self.item
    }
}

impl ResultItem for FixtureResult {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Fixture
    }

    fn excluded(&self) -> bool {
        self.item.excluded
    }

    fn set_excluded(&mut self, excluded: bool) {
        self.item.excluded = excluded;
    }

    fn muted(&self) -> bool {
        self.item.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.item.muted = muted;
    }

    fn nested_results(&self) -> Vec<ResultNode> {
        self.item.nested()
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    #[serde(flatten)]
    item: ExecutableItem,
    #[serde(skip)]
    uuid: Uuid,
}

impl StepResult {
    pub fn new(name: String) -> Self {
        Self::with_uuid(Uuid::new_v4(), name)
    }

    pub fn with_uuid(uuid: Uuid, name: String) -> Self {
        Self {
            item: ExecutableItem::new(name),
            uuid,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn item(&self) -> &ExecutableItem {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut ExecutableItem {
        &mut self.item
    }
}

impl ResultItem for StepResult {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Step
    }

    fn excluded(&self) -> bool {
        self.item.excluded
    }

    fn set_excluded(&mut self, excluded: bool) {
        self.item.excluded = excluded;
    }

    fn muted(&self) -> bool {
        self.item.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.item.muted = muted;
    }

    fn nested_results(&self) -> Vec<ResultNode> {
        self.item.nested()
    }
}

/// Groups the setup and teardown fixtures with the tests sharing them.
/// Tests are referenced by uuid and written by their own lifecycle;
/// fixtures live inline.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResult {
    uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "befores")]
    set_ups: Vec<Shared<FixtureResult>>,
    #[serde(rename = "afters")]
    tear_downs: Vec<Shared<FixtureResult>>,
    #[serde(with = "crate::model::serialize::children")]
    children: Vec<Shared<TestResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<i64>,
    #[serde(skip)]
    excluded: bool,
    #[serde(skip)]
    muted: bool,
}

impl ContainerResult {
    pub fn new() -> Self {
        Self::with_uuid(Uuid::new_v4())
    }

    pub fn with_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            name: None,
            set_ups: Vec::new(),
            tear_downs: Vec::new(),
            children: Vec::new(),
            start: None,
            stop: None,
            excluded: false,
            muted: false,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn start(&self) -> Option<i64> {
        self.start
    }

    pub fn set_start(&mut self, start: i64) {
        self.start = Some(start);
    }

    pub fn stop(&self) -> Option<i64> {
        self.stop
    }

    pub fn set_stop(&mut self, stop: i64) {
        self.stop = Some(stop);
    }

    pub fn set_ups(&self) -> &[Shared<FixtureResult>] {
        &self.set_ups
    }

    pub fn add_set_ups(&mut self, fixtures: Vec<Shared<FixtureResult>>) {
        self.set_ups.extend(fixtures);
    }

    pub fn tear_downs(&self) -> &[Shared<FixtureResult>] {
        &self.tear_downs
    }

    pub fn add_tear_downs(&mut self, fixtures: Vec<Shared<FixtureResult>>) {
        self.tear_downs.extend(fixtures);
    }

    pub fn children(&self) -> &[Shared<TestResult>] {
        &self.children
    }

    pub fn add_children(&mut self, children: Vec<Shared<TestResult>>) {
        self.children.extend(children);
    }
}

impl Default for ContainerResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultItem for ContainerResult {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Container
    }

    fn excluded(&self) -> bool {
        self.excluded
    }

    fn set_excluded(&mut self, excluded: bool) {
        self.excluded = excluded;
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn nested_results(&self) -> Vec<ResultNode> {
        let mut nested: Vec<ResultNode> = self
            .set_ups
            .iter()
            .cloned()
            .map(ResultNode::Fixture)
            .collect();
        nested.extend(self.tear_downs.iter().cloned().map(ResultNode::Fixture));
        nested.extend(self.children.iter().cloned().map(ResultNode::Test));
        nested
    }
}

#[cfg(test)]
mod tests {

    use uuid::Uuid;

    use super::{
        ContainerResult, ExecutableItem, FixtureResult, ResultItem, ResultKind, Shared, StepResult,
        TestResult,
    };
    use crate::model::stage::Stage;
    use crate::model::status::Status;

    #[test]
    fn test_container_serializes_children_as_uuids() {
        let mut container = ContainerResult::new();
        let test = TestResult::new("sign in".to_owned());
        let test_uuid = test.uuid();
        container.add_children(vec![Shared::new(test)]);
        container.add_set_ups(vec![Shared::new(FixtureResult::new("prepare".to_owned()))]);

        let json = serde_json::to_value(&container).unwrap();

        assert_eq!(
            json["children"],
            serde_json::json!([test_uuid.to_string()])
        );
        assert_eq!(json["befores"][0]["name"], "prepare");
        assert!(json.get("excluded").is_none());
    }

    #[test]
    fn test_test_result_serializes_flattened_item() {
        let mut test = TestResult::new("sign in".to_owned());
        test.item_mut().set_status(Some(Status::Passed));
        test.item_mut().set_stage(Stage::Finished);
        test.item_mut().set_start(100);
        test.item_mut().set_stop(200);

        let json = serde_json::to_value(&test).unwrap();

        assert_eq!(json["name"], "sign in");
        assert_eq!(json["status"], "passed");
        assert_eq!(json["stage"], "finished");
        assert_eq!(json["start"], 100);
        assert_eq!(json["stop"], 200);
        assert_eq!(json["uuid"], test.uuid().to_string());
    }

    #[test]
    fn test_step_serializes_without_uuid() {
        let step = StepResult::new("click".to_owned());

        let json = serde_json::to_value(&step).unwrap();

        assert!(json.get("uuid").is_none());
        assert_eq!(json["name"], "click");
    }

    #[test]
    fn test_nested_results_order_is_set_ups_tear_downs_children() {
        let mut container = ContainerResult::new();
        let set_up = Shared::new(FixtureResult::new("before".to_owned()));
        let tear_down = Shared::new(FixtureResult::new("after".to_owned()));
        let child = Shared::new(TestResult::new("case".to_owned()));
        container.add_set_ups(vec![set_up.clone()]);
        container.add_tear_downs(vec![tear_down.clone()]);
        container.add_children(vec![child.clone()]);

        let nested = container.nested_results();

        assert_eq!(nested.len(), 3);
        assert_eq!(nested[0].kind(), ResultKind::Fixture);
        assert_eq!(nested[0].uuid(), set_up.uuid());
        assert_eq!(nested[1].uuid(), tear_down.uuid());
        assert_eq!(nested[2].kind(), ResultKind::Test);
        assert_eq!(nested[2].uuid(), child.uuid());
    }

    #[test]
    fn test_builder_assigns_uuid_by_default() {
        let built = TestResult::builder()
            .item(ExecutableItem::builder().name("case".to_owned()).build().unwrap())
            .build()
            .unwrap();

        assert_ne!(built.uuid(), Uuid::nil());
        assert_eq!(built.item().name(), "case");
    }
}
