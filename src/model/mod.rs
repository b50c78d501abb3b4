//! In-memory model of a reported test run, serialized to the camelCase
//! JSON shape the report renderer expects. `excluded` and `muted` are
//! bookkeeping flags and never appear in the output.

mod attachment;
mod env;
mod label;
mod link;
mod parameter;
mod result;
pub mod serialize;
mod stage;
mod status;

pub use self::attachment::AttachmentResult;
pub use self::env::EnvProvider;
pub use self::label::{Label, Severity};
pub use self::link::{Link, LinkType};
pub use self::parameter::Parameter;
pub use self::result::{
    ContainerResult, ExecutableItem, ExecutableItemBuilder, ExecutionContext, FixtureResult,
    ResultItem, ResultKind, ResultNode, Shared, StepResult, TestResult, TestResultBuilder,
};
pub use self::stage::Stage;
pub use self::status::{Status, StatusDetails};
