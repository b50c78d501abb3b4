use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Once};

use uuid::Uuid;

use spotter::io::{
    DataSource, FileSystemResultsWriter, StandardLogger, StrictLogger, SystemClock,
};
use spotter::model::{
    AttachmentResult, ContainerResult, ResultItem, Status, StepResult, TestResult,
};
use spotter::{HooksNotifier, Lifecycle};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}[{}][{}] {}",
                    chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                    record.target(),
                    record.level(),
                    message
                ))
            })
            .level(log::LevelFilter::Debug)
            .chain(std::io::stdout())
            .apply()
            .ok();
    });
}

fn temp_output(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}", prefix, Uuid::new_v4()))
}

fn read_json(path: &PathBuf) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_full_run_produces_container_and_test_files() {
    let output = temp_output("spotter-run");
    let lifecycle = Lifecycle::new(
        Arc::new(StrictLogger),
        Arc::new(SystemClock),
        Arc::new(FileSystemResultsWriter::new(&output)),
        HooksNotifier::new(),
    );

    let container = ContainerResult::new();
    let container_uuid = container.uuid();
    lifecycle.start_container(container);

    let test = TestResult::new("adds an item to the cart".to_owned());
    let test_uuid = test.uuid();
    lifecycle.schedule_test(test, None);
    lifecycle.start_test(test_uuid);

    let step = StepResult::new("open product page".to_owned());
    lifecycle.start_step(step, None);
    lifecycle.stop_step(None);

    lifecycle.update_test(
        |t| {
            t.item_mut().set_status(Some(Status::Passed));
            Ok(())
        },
        None,
    );
    lifecycle.stop_test(None);
    lifecycle.write_test(test_uuid);

    lifecycle.stop_container(None);
    lifecycle.write_container(container_uuid);

    let test_json = read_json(&output.join(format!("{}-result.json", test_uuid)));
    assert_eq!(test_json["name"], "adds an item to the cart");
    assert_eq!(test_json["status"], "passed");
    assert_eq!(test_json["stage"], "finished");
    assert_eq!(test_json["steps"][0]["name"], "open product page");
    assert_eq!(test_json["steps"][0]["stage"], "finished");

    let container_json = read_json(&output.join(format!("{}-container.json", container_uuid)));
    assert_eq!(
        container_json["children"],
        serde_json::json!([test_uuid.to_string()])
    );
    assert_eq!(container_json["befores"], serde_json::json!([]));
    assert_eq!(container_json["afters"], serde_json::json!([]));

    fs::remove_dir_all(&output).unwrap();
}

#[test]
fn test_excluding_a_container_erases_written_results_from_disk() {
    init_logging();
    let output = temp_output("spotter-excluded");
    let lifecycle = Lifecycle::new(
        Arc::new(StandardLogger),
        Arc::new(SystemClock),
        Arc::new(FileSystemResultsWriter::new(&output)),
        HooksNotifier::new(),
    );

    let container = ContainerResult::new();
    let container_uuid = container.uuid();
    lifecycle.start_container(container);

    let test = TestResult::new("flaky scenario".to_owned());
    let test_uuid = test.uuid();
    lifecycle.schedule_test(test, None);
    lifecycle.start_test(test_uuid);

    let attachment = AttachmentResult::new("trace".to_owned(), None, Some("txt"));
    let attachment_source = attachment.source().to_owned();
    lifecycle.add_attachment(attachment, DataSource::from("request trace"));

    lifecycle.stop_test(None);
    lifecycle.write_test(test_uuid);

    let result_file = output.join(format!("{}-result.json", test_uuid));
    let attachment_file = output.join(&attachment_source);
    assert!(result_file.exists());
    assert!(attachment_file.exists());

    lifecycle.stop_container(None);
    lifecycle.update_container(
        |c| {
            c.set_excluded(true);
            Ok(())
        },
        Some(container_uuid),
    );
    lifecycle.write_container(container_uuid);

    assert!(!result_file.exists());
    assert!(!attachment_file.exists());
    assert!(!output
        .join(format!("{}-container.json", container_uuid))
        .exists());

    fs::remove_dir_all(&output).unwrap();
}
