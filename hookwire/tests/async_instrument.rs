use hookwire::{Args, Context, Manager, instrument_async, keys, testing::RecordingHandler};
use std::time::Duration;

mod common;

#[tokio::test]
async fn async_operation_is_timed_and_recorded() {
    let recorder = RecordingHandler::new();
    let manager = Manager::builder()
        .register_after_hook(recorder.clone())
        .build();
    let fields: Args = [(keys::TABLE, "orders")].into_iter().collect();

    let line = line!() + 1;
    let out: Result<usize, String> = instrument_async(
        &manager,
        Context::for_request("req-9", "/orders", "GET"),
        "select",
        fields,
        |_ctx| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(3)
        },
    )
    .await;

    assert_eq!(out, Ok(3));
    let args = recorder.last().unwrap();
    assert_eq!(args.str(keys::FUNC_NAME), "select");
    assert_eq!(args.str(keys::TABLE), "orders");
    assert_eq!(args.str(keys::UUID), "req-9");
    assert_eq!(args.str(keys::SOURCE), format!("{}:{line}", file!()));
    assert!(args.duration(keys::DURATION) >= Duration::from_millis(20));
    assert!(args.time(keys::END_TIME) >= args.time(keys::START_TIME));
}

#[tokio::test]
async fn async_errors_reach_the_log_line() {
    let (logger, buf) = common::buffer_logger("%f %e");
    let manager = Manager::builder()
        .register_log_hook_with(logger)
        .unwrap()
        .build();

    let out: Result<(), String> = instrument_async(
        &manager,
        Context::background(),
        "insert",
        Args::new(),
        |_ctx| async { Err("duplicate key".to_owned()) },
    )
    .await;
    manager.close().unwrap();

    assert!(out.is_err());
    assert_eq!(buf.contents(), "insert duplicate key\n");
}
