use chrono::{Local, TimeZone};
use hookwire::{
    Args, CallSite, ConfigError, Context, Manager, Pattern, PatternRegistry, PatternResult,
    RenderConfig, keys, standard_registry,
};
use proptest::prelude::*;
use std::fs;

mod common;
use common::title_registry;

fn render_time_args() -> Args {
    let mut args = Args::new();
    args.insert("time", Local.with_ymd_and_hms(2019, 1, 2, 11, 36, 28).unwrap());
    args
}

#[test]
fn json_group_renders_one_object() {
    let pattern = Pattern::compile("%J{Tt}", &title_registry()).unwrap();
    assert_eq!(
        pattern.render_string(&render_time_args()),
        "{\"time\":\"2019/01/02 11:36:28.000\",\"title\":\"RENDER\"}\n"
    );
}

#[test]
fn mixed_template_renders_text() {
    let pattern = Pattern::compile("[%T] title:%t", &title_registry()).unwrap();
    assert_eq!(
        pattern.render_string(&render_time_args()),
        "[2019/01/02 11:36:28.000] title:RENDER\n"
    );
}

#[test]
fn unknown_specifiers_pass_through() {
    let registry =
        PatternRegistry::new().with('M', |_: &Args| PatternResult::new("x", "2233"));
    let pattern = Pattern::compile("%12 %% %xd %M", &registry).unwrap();
    assert_eq!(pattern.render_string(&Args::new()), "%12 %% %xd 2233\n");
}

#[test]
fn registry_claiming_json_key_is_fatal() {
    let registry = standard_registry().with('J', |_: &Args| PatternResult::new("j", 1));
    assert_eq!(
        Pattern::compile("%u", &registry).unwrap_err(),
        ConfigError::ReservedKey('J')
    );
}

#[test]
fn log_hook_writes_json_lines_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig::default()
        .with_stdout(false)
        .with_file(dir.path().to_string_lossy(), "storage.log")
        .with_out_pattern("%J{ufcke}");

    let manager = Manager::builder()
        .add_arg(keys::DB_NAME, "cache")
        .register_log_hook(&config, &standard_registry())
        .unwrap()
        .build();

    let ctx = Context::for_request("req-7", "/cart", "GET");
    let mut hook = manager.create_hook(ctx);
    hook.start().operation("get");
    hook.add_arg(keys::COMMAND_NAME, "GET").add_arg(keys::KEY, "cart:7");
    hook.process_pre_hook();
    let result: Result<(), &str> = Err("nil reply");
    hook.finish_with(&result).process_after_hook();
    manager.close().unwrap();

    let written = fs::read_to_string(dir.path().join("storage.log")).unwrap();
    let record: serde_json::Value = serde_json::from_str(written.trim_end()).unwrap();
    assert_eq!(
        record,
        serde_json::json!({
            "command_name": "GET",
            "error": "nil reply",
            "func_name": "get",
            "key": "cart:7",
            "uuid": "req-7",
        })
    );
}

#[test]
fn stdout_and_file_sinks_render_differently() {
    let (text_logger, text) = common::buffer_logger("%u %c");
    let (json_logger, json) = common::buffer_logger("%J{uc}");
    let args = common::cache_call("DEL");

    text_logger.print(&args).unwrap();
    json_logger.print(&args).unwrap();

    assert_eq!(text.contents(), "req-1 DEL\n");
    assert_eq!(json.contents(), "{\"command_name\":\"DEL\",\"uuid\":\"req-1\"}\n");
}

#[test]
fn rotation_keeps_whole_records() {
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig::default()
        .with_stdout(false)
        .with_file(dir.path().to_string_lossy(), "rot.log")
        .with_out_pattern("%c %k")
        .with_rotation(64, 3);

    let manager = Manager::builder()
        .register_log_hook(&config, &standard_registry())
        .unwrap()
        .build();
    for i in 0..20 {
        let mut hook = manager.create_hook(Context::background());
        hook.add_arg(keys::COMMAND_NAME, "SET")
            .add_arg(keys::KEY, format!("key:{i:02}"));
        hook.run(|_| ());
    }
    manager.close().unwrap();

    let mut files = vec![dir.path().join("rot.log")];
    files.extend((1..=3).map(|n| dir.path().join(format!("rot.log.{n}"))));
    for file in &files {
        let content = fs::read_to_string(file).unwrap();
        assert!(content.len() <= 64);
        assert!(content.lines().all(|l| l.starts_with("SET key:") && l.len() == 10));
    }
    assert!(!dir.path().join("rot.log.4").exists());
    assert!(fs::read_to_string(&files[0]).unwrap().ends_with("SET key:19\n"));
}

#[test]
fn config_loads_from_toml() {
    let config = RenderConfig::from_toml_str(
        r#"
        stdout = false
        out_dir = "/var/log/app"
        out_file = "redis.log"
        rotate_size = 1048576
        max_log_file = 3
        "#,
    )
    .unwrap();

    assert_eq!(config.file_path(), std::path::Path::new("/var/log/app/redis.log"));
    assert_eq!(config.rotate_size, 1_048_576);
    assert_eq!(config.max_log_file, 3);
    assert!(!config.async_flush);
}

proptest! {
    #[test]
    fn every_line_ends_in_one_newline(template in "[%a-zA-Z{}J:\\[\\] ]{0,40}") {
        let pattern = Pattern::compile(&template, &standard_registry()).unwrap();
        let line = pattern.render_string(&common::cache_call("GET"));
        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn skipped_function_renders_empty_line(key in "[a-zA-Z]") {
        let key = key.chars().next().unwrap();
        prop_assume!(key != 'J');
        let registry = PatternRegistry::new().with(key, |_: &Args| PatternResult::skip("s"));
        let pattern = Pattern::compile(&format!("%{key}"), &registry).unwrap();
        prop_assert_eq!(pattern.render_string(&Args::new()), "\n");
    }

    #[test]
    fn last_add_arg_wins(values in proptest::collection::vec(any::<i64>(), 1..8)) {
        let manager = Manager::builder().build();
        let mut hook = manager.create_hook(Context::background());
        for v in &values {
            hook.add_arg(keys::VALUE, *v);
        }
        let pattern = Pattern::compile("%v", &standard_registry()).unwrap();
        let expected = format!("{}\n", values[values.len() - 1]);
        prop_assert_eq!(pattern.render_string(hook.args()), expected);
    }
}
