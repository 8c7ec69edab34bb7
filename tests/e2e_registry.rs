// LogWire - tests/e2e_registry.rs
//
// End-to-end tests for the handler registry, remote configuration and the
// logger front end.
//
// These tests exercise real file streams in temporary directories, real
// config.toml parsing and real threads -- no mocks for the transports. They
// drive the public library API the same way the CLI does.

use logwire::app::logger::Logger;
use logwire::app::manager::LogManager;
use logwire::app::remote::process_config_request;
use logwire::app::setup::apply_config;
use logwire::core::handler::{LogHandler, LogSink};
use logwire::core::model::{CategoryOverride, Level, LogAttributes};
use logwire::core::protocol::DataFormat;
use logwire::platform::config::load_config;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

// =============================================================================
// Helpers
// =============================================================================

/// Send one request and return the decoded reply.
fn request(manager: &LogManager, req: &str) -> Value {
    let mut reply = vec![0u8; 1024];
    let outcome = process_config_request(manager, req.as_bytes(), &mut reply, DataFormat::Json)
        .expect("reply fits");
    let value: Value = serde_json::from_slice(&reply[..outcome.len]).expect("reply is JSON");
    assert_eq!(value["ok"], outcome.ok);
    value
}

fn add_file_handler(id: &str, handler_type: &str, path: &Path, level: &str, filters: &str) -> String {
    format!(
        r#"{{"v":1,"cmd":"add_handler","id":"{id}","handler":{{"type":"{handler_type}"}},
            "stream":{{"type":"file","params":{{"path":{path},"append":false}}}},
            "level":"{level}","filters":{filters}}}"#,
        path = serde_json::to_string(path).unwrap(),
    )
}

#[derive(Default)]
struct Counter {
    hits: AtomicUsize,
}

impl LogSink for Counter {
    fn log_message(&self, _: &str, _: Level, _: Option<&str>, _: &LogAttributes) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

struct Forward(Arc<Counter>);

impl LogSink for Forward {
    fn log_message(&self, m: &str, l: Level, c: Option<&str>, a: &LogAttributes) {
        self.0.log_message(m, l, c, a);
    }
}

// =============================================================================
// Remote configuration E2E
// =============================================================================

/// A handler added over the wire writes filtered text lines to its file and
/// stops writing once removed.
#[test]
fn e2e_remote_file_handler_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.log");
    let manager = LogManager::with_default_factories();

    let add = add_file_handler(
        "file",
        "stream",
        &path,
        "info",
        r#"[{"category":"app.net","level":"trace"},{"category":"app.db","level":"error"}]"#,
    );
    assert_eq!(request(&manager, &add)["ok"], true);

    let net = Logger::with_manager("app.net.tcp", &manager);
    let db = Logger::with_manager("app.db", &manager);
    let ui = Logger::with_manager("ui", &manager);

    net.trace(format_args!("syn sent"));
    db.warn(format_args!("slow query"));
    db.code(5).error(format_args!("deadlock"));
    ui.debug(format_args!("redraw"));
    ui.info(format_args!("ready"));

    assert_eq!(request(&manager, r#"{"v":1,"cmd":"remove_handler","id":"file"}"#)["ok"], true);
    ui.error(format_args!("after removal"));

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{text}");
    assert!(lines[0].ends_with("[app.net.tcp] TRACE: syn sent"));
    assert!(lines[1].ends_with("[app.db] ERROR: deadlock [code = 5]"));
    assert!(lines[2].ends_with("[ui] INFO: ready"));
    assert!(!text.contains("after removal"));
}

/// JSON handler output is one parseable object per line.
#[test]
fn e2e_remote_json_handler() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.jsonl");
    let manager = LogManager::with_default_factories();

    let add = add_file_handler("j", "json", &path, "warn", "[]");
    assert_eq!(request(&manager, &add)["ok"], true);

    let log = Logger::with_manager("sensor", &manager);
    log.info(format_args!("ignored"));
    log.details("over range").warn(format_args!("temp {}", 91));
    manager.remove_named_handler("j");

    let text = fs::read_to_string(&path).unwrap();
    let records: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "warn");
    assert_eq!(records[0]["message"], "temp 91");
    assert_eq!(records[0]["category"], "sensor");
    assert_eq!(records[0]["details"], "over range");
}

/// Enumeration lists each id once; a second add with the same id fails and
/// the first handler keeps working.
#[test]
fn e2e_enumerate_and_duplicate_ids() {
    let dir = tempfile::tempdir().unwrap();
    let manager = LogManager::with_default_factories();

    assert_eq!(request(&manager, r#"{"cmd":"enum_handlers"}"#)["ids"], serde_json::json!([]));

    let a = add_file_handler("a", "stream", &dir.path().join("a.log"), "info", "[]");
    let b = add_file_handler("b", "stream", &dir.path().join("b.log"), "info", "[]");
    let a_again = add_file_handler("a", "json", &dir.path().join("a2.log"), "trace", "[]");
    assert_eq!(request(&manager, &a)["ok"], true);
    assert_eq!(request(&manager, &b)["ok"], true);

    let dup = request(&manager, &a_again);
    assert_eq!(dup["ok"], false);
    assert!(!dir.path().join("a2.log").exists(), "stream must not outlive a rejected add");

    let ids = request(&manager, r#"{"cmd":"enum_handlers"}"#);
    assert_eq!(ids["ids"], serde_json::json!(["a", "b"]));

    Logger::with_manager("x", &manager).info(format_args!("still text"));
    manager.remove_named_handler("a");
    manager.remove_named_handler("b");
    let a_text = fs::read_to_string(dir.path().join("a.log")).unwrap();
    assert!(a_text.ends_with("[x] INFO: still text\r\n"));
}

/// Replies never exceed the buffer; a long id list is cut and flagged.
#[test]
fn e2e_enumeration_truncates_to_reply_capacity() {
    let manager = LogManager::with_default_factories();
    manager.set_max_active_handlers(64);
    for i in 0..20 {
        let req = format!(
            r#"{{"cmd":"add_handler","id":"handler-number-{i}","handler":{{"type":"stream"}},"stream":{{"type":"stderr"}},"level":"none"}}"#
        );
        assert_eq!(request(&manager, &req)["ok"], true);
    }

    let mut reply = vec![0u8; 128];
    let outcome = process_config_request(
        &manager,
        br#"{"cmd":"enum_handlers"}"#,
        &mut reply,
        DataFormat::Json,
    )
    .unwrap();
    assert!(outcome.ok);
    assert!(outcome.len <= 128);
    let value: Value = serde_json::from_slice(&reply[..outcome.len]).unwrap();
    assert_eq!(value["truncated"], true);
    assert!(value["ids"].as_array().unwrap().len() < 20);
}

// =============================================================================
// Config E2E
// =============================================================================

/// Handlers declared in config.toml are installed at startup and can be
/// removed remotely like any other named handler.
#[test]
fn e2e_config_installs_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("boot.log");
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[registry]
max_active_handlers = 3

[[handlers]]
id = "boot"
type = "stream"
stream = "file"
level = "debug"
stream_params = {{ path = {path}, append = false }}
filters = [{{ category = "noisy", level = "error" }}]
"#,
            path = toml_string(&log_path),
        ),
    )
    .unwrap();

    let (config, warnings) = load_config(&config_path);
    assert!(warnings.is_empty(), "{warnings:?}");

    let manager = LogManager::with_default_factories();
    assert!(apply_config(&manager, &config).is_empty());
    assert_eq!(manager.named_handler_ids(), vec!["boot"]);

    let log = Logger::with_manager("noisy.loop", &manager);
    log.warn(format_args!("dropped"));
    log.error(format_args!("kept"));
    Logger::with_manager("main", &manager).debug(format_args!("boot ok"));

    assert_eq!(request(&manager, r#"{"cmd":"remove_handler","id":"boot"}"#)["ok"], true);
    let text = fs::read_to_string(&log_path).unwrap();
    assert_eq!(text.lines().count(), 2, "{text}");
    assert!(!text.contains("dropped"));
}

/// TOML basic string with backslashes and quotes escaped.
fn toml_string(path: &Path) -> String {
    let raw = path.display().to_string();
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

// =============================================================================
// Concurrency E2E
// =============================================================================

/// Many threads adding, removing and dispatching at once: no panic, no lost
/// delivery to a handler registered for the whole run, and no delivery from
/// a dispatch that began after the handler's removal returned.
///
/// Each churn handler accepts only its own thread's category, so the only
/// dispatches that can reach it are the ones its thread makes in sequence.
/// A dispatch already in flight on another thread when a handler is removed
/// may still deliver to it; that window is not checked here.
#[test]
fn e2e_concurrent_registry_and_dispatch() {
    const THREADS: usize = 4;
    const ROUNDS: usize = 200;

    let manager = Arc::new(LogManager::new());
    manager.set_max_active_handlers(64);

    let steady_count = Arc::new(Counter::default());
    let steady = Arc::new(LogHandler::new(Forward(Arc::clone(&steady_count)), Level::Trace));
    manager.add_handler(&steady).unwrap();

    let barrier = Arc::new(Barrier::new(THREADS * 2));
    let violation = Arc::new(AtomicBool::new(false));
    let mut workers = Vec::new();

    for t in 0..THREADS {
        // Churn: add a handler, dispatch, remove it, dispatch again.
        let churn_manager = Arc::clone(&manager);
        let churn_barrier = Arc::clone(&barrier);
        let churn_violation = Arc::clone(&violation);
        workers.push(thread::spawn(move || {
            let category = format!("churn.{t}");
            churn_barrier.wait();
            for _ in 0..ROUNDS {
                let count = Arc::new(Counter::default());
                let handler = Arc::new(LogHandler::with_filters(
                    Forward(Arc::clone(&count)),
                    Level::None,
                    &[CategoryOverride::new(category.as_str(), Level::Trace)],
                ));
                churn_manager.add_handler(&handler).unwrap();
                churn_manager.dispatch("m", Level::Info, Some(&category), &LogAttributes::default());
                if count.hits.load(Ordering::SeqCst) != 1 {
                    churn_violation.store(true, Ordering::SeqCst);
                }
                churn_manager.remove_handler(&handler);
                churn_manager.dispatch("m", Level::Info, Some(&category), &LogAttributes::default());
                if count.hits.load(Ordering::SeqCst) != 1 {
                    churn_violation.store(true, Ordering::SeqCst);
                }
            }
        }));

        // Dispatch only, in a category no churn handler accepts.
        let dispatch_manager = Arc::clone(&manager);
        let dispatch_barrier = Arc::clone(&barrier);
        workers.push(thread::spawn(move || {
            dispatch_barrier.wait();
            for _ in 0..ROUNDS {
                dispatch_manager.dispatch("d", Level::Debug, Some("dispatch"), &LogAttributes::default());
            }
        }));
    }

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    assert!(!violation.load(Ordering::SeqCst));
    // Each churn round dispatches twice; each dispatch-only round once.
    assert_eq!(
        steady_count.hits.load(Ordering::SeqCst),
        THREADS * ROUNDS * 3
    );
    assert_eq!(manager.active_handler_count(), 1);
}

/// Named handlers added and removed from several threads leave the registry
/// empty and release every stream.
#[test]
fn e2e_concurrent_named_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let manager = Arc::new(LogManager::with_default_factories());
    manager.set_max_active_handlers(64);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let manager = Arc::clone(&manager);
            let base = dir.path().to_path_buf();
            thread::spawn(move || {
                for i in 0..25 {
                    let id = format!("t{t}-{i}");
                    let req = add_file_handler(&id, "stream", &base.join(format!("{id}.log")), "info", "[]");
                    assert_eq!(request(&manager, &req)["ok"], true);
                    Logger::with_manager(id.as_str(), &manager).info(format_args!("hello"));
                    manager.remove_named_handler(&id);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker panicked");
    }

    assert!(manager.named_handler_ids().is_empty());
    assert_eq!(manager.active_handler_count(), 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 100);
}

/// The category gate holds through the whole stack.
#[test]
fn e2e_threshold_and_is_enabled() {
    let manager = LogManager::new();
    let counter = Arc::new(Counter::default());
    let handler = Arc::new(LogHandler::with_filters(
        Forward(Arc::clone(&counter)),
        Level::Info,
        &[
            CategoryOverride::new("a", Level::Warn),
            CategoryOverride::new("a.b", Level::Trace),
            CategoryOverride::new("net", Level::Error),
        ],
    ));
    manager.add_handler(&handler).unwrap();

    assert_eq!(manager.threshold(Some("a.b.c")), Level::Trace);
    assert_eq!(manager.threshold(Some("a.x")), Level::Warn);
    assert_eq!(manager.threshold(Some("x")), Level::Info);
    assert_eq!(manager.threshold(Some("network")), Level::Info);

    let net = Logger::with_manager("net", &manager);
    net.debug(format_args!("no"));
    net.error(format_args!("yes"));
    assert_eq!(counter.hits.load(Ordering::SeqCst), 1);
}
