use grmon_core::{parse_dump, parse_dump_str, Engine, EngineConfig, Frame, StatusLabels};
use std::io::BufReader;

const RUNTIME_DUMP: &str = "goroutine 4431 [running]:
runtime/pprof.writeGoroutineStacks(0xe491c0, 0xc0001380e0, 0x0, 0x0)
\t/usr/local/go/src/runtime/pprof/pprof.go:693 +0xb8
runtime/pprof.writeGoroutine(0xe491c0, 0xc0001380e0, 0x2, 0x0, 0x0)
\t/usr/local/go/src/runtime/pprof/pprof.go:682 +0x4b
net/http.(*conn).serve(0xc000fe5f40, 0xe54aa0, 0xc000fbab80)
\t/usr/local/go/src/net/http/server.go:1925 +0x1805

goroutine 1 [chan receive, 16 minutes]:
company/foo/bar/internal/svc.(*Service).Start(0xc0001adc70)
\t/home/user/dev/svc/internal/svc/svc.go:179 +0x3c5
main.main()
\t/home/user/dev/svc/cmd/svc/main.go:109 +0xcf0

goroutine 3 [select]:
company/foo/bar/internal/store.(*fileStore).createWatcher.func1(0xc0001b0320)
\t/home/user/dev/svc/internal/store/store.go:485 +0x1be
created by company/foo/bar/internal/store.(*fileStore).createWatcher
\t/home/user/dev/svc/internal/store/store.go:411 +0x159

goroutine 35 [IO wait]:
internal/poll.runtime_pollWait(0x7fd3bc60de38, 0x72, 0x0)
\t/usr/local/go/src/runtime/netpoll.go:220 +0x65
net/http.(*Server).Serve(0xc000138000, 0xe52ee0, 0xc0000c8660, 0x0, 0x0)
\t/usr/local/go/src/net/http/server.go:2937 +0x42e
company/foo/bar/cmd/svc/debug.Init.func1()
\t/home/user/dev/svc/cmd/svc/debug/debug.go:22 +0x5d
created by company/foo/bar/cmd/svc/debug.Init
\t/home/user/dev/svc/cmd/svc/debug/debug.go:21 +0x72";

const WINDOWS_DUMP: &str = "goroutine 268 [runnable, locked to thread]:
syscall.Syscall9(0x7ff9af9b0500, 0x7, 0x1f4, 0xc0000902d8, 0x1, ...)
\tC:/Program Files/Go/src/runtime/syscall_windows.go:356 +0xf2
syscall.WSARecv(0x1f4, 0xc0000902d8, 0x1, 0xc0000902c8, 0xc000090348)
\tC:/Program Files/Go/src/syscall/zsyscall_windows.go:1264 +0x12c
created by net/http.(*connReader).startBackgroundRead
\tC:/Program Files/Go/src/net/http/server.go:688 +0xdb
";

/// Re-derives file, line and offset from `file://<path>#<line>[ +0x<hex>]`.
fn reparse_rendered(frame: &Frame) -> (String, u32, Option<u64>) {
    let rendered = frame.to_string();
    let (_, location) = rendered.split_once("\n   file://").unwrap();
    let (path, rest) = location.rsplit_once('#').unwrap();
    let (line, offset) = match rest.split_once(" +0x") {
        Some((line, hex)) => (line, Some(u64::from_str_radix(hex, 16).unwrap())),
        None => (rest, None),
    };
    (path.to_string(), line.parse().unwrap(), offset)
}

#[test]
fn parses_typical_runtime_dump() {
    let report = parse_dump(BufReader::new(RUNTIME_DUMP.as_bytes())).unwrap();
    assert!(report.issues.is_empty(), "{:?}", report.issues);
    let tasks = report.tasks;
    assert_eq!(tasks.len(), 4);

    let ids: Vec<u64> = tasks.iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![4431, 1, 3, 35]);

    let running = &tasks[0];
    assert_eq!(running.status, "running");
    assert_eq!(running.wait_minutes, 0);
    assert_eq!(running.stack_frames.len(), 3);
    assert_eq!(
        running.stack_frames[0].function_signature,
        "runtime/pprof.writeGoroutineStacks(0xe491c0, 0xc0001380e0, 0x0, 0x0)"
    );
    assert!(running.created_by.is_none());

    let waiting = &tasks[1];
    assert_eq!(waiting.status, "chan receive");
    assert_eq!(waiting.wait_minutes, 16);
    assert!(waiting.created_by.is_none());
    assert!(!waiting.locked_to_os_thread);

    let select = &tasks[2];
    assert_eq!(select.status, "select");
    assert_eq!(select.stack_frames.len(), 1);

    let io = &tasks[3];
    assert_eq!(io.status, "IO wait");
    let created_by = io.created_by.as_ref().unwrap();
    assert_eq!(created_by.function_signature, "company/foo/bar/cmd/svc/debug.Init");
    assert_eq!(created_by.file_path, "/home/user/dev/svc/cmd/svc/debug/debug.go");
    assert_eq!(created_by.line, 21);
    assert_eq!(created_by.offset, Some(0x72));
    let last = io.stack_frames.last().unwrap();
    assert_eq!(last.function_signature, "company/foo/bar/cmd/svc/debug.Init.func1()");
    assert_eq!(last.offset, Some(0x5d));
}

#[test]
fn parses_locked_windows_goroutine() {
    let report = parse_dump_str(WINDOWS_DUMP);
    assert!(report.issues.is_empty());
    assert_eq!(report.tasks.len(), 1);
    let task = &report.tasks[0];
    assert_eq!(task.id, 268);
    assert_eq!(task.status, "runnable");
    assert_eq!(task.wait_minutes, 0);
    assert!(task.locked_to_os_thread);
    assert_eq!(
        task.stack_frames[1].file_path,
        "C:/Program Files/Go/src/syscall/zsyscall_windows.go"
    );
    assert_eq!(task.stack_frames[1].line, 1264);
    assert_eq!(task.created_by.as_ref().unwrap().offset, Some(0xdb));
}

#[test]
fn rendered_frames_round_trip() {
    let report = parse_dump_str(&format!("{RUNTIME_DUMP}\n\n{WINDOWS_DUMP}"));
    let frames = report
        .tasks
        .iter()
        .flat_map(|task| task.stack_frames.iter().chain(task.created_by.iter()));
    let mut checked = 0;
    for frame in frames {
        let (path, line, offset) = reparse_rendered(frame);
        assert_eq!(path, frame.file_path);
        assert_eq!(line, frame.line);
        assert_eq!(offset, frame.offset);
        checked += 1;
    }
    assert_eq!(checked, 14);
}

#[test]
fn malformed_blocks_do_not_affect_siblings() {
    let dump = format!(
        "\ngoroutine\n\nsome stray output\ngoroutine 0fd [running]:\n\n{RUNTIME_DUMP}\n"
    );
    let report = parse_dump_str(&dump);
    assert_eq!(report.tasks.len(), 4);
    assert_eq!(report.issues.len(), 2);
    assert_eq!(report.issues[0].line_number, 2);
    assert_eq!(report.issues[1].line_number, 5);
}

#[test]
fn entirely_malformed_dump_is_empty_snapshot() {
    let report = parse_dump_str("goroutine x [a]:\ngoroutine 1 running\nnot a dump\n");
    assert!(report.tasks.is_empty());
    assert_eq!(report.issues.len(), 2);
}

#[test]
fn engine_consumes_parsed_snapshots() {
    let mut engine = Engine::new(EngineConfig {
        history_capacity: 3,
        labels: StatusLabels::default(),
    });
    engine.apply_snapshot(parse_dump_str(RUNTIME_DUMP).tasks);
    engine.apply_snapshot(parse_dump_str(WINDOWS_DUMP).tasks);
    engine.apply_snapshot(parse_dump_str(RUNTIME_DUMP).tasks);

    assert_eq!(engine.history().samples().collect::<Vec<_>>(), vec![4, 1, 4]);
    let stats = engine.history().stats();
    assert_eq!((stats.min, stats.max), (1, 4));
    assert_eq!(stats.avg, 3.25);

    assert_eq!(
        engine.histogram().legend(),
        "IO: IO wait (1)\ncha: chan receive (1)\nrun: running (1)\nsel: select (1)"
    );

    engine.set_filter("NETPOLL");
    let ids: Vec<u64> = engine.filtered().map(|task| task.id).collect();
    assert_eq!(ids, vec![35]);
    engine.set_filter("store.go#411");
    let ids: Vec<u64> = engine.filtered().map(|task| task.id).collect();
    assert_eq!(ids, vec![3]);
}
