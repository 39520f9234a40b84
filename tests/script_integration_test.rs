use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use versioned_map::{
    Command, CommandOutput, ConcurrentVersionedMap, ScriptRunner, VersionedMap,
    VersionedMapError,
};

const INVENTORY_SCRIPT: &str = r#"
# stock levels over a day
put apples 10
put pears 4
put apples 7
get apples@1
get apples
delete pears
get pears
get pears@2
snapshot @3
keys
version
history apples
"#;

fn runner() -> ScriptRunner {
    ScriptRunner::new(Arc::new(ConcurrentVersionedMap::new()), true)
}

#[test]
fn test_script_file_end_to_end() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(INVENTORY_SCRIPT.as_bytes()).unwrap();

    let runner = runner();
    let entries = runner.run_file(file.path()).unwrap();
    let rendered: Vec<String> = entries.iter().map(|e| e.output.to_string()).collect();

    assert_eq!(rendered[0], "1");
    assert_eq!(rendered[1], "2");
    assert_eq!(rendered[2], "3");
    assert_eq!(rendered[3], "10");
    assert_eq!(rendered[4], "7");
    assert_eq!(rendered[5], "4");
    assert_eq!(rendered[6], "(none)");
    assert_eq!(rendered[7], "4");
    assert_eq!(rendered[8], "@3\napples=7\npears=4");
    assert_eq!(rendered[9], "apples");
    assert_eq!(rendered[10], "4");
    assert_eq!(rendered[11].lines().count(), 2);

    assert_eq!(runner.map().current_version(), 4);
    assert_eq!(entries[0].line, 3);
    assert_eq!(
        entries[0].command,
        Command::Put {
            key: "apples".to_string(),
            value: "10".to_string(),
        }
    );
}

#[test]
fn test_outputs_render_as_json_lines() {
    let runner = runner();
    let entries = runner
        .run("put a x\ndelete a\nget a@1\nsnapshot\nclear\nversion")
        .unwrap();

    let lines: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| serde_json::to_value(&e.output).unwrap())
        .collect();

    assert_eq!(lines[0], serde_json::json!({"kind": "version", "version": 1}));
    assert_eq!(lines[1], serde_json::json!({"kind": "version", "version": 2}));
    assert_eq!(lines[2]["value"], "x");
    assert_eq!(lines[3]["snapshot"]["version"], 2);
    assert_eq!(lines[3]["snapshot"]["entries"], serde_json::json!({}));
    assert_eq!(lines[4], serde_json::json!({"kind": "cleared"}));
    assert_eq!(lines[5], serde_json::json!({"kind": "version", "version": 0}));
}

#[test]
fn test_history_survives_until_clear() {
    let runner = runner();
    let entries = runner
        .run("put k 1\nput k 2\ndelete k\nhistory k\nclear\nhistory k")
        .unwrap();

    match &entries[3].output {
        CommandOutput::History { key, elements } => {
            assert_eq!(key, "k");
            let versions: Vec<u64> = elements.iter().map(|e| e.version).collect();
            assert_eq!(versions, vec![1, 2, 3]);
            assert!(elements[2].is_tombstone());
        }
        other => panic!("unexpected output: {:?}", other),
    }
    assert_eq!(entries[5].output.to_string(), "k: (no history)");
}

#[test]
fn test_bad_script_reports_first_error_line() {
    let runner = runner();
    let err = runner
        .run("put a 1\nget a@\nput b\nversion")
        .unwrap_err();

    match err {
        VersionedMapError::ParseError { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(runner.map().current_version(), 0);
}
