//! Integration tests for the kura REPL.
//!
//! These tests run scripts through the REPL and verify behavior.

use kura_repl::Repl;
use kura_repl::config::KuraConfig;

/// Run multiple lines through a REPL and collect outputs.
async fn run_script(repl: &mut Repl, script: &str) -> Vec<String> {
    let mut outputs = Vec::new();
    for line in script.lines() {
        match repl.process_line(line).await {
            Ok(Some(output)) => outputs.push(output),
            Ok(None) => {}
            Err(e) => outputs.push(format!("ERROR: {e}")),
        }
    }
    outputs
}

fn outputs_contain(outputs: &[String], expected: &[&str]) -> bool {
    let joined = outputs.join("\n");
    expected.iter().all(|e| joined.contains(e))
}

// ============================================================================
// Files
// ============================================================================

#[tokio::test]
async fn write_and_cat() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(
        &mut repl,
        r#"
        write /notes/today.md "first line\nsecond line"
        cat /notes/today.md
        "#,
    )
    .await;
    assert_eq!(outputs[0], "wrote /notes/today.md (v1)");
    assert_eq!(outputs[1], "first line\nsecond line");
}

#[tokio::test]
async fn unquoted_text_is_joined() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(&mut repl, "create /f.txt hello there world\ncat /f.txt").await;
    assert_eq!(outputs, vec!["created /f.txt", "hello there world"]);
}

#[tokio::test]
async fn edits_report_snippets() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(
        &mut repl,
        r##"
        write /cfg "a = 1\nb = 2"
        replace /cfg "b = 2" "b = 3"
        insert /cfg 0 "# header"
        cat /cfg
        "##,
    )
    .await;
    assert!(outputs[1].starts_with("replaced at line 2 (v2)"), "{}", outputs[1]);
    assert!(outputs[2].starts_with("inserted (v3)"), "{}", outputs[2]);
    assert_eq!(outputs[3], "# header\na = 1\nb = 3");
}

#[tokio::test]
async fn errors_carry_codes() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(
        &mut repl,
        r#"
        cat /missing
        write /dup "x\nx"
        replace /dup x y
        insert /dup 9 nope
        "#,
    )
    .await;
    assert!(outputs[0].starts_with("ERROR: PATH_NOT_FOUND"), "{}", outputs[0]);
    assert!(outputs[2].starts_with("ERROR: STRING_NOT_UNIQUE"), "{}", outputs[2]);
    assert!(outputs[3].starts_with("ERROR: INVALID_LINE"), "{}", outputs[3]);
}

// ============================================================================
// Directories and lifecycle
// ============================================================================

#[tokio::test]
async fn ls_hides_deleted_unless_asked() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(
        &mut repl,
        r#"
        mkdir /docs
        write /docs/a.md aaa
        write /docs/b.md bb
        rm /docs/b.md
        ls /docs
        ls -a /docs
        "#,
    )
    .await;
    let visible = &outputs[outputs.len() - 2];
    let all = &outputs[outputs.len() - 1];
    assert!(visible.contains("a.md") && !visible.contains("b.md"), "{visible}");
    assert!(all.contains("b.md  (deleted)"), "{all}");
}

#[tokio::test]
async fn restore_and_purge() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(
        &mut repl,
        r#"
        write /d/f.txt keep
        rmdir -r /d
        restore /d/f.txt
        cat /d/f.txt
        rm /d/f.txt
        purge /d/f.txt
        ls -a /d
        "#,
    )
    .await;
    assert!(outputs_contain(&outputs, &["keep", "purged /d/f.txt"]));
    assert!(!outputs.iter().any(|o| o.starts_with("ERROR")), "{outputs:?}");
}

#[tokio::test]
async fn history_commands() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(
        &mut repl,
        r#"
        write /log one
        write /log two
        write /log three
        versions /log
        show /log 1
        show /log v2
        "#,
    )
    .await;
    let listing = &outputs[3];
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("v3"));
    assert!(lines[2].starts_with("v1"));
    assert_eq!(outputs[4], "one");
    assert_eq!(outputs[5], "two");
}

#[tokio::test]
async fn history_is_kept_until_pruned() {
    let mut repl = Repl::in_memory();
    let writes: String = (0..14).map(|i| format!("write /log entry{i}\n")).collect();
    run_script(&mut repl, &writes).await;

    let outputs = run_script(&mut repl, "versions /log\nshow /log 1").await;
    assert_eq!(outputs[0].lines().count(), 14);
    assert_eq!(outputs[1], "entry0");

    let outputs = run_script(&mut repl, "prune /log\nversions /log\nshow /log 1").await;
    assert_eq!(outputs[0].lines().count(), 11);
    assert!(outputs[1].starts_with("ERROR: PATH_NOT_FOUND"), "{}", outputs[1]);
}

#[tokio::test]
async fn orphans_can_be_adopted() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(
        &mut repl,
        r#"
        write /a.txt original
        rm /a.txt
        write /b.txt replacement
        mv /b.txt /a.txt
        orphans
        "#,
    )
    .await;
    let listing = outputs.last().cloned().unwrap_or_default();
    assert!(listing.ends_with("/a.txt"), "{listing}");
    let file_id = listing.split_whitespace().next().unwrap_or_default().to_string();

    let outputs = run_script(
        &mut repl,
        &format!("adopt {file_id} /recovered.txt\ncat /recovered.txt\norphans"),
    )
    .await;
    assert_eq!(outputs[1], "original");
    assert_eq!(outputs[2], "(no orphans)");
}

// ============================================================================
// Meta-commands
// ============================================================================

#[tokio::test]
async fn namespace_and_project_switching() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(
        &mut repl,
        r#"
        /ns /team
        write /notes.md mine
        write /share/x.md nope
        /ns -
        cat /team/notes.md
        /project other
        ls /
        /project
        "#,
    )
    .await;
    assert_eq!(outputs[0], "namespace: /team");
    assert!(outputs[2].starts_with("ERROR: READONLY"), "{}", outputs[2]);
    assert!(outputs.contains(&"mine".to_string()));
    assert_eq!(outputs.last().map(String::as_str), Some("other"));
}

#[tokio::test]
async fn quit_and_unknown_commands() {
    let mut repl = Repl::in_memory();
    let outputs = run_script(&mut repl, "frobnicate\n/bogus\n/help").await;
    assert!(outputs[0].starts_with("Unknown command: frobnicate"));
    assert!(outputs[1].starts_with("Unknown command: /bogus"));
    assert!(outputs[2].contains("versions <path>"));

    assert!(!repl.should_quit());
    run_script(&mut repl, "/quit").await;
    assert!(repl.should_quit());
}

#[tokio::test]
async fn directory_store_persists_between_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let config = KuraConfig {
        data_dir: Some(dir.path().to_path_buf()),
        project: "persist".to_string(),
        ..KuraConfig::default()
    };

    let mut first = Repl::open(&config);
    run_script(&mut first, "write /kept.md still here").await;
    drop(first);

    let mut second = Repl::open(&config);
    let outputs = run_script(&mut second, "cat /kept.md").await;
    assert_eq!(outputs, vec!["still here"]);
}
