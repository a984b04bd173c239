use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("zen-{nanos}-{name}"))
}

fn zen(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_zen"))
        .args(args)
        .env("ZEN_DATA_DIR", dir)
        .env("ZEN_CONFIG_PATH", dir.join("missing-config.json"))
        .env_remove("ZEN_API_KEY")
        .env_remove("API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run zen")
}

fn logged_in(name: &str) -> PathBuf {
    let dir = temp_dir(name);
    let output = zen(&dir, &["login", "--name", "Jane", "--email", "jane@example.com"]);
    assert!(output.status.success());
    dir
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn say_add_appends_medium_task() {
    let dir = logged_in("say-add");
    let said = zen(&dir, &["say", "Add", "buy", "eggs", "to", "my", "list"]);
    let listed = zen(&dir, &["list", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(said.status.success());
    assert!(stdout(&said).contains("✅ Added: buy eggs"));
    let tasks: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["title"], "buy eggs");
    assert_eq!(tasks[0]["priority"], "medium");
    assert_eq!(tasks[0]["completed"], false);
}

#[test]
fn say_delete_unknown_task_asks_for_clarification() {
    let dir = logged_in("say-delete");
    zen(&dir, &["add", "buy eggs"]);
    let english = zen(&dir, &["say", "delete foo"]);
    let urdu = zen(&dir, &["say", "--lang", "ur", "delete foo"]);
    let listed = zen(&dir, &["list", "--json"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(stdout(&english).contains("Which task should I delete?"));
    assert!(stdout(&urdu).contains("مجھے کون سا ٹاسک ختم کرنا چاہئے؟"));
    let tasks: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(tasks.as_array().unwrap().len(), 1);
}

#[test]
fn say_complete_then_summarise() {
    let dir = logged_in("say-complete");
    zen(&dir, &["say", "add buy eggs"]);
    let done = zen(&dir, &["say", "mark buy eggs as done"]);
    let question = zen(&dir, &["say", "how many tasks do I have?"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(stdout(&done).contains("✔️ Task updated."));
    assert!(stdout(&question).contains("You have 1 task, 0 still open."));
}

#[test]
fn say_json_wraps_reply_and_filtered_tasks() {
    let dir = logged_in("say-json");
    zen(&dir, &["add", "Buy Eggs"]);
    zen(&dir, &["add", "walk dog"]);
    let output = zen(&dir, &["say", "--json", "search", "for", "eggs"]);
    let added = zen(&dir, &["say", "--json", "add", "call", "mom"]);
    std::fs::remove_dir_all(&dir).ok();

    let reply: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reply["reply"], "🔍 Filtering for: eggs");
    let tasks = reply["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Buy Eggs");

    let added: serde_json::Value = serde_json::from_slice(&added.stdout).unwrap();
    assert!(added.get("tasks").is_none());
}

#[test]
fn say_search_lists_matching_tasks() {
    let dir = logged_in("say-search");
    zen(&dir, &["add", "Buy Eggs"]);
    zen(&dir, &["add", "walk dog"]);
    let found = zen(&dir, &["say", "search", "eggs"]);
    let missing = zen(&dir, &["say", "search", "piano"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(found.status.success());
    let found = stdout(&found);
    assert!(found.contains("🔍 Filtering for: eggs"));
    assert!(found.contains("Buy Eggs"));
    assert!(!found.contains("walk dog"));
    assert!(stdout(&missing).contains("No matches found."));
}

#[test]
fn say_requires_login() {
    let dir = temp_dir("say-anon");
    let output = zen(&dir, &["say", "add milk"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not logged in"));
}

#[test]
fn ask_without_model_falls_back() {
    let dir = temp_dir("ask");
    let english = zen(&dir, &["ask", "what", "is", "zen?"]);
    let urdu = zen(&dir, &["ask", "--lang", "ur", "hello"]);

    assert!(english.status.success());
    assert!(stdout(&english).contains("Sorry, I'm having trouble connecting right now."));
    assert!(stdout(&urdu).contains("معذرت"));
}
