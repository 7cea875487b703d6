mod support;

use predicates::str::contains;
use serde_json::Value;

use support::{TestEnv, DEMO_EMAIL, DEMO_PASSWORD};

#[test]
fn register_login_whoami_logout() {
    let env = TestEnv::with_demo(false);

    let registered = env.json(&[
        "register",
        "ada@example.com",
        "--name",
        "Ada",
        "--password",
        "s3cret",
    ]);
    assert_eq!(registered["data"]["email"], "ada@example.com");
    assert!(registered["data"]["id"]
        .as_str()
        .is_some_and(|id| id.starts_with("user_")));

    let whoami = env.json(&["whoami"]);
    assert_eq!(whoami["data"]["authenticated"], false);

    let login = env.json(&["login", "ada@example.com", "--password", "s3cret"]);
    assert_eq!(login["data"]["user"]["name"], "Ada");

    let whoami = env.json(&["whoami"]);
    assert_eq!(whoami["data"]["authenticated"], true);
    assert_eq!(whoami["data"]["user"]["email"], "ada@example.com");

    env.tb()
        .arg("logout")
        .assert()
        .success()
        .stdout(contains("logged out ada@example.com"));
    env.tb()
        .arg("logout")
        .assert()
        .success()
        .stdout(contains("no active session"));

    let whoami = env.json(&["whoami"]);
    assert_eq!(whoami["data"]["authenticated"], false);
}

#[test]
fn credentials_are_not_stored_in_cleartext() {
    let env = TestEnv::with_demo(false);
    env.register_and_login("ada@example.com", "Ada", "s3cret");

    let raw = std::fs::read_to_string(env.blob_path("credentials")).expect("credentials");
    assert!(!raw.contains("s3cret"));
    assert!(raw.contains("$argon2id$"));
}

#[test]
fn duplicate_email_is_rejected() {
    let env = TestEnv::with_demo(false);
    env.tb()
        .args(["register", "a@x.com", "--name", "A", "--password", "pw"])
        .assert()
        .success();

    let output = env
        .tb()
        .args(["--json", "register", "a@x.com", "--name", "B", "--password", "pw"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("error json");
    assert_eq!(value["status"], "error");
    assert_eq!(value["command"], "register");
    assert_eq!(value["error"]["kind"], "duplicate_email");
    assert_eq!(value["error"]["code"], 2);

    let users = env.read_blob("users");
    assert_eq!(users.as_array().map(Vec::len), Some(1));
}

#[test]
fn email_case_is_significant() {
    let env = TestEnv::with_demo(false);
    env.tb()
        .args(["register", "a@x.com", "--name", "A", "--password", "pw"])
        .assert()
        .success();
    env.tb()
        .args(["register", "A@x.com", "--name", "B", "--password", "pw"])
        .assert()
        .success();
}

#[test]
fn wrong_password_and_unknown_user() {
    let env = TestEnv::new();

    env.tb()
        .args(["login", DEMO_EMAIL, "--password", "nope"])
        .assert()
        .code(3)
        .stderr(contains("Invalid credential"));

    env.tb()
        .args(["login", "ghost@x.com", "--password", "pw"])
        .assert()
        .code(2)
        .stderr(contains("User not found"))
        .stderr(contains("hint: tb register"));

    let whoami = env.json(&["whoami"]);
    assert_eq!(whoami["data"]["authenticated"], false);
}

#[test]
fn password_can_come_from_env() {
    let env = TestEnv::new();
    env.tb()
        .env("TB_PASSWORD", DEMO_PASSWORD)
        .args(["login", DEMO_EMAIL])
        .assert()
        .success()
        .stdout(contains("welcome, Demo User"));
}

#[test]
fn register_validates_input() {
    let env = TestEnv::with_demo(false);
    env.tb()
        .args(["register", "not-an-email", "--name", "A", "--password", "pw"])
        .assert()
        .code(2);
    env.tb()
        .args(["register", "a@x.com", "--name", "   ", "--password", "pw"])
        .assert()
        .code(2)
        .stderr(contains("name must not be blank"));
    assert!(!env.blob_path("users").exists());
}

#[test]
fn profile_rename_requires_session_and_persists() {
    let env = TestEnv::new();

    env.tb()
        .args(["profile", "rename", "Someone"])
        .assert()
        .code(3)
        .stderr(contains("hint: tb login <email>"));

    env.login_demo();
    let renamed = env.json(&["profile", "rename", "  Demo Renamed "]);
    assert_eq!(renamed["command"], "profile rename");
    assert_eq!(renamed["data"]["name"], "Demo Renamed");

    let whoami = env.json(&["whoami"]);
    assert_eq!(whoami["data"]["user"]["name"], "Demo Renamed");
}
