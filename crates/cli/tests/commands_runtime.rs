use std::env;
use std::sync::{Mutex, OnceLock};

use intake_cli::commands::{migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(
        &[
            ("INTAKE_CHAT_APP_TOKEN", "xapp-test"),
            ("INTAKE_CHAT_BOT_TOKEN", "xoxb-test"),
            ("INTAKE_DATABASE_URL", "sqlite::memory:"),
        ],
        || {
            let result = migrate::run();
            assert_eq!(result.exit_code, 0, "expected successful migrate run");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "migrate");
            assert_eq!(payload["status"], "ok");
        },
    );
}

#[test]
fn migrate_returns_config_failure_without_tokens() {
    with_env(&[], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_loads_the_demo_campaign() {
    with_env(
        &[
            ("INTAKE_CHAT_APP_TOKEN", "xapp-test"),
            ("INTAKE_CHAT_BOT_TOKEN", "xoxb-test"),
            ("INTAKE_DATABASE_URL", "sqlite::memory:"),
        ],
        || {
            let result = seed::run();
            assert_eq!(result.exit_code, 0, "expected deterministic seed success");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "seed");
            assert_eq!(payload["status"], "ok");

            let message = payload["message"].as_str().unwrap_or("");
            assert!(message.contains("demo-onboarding"));
        },
    );
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(
        &[
            ("INTAKE_CHAT_APP_TOKEN", "xapp-test"),
            ("INTAKE_CHAT_BOT_TOKEN", "xoxb-test"),
            ("INTAKE_DATABASE_URL", "sqlite::memory:"),
        ],
        || {
            let first = seed::run();
            assert_eq!(first.exit_code, 0, "expected first seed invocation success");

            let second = seed::run();
            assert_eq!(second.exit_code, 0, "expected second seed invocation success");

            assert_eq!(
                parse_payload(&first.output)["message"],
                parse_payload(&second.output)["message"]
            );
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "INTAKE_DATABASE_URL",
        "INTAKE_DATABASE_MAX_CONNECTIONS",
        "INTAKE_DATABASE_TIMEOUT_SECS",
        "INTAKE_CHAT_APP_TOKEN",
        "INTAKE_CHAT_BOT_TOKEN",
        "INTAKE_ENGINE_FIELDS_PER_MODAL",
        "INTAKE_ENGINE_SESSION_TTL_MINUTES",
        "INTAKE_REFERRAL_ENABLED",
        "INTAKE_REFERRAL_CALLBACK_BASE_URL",
        "INTAKE_REFERRAL_WEBHOOK_SECRET",
        "INTAKE_SERVER_BIND_ADDRESS",
        "INTAKE_SERVER_HEALTH_CHECK_PORT",
        "INTAKE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "INTAKE_LOGGING_LEVEL",
        "INTAKE_LOGGING_FORMAT",
        "INTAKE_LOG_LEVEL",
        "INTAKE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
