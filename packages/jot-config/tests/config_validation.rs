use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use jot_config::Config;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with(edit: impl FnOnce(&mut toml::Table)) -> String {
	let mut value: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	edit(root);

	toml::to_string(&value).expect("Failed to render sample config.")
}

fn section<'a>(root: &'a mut toml::Table, path: &[&str]) -> &'a mut toml::Table {
	let mut table = root;

	for key in path {
		table = table
			.get_mut(*key)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{key}]."));
	}

	table
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("jot_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> jot_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = jot_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_error(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Sample config must load.");

	assert_eq!(cfg.service.http_bind, "127.0.0.1:5001");
	assert_eq!(cfg.storage.pool_max_conns, 3);
	assert_eq!(cfg.providers.llm.api_key, "test-key");
	assert_eq!(cfg.translation.max_attempts, 3);
	assert_eq!(cfg.translation.initial_backoff_ms, 1_000);
}

#[test]
fn translation_section_defaults_when_missing() {
	let payload = sample_with(|root| {
		root.remove("translation");
	});
	let cfg = load_payload(payload).expect("Config without [translation] must load.");

	assert_eq!(cfg.translation.max_attempts, 3);
	assert_eq!(cfg.translation.initial_backoff_ms, 1_000);
	assert_eq!(cfg.translation.error_pause_ms, 1_000);
	assert_eq!(cfg.translation.default_target_language, "en");
}

#[test]
fn blank_api_key_is_allowed() {
	let payload = sample_with(|root| {
		section(root, &["providers", "llm"])
			.insert("api_key".to_string(), Value::String("  ".to_string()));
	});
	let cfg = load_payload(payload).expect("Blank api_key must not fail validation.");

	assert!(cfg.providers.llm.api_key.is_empty());
}

#[test]
fn api_key_env_fills_blank_key() {
	let var = format!("JOT_CONFIG_TEST_KEY_{}", std::process::id());

	// SAFETY: the variable name is unique to this test process and test.
	unsafe { env::set_var(&var, " from-env ") };

	let payload = sample_with(|root| {
		let llm = section(root, &["providers", "llm"]);

		llm.insert("api_key".to_string(), Value::String(String::new()));
		llm.insert("api_key_env".to_string(), Value::String(var.clone()));
	});
	let cfg = load_payload(payload).expect("Config must load.");

	// SAFETY: see above.
	unsafe { env::remove_var(&var) };

	assert_eq!(cfg.providers.llm.api_key, "from-env");
}

#[test]
fn pool_max_conns_must_be_positive() {
	let payload = sample_with(|root| {
		section(root, &["storage"]).insert("pool_max_conns".to_string(), Value::Integer(0));
	});

	expect_validation_error(payload, "storage.pool_max_conns must be greater than zero.");
}

#[test]
fn max_attempts_must_be_positive() {
	let payload = sample_with(|root| {
		section(root, &["translation"]).insert("max_attempts".to_string(), Value::Integer(0));
	});

	expect_validation_error(payload, "translation.max_attempts must be greater than zero.");
}

#[test]
fn temperature_must_be_in_range() {
	let payload = sample_with(|root| {
		section(root, &["providers", "llm"])
			.insert("temperature".to_string(), Value::Float(3.5));
	});

	expect_validation_error(payload, "providers.llm.temperature must be in the range 0.0-2.0.");
}

#[test]
fn default_headers_must_be_strings() {
	let payload = sample_with(|root| {
		section(root, &["providers", "llm", "default_headers"])
			.insert("X-Retries".to_string(), Value::Integer(2));
	});

	expect_validation_error(payload, "providers.llm.default_headers values must be strings.");
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("jot_config_test_missing.toml");
	let err = jot_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, jot_config::Error::ReadConfig { .. }));
}
