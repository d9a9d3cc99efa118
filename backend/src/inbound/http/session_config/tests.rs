//! Unit tests for session configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;
use uuid::Uuid;

struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> Self {
        let path = std::env::temp_dir().join(format!("quorum-session-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'k'; len]).expect("write key file");
        Self { path }
    }

    fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn env_with(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key: &TempKeyFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path_str()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

#[rstest]
fn release_accepts_complete_configuration() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let settings = session_settings_from_env(&env_with(release_vars(&key)), BuildMode::Release)
        .expect("valid release settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.max_age, Duration::from_secs(DEFAULT_MAX_AGE_HOURS * 3600));
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_each_toggle(#[case] missing: &'static str) {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key);
    vars.remove(missing);
    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("missing toggle rejected");
    assert!(matches!(err, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(SAMESITE_ENV, "sideways")]
#[case(MAX_AGE_ENV, "0")]
fn release_rejects_invalid_values(#[case] name: &'static str, #[case] value: &str) {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key);
    vars.insert(name, value.to_owned());
    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("invalid toggle rejected");
    assert!(matches!(err, SessionConfigError::InvalidEnv { name: got, .. } if got == name));
}

#[rstest]
fn release_rejects_same_site_none_without_secure_cookie() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());
    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("insecure SameSite=None rejected");
    assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn release_rejects_ephemeral_keys() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());
    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("ephemeral rejected");
    assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_rejects_short_key() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN - 1);
    let err = session_settings_from_env(&env_with(release_vars(&key)), BuildMode::Release)
        .err()
        .expect("short key rejected");
    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort { length, .. } if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn release_rejects_missing_key_file() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key);
    vars.insert(KEY_FILE_ENV, "/nonexistent/quorum/session_key".to_owned());
    let err = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .err()
        .expect("unreadable key rejected");
    assert!(matches!(err, SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn debug_falls_back_to_defaults() {
    let mut vars = HashMap::new();
    vars.insert(KEY_FILE_ENV, "/nonexistent/quorum/session_key".to_owned());
    vars.insert(SAMESITE_ENV, "sideways".to_owned());
    let settings = session_settings_from_env(&env_with(vars), BuildMode::Debug)
        .expect("debug tolerates defaults");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn max_age_is_read_in_hours() {
    let key = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key);
    vars.insert(MAX_AGE_ENV, "12".to_owned());
    let settings = session_settings_from_env(&env_with(vars), BuildMode::Release)
        .expect("valid settings");
    assert_eq!(settings.max_age, Duration::from_secs(12 * 3600));
}

#[rstest]
#[case("1", Some(true))]
#[case("No", Some(false))]
#[case(" y ", Some(true))]
#[case("perhaps", None)]
fn parses_boolean_toggles(#[case] raw: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(raw), expected);
}
