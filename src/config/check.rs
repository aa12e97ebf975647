//! Environment report for the `check-env` command.

use super::config::{
    DEFAULT_ENDPOINT, DEFAULT_MODEL, ENV_API_KEY, ENV_ENDPOINT, ENV_MODEL, TutorConfig,
    credential_looks_valid, mask_credential,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: Option<String>,
}

impl EnvCheck {
    fn new(name: impl Into<String>, status: CheckStatus, detail: Option<String>) -> Self {
        Self {
            name: name.into(),
            status,
            detail,
        }
    }

    pub fn line(&self) -> String {
        let tag = match self.status {
            CheckStatus::Ok => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        match &self.detail {
            Some(detail) => format!("{} {} ({})", tag, self.name, detail),
            None => format!("{} {}", tag, self.name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvReport {
    pub checks: Vec<EnvCheck>,
}

impl EnvReport {
    /// True when nothing failed. Warnings do not count.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    pub fn lines(&self) -> Vec<String> {
        self.checks.iter().map(EnvCheck::line).collect()
    }
}

/// Inspect the variables a session needs. The credential is only ever
/// reported masked.
pub fn check_environment<F>(lookup: F) -> EnvReport
where
    F: Fn(&str) -> Option<String>,
{
    let mut checks = Vec::new();

    match lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            checks.push(EnvCheck::new(
                ENV_API_KEY,
                CheckStatus::Ok,
                Some(format!("{}, {} chars", mask_credential(&key), key.chars().count())),
            ));
            if credential_looks_valid(&key) {
                checks.push(EnvCheck::new("credential starts with 'sk-'", CheckStatus::Ok, None));
            } else {
                checks.push(EnvCheck::new(
                    "credential usually starts with 'sk-'",
                    CheckStatus::Warn,
                    None,
                ));
            }
        }
        None => checks.push(EnvCheck::new(
            ENV_API_KEY,
            CheckStatus::Fail,
            Some(format!("not set; export {}=your-api-key", ENV_API_KEY)),
        )),
    }

    let endpoint = lookup(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    checks.push(EnvCheck::new("endpoint", CheckStatus::Ok, Some(endpoint)));
    let model = lookup(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string());
    checks.push(EnvCheck::new("model", CheckStatus::Ok, Some(model)));

    match TutorConfig::from_lookup(&lookup).and_then(|c| c.validate()) {
        Ok(()) => checks.push(EnvCheck::new("configuration", CheckStatus::Ok, None)),
        Err(e) => checks.push(EnvCheck::new("configuration", CheckStatus::Fail, Some(e.to_string()))),
    }

    EnvReport { checks }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_fails() {
        let report = check_environment(|_| None);
        assert!(!report.passed());
        assert_eq!(report.checks[0].status, CheckStatus::Fail);
    }

    #[test]
    fn test_key_reported_masked() {
        let key = "sk-abcdefgh12345678wxyz";
        let report = check_environment(|name| (name == ENV_API_KEY).then(|| key.to_string()));
        assert!(report.passed());
        let text = report.lines().join("\n");
        assert!(!text.contains(key));
        assert!(text.contains("sk-abcde"));
    }

    #[test]
    fn test_unusual_key_only_warns() {
        let report = check_environment(|name| (name == ENV_API_KEY).then(|| "token-123456789".to_string()));
        assert!(report.passed());
        assert!(report.checks.iter().any(|c| c.status == CheckStatus::Warn));
    }
}
