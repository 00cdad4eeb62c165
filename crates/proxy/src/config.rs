use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use shared::routes::{
    Environment, RouteTable, CASE_GEN_PREFIX, SCHEDULER_PREFIX, SIMULATION_PREFIX,
};

pub const DEFAULT_SETTINGS_FILE: &str = "proxy.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub environment: Environment,
    pub log_filter: String,
    /// Backend origin overrides keyed by route prefix.
    pub target_overrides: Vec<(String, String)>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            environment: Environment::Dev,
            log_filter: "info".into(),
            target_overrides: Vec::new(),
        }
    }
}

impl Settings {
    pub fn route_table(&self) -> anyhow::Result<RouteTable> {
        let mut table = RouteTable::for_environment(self.environment);
        for (prefix, target) in &self.target_overrides {
            table
                .set_target(prefix, target)
                .with_context(|| format!("invalid backend override for '{prefix}'"))?;
        }
        Ok(table)
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

const TARGET_KEYS: [(&str, &str, &str); 3] = [
    ("case_gen_target", "APP__CASE_GEN_TARGET", CASE_GEN_PREFIX),
    ("scheduler_target", "APP__SCHEDULER_TARGET", SCHEDULER_PREFIX),
    ("simulation_target", "APP__SIMULATION_TARGET", SIMULATION_PREFIX),
];

fn set_override(settings: &mut Settings, prefix: &str, target: String) {
    settings.target_overrides.retain(|(p, _)| p != prefix);
    settings.target_overrides.push((prefix.to_string(), target));
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.bind_addr = v.clone();
    }
    if let Some(v) = file_cfg.get("environment") {
        settings.environment = v.parse()?;
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    for (file_key, _, prefix) in TARGET_KEYS {
        if let Some(v) = file_cfg.get(file_key) {
            set_override(settings, prefix, v.clone());
        }
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
    if let Some(v) = lookup("PROXY_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = lookup("PROXY_ENV") {
        settings.environment = v.parse()?;
    }
    if let Some(v) = lookup("APP__ENVIRONMENT") {
        settings.environment = v.parse()?;
    }

    if let Some(v) = lookup("RUST_LOG") {
        settings.log_filter = v;
    }

    for (_, env_key, prefix) in TARGET_KEYS {
        if let Some(v) = lookup(env_key) {
            set_override(settings, prefix, v);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_dev_routes_on_port_3000() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr, "0.0.0.0:3000");
        let table = settings.route_table().expect("table");
        assert_eq!(table, RouteTable::for_environment(Environment::Dev));
    }

    #[test]
    fn file_selects_environment_and_overrides_target() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            "environment = \"preview\"\nscheduler_target = \"http://sched-canary:4000\"\n",
        )
        .expect("parse");

        let table = settings.route_table().expect("table");
        assert_eq!(
            table.resolve("/api/scheduler/get-pop-schedules").expect("route").url,
            "http://sched-canary:4000/get-pop-schedules"
        );
        assert_eq!(
            table.resolve("/api/case-gen/get-case-buckets").expect("route").url,
            "http://case_gen:6500/get-case-buckets"
        );
    }

    #[test]
    fn env_overrides_file_values() {
        let mut settings = Settings::default();
        apply_file(&mut settings, "bind_addr = \"127.0.0.1:3001\"\n").expect("parse");
        apply_env(
            &mut settings,
            env_from(&[
                ("PROXY_BIND", "127.0.0.1:3002"),
                ("APP__BIND_ADDR", "127.0.0.1:3003"),
                ("PROXY_ENV", "preview"),
            ]),
        )
        .expect("env");

        assert_eq!(settings.bind_addr, "127.0.0.1:3003");
        assert_eq!(settings.environment, Environment::Preview);
    }

    #[test]
    fn later_override_for_same_prefix_wins() {
        let mut settings = Settings::default();
        apply_file(&mut settings, "case_gen_target = \"http://a:6500\"\n").expect("parse");
        apply_env(
            &mut settings,
            env_from(&[("APP__CASE_GEN_TARGET", "http://b:6500")]),
        )
        .expect("env");

        assert_eq!(
            settings.target_overrides,
            vec![(CASE_GEN_PREFIX.to_string(), "http://b:6500".to_string())]
        );
    }

    #[test]
    fn rejects_unknown_environment_and_bad_targets() {
        let mut settings = Settings::default();
        assert!(apply_file(&mut settings, "environment = \"staging\"\n").is_err());

        settings.target_overrides = vec![(SCHEDULER_PREFIX.into(), "sched:4000".into())];
        assert!(settings.route_table().is_err());
    }
}
