use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

pub const CASE_GEN_PREFIX: &str = "/api/case-gen";
pub const SCHEDULER_PREFIX: &str = "/api/scheduler";
pub const SIMULATION_PREFIX: &str = "/api/simulation";

/// Deployment the proxy forwards into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Dev,
    Preview,
}

impl FromStr for Environment {
    type Err = RouteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "preview" => Ok(Environment::Preview),
            other => Err(RouteError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Dev => f.write_str("dev"),
            Environment::Preview => f.write_str("preview"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRoute {
    pub prefix: String,
    pub target: String,
}

impl ProxyRoute {
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Result<Self, RouteError> {
        let prefix = prefix.into();
        let target = target.into().trim_end_matches('/').to_string();
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            return Err(RouteError::InvalidPrefix(prefix));
        }
        if !(target.starts_with("http://") || target.starts_with("https://")) {
            return Err(RouteError::InvalidTarget(target));
        }
        Ok(Self { prefix, target })
    }

    /// Remainder of `path` after this route's prefix, if the prefix matches on a segment boundary.
    fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
            Some(rest)
        } else {
            None
        }
    }
}

/// Upstream location for one proxied request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget<'a> {
    pub route: &'a ProxyRoute,
    /// Absolute upstream URL with the prefix removed and the query preserved.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<ProxyRoute>,
}

impl RouteTable {
    pub fn new(routes: Vec<ProxyRoute>) -> Self {
        Self { routes }
    }

    pub fn for_environment(environment: Environment) -> Self {
        let (case_gen, scheduler, simulation) = match environment {
            Environment::Dev => (
                "http://localhost:6500",
                "http://localhost:4000",
                "http://localhost:7000",
            ),
            Environment::Preview => (
                "http://case_gen:6500",
                "http://sched:4000",
                "http://risk_based_sim:7000",
            ),
        };
        Self {
            routes: vec![
                ProxyRoute {
                    prefix: CASE_GEN_PREFIX.into(),
                    target: case_gen.into(),
                },
                ProxyRoute {
                    prefix: SCHEDULER_PREFIX.into(),
                    target: scheduler.into(),
                },
                ProxyRoute {
                    prefix: SIMULATION_PREFIX.into(),
                    target: simulation.into(),
                },
            ],
        }
    }

    pub fn routes(&self) -> &[ProxyRoute] {
        &self.routes
    }

    /// Replaces the target of the route with `prefix`, or appends a new route.
    pub fn set_target(&mut self, prefix: &str, target: &str) -> Result<(), RouteError> {
        let route = ProxyRoute::new(prefix, target)?;
        match self.routes.iter_mut().find(|r| r.prefix == route.prefix) {
            Some(existing) => existing.target = route.target,
            None => self.routes.push(route),
        }
        Ok(())
    }

    /// Maps a path-and-query such as `/api/scheduler/get-pop-schedules?x=1` to its backend.
    pub fn resolve<'a>(&'a self, path_and_query: &str) -> Option<ForwardTarget<'a>> {
        let (route, rest) = self
            .routes
            .iter()
            .filter_map(|route| route.strip(path_and_query).map(|rest| (route, rest)))
            .max_by_key(|(route, _)| route.prefix.len())?;

        let url = if rest.is_empty() || rest.starts_with('?') {
            format!("{}/{rest}", route.target)
        } else {
            format!("{}{rest}", route.target)
        };
        Some(ForwardTarget { route, url })
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}
