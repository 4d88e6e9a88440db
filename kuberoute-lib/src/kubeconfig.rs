//! Cluster API endpoint lookup from kubeconfig files.
//!
//! Follows the client loading rules: an explicit file, else the
//! `KUBECONFIG` path list, else `~/.kube/config`. When several files are
//! merged the first definition of a name wins.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const ENV_VAR: &str = "KUBECONFIG";
const DEFAULT_RELATIVE_PATH: &str = ".kube/config";

#[derive(Debug, Error)]
pub enum Error {
    #[error("No kubeconfig file found")]
    NoFile,
    #[error("IO error reading {path}: {source}")]
    IO { path: PathBuf, source: io::Error },
    #[error("Error parsing {path}: {source}")]
    Yaml { path: PathBuf, source: serde_yaml::Error },
    #[error("No current context set")]
    NoCurrentContext,
    #[error("Context {0} not found")]
    ContextNotFound(String),
    #[error("Cluster {0} not found")]
    ClusterNotFound(String),
    #[error("Cluster {0} has no server")]
    NoServer(String),
}

/// Where kubeconfig files are taken from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A single file that must exist.
    Explicit(PathBuf),
    /// Candidate files in precedence order, missing ones are skipped.
    Search(Vec<PathBuf>),
}

impl Source {
    /// Loading rules from the environment, unless `explicit` is given.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        if let Some(path) = explicit {
            return Source::Explicit(path);
        }
        match env::var_os(ENV_VAR) {
            Some(list) if !list.is_empty() => {
                Source::Search(env::split_paths(&list).filter(|p| !p.as_os_str().is_empty()).collect())
            }
            _ => Source::Search(home_dir().map(|home| home.join(DEFAULT_RELATIVE_PATH)).into_iter().collect()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct KubeConfig {
    #[serde(default)]
    current_context: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    contexts: Vec<NamedContext>,
    #[serde(default, deserialize_with = "null_as_empty")]
    clusters: Vec<NamedCluster>,
}

/// `kubectl config view` writes empty lists as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: Context,
}

#[derive(Debug, Deserialize)]
struct Context {
    cluster: String,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: Cluster,
}

#[derive(Debug, Deserialize)]
struct Cluster {
    #[serde(default)]
    server: String,
}

impl KubeConfig {
    fn merge(&mut self, other: KubeConfig) {
        if self.current_context.as_deref().is_none_or(str::is_empty) {
            self.current_context = other.current_context;
        }
        for context in other.contexts {
            if !self.contexts.iter().any(|c| c.name == context.name) {
                self.contexts.push(context);
            }
        }
        for cluster in other.clusters {
            if !self.clusters.iter().any(|c| c.name == cluster.name) {
                self.clusters.push(cluster);
            }
        }
    }

    fn server(&self, context_override: Option<&str>) -> Result<String, Error> {
        let context_name = context_override
            .or(self.current_context.as_deref())
            .filter(|name| !name.is_empty())
            .ok_or(Error::NoCurrentContext)?;
        let context = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| Error::ContextNotFound(context_name.to_string()))?;
        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.context.cluster)
            .ok_or_else(|| Error::ClusterNotFound(context.context.cluster.clone()))?;
        if cluster.cluster.server.is_empty() {
            return Err(Error::NoServer(cluster.name.clone()));
        }
        Ok(cluster.cluster.server.clone())
    }
}

/// Server URL of the cluster selected by the current (or overridden) context.
pub fn cluster_server(source: &Source, context: Option<&str>) -> Result<String, Error> {
    let mut merged = KubeConfig::default();
    let mut found = false;
    match source {
        Source::Explicit(path) => {
            merged = read(path)?.ok_or(Error::NoFile)?;
            found = true;
        }
        Source::Search(paths) => {
            for path in paths {
                if let Some(config) = read(path)? {
                    tracing::debug!(path = %path.display(), "loaded kubeconfig");
                    merged.merge(config);
                    found = true;
                }
            }
        }
    }
    if !found {
        return Err(Error::NoFile);
    }
    merged.server(context)
}

fn read(path: &Path) -> Result<Option<KubeConfig>, Error> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(Error::IO {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if content.trim().is_empty() {
        return Ok(Some(KubeConfig::default()));
    }
    serde_yaml::from_str(&content).map(Some).map_err(|source| Error::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").filter(|h| !h.is_empty()).map(PathBuf::from)
}
