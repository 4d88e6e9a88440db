use clap::Parser;

use std::path::PathBuf;

use kuberoute_lib::logging;

/// Route traffic for a Kubernetes API server through the local point-to-point tunnel
#[derive(Clone, Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// Additional hosts to route through the tunnel
    pub hosts: Vec<String>,

    /// Kubeconfig file (defaults to the KUBECONFIG list, then ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current context
    #[arg(long)]
    pub context: Option<String>,

    /// Resolve gateway and destinations without installing routes
    #[arg(long)]
    pub dry_run: bool,

    /// Write logs to this file instead of stdout
    #[arg(long, env = logging::ENV_VAR_LOG_FILE)]
    pub log_file: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_without_arguments() -> anyhow::Result<()> {
        let args = Cli::try_parse_from(["kuberoute"])?;
        assert!(args.hosts.is_empty());
        assert!(args.kubeconfig.is_none());
        assert!(!args.dry_run);
        Ok(())
    }

    #[test]
    fn parses_hosts_and_flags() -> anyhow::Result<()> {
        let args = Cli::try_parse_from([
            "kuberoute",
            "--kubeconfig",
            "/tmp/kubeconfig",
            "--context",
            "staging",
            "--dry-run",
            "registry.example.com",
            "https://auth.example.com",
        ])?;

        assert_eq!(args.hosts, vec!["registry.example.com", "https://auth.example.com"]);
        assert_eq!(args.kubeconfig, Some(PathBuf::from("/tmp/kubeconfig")));
        assert_eq!(args.context.as_deref(), Some("staging"));
        assert!(args.dry_run);
        Ok(())
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["kuberoute", "--metric", "5"]).is_err());
    }
}
