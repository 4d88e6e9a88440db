use std::net::IpAddr;
use std::process;

use kuberoute_lib::hosts::{self, HostResolver, SystemResolver};
use kuberoute_lib::kernel::{self, RoutingKernelPort};
use kuberoute_lib::{gateway, installer, kubeconfig, logging};

mod cli;

fn run<P: RoutingKernelPort, R: HostResolver>(
    args: &cli::Cli,
    port: &P,
    resolver: &R,
    pid: u32,
) -> Result<(), exitcode::ExitCode> {
    let source = kubeconfig::Source::from_env(args.kubeconfig.clone());
    let server = kubeconfig::cluster_server(&source, args.context.as_deref()).map_err(|err| {
        tracing::error!(error = %err, "error getting kubeconfig");
        exitcode::CONFIG
    })?;
    tracing::info!(%server, "kubernetes host");

    let mut host_list = args.hosts.clone();
    host_list.push(server);
    let addrs = hosts::host_addrs(resolver, &host_list).map_err(|err| {
        tracing::error!(error = %err, "error resolving hosts");
        exitcode::NOHOST
    })?;

    let gateway = gateway::resolve(port).map_err(|err| {
        tracing::error!(error = %err, "error getting gateway");
        match err {
            gateway::Error::NotFound => exitcode::UNAVAILABLE,
            gateway::Error::Kernel(_) => exitcode::OSERR,
        }
    })?;

    if args.dry_run {
        let requests = installer::preview(port, pid, gateway, &addrs).map_err(installer_exit)?;
        for request in requests.iter() {
            tracing::info!(seq = request.seq, "would route {} through {}", request.route.destination(), gateway);
        }
        return Ok(());
    }

    add_routes(port, pid, gateway, &addrs)
}

fn add_routes<P: RoutingKernelPort>(
    port: &P,
    pid: u32,
    gateway: IpAddr,
    addrs: &[IpAddr],
) -> Result<(), exitcode::ExitCode> {
    let report = installer::install(port, pid, gateway, addrs).map_err(installer_exit)?;
    if !report.failed.is_empty() {
        tracing::warn!(failed = report.failed.len(), "some routes were not accepted by the kernel");
    }
    Ok(())
}

fn installer_exit(err: installer::Error) -> exitcode::ExitCode {
    tracing::error!(error = %err, "error adding routes");
    match err {
        installer::Error::Kernel(_) => exitcode::OSERR,
        installer::Error::Request { .. } | installer::Error::TooManyDestinations(_) => exitcode::SOFTWARE,
    }
}

fn main() {
    let args = cli::parse();

    match &args.log_file {
        Some(path) => {
            if let Err(err) = logging::setup_log_file(path) {
                eprintln!("error opening log file {}: {}", path.display(), err);
                process::exit(exitcode::CANTCREAT);
            }
        }
        None => logging::setup_stdout(),
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting {}",
        env!("CARGO_PKG_NAME")
    );

    match run(&args, &kernel::platform(), &SystemResolver, process::id()) {
        Ok(_) => (),
        Err(exitcode::OK) => (),
        Err(code) => {
            tracing::warn!("abnormal exit");
            process::exit(code);
        }
    }
}
