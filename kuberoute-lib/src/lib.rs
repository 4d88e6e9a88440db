pub mod gateway;
pub mod hosts;
pub mod installer;
pub mod interface;
pub mod kernel;
pub mod kubeconfig;
pub mod logging;
#[cfg(target_os = "linux")]
pub mod netlink;
pub mod rib;
pub mod route_message;
pub mod slot;
pub mod sockaddr;
