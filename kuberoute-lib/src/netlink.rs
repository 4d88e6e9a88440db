//! `RTM_NEWROUTE` requests for Linux `NETLINK_ROUTE` sockets.

use netlink_packet_core::{NLM_F_CREATE, NLM_F_EXCL, NLM_F_REQUEST, NetlinkHeader, NetlinkMessage, NetlinkPayload};
use netlink_packet_route::{
    AF_INET, AF_INET6, RT_SCOPE_UNIVERSE, RT_TABLE_MAIN, RTN_UNICAST, RTPROT_STATIC, RouteHeader, RouteMessage,
    RtnlMessage, route,
};

use crate::route_message::{HostRoute, RouteRequest};

/// Builds the `RTM_NEWROUTE` message for `request`, finalized with length and type.
pub fn new_route_message(pid: u32, request: &RouteRequest) -> NetlinkMessage<RtnlMessage> {
    let (family, prefix_len, destination, gateway) = match request.route {
        HostRoute::V4 { destination, gateway } => {
            (AF_INET, 32, destination.octets().to_vec(), gateway.octets().to_vec())
        }
        HostRoute::V6 { destination, gateway } => {
            (AF_INET6, 128, destination.octets().to_vec(), gateway.octets().to_vec())
        }
    };

    let mut header = NetlinkHeader::default();
    header.flags = NLM_F_REQUEST | NLM_F_CREATE | NLM_F_EXCL;
    header.sequence_number = request.seq;
    header.port_number = pid;

    let mut route_header = RouteHeader::default();
    route_header.address_family = family as u8;
    route_header.destination_prefix_length = prefix_len;
    route_header.table = RT_TABLE_MAIN;
    route_header.protocol = RTPROT_STATIC;
    route_header.scope = RT_SCOPE_UNIVERSE;
    route_header.kind = RTN_UNICAST;

    let mut route_message = RouteMessage::default();
    route_message.header = route_header;
    route_message.nlas = vec![route::Nla::Destination(destination), route::Nla::Gateway(gateway)];

    let mut message = NetlinkMessage::new(header, NetlinkPayload::from(RtnlMessage::NewRoute(route_message)));
    message.finalize();
    message
}

/// Encodes the host route of `request` as a netlink message sent by `pid`.
pub fn encode_new_route(pid: u32, request: &RouteRequest) -> Vec<u8> {
    let message = new_route_message(pid, request);
    let mut buf = vec![0u8; message.buffer_len()];
    message.serialize(&mut buf);
    buf
}
