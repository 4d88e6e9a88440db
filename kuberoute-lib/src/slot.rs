//! Address slots of a routing message and their presence bitmask.

use crate::sockaddr::{self, SocketAddress};

/// Number of address slots (`RTAX_MAX`).
pub const SLOT_COUNT: usize = 8;

/// Role of an address within a routing message (`RTAX_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Destination = 0,
    Gateway = 1,
    Netmask = 2,
    Genmask = 3,
    InterfaceLink = 4,
    InterfaceAddress = 5,
    Author = 6,
    /// Broadcast address, or the remote end on a point-to-point interface.
    Broadcast = 7,
}

impl Slot {
    pub const ALL: [Slot; SLOT_COUNT] = [
        Slot::Destination,
        Slot::Gateway,
        Slot::Netmask,
        Slot::Genmask,
        Slot::InterfaceLink,
        Slot::InterfaceAddress,
        Slot::Author,
        Slot::Broadcast,
    ];

    /// Presence bit (`RTA_*`).
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Addresses of one message indexed by [`Slot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSlots([Option<SocketAddress>; SLOT_COUNT]);

impl AddressSlots {
    pub fn with(mut self, slot: Slot, addr: SocketAddress) -> Self {
        self.set(slot, addr);
        self
    }

    pub fn set(&mut self, slot: Slot, addr: SocketAddress) {
        self.0[slot as usize] = Some(addr);
    }

    pub fn get(&self, slot: Slot) -> Option<&SocketAddress> {
        self.0[slot as usize].as_ref()
    }

    pub fn mask(&self) -> u32 {
        Slot::ALL
            .iter()
            .filter(|slot| self.get(**slot).is_some())
            .fold(0, |mask, slot| mask | slot.bit())
    }

    /// Appends every populated slot in ascending slot order.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), sockaddr::Error> {
        for addr in self.0.iter().flatten() {
            addr.encode(buf)?;
        }
        Ok(())
    }

    /// Decodes one record per bit set in `mask` from the start of `b`.
    pub fn decode(mask: u32, mut b: &[u8]) -> Result<Self, sockaddr::Error> {
        let mut slots = AddressSlots::default();
        for slot in Slot::ALL {
            if mask & slot.bit() == 0 {
                continue;
            }
            let (addr, consumed) = SocketAddress::decode(b)?;
            slots.set(slot, addr);
            b = &b[consumed..];
        }
        Ok(slots)
    }
}
