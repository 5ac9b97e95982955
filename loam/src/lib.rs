//! `loam` is an OMA Lightweight M2M (LWM2M) client over CoAP/UDP that
//! aims to be:
//! - Platform-independent (bring your own transport and clock)
//! - Non-blocking (one cooperative event loop, no threads, no waiting)
//! - Approachable
//!
//! ## LWM2M
//! LWM2M is a device-management protocol for constrained devices built
//! on CoAP. A client like this one:
//! - **bootstraps**: fetches credentials for its management server
//!   from a bootstrap server
//! - **registers**: advertises itself and its object tree to the
//!   server, and keeps the registration fresh for a negotiated
//!   lifetime
//! - **serves**: answers server-initiated READ / WRITE / EXECUTE /
//!   CREATE / DELETE operations against a tree of numbered objects,
//!   instances and resources (`/3/0/0` is the manufacturer string of
//!   the Device object)
//! - **notifies**: when a server observes a resource, pushes updates
//!   gated by the observation's period and threshold attributes
//!
//! ## Shape of the crate
//! [`Interface`] is the application surface: non-blocking operations
//! in, [`InterfaceObserver`] callbacks out. Underneath,
//! [`core::Core`] runs everything as one FIFO of events - API calls,
//! inbound datagrams, timer expiries, value updates - processed one
//! at a time, so no engine state is ever observed mid-change.
//!
//! The host supplies two seams:
//! - [`net::Transport`]: fire-and-forget datagram send; inbound
//!   datagrams are pushed into [`Interface::deliver`] from whatever
//!   IO loop the host runs
//! - [`time::Clock`]: an [`embedded_time::Clock`] with u64 ticks
//!
//! With the (default) `std` feature, [`std::Clock`] and
//! [`std::UdpTransport`] implement both over the standard library.

#![cfg_attr(not(feature = "std"), no_std)]
// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(missing_copy_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// -
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]

extern crate alloc as std_alloc;

#[cfg(test)]
pub(crate) mod test;

/// configuring runtime behavior
pub mod config;

/// the NSDL engine: event loop, state machine, dispatch
pub mod core;

/// the Device object builder
pub mod device;

/// endpoint parameters advertised at registration
pub mod endpoint;

mod error;

mod interface;

/// network abstractions
pub mod net;

/// observation state & notification policy
pub mod observe;

/// customizable retrying of fallible operations
pub mod retry;

/// the Security object
pub mod security;

/// `std`-only clock and transport
#[cfg(feature = "std")]
pub mod std;

/// time abstractions
pub mod time;

/// named single-shot and periodic timers
pub mod timer;

/// the object / instance / resource tree
pub mod tree;

pub use device::Device;
pub use error::Error;
pub use interface::{Interface, InterfaceObserver};
pub use security::{Security, SecurityMode};
