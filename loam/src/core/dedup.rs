use loam_msg::{Id, Message};
use no_std_net::SocketAddr;
use std_alloc::vec::Vec;

#[cfg(test)]
use embedded_time::duration::Milliseconds;
use crate::time::Millis;

/// What the cache knows about an inbound message id.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DedupOutcome {
  /// Never seen (until now); process the message
  New,
  /// Seen within the exchange lifetime; if we responded before, the
  /// cached response should be resent, otherwise the repeat is
  /// dropped on the floor
  Duplicate(Option<Message>),
}

#[derive(Clone, Debug)]
struct Seen {
  addr: SocketAddr,
  id: Id,
  at: Millis,
  response: Option<Message>,
}

/// Remembers inbound message ids per peer for `EXCHANGE_LIFETIME`
/// so that a retransmitted request is answered with the same
/// response exactly once instead of being processed twice.
#[derive(Clone, Debug, Default)]
pub(crate) struct DedupCache {
  seen: Vec<Seen>,
}

impl DedupCache {
  /// Record an id (when new) and report what we know about it.
  pub(crate) fn check(&mut self, addr: SocketAddr, id: Id, now: Millis) -> DedupOutcome {
    match self.seen
              .iter()
              .find(|s| s.addr == addr && s.id == id)
    {
      | Some(seen) => DedupOutcome::Duplicate(seen.response.clone()),
      | None => {
        self.seen.push(Seen { addr,
                              id,
                              at: now,
                              response: None });
        DedupOutcome::New
      },
    }
  }

  /// Attach the response we sent for an id, to be replayed on a
  /// duplicate.
  pub(crate) fn store_response(&mut self, addr: SocketAddr, id: Id, response: Message) {
    if let Some(seen) = self.seen
                            .iter_mut()
                            .find(|s| s.addr == addr && s.id == id)
    {
      seen.response = Some(response);
    }
  }

  /// Forget everything older than `lifetime`.
  pub(crate) fn prune(&mut self, now: Millis, lifetime: Millis) {
    self.seen
        .retain(|s| now.0.saturating_sub(s.at.0) < lifetime.0);
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.seen.len()
  }
}
