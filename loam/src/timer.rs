use loam_msg::Token;
use std_alloc::vec::Vec;

use embedded_time::duration::Milliseconds;
use crate::time::Millis;
use crate::tree::Path;

/// The timers the engine runs on, named so that an expiry carries
/// what to do about it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimerKind {
  /// The periodic execution tick driving retransmission and
  /// dedup-cache expiry
  NsdlExecution,
  /// Fires at 75% of the registration lifetime to refresh the
  /// registration before it lapses
  Registration,
  /// An observation's deferred notification is due
  /// (minimum period elapsed)
  MinPeriod(Path, Token),
  /// An observation's maximum period elapsed; notify even
  /// without a change
  MaxPeriod(Path, Token),
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Entry {
  kind: TimerKind,
  deadline: Millis,
  period: Option<Millis>,
}

/// Single-shot and periodic timers over the engine's
/// milliseconds-since-epoch timeline.
///
/// Expiries are pulled, not pushed: the engine asks
/// [`TimerQueue::poll_expired`] on every drive and feeds the kinds
/// into its event queue, which keeps all timer handling on the one
/// event loop.
#[derive(Clone, Debug, Default)]
pub struct TimerQueue {
  entries: Vec<Entry>,
}

impl TimerQueue {
  /// An empty queue
  pub fn new() -> Self {
    Self::default()
  }

  /// Arm a single-shot timer `after` from `now`, replacing any
  /// timer of the same kind.
  pub fn schedule(&mut self, kind: TimerKind, after: Millis, now: Millis) {
    self.cancel(&kind);
    self.entries.push(Entry { kind,
                              deadline: Milliseconds(now.0 + after.0),
                              period: None });
  }

  /// Arm a periodic timer firing every `period` from `now`,
  /// replacing any timer of the same kind.
  pub fn schedule_periodic(&mut self, kind: TimerKind, period: Millis, now: Millis) {
    self.cancel(&kind);
    self.entries.push(Entry { kind,
                              deadline: Milliseconds(now.0 + period.0),
                              period: Some(period) });
  }

  /// Disarm the timer of this kind, if armed
  pub fn cancel(&mut self, kind: &TimerKind) {
    self.entries.retain(|e| e.kind != *kind);
  }

  /// Disarm everything. Fatal errors and the transition to idle
  /// stop all timers in one move.
  pub fn cancel_all(&mut self) {
    self.entries.clear();
  }

  /// Whether a timer of this kind is armed
  pub fn is_scheduled(&self, kind: &TimerKind) -> bool {
    self.entries.iter().any(|e| e.kind == *kind)
  }

  /// All expiries due at `now`, in deadline order. Periodic timers
  /// re-arm themselves; single-shots disarm.
  pub fn poll_expired(&mut self, now: Millis) -> Vec<TimerKind> {
    let mut due = self.entries
                      .iter()
                      .filter(|e| e.deadline.0 <= now.0)
                      .copied()
                      .collect::<Vec<_>>();
    due.sort_by_key(|e| e.deadline.0);

    self.entries.retain_mut(|e| match (e.deadline.0 <= now.0, e.period) {
                  | (false, _) => true,
                  | (true, None) => false,
                  | (true, Some(Milliseconds(period))) => {
                    while e.deadline.0 <= now.0 {
                      e.deadline.0 += period;
                    }
                    true
                  },
                });

    due.into_iter().map(|e| e.kind).collect()
  }

  /// The soonest armed deadline; lets a host sleep until something
  /// is actually due.
  pub fn next_deadline(&self) -> Option<Millis> {
    self.entries.iter().map(|e| e.deadline).min_by_key(|d| d.0)
  }
}
