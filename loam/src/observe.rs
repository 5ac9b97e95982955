use loam_msg::Token;

use embedded_time::duration::Milliseconds;
use crate::time::Millis;
use crate::tree::{Path, Value};

/// The rolling notification counter carried in the Observe option.
///
/// Strictly increasing between notifications, wrapping at `2^24`
/// (the Observe option is at most 3 bytes wide).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ObserveSeq(u32);

impl ObserveSeq {
  /// The current counter value
  pub fn current(&self) -> u32 {
    self.0
  }

  /// Advance and return the new value
  pub fn next(&mut self) -> u32 {
    self.0 = (self.0 + 1) & 0x00ff_ffff;
    self.0
  }
}

/// The notification conditions a server attaches to an observation
/// through query parameters on the observing GET
/// (`pmin=`, `pmax=`, `lt=`, `gt=`, `st=`).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Attributes {
  /// Minimum period, seconds: suppress notifications closer together
  /// than this
  pub pmin: Option<u32>,
  /// Maximum period, seconds: force a notification this long after
  /// the previous one even without a change
  pub pmax: Option<u32>,
  /// Less-than threshold (numeric resources only)
  pub lt: Option<f64>,
  /// Greater-than threshold (numeric resources only)
  pub gt: Option<f64>,
  /// Minimum step between reported values (numeric resources only)
  pub step: Option<f64>,
}

impl Attributes {
  /// Parse attributes out of a request's query parameters,
  /// ignoring everything unrelated.
  pub fn from_queries<'a>(queries: impl Iterator<Item = &'a str>) -> Self {
    let mut attrs = Self::default();

    for query in queries {
      match query.split_once('=') {
        | Some(("pmin", v)) => attrs.pmin = v.parse().ok(),
        | Some(("pmax", v)) => attrs.pmax = v.parse().ok(),
        | Some(("lt", v)) => attrs.lt = v.parse().ok(),
        | Some(("gt", v)) => attrs.gt = v.parse().ok(),
        | Some(("st", v)) => attrs.step = v.parse().ok(),
        | _ => (),
      }
    }

    attrs
  }
}

/// What to do about a value change under an active observation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
  /// Notify now
  SendNow,
  /// A notification is due but the minimum period has not passed;
  /// notify at the given time
  Defer(Millis),
  /// The change does not warrant a notification
  Skip,
}

/// One active observation: the token a server observed a node with,
/// where it points, its counter, conditions and the snapshot of what
/// was last reported.
///
/// Observations are token-scoped: the same node may be observed
/// twice under different tokens, and a GET without an Observe option
/// never touches them.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
  /// The node under observation
  pub path: Path,
  /// The token notifications are sent under
  pub token: Token,
  /// See [`ObserveSeq`]
  pub seq: ObserveSeq,
  /// See [`Attributes`]
  pub attrs: Attributes,
  /// When the last notification (or the initial response) was sent
  pub last_sent_at: Option<Millis>,
  /// The value most recently reported, for threshold comparison
  pub last_sent_value: Option<Value>,
  /// A change is waiting out the minimum period
  pub pending: bool,
}

impl Observation {
  /// A fresh observation, before the initial response is sent.
  pub fn new(path: Path, token: Token, attrs: Attributes) -> Self {
    Self { path,
           token,
           seq: ObserveSeq::default(),
           attrs,
           last_sent_at: None,
           last_sent_value: None,
           pending: false }
  }

  /// Decide what a change of the observed node's value means for
  /// this observation.
  pub fn on_change(&self, now: Millis, new_value: Option<&Value>) -> Decision {
    if !self.value_notable(new_value) {
      return Decision::Skip;
    }

    match (self.attrs.pmin, self.last_sent_at) {
      | (Some(pmin), Some(Milliseconds(at))) if now.0 < at + (pmin as u64) * 1000 => {
        Decision::Defer(Milliseconds(at + (pmin as u64) * 1000))
      },
      | _ => Decision::SendNow,
    }
  }

  /// Record that a notification (or the initial Observe response)
  /// went out carrying `value`.
  pub fn sent(&mut self, now: Millis, value: Option<Value>) {
    self.last_sent_at = Some(now);
    self.last_sent_value = value;
    self.pending = false;
  }

  /// `lt`/`gt`/`st` gating, evaluated against the last-sent value.
  ///
  /// Non-numeric values (and observations without numeric
  /// conditions) always pass; a numeric value passes when it crosses
  /// a configured threshold or moved at least `st` away from what
  /// was last reported.
  fn value_notable(&self, new_value: Option<&Value>) -> bool {
    let Attributes { lt, gt, step, .. } = self.attrs;

    if lt.is_none() && gt.is_none() && step.is_none() {
      return true;
    }

    let new = new_value.and_then(Value::as_numeric);
    let old = self.last_sent_value.as_ref().and_then(Value::as_numeric);

    let (new, old) = match (new, old) {
      | (Some(new), Some(old)) => (new, old),
      // nothing to compare against; report
      | _ => return true,
    };

    let crosses = |threshold: f64| (old < threshold) != (new < threshold);

    lt.map(crosses).unwrap_or(false)
    || gt.map(crosses).unwrap_or(false)
    || step.map(|st| (new - old).abs() >= st).unwrap_or(false)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tree::ObjectId;

  fn obs(attrs: Attributes) -> Observation {
    Observation::new(Path::object(ObjectId(42)),
                     Token(Default::default()),
                     attrs)
  }

  #[test]
  fn seq_wraps_at_2_pow_24() {
    let mut seq = ObserveSeq(0x00ff_fffe);
    assert_eq!(seq.next(), 0x00ff_ffff);
    assert_eq!(seq.next(), 0);
    assert_eq!(seq.next(), 1);
  }

  #[test]
  fn attrs_from_queries() {
    let queries = ["pmin=5", "pmax=60", "lt=10.5", "unrelated=1", "st=2"];
    let attrs = Attributes::from_queries(queries.into_iter());

    assert_eq!(attrs.pmin, Some(5));
    assert_eq!(attrs.pmax, Some(60));
    assert_eq!(attrs.lt, Some(10.5));
    assert_eq!(attrs.gt, None);
    assert_eq!(attrs.step, Some(2.0));
  }

  #[test]
  fn no_conditions_always_sends() {
    let obs = obs(Attributes::default());
    assert_eq!(obs.on_change(Milliseconds(0), Some(&Value::String("x".into()))),
               Decision::SendNow);
  }

  #[test]
  fn pmin_defers() {
    let mut obs = obs(Attributes { pmin: Some(5),
                                   ..Default::default() });
    obs.sent(Milliseconds(1000), None);

    assert_eq!(obs.on_change(Milliseconds(3000), Some(&Value::Int(1))),
               Decision::Defer(Milliseconds(6000)));
    assert_eq!(obs.on_change(Milliseconds(6000), Some(&Value::Int(1))),
               Decision::SendNow);
  }

  #[test]
  fn step_gates_small_moves() {
    let mut obs = obs(Attributes { step: Some(2.0),
                                   ..Default::default() });
    obs.sent(Milliseconds(0), Some(Value::Float(10.0)));

    assert_eq!(obs.on_change(Milliseconds(1), Some(&Value::Float(11.0))),
               Decision::Skip);
    assert_eq!(obs.on_change(Milliseconds(1), Some(&Value::Float(12.0))),
               Decision::SendNow);
  }

  #[test]
  fn lt_fires_on_crossing_only() {
    let mut obs = obs(Attributes { lt: Some(10.0),
                                   ..Default::default() });
    obs.sent(Milliseconds(0), Some(Value::Int(15)));

    assert_eq!(obs.on_change(Milliseconds(1), Some(&Value::Int(12))),
               Decision::Skip);
    assert_eq!(obs.on_change(Milliseconds(1), Some(&Value::Int(9))),
               Decision::SendNow);
  }
}
