use embedded_time::duration::Milliseconds;

use crate::retry::{Attempts, Strategy};
use crate::time::Millis;

/// Configuration options related to outbound CON requests
/// (bootstrap, register, update, unregister are all confirmable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Con {
  /// Retry strategy for CON requests that
  /// have not yet been answered.
  ///
  /// Defaults to the RFC 7252 transmission parameters: an initial
  /// timeout drawn from `[ACK_TIMEOUT, ACK_TIMEOUT * ACK_RANDOM_FACTOR]`
  /// (2-3 seconds), doubling after every attempt.
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use loam::config::Con;
  /// use loam::retry::Strategy;
  ///
  /// assert_eq!(Con::default().retry_strategy,
  ///            Strategy::Exponential { init_min: Milliseconds(2_000),
  ///                                    init_max: Milliseconds(3_000) });
  /// ```
  pub retry_strategy: Strategy,

  /// Number of times we are allowed to resend a CON request
  /// before erroring (`MAX_RETRANSMIT`).
  ///
  /// Defaults to 4, so at most 5 copies of a message ever
  /// hit the wire.
  /// ```
  /// use loam::config::Con;
  /// use loam::retry::Attempts;
  ///
  /// assert_eq!(Con::default().max_retransmits, Attempts(4));
  /// ```
  pub max_retransmits: Attempts,
}

impl Default for Con {
  fn default() -> Self {
    Con { retry_strategy: Strategy::Exponential { init_min: Milliseconds(2_000),
                                                  init_max: Milliseconds(3_000) },
          max_retransmits: Attempts(4) }
  }
}

/// Runtime config
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Config {
  /// See [`Con`]
  pub con: Con,

  /// Period of the engine execution timer that drives
  /// retransmission and dedup expiry.
  ///
  /// Defaults to 1 second.
  pub exec_interval: Millis,

  /// `MAX_LATENCY` of RFC 7252 section 4.8.2; the time a datagram is
  /// expected to take from the start of its transmission to the
  /// completion of its reception.
  ///
  /// Defaults to 100 seconds.
  pub max_latency: Millis,

  /// `PROCESSING_DELAY` of RFC 7252 section 4.8.2; the time a node
  /// takes to turn around a CON request into its ACK.
  ///
  /// Defaults to 2 seconds.
  pub expected_processing_delay: Millis,

  /// UDP port used when a server URI does not carry one.
  ///
  /// Defaults to 5683.
  pub default_port: u16,

  /// UDP port used when a secured (`coaps://`) server URI does not
  /// carry one.
  ///
  /// Defaults to 5684.
  pub default_secure_port: u16,
}

impl Default for Config {
  fn default() -> Self {
    Config { con: Con::default(),
             exec_interval: Milliseconds(1_000),
             max_latency: Milliseconds(100_000),
             expected_processing_delay: Milliseconds(2_000),
             default_port: 5683,
             default_secure_port: 5684 }
  }
}

impl Config {
  /// `EXCHANGE_LIFETIME` of RFC 7252 section 4.8.2: how long an
  /// inbound message id is remembered for dedup, and how long a
  /// cached response to it is kept.
  ///
  /// `MAX_TRANSMIT_SPAN + (2 * MAX_LATENCY) + PROCESSING_DELAY`;
  /// 247 seconds with the default configuration.
  ///
  /// ```
  /// use loam::config::Config;
  ///
  /// assert_eq!(Config::default().exchange_lifetime_millis(), 247_000);
  /// ```
  pub fn exchange_lifetime_millis(&self) -> u64 {
    let Milliseconds(span) = self.con
                                 .retry_strategy
                                 .total_span(self.con.max_retransmits);
    let Milliseconds(latency) = self.max_latency;
    let Milliseconds(processing) = self.expected_processing_delay;

    span + 2 * latency + processing
  }
}
