//! Perception event types and validation.
//!
//! A perception event is one telemetry record from a front-end domain.
//! Events are validated once, at construction, and are immutable after
//! that. Decoding from JSON goes through the same validator, so a
//! `PerceptionEvent` value is always well-formed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{FlowError, Result};

/// Payload key the engine reads the challenge signal from.
pub const DIFFICULTY_KEY: &str = "difficulty";

/// Front-end surface that generated an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Domain {
    /// Direct gameplay telemetry.
    Game,
    /// Interactive narrative telemetry.
    Narrative,
    /// Decentralized-governance interactions.
    Dao,
}

impl Domain {
    /// Get all domain variants.
    pub fn all() -> &'static [Domain] {
        &[Domain::Game, Domain::Narrative, Domain::Dao]
    }

    /// The wire name of this domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Game => "game",
            Domain::Narrative => "narrative",
            Domain::Dao => "dao",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = FlowError;

    /// Exact, case-sensitive match. No trimming or normalization.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "game" => Ok(Domain::Game),
            "narrative" => Ok(Domain::Narrative),
            "dao" => Ok(Domain::Dao),
            other => Err(FlowError::invalid_domain(other)),
        }
    }
}

impl TryFrom<String> for Domain {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Open, domain-specific event payload.
///
/// Values keep their JSON type so the payload round-trips unchanged. The
/// engine reads only [`DIFFICULTY_KEY`]; see [`Payload::difficulty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, Value>);

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a value, returning the previous one if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Extract the difficulty signal.
    ///
    /// - absent, non-numeric, or non-finite: `None`
    /// - negative: `Some(0.0)`
    /// - otherwise the number as is (no upper ceiling)
    pub fn difficulty(&self) -> Option<f64> {
        let value = self.0.get(DIFFICULTY_KEY)?.as_f64()?;
        if !value.is_finite() {
            return None;
        }
        Some(value.max(0.0))
    }

    /// Difficulty signal, falling back to `default` when unusable.
    pub fn difficulty_or(&self, default: f64) -> f64 {
        self.difficulty().unwrap_or(default)
    }
}

impl From<BTreeMap<String, Value>> for Payload {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Event timestamp as the producer sent it.
///
/// Any RFC 3339 instant is accepted. A timestamp with no offset
/// (`2025-01-01T12:00:00`, as naive producers emit) is read as UTC.
/// The original text is kept and re-emitted on encode, so an event
/// round-trips with its offset and precision untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventTimestamp {
    raw: String,
    instant: DateTime<FixedOffset>,
}

impl EventTimestamp {
    /// Current time in UTC.
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// The timestamp text as received.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The instant, with the producer's offset (`+00:00` for naive input).
    pub fn instant(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.instant.with_timezone(&Utc)
    }

    /// Whether the producer omitted the offset.
    pub fn is_naive(&self) -> bool {
        DateTime::parse_from_rfc3339(&self.raw).is_err()
    }
}

impl fmt::Display for EventTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for EventTimestamp {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        let instant = match DateTime::parse_from_rfc3339(s) {
            Ok(instant) => instant,
            Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
                .map_err(|e| FlowError::serde(format!("invalid timestamp '{}': {}", s, e)))?,
        };
        Ok(Self {
            raw: s.to_string(),
            instant,
        })
    }
}

impl TryFrom<String> for EventTimestamp {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<EventTimestamp> for String {
    fn from(ts: EventTimestamp) -> Self {
        ts.raw
    }
}

impl From<DateTime<Utc>> for EventTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            instant: instant.fixed_offset(),
        }
    }
}

impl From<DateTime<FixedOffset>> for EventTimestamp {
    fn from(instant: DateTime<FixedOffset>) -> Self {
        Self {
            raw: instant.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            instant,
        }
    }
}

/// Unvalidated event as it arrives from the caller or the wire.
///
/// Every field is structurally required; only `domain` is checked
/// semantically, by [`RawPerceptionEvent::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPerceptionEvent {
    pub id: Uuid,
    #[serde(alias = "ts")]
    pub timestamp: EventTimestamp,
    pub domain: String,
    pub user_hash: String,
    pub payload: Payload,
}

impl RawPerceptionEvent {
    /// Validate into an immutable event.
    pub fn validate(self) -> Result<PerceptionEvent> {
        let domain = self.domain.parse::<Domain>()?;
        Ok(PerceptionEvent {
            id: self.id,
            timestamp: self.timestamp,
            domain,
            user_hash: self.user_hash,
            payload: self.payload,
        })
    }
}

impl From<PerceptionEvent> for RawPerceptionEvent {
    fn from(event: PerceptionEvent) -> Self {
        Self {
            id: event.id,
            timestamp: event.timestamp,
            domain: event.domain.as_str().to_string(),
            user_hash: event.user_hash,
            payload: event.payload,
        }
    }
}

/// A validated perception event.
///
/// Fields are read-only. The engine takes events by value, so each one is
/// consumed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPerceptionEvent")]
pub struct PerceptionEvent {
    id: Uuid,
    timestamp: EventTimestamp,
    domain: Domain,
    user_hash: String,
    payload: Payload,
}

impl PerceptionEvent {
    /// Construct and validate an event.
    ///
    /// Fails with [`FlowError::InvalidDomain`] when `domain` is not one of
    /// `game`, `narrative`, `dao`.
    pub fn new(
        id: Uuid,
        timestamp: impl Into<EventTimestamp>,
        domain: &str,
        user_hash: impl Into<String>,
        payload: Payload,
    ) -> Result<Self> {
        RawPerceptionEvent {
            id,
            timestamp: timestamp.into(),
            domain: domain.to_string(),
            user_hash: user_hash.into(),
            payload,
        }
        .validate()
    }

    /// Construct from an already-typed domain. Cannot fail.
    pub fn from_parts(
        id: Uuid,
        timestamp: impl Into<EventTimestamp>,
        domain: Domain,
        user_hash: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            id,
            timestamp: timestamp.into(),
            domain,
            user_hash: user_hash.into(),
            payload,
        }
    }

    /// Decode and validate a JSON event.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawPerceptionEvent = serde_json::from_str(json)?;
        raw.validate()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> &EventTimestamp {
        &self.timestamp
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn user_hash(&self) -> &str {
        &self.user_hash
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

impl TryFrom<RawPerceptionEvent> for PerceptionEvent {
    type Error = FlowError;

    fn try_from(raw: RawPerceptionEvent) -> Result<Self> {
        raw.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER_HASH: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

    fn make(domain: &str) -> Result<PerceptionEvent> {
        PerceptionEvent::new(
            Uuid::new_v4(),
            Utc::now(),
            domain,
            USER_HASH,
            Payload::new().with("difficulty", 0.8),
        )
    }

    #[test]
    fn test_valid_domains_accepted() {
        for domain in ["game", "narrative", "dao"] {
            let event = make(domain).unwrap();
            assert_eq!(event.domain().as_str(), domain);
        }
    }

    #[test]
    fn test_unknown_domain_rejected() {
        let err = make("politics").unwrap_err();
        match err {
            FlowError::InvalidDomain { value } => assert_eq!(value, "politics"),
            other => panic!("expected InvalidDomain, got {other:?}"),
        }
    }

    #[test]
    fn test_domain_is_case_sensitive() {
        assert!(make("Game").is_err());
        assert!(make("DAO").is_err());
        assert!(make(" game").is_err());
        assert!(make("").is_err());
    }

    #[test]
    fn test_domain_all_round_trip_through_from_str() {
        for domain in Domain::all() {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), *domain);
            assert_eq!(domain.to_string(), domain.as_str());
        }
    }

    #[test]
    fn test_event_fields_carried_through() {
        let id = Uuid::new_v4();
        let ts = Utc::now();
        let payload = Payload::new().with("difficulty", 0.3).with("score", 100);
        let event = PerceptionEvent::new(id, ts, "dao", "abc", payload.clone()).unwrap();

        assert_eq!(event.id(), id);
        assert_eq!(event.timestamp().to_utc(), ts);
        assert_eq!(event.domain(), Domain::Dao);
        assert_eq!(event.user_hash(), "abc");
        assert_eq!(event.payload(), &payload);
    }

    #[test]
    fn test_json_round_trip_preserves_payload() {
        let payload = Payload::new()
            .with("difficulty", 0.8)
            .with("score", 100)
            .with("tags", json!(["a", "b"]))
            .with("nested", json!({"level": 3, "boss": null}));
        let event = PerceptionEvent::new(Uuid::new_v4(), Utc::now(), "game", USER_HASH, payload)
            .unwrap();

        let json = serde_json::to_string(&event).unwrap();
        let decoded: PerceptionEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, event);
        assert_eq!(decoded.payload().get("nested").unwrap()["level"], json!(3));
    }

    #[test]
    fn test_serialized_shape() {
        let event = make("narrative").unwrap();
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["domain"], json!("narrative"));
        assert_eq!(value["user_hash"], json!(USER_HASH));
        assert_eq!(value["payload"]["difficulty"], json!(0.8));
        assert!(value["id"].is_string());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_deserialize_rejects_unknown_domain() {
        let json = json!({
            "id": Uuid::new_v4(),
            "timestamp": "2025-01-01T00:00:00Z",
            "domain": "politics",
            "user_hash": USER_HASH,
            "payload": {}
        })
        .to_string();

        assert!(serde_json::from_str::<PerceptionEvent>(&json).is_err());
        let err = PerceptionEvent::from_json(&json).unwrap_err();
        assert!(matches!(err, FlowError::InvalidDomain { .. }));
    }

    #[test]
    fn test_deserialize_missing_field_is_structural() {
        let json = json!({
            "id": Uuid::new_v4(),
            "timestamp": "2025-01-01T00:00:00Z",
            "domain": "game",
            "payload": {}
        })
        .to_string();

        let err = PerceptionEvent::from_json(&json).unwrap_err();
        assert!(matches!(err, FlowError::Serde { .. }));
    }

    #[test]
    fn test_deserialize_accepts_ts_alias() {
        let json = json!({
            "id": Uuid::new_v4(),
            "ts": "2025-01-01T12:30:00Z",
            "domain": "dao",
            "user_hash": USER_HASH,
            "payload": {"vote": "yes"}
        })
        .to_string();

        let event = PerceptionEvent::from_json(&json).unwrap();
        assert_eq!(event.timestamp().as_str(), "2025-01-01T12:30:00Z");
        assert_eq!(event.timestamp().to_utc().to_rfc3339(), "2025-01-01T12:30:00+00:00");
    }

    fn event_json(ts: &str) -> String {
        json!({
            "id": Uuid::new_v4(),
            "timestamp": ts,
            "domain": "game",
            "user_hash": USER_HASH,
            "payload": {"difficulty": 0.8}
        })
        .to_string()
    }

    #[test]
    fn test_naive_timestamp_read_as_utc() {
        for ts in ["2025-01-01T12:00:00", "2025-01-01T12:00:00.123456"] {
            let event = PerceptionEvent::from_json(&event_json(ts)).unwrap();
            assert!(event.timestamp().is_naive());
            assert_eq!(event.timestamp().instant().offset().local_minus_utc(), 0);
            assert_eq!(
                event.timestamp().to_utc().format("%H:%M:%S").to_string(),
                "12:00:00"
            );

            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["timestamp"], json!(ts));
        }
    }

    #[test]
    fn test_offset_timestamp_preserved() {
        let ts = "2025-01-01T12:00:00+02:00";
        let event = PerceptionEvent::from_json(&event_json(ts)).unwrap();

        assert!(!event.timestamp().is_naive());
        assert_eq!(event.timestamp().instant().offset().local_minus_utc(), 7200);
        assert_eq!(event.timestamp().to_utc().to_rfc3339(), "2025-01-01T10:00:00+00:00");

        let encoded = serde_json::to_string(&event).unwrap();
        assert!(encoded.contains(r#""timestamp":"2025-01-01T12:00:00+02:00""#));
        let decoded = PerceptionEvent::from_json(&encoded).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_unparseable_timestamp_is_structural() {
        for ts in ["yesterday", "2025-01-01", ""] {
            let err = PerceptionEvent::from_json(&event_json(ts)).unwrap_err();
            assert!(matches!(err, FlowError::Serde { .. }), "{ts}: {err:?}");
        }
    }

    #[test]
    fn test_raw_round_trip() {
        let event = make("game").unwrap();
        let raw = RawPerceptionEvent::from(event.clone());
        assert_eq!(raw.domain, "game");
        assert_eq!(raw.validate().unwrap(), event);
    }

    // =========================================================================
    // Difficulty extraction
    // =========================================================================

    #[test]
    fn test_difficulty_present() {
        let payload = Payload::new().with("difficulty", 0.8);
        assert_eq!(payload.difficulty(), Some(0.8));
    }

    #[test]
    fn test_difficulty_integer_is_numeric() {
        let payload = Payload::new().with("difficulty", 1);
        assert_eq!(payload.difficulty(), Some(1.0));
    }

    #[test]
    fn test_difficulty_absent_uses_default() {
        let payload = Payload::new().with("score", 100);
        assert_eq!(payload.difficulty(), None);
        assert_eq!(payload.difficulty_or(0.5), 0.5);
    }

    #[test]
    fn test_difficulty_non_numeric_uses_default() {
        for value in [json!("0.8"), json!(true), json!(null), json!([0.8]), json!({})] {
            let payload = Payload::new().with("difficulty", value);
            assert_eq!(payload.difficulty_or(0.5), 0.5);
        }
    }

    #[test]
    fn test_difficulty_negative_floors_at_zero() {
        let payload = Payload::new().with("difficulty", -2.5);
        assert_eq!(payload.difficulty(), Some(0.0));
    }

    #[test]
    fn test_difficulty_above_one_kept() {
        let payload = Payload::new().with("difficulty", 3.0);
        assert_eq!(payload.difficulty(), Some(3.0));
    }

    #[test]
    fn test_payload_from_iter() {
        let payload: Payload = [("difficulty", json!(0.2)), ("level", json!(4))]
            .into_iter()
            .collect();
        assert_eq!(payload.len(), 2);
        assert!(!payload.is_empty());
        assert_eq!(payload.iter().count(), 2);
    }
}
