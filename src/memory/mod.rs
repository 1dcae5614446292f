//! Memory index — recurring-issue detection
//!
//! Append-only log of committed complaints, keyed chronologically, answering
//! "has this location/issue recurred?". Entries are recorded by the store
//! only after a complaint commit succeeds, so a lookup can never see an
//! in-flight submission: two simultaneous submissions at the same location
//! never match each other, while anything committed before a lookup started
//! is always visible to it.
//!
//! Matching: same damage type, haversine distance within the radius, and
//! (optionally) created within the lookback window. Haversine is
//! deterministic and symmetric, so the signal is reproducible.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::StoreError;
use crate::types::{ComplaintId, DamageType, GeoPoint, RecurrenceSignal};

/// Default spatial match radius in metres
pub const DEFAULT_RADIUS_M: f64 = 100.0;

/// WGS-84 mean Earth radius in metres
const EARTH_RADIUS_M: f64 = 6_371_000.0;

const TREE_NAME: &str = "recurrence_log";

// ============================================================================
// Entries
// ============================================================================

/// One committed complaint as seen by the recurrence index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurrenceEntry {
    pub complaint_id: ComplaintId,
    pub damage_type: DamageType,
    pub point: GeoPoint,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Distance
// ============================================================================

/// Haversine great-circle distance between two points, in metres.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

// ============================================================================
// Index
// ============================================================================

/// Persistent recurrence index backed by its own sled tree.
///
/// Key: created_at as nanoseconds (big-endian, sorts chronologically)
/// followed by the complaint ID bytes so same-instant commits never collide.
/// Value: JSON-serialized `RecurrenceEntry`.
#[derive(Clone)]
pub struct MemoryIndex {
    tree: sled::Tree,
}

impl MemoryIndex {
    /// Open or create the recurrence tree inside the shared database.
    pub fn open(db: &sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree(TREE_NAME)?;
        Ok(Self { tree })
    }

    /// Append one committed complaint to the log.
    ///
    /// Called by the store after the record write succeeds; never before.
    pub fn record(&self, entry: &RecurrenceEntry) -> Result<(), StoreError> {
        let key = Self::key_for(entry);
        let value = serde_json::to_vec(entry)?;
        self.tree.insert(key, value)?;
        Ok(())
    }

    /// Answer the recurrence question for a prospective complaint.
    ///
    /// Returns the zero signal on an empty index; lookup never errors.
    /// Matched IDs come back oldest first (chronological key order).
    pub fn find_recurrence(
        &self,
        point: GeoPoint,
        damage_type: DamageType,
        radius_m: f64,
        lookback: Option<Duration>,
    ) -> RecurrenceSignal {
        let cutoff = lookback.map(|window| Utc::now() - window);

        let matched: Vec<ComplaintId> = self
            .tree
            .iter()
            .filter_map(|item| item.ok())
            .filter_map(|(_, value)| serde_json::from_slice::<RecurrenceEntry>(&value).ok())
            .filter(|entry| entry.damage_type == damage_type)
            .filter(|entry| cutoff.map_or(true, |c| entry.created_at >= c))
            .filter(|entry| haversine_m(entry.point, point) <= radius_m)
            .map(|entry| entry.complaint_id)
            .collect();

        RecurrenceSignal::from_matches(matched)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Rebuild the log from the authoritative complaint records.
    ///
    /// Used at startup when the index tree is missing (e.g. restored from a
    /// partial backup) but the complaint tree is not.
    pub fn rebuild<'a>(
        &self,
        complaints: impl Iterator<Item = &'a crate::types::Complaint>,
    ) -> Result<usize, StoreError> {
        let mut rebuilt = 0;
        for complaint in complaints {
            self.record(&RecurrenceEntry {
                complaint_id: complaint.id.clone(),
                damage_type: complaint.assessment.damage_type,
                point: complaint.location.point,
                created_at: complaint.created_at,
            })?;
            rebuilt += 1;
        }
        if rebuilt > 0 {
            warn!(entries = rebuilt, "recurrence index rebuilt from complaint records");
        }
        Ok(rebuilt)
    }

    fn key_for(entry: &RecurrenceEntry) -> Vec<u8> {
        let nanos = entry
            .created_at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| entry.created_at.timestamp() * 1_000_000_000);
        let mut key = nanos.to_be_bytes().to_vec();
        key.extend_from_slice(entry.complaint_id.as_bytes());
        key
    }
}
