//! In-memory peer registry: the one piece of shared mutable state.
//!
//! Rooms map client ids to their latest reported record. Records age out
//! lazily: every upsert and every snapshot sweeps all rooms and deletes
//! anything older than the liveness cutoff. There is no background timer, so
//! a quiet registry only discovers staleness when the next request arrives.
//!
//! The registry itself is synchronous; the server serializes access through a
//! `tokio::sync::Mutex` so each operation's prune-then-mutate (or
//! prune-then-read) span is atomic with respect to other requests.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{ClientRecord, CooldownEntry, GroupOrder, UpdatePayload};

/// Records older than this (ms) are deleted on the next sweep.
pub const LIVENESS_CUTOFF_MS: i64 = 15_000;

/// Prefix for auto-assigned display names: `spirit 1`, `spirit 2`, ...
const DEFAULT_NAME_PREFIX: &str = "spirit";

/// One peer as reported by `GET /aggregate`.
#[derive(Debug, Clone, Serialize)]
pub struct PeerState {
    #[serde(rename = "clientId")]
    pub client_id: String,
    pub name: String,
    pub prof: u32,
    #[serde(rename = "pluginVer")]
    pub plugin_ver: Option<String>,
    pub subgroup: u32,
    pub entries: Vec<CooldownEntry>,
}

/// Aggregated view of one room.
///
/// `group_order` is present only if some client ever stored one for this
/// room; it is independent of the peer list and survives pruning.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub room: String,
    pub peers: Vec<PeerState>,
    #[serde(rename = "groupOrder", skip_serializing_if = "Option::is_none")]
    pub group_order: Option<GroupOrder>,
}

/// Per-room storage of client records plus room-wide ordering hints.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// room name -> (client id -> latest record)
    rooms: HashMap<String, HashMap<String, ClientRecord>>,
    /// room name -> last received group order, replaced wholesale
    group_orders: HashMap<String, GroupOrder>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or fully replace) a client's record and return the name that
    /// was actually stored, so callers learn auto-assigned names.
    ///
    /// A non-empty provided name is used verbatim, collisions included.
    /// A non-empty group order replaces the room's stored one; absence leaves
    /// it untouched. Ends with a full sweep across all rooms.
    pub fn upsert(&mut self, payload: UpdatePayload, now: i64) -> String {
        let name = self.assign_name(&payload.room, &payload.client_id, payload.name.as_deref());

        let records = self.rooms.entry(payload.room.clone()).or_default();
        records.insert(
            payload.client_id,
            ClientRecord {
                name: name.clone(),
                prof: payload.prof,
                plugin_ver: payload.plugin_ver,
                subgroup: payload.subgroup,
                entries: payload.entries,
                last_updated_at: now,
            },
        );

        if let Some(order) = payload.group_order {
            self.group_orders.insert(payload.room, order);
        }

        self.prune(now);
        name
    }

    /// Sweep all rooms, then read one.
    ///
    /// Never fails; an unknown room is created empty and yields an empty
    /// peer list. Peer order is whatever the map iterates, no guaranteed
    /// sort.
    pub fn snapshot(&mut self, room: &str, now: i64) -> RoomSnapshot {
        self.prune(now);

        let records = self.rooms.entry(room.to_string()).or_default();
        let peers = records
            .iter()
            .map(|(client_id, record)| PeerState {
                client_id: client_id.clone(),
                name: record.name.clone(),
                prof: record.prof,
                plugin_ver: record.plugin_ver.clone(),
                subgroup: record.subgroup,
                entries: record.entries.clone(),
            })
            .collect();

        RoomSnapshot {
            room: room.to_string(),
            peers,
            group_order: self.group_orders.get(room).cloned(),
        }
    }

    /// Delete every record not updated within the liveness cutoff.
    ///
    /// Sweeps all rooms, not just the one a request touched. Rooms
    /// themselves are never deleted, only their records.
    pub fn prune(&mut self, now: i64) {
        for records in self.rooms.values_mut() {
            records.retain(|_, record| now - record.last_updated_at <= LIVENESS_CUTOFF_MS);
        }
    }

    /// Create a room if it does not exist yet. Used by the status page so
    /// the default room always shows.
    pub fn ensure_room(&mut self, room: &str) {
        self.rooms.entry(room.to_string()).or_default();
    }

    /// All rooms and their current records, for read-only projections.
    pub fn rooms(&self) -> &HashMap<String, HashMap<String, ClientRecord>> {
        &self.rooms
    }

    /// Resolve the display name to store for `client_id`.
    ///
    /// A provided name wins with no collision check. Otherwise the lowest
    /// free `spirit {n}` among the room's currently stored names. Allocation
    /// runs before the upsert's own sweep, so a stale record keeps its
    /// number taken until something prunes it. The client's own previous
    /// record is ignored so a re-sent anonymous update keeps its name
    /// instead of hopping to the next number.
    fn assign_name(&self, room: &str, client_id: &str, provided: Option<&str>) -> String {
        if let Some(name) = provided {
            return name.to_string();
        }

        let used: std::collections::HashSet<String> = self
            .rooms
            .get(room)
            .map(|records| {
                records
                    .iter()
                    .filter(|(id, _)| id.as_str() != client_id)
                    .map(|(_, record)| record.name.trim().to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        let mut n = 1usize;
        while used.contains(&format!("{DEFAULT_NAME_PREFIX} {n}")) {
            n += 1;
        }
        format!("{DEFAULT_NAME_PREFIX} {n}")
    }
}
