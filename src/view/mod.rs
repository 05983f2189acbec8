//! Read-only reporting projection over the registry.
//!
//! Classifies peers by how recently they were seen and derives a per-room
//! status plus cross-room summary statistics. Consumed by the status page
//! only; nothing here mutates stored state.

use std::collections::HashMap;

use crate::domain::ClientRecord;
use crate::registry::LIVENESS_CUTOFF_MS;

/// Peers seen within this window (ms) but past the liveness cutoff count as
/// stale; older than this is offline. Distinct from pruning, which removes
/// records entirely once past the liveness cutoff plus whatever delay occurs
/// before the next sweep.
pub const STALE_CUTOFF_MS: i64 = 45_000;

/// How recently a peer reported in, relative to the reporting moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    Live,
    Stale,
    Offline,
}

impl PeerStatus {
    /// Classify a peer by milliseconds since its last update.
    pub fn classify(last_seen_ms_ago: i64) -> Self {
        if last_seen_ms_ago <= LIVENESS_CUTOFF_MS {
            Self::Live
        } else if last_seen_ms_ago <= STALE_CUTOFF_MS {
            Self::Stale
        } else {
            Self::Offline
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Stale => "Stale",
            Self::Offline => "Offline",
        }
    }
}

/// Health of a whole room, derived from its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Live,
    Mixed,
    Offline,
}

impl RoomStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Mixed => "Mixed",
            Self::Offline => "Offline",
        }
    }
}

/// One peer row in the report.
#[derive(Debug, Clone)]
pub struct PeerReport {
    pub client_id: String,
    pub name: String,
    pub prof: u32,
    pub plugin_ver: Option<String>,
    pub subgroup: u32,
    pub entries_count: usize,
    pub last_seen_ms_ago: i64,
    pub status: PeerStatus,
}

/// One room in the report.
#[derive(Debug, Clone)]
pub struct RoomReport {
    pub room: String,
    pub peers: Vec<PeerReport>,
    pub status: RoomStatus,
}

/// Cross-room report consumed by the status page.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Rooms sorted by name so the page renders deterministically
    pub rooms: Vec<RoomReport>,
    pub total_rooms: usize,
    pub total_clients: usize,
    pub live_clients: usize,
    /// Mean ms since last update across all peers, `None` when there are none
    pub avg_latency_ms: Option<i64>,
}

impl StatusReport {
    /// Project the registry's rooms into a report as of `now`.
    pub fn build(rooms: &HashMap<String, HashMap<String, ClientRecord>>, now: i64) -> Self {
        let mut reports: Vec<RoomReport> = rooms
            .iter()
            .map(|(room, records)| room_report(room, records, now))
            .collect();
        reports.sort_by(|a, b| a.room.cmp(&b.room));

        let total_rooms = reports.len();
        let mut total_clients = 0;
        let mut live_clients = 0;
        let mut latency_sum: i64 = 0;

        for report in &reports {
            for peer in &report.peers {
                total_clients += 1;
                if peer.status == PeerStatus::Live {
                    live_clients += 1;
                }
                latency_sum += peer.last_seen_ms_ago;
            }
        }

        let avg_latency_ms = if total_clients > 0 {
            Some((latency_sum as f64 / total_clients as f64).round() as i64)
        } else {
            None
        };

        Self {
            rooms: reports,
            total_rooms,
            total_clients,
            live_clients,
            avg_latency_ms,
        }
    }
}

fn room_report(room: &str, records: &HashMap<String, ClientRecord>, now: i64) -> RoomReport {
    let peers: Vec<PeerReport> = records
        .iter()
        .map(|(client_id, record)| {
            let last_seen_ms_ago = now - record.last_updated_at;
            PeerReport {
                client_id: client_id.clone(),
                name: record.name.clone(),
                prof: record.prof,
                plugin_ver: record.plugin_ver.clone(),
                subgroup: record.subgroup,
                entries_count: record.entries.len(),
                last_seen_ms_ago,
                status: PeerStatus::classify(last_seen_ms_ago),
            }
        })
        .collect();

    RoomReport {
        room: room.to_string(),
        status: room_status(&peers),
        peers,
    }
}

/// Room status rules:
/// - no peers: Offline
/// - at least one live peer, no offline peers, and stale count within
///   max(1, peers/3): Live
/// - no live and no stale peers: Offline
/// - anything else: Mixed
fn room_status(peers: &[PeerReport]) -> RoomStatus {
    if peers.is_empty() {
        return RoomStatus::Offline;
    }

    let live = peers.iter().filter(|p| p.status == PeerStatus::Live).count();
    let stale = peers
        .iter()
        .filter(|p| p.status == PeerStatus::Stale)
        .count();
    let offline = peers
        .iter()
        .filter(|p| p.status == PeerStatus::Offline)
        .count();

    let stale_budget = 1.0_f64.max(peers.len() as f64 / 3.0);
    if live > 0 && offline == 0 && (stale as f64) <= stale_budget {
        RoomStatus::Live
    } else if live == 0 && stale == 0 {
        RoomStatus::Offline
    } else {
        RoomStatus::Mixed
    }
}
