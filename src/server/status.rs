//! HTML rendering for the status page.
//!
//! Plain string building, no templating. Everything dynamic goes through
//! [`esc_html`] before landing in markup.

use std::fmt::Write;

use crate::view::{PeerStatus, RoomReport, RoomStatus, StatusReport};

use super::handler::PLUGIN_ASSET;

const PAGE_STYLE: &str = r#"
    :root {
      --bg: #050816;
      --panel: rgba(15, 23, 42, 0.96);
      --border: rgba(148, 163, 184, 0.3);
      --text: #e5e7eb;
      --text-soft: #9ca3af;
      --live: #4ade80;
      --stale: #facc15;
      --offline: #fb7185;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      padding: 24px;
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
      background: radial-gradient(circle at top, #1d293b 0, #020617 40%);
      color: var(--text);
    }
    .page { max-width: 960px; margin: 0 auto; }
    h1 { letter-spacing: -0.03em; margin: 0 0 6px; }
    .subtitle { color: var(--text-soft); font-size: 14px; margin: 0 0 18px; }
    .btn {
      display: inline-block;
      padding: 9px 16px;
      border-radius: 999px;
      background: linear-gradient(135deg, #22c55e, #4ade80);
      color: #022c22;
      font-size: 13px;
      font-weight: 500;
      text-decoration: none;
      margin-bottom: 18px;
    }
    .stats {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
      gap: 10px;
      margin-bottom: 22px;
    }
    .stat {
      background: var(--panel);
      border: 1px solid var(--border);
      border-radius: 14px;
      padding: 10px 12px;
    }
    .stat-label { font-size: 11px; color: var(--text-soft); }
    .stat-value { font-size: 18px; font-weight: 600; }
    .room {
      background: var(--panel);
      border: 1px solid var(--border);
      border-radius: 18px;
      padding: 12px;
      margin-bottom: 14px;
    }
    .room-header {
      display: flex;
      justify-content: space-between;
      align-items: center;
      margin-bottom: 8px;
      font-size: 13px;
    }
    .room-count { color: var(--text-soft); font-size: 11px; }
    table { width: 100%; border-collapse: collapse; font-size: 11px; }
    th, td {
      padding: 6px 8px;
      text-align: left;
      border-bottom: 1px solid rgba(30, 64, 175, 0.5);
      white-space: nowrap;
    }
    th {
      font-size: 10px;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--text-soft);
    }
    .chip {
      padding: 3px 8px;
      border-radius: 999px;
      font-size: 10px;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      border: 1px solid currentColor;
    }
    .chip-live { color: var(--live); }
    .chip-stale { color: var(--stale); }
    .chip-mixed { color: var(--stale); }
    .chip-offline { color: var(--offline); }
    .empty { color: var(--text-soft); font-size: 12px; padding: 4px 0; }
    .footer {
      margin-top: 16px;
      font-size: 11px;
      color: var(--text-soft);
      display: flex;
      justify-content: space-between;
    }
"#;

/// Escape a string for safe embedding in HTML text or attribute context.
pub fn esc_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the full status page for a report.
pub fn render_status_page(report: &StatusReport, server_time: &str) -> String {
    let latency_text = match report.avg_latency_ms {
        Some(ms) => format!("Latency: ~{ms} ms average"),
        None => "Latency: waiting for clients...".to_string(),
    };
    let clients_subtitle = if report.total_clients == 0 {
        "(no clients connected)".to_string()
    } else {
        format!(
            "({} client{} across {} room{})",
            report.total_clients,
            plural(report.total_clients),
            report.total_rooms,
            plural(report.total_rooms),
        )
    };

    let mut rooms_html = String::new();
    for room in &report.rooms {
        rooms_html.push_str(&render_room(room));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Relay Status</title>
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <style>{PAGE_STYLE}</style>
</head>
<body>
  <div class="page">
    <h1>arcdps Cooldowns Relay</h1>
    <p class="subtitle">
      Page rendered at {server_time} (server time).
      Data reflects clients seen in the last 15 seconds.
    </p>
    <a class="btn" href="/download/{asset}" download>Download {asset}</a>
    <div class="stats">
      <div class="stat">
        <div class="stat-label">Rooms</div>
        <div class="stat-value">{total_rooms}</div>
      </div>
      <div class="stat">
        <div class="stat-label">Connected clients</div>
        <div class="stat-value">{total_clients}</div>
      </div>
      <div class="stat">
        <div class="stat-label">Live clients</div>
        <div class="stat-value">{live_clients}</div>
      </div>
      <div class="stat">
        <div class="stat-label">Latency</div>
        <div class="stat-value" style="font-size:13px">{latency}</div>
      </div>
    </div>
    <h2 style="font-size:16px">Connected clients <span class="room-count">{subtitle}</span></h2>
    {rooms}
    <footer class="footer">
      <div>Relay Status &middot; lightweight GW2 cooldown relay monitor.</div>
      <div>Place {asset} next to arcdps.dll in your GW2 folder.</div>
    </footer>
  </div>
</body>
</html>"#,
        asset = PLUGIN_ASSET,
        server_time = esc_html(server_time),
        total_rooms = report.total_rooms,
        total_clients = report.total_clients,
        live_clients = report.live_clients,
        latency = esc_html(&latency_text),
        subtitle = esc_html(&clients_subtitle),
        rooms = rooms_html,
    )
}

fn render_room(room: &RoomReport) -> String {
    let chip_class = match room.status {
        RoomStatus::Live => "chip-live",
        RoomStatus::Mixed => "chip-mixed",
        RoomStatus::Offline => "chip-offline",
    };

    let body = if room.peers.is_empty() {
        r#"<p class="empty">No clients connected to this room.</p>"#.to_string()
    } else {
        let mut rows = String::new();
        for (i, peer) in room.peers.iter().enumerate() {
            let peer_chip = match peer.status {
                PeerStatus::Live => "chip-live",
                PeerStatus::Stale => "chip-stale",
                PeerStatus::Offline => "chip-offline",
            };
            let _ = write!(
                rows,
                r#"<tr>
  <td>{index}</td>
  <td>{client_id}</td>
  <td>{name}</td>
  <td>{prof}</td>
  <td>{subgroup}</td>
  <td>{plugin_ver}</td>
  <td>{entries}</td>
  <td>{last_seen}</td>
  <td><span class="chip {chip}">{status}</span></td>
</tr>"#,
                index = i + 1,
                client_id = esc_html(&peer.client_id),
                name = esc_html(&peer.name),
                prof = peer.prof,
                subgroup = peer.subgroup,
                plugin_ver = esc_html(peer.plugin_ver.as_deref().unwrap_or("")),
                entries = peer.entries_count,
                last_seen = peer.last_seen_ms_ago,
                chip = peer_chip,
                status = peer.status.label(),
            );
        }
        format!(
            r#"<table>
  <thead>
    <tr>
      <th>#</th><th>ClientId</th><th>Name</th><th>Prof</th><th>Subgroup</th>
      <th>PluginVer</th><th>Entries</th><th>Last seen (ms)</th><th>Status</th>
    </tr>
  </thead>
  <tbody>{rows}</tbody>
</table>"#
        )
    };

    format!(
        r#"<article class="room">
  <div class="room-header">
    <div>{name} <span class="room-count">{count} client{s}</span></div>
    <span class="chip {chip}">{status}</span>
  </div>
  {body}
</article>"#,
        name = esc_html(&room.room),
        count = room.peers.len(),
        s = plural(room.peers.len()),
        chip = chip_class,
        status = room.status.label(),
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::StatusReport;
    use std::collections::HashMap;

    #[test]
    fn test_esc_html_escapes_markup() {
        // given / when:
        let escaped = esc_html(r#"<script>alert("x&'y")</script>"#);

        // then:
        assert_eq!(
            escaped,
            "&lt;script&gt;alert(&quot;x&amp;&#39;y&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_esc_html_leaves_plain_text_alone() {
        // given / when / then:
        assert_eq!(esc_html("spirit 1"), "spirit 1");
    }

    #[test]
    fn test_empty_report_renders_waiting_latency() {
        // given:
        let report = StatusReport::build(&HashMap::new(), 0);

        // when:
        let page = render_status_page(&report, "2026-01-01 00:00");

        // then:
        assert!(page.contains("waiting for clients"));
        assert!(page.contains("(no clients connected)"));
        assert!(page.contains("2026-01-01 00:00"));
    }

    #[test]
    fn test_room_with_hostile_name_is_escaped() {
        // given:
        let mut rooms = HashMap::new();
        rooms.insert("<bags>".to_string(), HashMap::new());
        let report = StatusReport::build(&rooms, 0);

        // when:
        let page = render_status_page(&report, "2026-01-01 00:00");

        // then:
        assert!(page.contains("&lt;bags&gt;"));
        assert!(!page.contains("<bags>"));
    }
}
