// firewatch_core/src/coordinator/popups.rs

//! Popup markup for each marker kind. Free text is HTML-escaped.

use crate::hazards::HazardPoint;
use crate::hydrants::Hydrant;
use crate::snapshot::LocationSnapshot;
use crate::types::{Position, Timestamp};

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

pub fn user_location(position: &Position) -> String {
    format!(
        "<div class=\"popup\"><b>Your Location</b>\
         <div>Latitude: {:.6}</div>\
         <div>Longitude: {:.6}</div>\
         <div class=\"muted\">Accuracy: {} meters</div></div>",
        position.latitude(),
        position.longitude(),
        position.accuracy_meters().round()
    )
}

/// `index` is 1-based within the current set.
pub fn fire_incident(index: usize, point: &HazardPoint, distance_meters: f64) -> String {
    format!(
        "<div class=\"popup\"><b>Fire Incident #{index}</b>\
         <div>Status: Active</div>\
         <div>Reported: Just now</div>\
         <div>Severity: {}</div>\
         <div class=\"muted\">Distance: {} meters</div></div>",
        point.severity.label(),
        distance_meters.round()
    )
}

pub fn reported_fire(point: &HazardPoint) -> String {
    format!(
        "<div class=\"popup\"><b>Fire Emergency Reported</b>\
         <div>Status: Emergency Response En Route</div>\
         <div>Reported: {}</div>\
         <div>Priority: HIGH</div>\
         <div class=\"muted\">Coordinates: {:.6}, {:.6}</div></div>",
        point.reported_at.format("%H:%M"),
        point.location.lat,
        point.location.lng
    )
}

pub fn response_team(eta_minutes: u32) -> String {
    format!(
        "<div class=\"popup\"><b>Response Team En Route</b>\
         <div>ETA: {eta_minutes} minutes</div></div>"
    )
}

pub fn hydrant(hydrant: &Hydrant) -> String {
    let condition = if hydrant.is_operational() {
        "Operational"
    } else {
        "Unserviceable"
    };
    format!(
        "<div class=\"popup\"><b>Fire Hydrant</b>\
         <div>Condition: {condition}</div>\
         <div>Pressure: {}</div>\
         <div class=\"muted\">Lat: {:.6}<br>Lng: {:.6}</div></div>",
        hydrant.pressure.label(),
        hydrant.lat,
        hydrant.lng
    )
}

pub fn shared_location(snapshot: &LocationSnapshot, received_at: Timestamp) -> String {
    let age_minutes = received_at
        .signed_duration_since(snapshot.captured_at)
        .num_minutes()
        .max(0);
    format!(
        "<div class=\"popup\"><b>Shared location</b>\
         <div>{}</div>\
         <div>Latitude: {:.6}</div>\
         <div>Longitude: {:.6}</div>\
         <div class=\"muted\">Captured {age_minutes} min ago by {}</div></div>",
        escape_html(&snapshot.approximate_address),
        snapshot.latitude,
        snapshot.longitude,
        escape_html(&snapshot.device_tag)
    )
}
