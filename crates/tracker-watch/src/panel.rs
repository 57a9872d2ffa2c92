//! Text rendering of the tracking panel.

use chrono::{DateTime, Utc};
use tracker_mirror::ClientSimulationMirror;
use tracker_types::{ObjectStatus, heading_degrees};

/// Render the mirror as of `now`, listing at most `max_rows` objects.
///
/// Every line, the last included, ends with a newline.
pub fn render(mirror: &ClientSimulationMirror, now: DateTime<Utc>, max_rows: usize) -> String {
    let counts = mirror.counts(now);
    let header = [
        format!(
            "Tracking {} objects ({} active, {} lost)",
            mirror.len(),
            counts.active,
            counts.lost
        ),
        format!(
            "{:>6} {:>10} {:>10} {:>7} {:>7} {:>8}  {}",
            "ID", "Lat", "Lng", "DirX", "DirY", "Heading", "Status"
        ),
    ];

    let rows = mirror.objects().take(max_rows).map(|tracked| {
        let object = tracked.object();
        let status = match tracked.status(now) {
            ObjectStatus::Active => "ACTIVE",
            ObjectStatus::Lost => "LOST",
        };
        format!(
            "{:>6} {:>10.4} {:>10.4} {:>7.2} {:>7.2} {:>7.1}\u{b0}  {}",
            object.id,
            object.position.lat,
            object.position.lng,
            object.direction.x,
            object.direction.y,
            heading_degrees(&object.direction),
            status
        )
    });

    let hidden = mirror.len().saturating_sub(max_rows);
    let footer = (hidden > 0).then(|| format!("... and {hidden} more"));

    header
        .into_iter()
        .chain(rows)
        .chain(footer)
        .map(|line| line + "\n")
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tracker_mirror::MirrorConfig;
    use tracker_types::{ObjectId, Position, TrackedObject, Vector};

    use super::*;

    fn object(id: u64) -> TrackedObject {
        TrackedObject {
            id: ObjectId(id),
            velocity: 0.5,
            position: Position {
                lat: 50.123_456,
                lng: 15.5,
            },
            direction: Vector { x: 0.0, y: 1.0 },
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn renders_rows_with_fixed_precision() {
        let mut mirror = ClientSimulationMirror::new(&MirrorConfig::default());
        mirror.bootstrap(vec![object(1)], now());

        let panel = render(&mirror, now(), 10);
        assert!(panel.starts_with("Tracking 1 objects (1 active, 0 lost)"));
        assert!(panel.contains("50.1235"));
        assert!(panel.contains("15.5000"));
        assert!(panel.contains("1.00"));
        assert!(panel.contains("90.0\u{b0}"));
        assert!(panel.contains("ACTIVE"));
    }

    #[test]
    fn caps_rows_and_reports_the_rest() {
        let mut mirror = ClientSimulationMirror::new(&MirrorConfig::default());
        mirror.bootstrap((1..=5).map(object).collect(), now());

        let panel = render(&mirror, now(), 2);
        assert_eq!(panel.lines().count(), 5);
        assert!(panel.ends_with("... and 3 more\n"));
    }

    #[test]
    fn empty_mirror_renders_only_the_header() {
        let mirror = ClientSimulationMirror::new(&MirrorConfig::default());

        let panel = render(&mirror, now(), 10);
        let lines: Vec<&str> = panel.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.first().copied(), Some("Tracking 0 objects (0 active, 0 lost)"));
        assert!(panel.ends_with("Status\n"));
        assert!(!panel.contains("more"));
    }
}
