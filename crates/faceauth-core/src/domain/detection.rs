//! Detection domain: known identities, per-face classification, and the
//! summary produced by one detection run.
//!
//! Classification follows the nearest-neighbour rule: a face is attributed
//! to the enrolled identity with the smallest distance, provided that
//! distance is within the tolerance.  Everything else is [`UNKNOWN_LABEL`].

use serde::{Deserialize, Serialize};

/// Label given to a face that matched no enrolled identity.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Pixel rectangle of a face inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    /// Width in pixels; zero for a degenerate box.
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    /// Height in pixels; zero for a degenerate box.
    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }
}

/// A fixed-length face embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceEncoding(pub Vec<f32>);

impl FaceEncoding {
    /// Euclidean distance between two encodings.
    ///
    /// Encodings of different lengths are incomparable and yield
    /// `f64::INFINITY`, which never falls within any tolerance.
    pub fn distance_to(&self, other: &FaceEncoding) -> f64 {
        if self.0.len() != other.0.len() {
            return f64::INFINITY;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| {
                let d = f64::from(*a) - f64::from(*b);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

/// One enrolled person: a label and its reference encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownIdentity {
    pub label: String,
    pub encoding: FaceEncoding,
}

/// The enrolled identities, in enrollment order.
///
/// Distances reported for a face are indexed the same way as this set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnownIdentitySet {
    identities: Vec<KnownIdentity>,
}

impl KnownIdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an identity.  Duplicate labels are allowed.
    pub fn push(&mut self, label: impl Into<String>, encoding: FaceEncoding) {
        self.identities.push(KnownIdentity {
            label: label.into(),
            encoding,
        });
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnownIdentity> {
        self.identities.iter()
    }

    /// Labels in enrollment order.
    pub fn labels(&self) -> Vec<&str> {
        self.identities.iter().map(|i| i.label.as_str()).collect()
    }

    /// Distances from `encoding` to every enrolled identity, in set order.
    pub fn distances_to(&self, encoding: &FaceEncoding) -> Vec<f64> {
        self.identities
            .iter()
            .map(|known| known.encoding.distance_to(encoding))
            .collect()
    }

    /// Classifies one face from its distance vector.
    ///
    /// Picks the smallest distance (the earliest index wins a tie) and returns
    /// that identity's label when the distance is at most `tolerance`, else
    /// [`UNKNOWN_LABEL`].  The best distance is reported in both cases; it is
    /// `None` only when there is nothing to compare against.
    pub fn classify(&self, distances: &[f64], tolerance: f64) -> (String, Option<f64>) {
        let best = distances
            .iter()
            .take(self.identities.len())
            .copied()
            .enumerate()
            .filter(|(_, d)| !d.is_nan())
            .fold(None::<(usize, f64)>, |best, (idx, d)| match best {
                Some((_, current)) if current <= d => best,
                _ => Some((idx, d)),
            });

        match best {
            Some((idx, d)) if d <= tolerance => (self.identities[idx].label.clone(), Some(d)),
            Some((_, d)) => (UNKNOWN_LABEL.to_string(), Some(d)),
            None => (UNKNOWN_LABEL.to_string(), None),
        }
    }
}

impl FromIterator<KnownIdentity> for KnownIdentitySet {
    fn from_iter<T: IntoIterator<Item = KnownIdentity>>(iter: T) -> Self {
        Self {
            identities: iter.into_iter().collect(),
        }
    }
}

/// A face as reported by a detector, before classification.
///
/// `distances[i]` is the distance to the `i`-th identity of the
/// [`KnownIdentitySet`] the detector was given.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceObservation {
    pub bounding_box: BoundingBox,
    pub distances: Vec<f64>,
}

impl FaceObservation {
    /// Builds an observation from a freshly computed embedding.
    pub fn from_encoding(
        bounding_box: BoundingBox,
        encoding: &FaceEncoding,
        known: &KnownIdentitySet,
    ) -> Self {
        Self {
            bounding_box,
            distances: known.distances_to(encoding),
        }
    }
}

/// One classified face in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// The matched identity or [`UNKNOWN_LABEL`].
    #[serde(rename = "name")]
    pub label: String,
    /// Distance to the nearest enrolled identity, if any were enrolled.
    pub distance: Option<f64>,
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
}

impl DetectionResult {
    /// Returns `true` when this face matched an enrolled identity.
    pub fn is_known(&self) -> bool {
        self.label != UNKNOWN_LABEL
    }
}

/// Wire form of one [`LabelCounts`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

/// Per-label match counts that remember the order labels were first seen.
///
/// Serialized as an array of `{"label","count"}` objects so the order
/// survives a JSON round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LabelCount>", into = "Vec<LabelCount>")]
pub struct LabelCounts {
    entries: Vec<(String, u64)>,
}

impl LabelCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to `label`, appending it if this is its first sighting.
    pub fn increment(&mut self, label: &str) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((label.to_string(), 1)),
        }
    }

    /// Count for `label`, zero if never seen.
    pub fn get(&self, label: &str) -> u64 {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, c)| *c)
    }

    /// The label seen first.
    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<LabelCount>> for LabelCounts {
    fn from(counts: Vec<LabelCount>) -> Self {
        let mut merged = LabelCounts::new();
        for LabelCount { label, count } in counts {
            match merged.entries.iter_mut().find(|(l, _)| *l == label) {
                Some((_, c)) => *c += count,
                None => merged.entries.push((label, count)),
            }
        }
        merged
    }
}

impl From<LabelCounts> for Vec<LabelCount> {
    fn from(counts: LabelCounts) -> Self {
        counts
            .entries
            .into_iter()
            .map(|(label, count)| LabelCount { label, count })
            .collect()
    }
}

/// Why a detection run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    StopOnFirstMatch,
    MaxFramesReached,
    Timeout,
    CaptureFailure,
}

/// Detections of one sampled frame, kept when a timeline was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Epoch seconds at which the frame was processed.
    pub ts: f64,
    /// 1-based index of the frame among all captured frames.
    pub frame_index: u64,
    pub detections: Vec<DetectionResult>,
}

/// Outcome of one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSummary {
    /// Frames that reached the detector.
    pub frames_processed: u64,
    /// Recognised labels and their face counts, in order of first sighting.
    pub names_seen: LabelCounts,
    /// Faces classified as [`UNKNOWN_LABEL`].
    pub unknown_frames: u64,
    pub stop_reason: StopReason,
    /// Path of the most recent annotated frame written, if any.
    #[serde(default)]
    pub last_annotated_frame: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEntry>>,
}

impl LoopSummary {
    /// The first identity recognised during the run, in discovery order.
    pub fn first_positive_label(&self) -> Option<&str> {
        self.names_seen.first()
    }

    /// Returns `true` when at least one enrolled identity was recognised.
    pub fn has_match(&self) -> bool {
        !self.names_seen.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn identities(labels: &[&str]) -> KnownIdentitySet {
        let mut set = KnownIdentitySet::new();
        for (i, label) in labels.iter().enumerate() {
            set.push(*label, FaceEncoding(vec![i as f32; 4]));
        }
        set
    }

    #[test]
    fn test_classify_picks_minimum_within_tolerance() {
        // Arrange
        let set = identities(&["alice", "bob", "carol"]);

        // Act
        let (label, distance) = set.classify(&[0.7, 0.35, 0.5], 0.6);

        // Assert
        assert_eq!(label, "bob");
        assert_eq!(distance, Some(0.35));
    }

    #[test]
    fn test_classify_above_tolerance_is_unknown_but_keeps_distance() {
        let set = identities(&["alice"]);
        let (label, distance) = set.classify(&[0.61], 0.6);
        assert_eq!(label, UNKNOWN_LABEL);
        assert_eq!(distance, Some(0.61));
    }

    #[test]
    fn test_classify_exactly_at_tolerance_matches() {
        let set = identities(&["alice"]);
        let (label, _) = set.classify(&[0.6], 0.6);
        assert_eq!(label, "alice");
    }

    #[test]
    fn test_classify_tie_goes_to_earliest_identity() {
        let set = identities(&["alice", "bob"]);
        let (label, _) = set.classify(&[0.4, 0.4], 0.6);
        assert_eq!(label, "alice");
    }

    #[test]
    fn test_classify_with_empty_set_is_unknown_without_distance() {
        let set = KnownIdentitySet::new();
        assert_eq!(set.classify(&[], 0.6), (UNKNOWN_LABEL.to_string(), None));
    }

    #[test]
    fn test_classify_ignores_nan_distances() {
        let set = identities(&["alice", "bob"]);
        let (label, distance) = set.classify(&[f64::NAN, 0.2], 0.6);
        assert_eq!(label, "bob");
        assert_eq!(distance, Some(0.2));
    }

    #[test]
    fn test_encoding_distance_is_euclidean() {
        let a = FaceEncoding(vec![0.0, 0.0]);
        let b = FaceEncoding(vec![3.0, 4.0]);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_encoding_length_mismatch_never_matches() {
        let a = FaceEncoding(vec![0.0]);
        let b = FaceEncoding(vec![0.0, 0.0]);
        assert!(a.distance_to(&b).is_infinite());
    }

    #[test]
    fn test_observation_from_encoding_indexes_like_the_set() {
        let set = identities(&["alice", "bob"]);
        let bbox = BoundingBox { left: 0, top: 0, right: 10, bottom: 10 };
        let obs = FaceObservation::from_encoding(bbox, &FaceEncoding(vec![1.0; 4]), &set);
        assert_eq!(obs.distances.len(), 2);
        assert!(obs.distances[1] < obs.distances[0]);
    }

    #[test]
    fn test_label_counts_preserve_first_sighting_order() {
        // Arrange: bob seen first, alice seen more often afterwards
        let mut counts = LabelCounts::new();

        // Act
        counts.increment("bob");
        counts.increment("alice");
        counts.increment("alice");

        // Assert
        assert_eq!(counts.first(), Some("bob"));
        assert_eq!(counts.get("alice"), 2);
        assert_eq!(counts.get("bob"), 1);
        assert_eq!(counts.get("carol"), 0);
    }

    #[test]
    fn test_label_counts_serialize_as_ordered_array() {
        let mut counts = LabelCounts::new();
        counts.increment("zed");
        counts.increment("amy");
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"[{"label":"zed","count":1},{"label":"amy","count":1}]"#);

        let back: LabelCounts = serde_json::from_str(&json).unwrap();
        assert_eq!(back.first(), Some("zed"));
    }

    #[test]
    fn test_summary_first_positive_label_follows_discovery_order() {
        let mut names_seen = LabelCounts::new();
        names_seen.increment("bob");
        names_seen.increment("alice");
        names_seen.increment("alice");
        let summary = LoopSummary {
            frames_processed: 3,
            names_seen,
            unknown_frames: 0,
            stop_reason: StopReason::MaxFramesReached,
            last_annotated_frame: None,
            timeline: None,
        };

        assert_eq!(summary.first_positive_label(), Some("bob"));
        assert!(summary.has_match());
    }

    #[test]
    fn test_summary_json_uses_snake_case_stop_reason_and_omits_timeline() {
        let summary = LoopSummary {
            frames_processed: 0,
            names_seen: LabelCounts::new(),
            unknown_frames: 0,
            stop_reason: StopReason::CaptureFailure,
            last_annotated_frame: None,
            timeline: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["stop_reason"], "capture_failure");
        assert!(json.get("timeline").is_none());
        assert!(json["last_annotated_frame"].is_null());
    }

    #[test]
    fn test_detection_result_wire_names() {
        let result = DetectionResult {
            label: "alice".to_string(),
            distance: Some(0.3),
            bounding_box: BoundingBox { left: 1, top: 2, right: 3, bottom: 4 },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["name"], "alice");
        assert_eq!(json["box"]["right"], 3);
        assert!(result.is_known());
    }

    #[test]
    fn test_bounding_box_dimensions_clamp_at_zero() {
        let bbox = BoundingBox { left: 10, top: 10, right: 5, bottom: 30 };
        assert_eq!(bbox.width(), 0);
        assert_eq!(bbox.height(), 20);
    }
}
