//! History aggregation over persisted analysis records.
//!
//! Records arrive in arbitrary order from the persistence collaborator and
//! may carry malformed summaries; every statistic below is defined over
//! exactly the records where its inputs parsed, while `total` and the
//! activity window always cover the full set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::risk::RiskTier;
use crate::summary::{parse_summary, ParsedSummary};
use crate::types::{DbId, Score, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of entries in the top-suspicion and top-user rankings.
pub const TOP_RANKING_SIZE: usize = 5;

/// Number of bins in the fusion score histogram (0.1 per bin).
pub const FUSION_HISTOGRAM_BINS: usize = 10;

/// Trailing activity windows, in days.
pub const WEEK_WINDOW_DAYS: i64 = 7;
pub const MONTH_WINDOW_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One persisted analysis event, immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub created_at: Timestamp,
    pub filename: String,
    pub file_size_bytes: Option<i64>,
    pub mime_type: Option<String>,
    /// Compact encoded scores, see [`crate::summary`].
    pub summary: String,
}

// ---------------------------------------------------------------------------
// Derived statistics
// ---------------------------------------------------------------------------

/// Mean and contributing-record count for one summary field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FieldStat {
    pub count: usize,
    /// Absent when no record contributed.
    pub mean: Option<Score>,
}

/// Per-field means, each counted independently: a record missing `ai`
/// still contributes to `manip` when that field parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModuleAverages {
    pub ai: FieldStat,
    pub manip: FieldStat,
    pub patch: FieldStat,
    pub meta: FieldStat,
    pub fusion: FieldStat,
}

/// Record counts per risk tier, bucketed on the parsed `fusion` score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub low: usize,
    pub mid: usize,
    pub high: usize,
}

impl TierCounts {
    fn record(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::Low => self.low += 1,
            RiskTier::Mid => self.mid += 1,
            RiskTier::High => self.high += 1,
        }
    }
}

/// One point of the suspicion-over-time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub created_at: Timestamp,
    pub fusion: Score,
}

/// One entry of the top-suspicion ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    pub id: DbId,
    pub filename: String,
    pub created_at: Timestamp,
    pub fusion: Score,
}

/// Descriptive statistics over one user's history. Never persisted;
/// recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    /// All records, including those whose summary did not parse.
    pub total: usize,
    /// Earliest `created_at` over all records.
    pub first_activity: Timestamp,
    /// Latest `created_at` over all records.
    pub last_activity: Timestamp,
    pub averages: ModuleAverages,
    pub tiers: TierCounts,
    /// Ascending by creation time; ties keep input order.
    pub timeline: Vec<TimelinePoint>,
    /// Descending by fusion score, at most [`TOP_RANKING_SIZE`] entries;
    /// ties keep input order.
    pub top_suspicious: Vec<RankedRecord>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate a user's records into [`AggregateStats`].
///
/// Returns `None` for an empty collection so callers can distinguish "no
/// data yet" from statistics that computed to zero.
pub fn aggregate(records: &[HistoryRecord]) -> Option<AggregateStats> {
    let first = records.first()?;

    let mut first_activity = first.created_at;
    let mut last_activity = first.created_at;
    let mut accumulator = Accumulator::default();
    let mut tiers = TierCounts::default();
    let mut timeline = Vec::new();
    let mut ranked = Vec::new();

    for record in records {
        first_activity = first_activity.min(record.created_at);
        last_activity = last_activity.max(record.created_at);

        let parsed = parse_summary(&record.summary);
        accumulator.add(&parsed);

        if let Some(fusion) = parsed.fusion {
            tiers.record(RiskTier::from_score(fusion));
            timeline.push(TimelinePoint {
                created_at: record.created_at,
                fusion,
            });
            ranked.push(RankedRecord {
                id: record.id,
                filename: record.filename.clone(),
                created_at: record.created_at,
                fusion,
            });
        }
    }

    // Stable sorts: equal keys keep input order.
    timeline.sort_by_key(|point| point.created_at);
    ranked.sort_by(|a, b| {
        b.fusion
            .partial_cmp(&a.fusion)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(TOP_RANKING_SIZE);

    Some(AggregateStats {
        total: records.len(),
        first_activity,
        last_activity,
        averages: accumulator.finish(),
        tiers,
        timeline,
        top_suspicious: ranked,
    })
}

// ---------------------------------------------------------------------------
// Cross-user overview
// ---------------------------------------------------------------------------

/// Record counts over the full set and trailing windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityCounts {
    pub total: usize,
    pub last_week: usize,
    pub last_month: usize,
}

/// One entry of the ranking of users by analysis volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserVolume {
    pub user_id: DbId,
    pub records: usize,
}

/// Administrative statistics over all users' records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewStats {
    pub activity: ActivityCounts,
    pub averages: ModuleAverages,
    pub tiers: TierCounts,
    /// Fusion scores bucketed into [`FUSION_HISTOGRAM_BINS`] bins of 0.1,
    /// with 1.0 landing in the last bin.
    pub fusion_bins: [usize; FUSION_HISTOGRAM_BINS],
    /// Descending by record count, ties by ascending user id, at most
    /// [`TOP_RANKING_SIZE`] entries. Records without a user are skipped.
    pub top_users_by_volume: Vec<UserVolume>,
}

/// Compute the cross-user overview at an explicit reference time.
///
/// `now` anchors the trailing 7- and 30-day windows; passing it in keeps
/// the function pure and the windows reproducible in tests.
pub fn overview(records: &[HistoryRecord], now: Timestamp) -> Option<OverviewStats> {
    if records.is_empty() {
        return None;
    }

    let week_cutoff = now - chrono::Duration::days(WEEK_WINDOW_DAYS);
    let month_cutoff = now - chrono::Duration::days(MONTH_WINDOW_DAYS);

    let mut activity = ActivityCounts {
        total: records.len(),
        ..Default::default()
    };
    let mut accumulator = Accumulator::default();
    let mut tiers = TierCounts::default();
    let mut fusion_bins = [0usize; FUSION_HISTOGRAM_BINS];
    let mut per_user: HashMap<DbId, usize> = HashMap::new();

    for record in records {
        if record.created_at >= week_cutoff {
            activity.last_week += 1;
        }
        if record.created_at >= month_cutoff {
            activity.last_month += 1;
        }
        if let Some(user_id) = record.user_id {
            *per_user.entry(user_id).or_insert(0) += 1;
        }

        let parsed = parse_summary(&record.summary);
        accumulator.add(&parsed);

        if let Some(fusion) = parsed.fusion {
            tiers.record(RiskTier::from_score(fusion));
            let bin = ((fusion * FUSION_HISTOGRAM_BINS as f64).floor() as i64)
                .clamp(0, FUSION_HISTOGRAM_BINS as i64 - 1) as usize;
            fusion_bins[bin] += 1;
        }
    }

    let mut top_users: Vec<UserVolume> = per_user
        .into_iter()
        .map(|(user_id, records)| UserVolume { user_id, records })
        .collect();
    top_users.sort_by(|a, b| b.records.cmp(&a.records).then(a.user_id.cmp(&b.user_id)));
    top_users.truncate(TOP_RANKING_SIZE);

    Some(OverviewStats {
        activity,
        averages: accumulator.finish(),
        tiers,
        fusion_bins,
        top_users_by_volume: top_users,
    })
}

// ---------------------------------------------------------------------------
// Mean accumulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct SumCount {
    sum: f64,
    count: usize,
}

impl SumCount {
    fn add(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn stat(self) -> FieldStat {
        FieldStat {
            count: self.count,
            mean: (self.count > 0).then(|| self.sum / self.count as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    ai: SumCount,
    manip: SumCount,
    patch: SumCount,
    meta: SumCount,
    fusion: SumCount,
}

impl Accumulator {
    fn add(&mut self, parsed: &ParsedSummary) {
        self.ai.add(parsed.ai);
        self.manip.add(parsed.manip);
        self.patch.add(parsed.patch);
        self.meta.add(parsed.meta);
        self.fusion.add(parsed.fusion);
    }

    fn finish(self) -> ModuleAverages {
        ModuleAverages {
            ai: self.ai.stat(),
            manip: self.manip.stat(),
            patch: self.patch.stat(),
            meta: self.meta.stat(),
            fusion: self.fusion.stat(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
