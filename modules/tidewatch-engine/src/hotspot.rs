//! Geographic hotspot aggregation over recent verified reports and
//! high-probability signals.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use tidewatch_common::types::{GeoPoint, HazardType, Hotspot, Severity};
use tidewatch_store::{HotspotStore, ReportStore, SignalStore};

/// Signals below this probability never contribute to hotspots.
const SIGNAL_PROBABILITY_FLOOR: f64 = 0.5;

/// Minimum representative radius so single-point clusters render visibly.
const MIN_RADIUS_KM: f64 = 1.0;

/// One geo-located contribution, from either a report or a signal.
struct Member {
    point: GeoPoint,
    severity: Option<Severity>,
    hazard_types: BTreeSet<HazardType>,
}

pub struct HotspotAggregator {
    reports: Arc<dyn ReportStore>,
    signals: Arc<dyn SignalStore>,
    hotspots: Arc<dyn HotspotStore>,
    radius_km: f64,
    window: Duration,
    ttl: Duration,
}

impl HotspotAggregator {
    pub fn new(
        reports: Arc<dyn ReportStore>,
        signals: Arc<dyn SignalStore>,
        hotspots: Arc<dyn HotspotStore>,
        radius_km: f64,
        window: Duration,
        ttl: Duration,
    ) -> Self {
        Self {
            reports,
            signals,
            hotspots,
            radius_km,
            window,
            ttl,
        }
    }

    /// Recompute hotspots from scratch over the recent window and store
    /// them as a fresh generation. Returns the emitted hotspots.
    ///
    /// The daemon calls this on the report-scan cadence; a surface that
    /// verifies reports should also call it right after a verification so
    /// the new report shows up without waiting for the next scan.
    pub async fn run(&self) -> Result<Vec<Hotspot>> {
        let now = Utc::now();
        let since = now - self.window;

        let mut members = Vec::new();
        for report in self.reports.verified_since(since, Severity::Low).await? {
            members.push(Member {
                point: report.location,
                severity: Some(report.severity),
                hazard_types: BTreeSet::from([report.hazard_type]),
            });
        }
        for signal in self
            .signals
            .recent_signals(since, SIGNAL_PROBABILITY_FLOOR)
            .await?
        {
            let Some(point) = signal.post.location else {
                continue;
            };
            // Keyword tags that name a hazard type become cluster labels;
            // the generic tag does not.
            let hazard_types = signal
                .hazard_keywords
                .iter()
                .filter_map(|tag| HazardType::from_str(tag).ok())
                .collect();
            members.push(Member {
                point,
                severity: None,
                hazard_types,
            });
        }

        let generation = Uuid::new_v4();
        let mut spots = Vec::new();
        for cluster in cluster_single_link(&members, self.radius_km) {
            let center = centroid(&cluster, &members);
            let radius = cluster
                .iter()
                .map(|&i| center.distance_km(&members[i].point))
                .fold(MIN_RADIUS_KM, f64::max);
            let severity = cluster
                .iter()
                .filter_map(|&i| members[i].severity)
                .max()
                .unwrap_or(Severity::Medium);
            let hazard_types: BTreeSet<HazardType> = cluster
                .iter()
                .flat_map(|&i| members[i].hazard_types.iter().copied())
                .collect();

            spots.push(Hotspot::new(
                generation,
                center,
                radius,
                cluster.len() as u32,
                severity,
                hazard_types,
                now,
                now + self.ttl,
            )?);
        }

        self.hotspots
            .replace_generation(generation, spots.clone())
            .await?;

        info!(
            members = members.len(),
            hotspots = spots.len(),
            "Hotspot generation complete"
        );
        Ok(spots)
    }
}

/// Single-link clustering: two members belong to the same cluster when any
/// chain of pairwise distances <= `radius_km` connects them.
fn cluster_single_link(members: &[Member], radius_km: f64) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; members.len()];
    let mut clusters = Vec::new();

    for seed in 0..members.len() {
        if assigned[seed] {
            continue;
        }
        let mut cluster = vec![seed];
        assigned[seed] = true;
        let mut frontier = vec![seed];

        while let Some(current) = frontier.pop() {
            for other in 0..members.len() {
                if assigned[other] {
                    continue;
                }
                if members[current].point.distance_km(&members[other].point) <= radius_km {
                    assigned[other] = true;
                    cluster.push(other);
                    frontier.push(other);
                }
            }
        }
        clusters.push(cluster);
    }
    clusters
}

fn centroid(cluster: &[usize], members: &[Member]) -> GeoPoint {
    let n = cluster.len() as f64;
    GeoPoint {
        lat: cluster.iter().map(|&i| members[i].point.lat).sum::<f64>() / n,
        lng: cluster.iter().map(|&i| members[i].point.lng).sum::<f64>() / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use tidewatch_common::types::{AnalyzedSignal, HazardReport, Platform, Post};
    use tidewatch_store::{MemoryHotspotStore, MemoryReportStore, MemorySignalStore};

    fn report(lat: f64, lng: f64, severity: Severity, hazard: HazardType) -> HazardReport {
        let now = Utc::now();
        HazardReport {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "observed from shore".to_string(),
            description: "water rising fast".to_string(),
            hazard_type: hazard,
            severity,
            location: GeoPoint { lat, lng },
            media_urls: Vec::new(),
            is_verified: true,
            verified_by: Some(Uuid::new_v4()),
            verified_at: Some(now),
            created_at: now,
        }
    }

    fn signal(lat: f64, lng: f64, probability: f64, tag: &str) -> AnalyzedSignal {
        AnalyzedSignal {
            id: Uuid::new_v4(),
            post: Post {
                platform: Platform::Twitter,
                external_id: Uuid::new_v4().to_string(),
                content: "waves over the road".to_string(),
                author: None,
                location: Some(GeoPoint { lat, lng }),
                engagement: HashMap::new(),
                created_at: Utc::now(),
            },
            hazard_keywords: BTreeSet::from([tag.to_string()]),
            sentiment_score: -0.5,
            hazard_probability: probability,
            processed_at: Utc::now(),
        }
    }

    async fn make_aggregator() -> (
        Arc<MemoryReportStore>,
        Arc<MemorySignalStore>,
        Arc<MemoryHotspotStore>,
        HotspotAggregator,
    ) {
        let reports = Arc::new(MemoryReportStore::new());
        let signals = Arc::new(MemorySignalStore::new());
        let hotspots = Arc::new(MemoryHotspotStore::new());
        let aggregator = HotspotAggregator::new(
            reports.clone(),
            signals.clone(),
            hotspots.clone(),
            5.0,
            Duration::hours(24),
            Duration::hours(6),
        );
        (reports, signals, hotspots, aggregator)
    }

    // Roughly 0.01 degrees latitude is 1.11 km.
    const KM_PER_LAT_DEGREE: f64 = 111.0;

    #[tokio::test]
    async fn chained_points_form_one_cluster() {
        let (reports, _, _, aggregator) = make_aggregator().await;
        // Three points in a 4 km chain: ends are 8 km apart but linked
        // through the middle.
        let step = 4.0 / KM_PER_LAT_DEGREE;
        reports
            .upsert(report(13.0, 80.2, Severity::Medium, HazardType::HighWaves))
            .await
            .unwrap();
        reports
            .upsert(report(13.0 + step, 80.2, Severity::High, HazardType::HighWaves))
            .await
            .unwrap();
        reports
            .upsert(report(13.0 + 2.0 * step, 80.2, Severity::Low, HazardType::Flooding))
            .await
            .unwrap();

        let spots = aggregator.run().await.unwrap();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].report_count, 3);
        assert_eq!(spots[0].severity, Severity::High);
        assert!(spots[0].hazard_types.contains(&HazardType::HighWaves));
        assert!(spots[0].hazard_types.contains(&HazardType::Flooding));
    }

    #[tokio::test]
    async fn distant_points_split_into_clusters() {
        let (reports, _, _, aggregator) = make_aggregator().await;
        reports
            .upsert(report(13.0, 80.2, Severity::Medium, HazardType::HighWaves))
            .await
            .unwrap();
        // Chennai vs Mumbai, far beyond any radius.
        reports
            .upsert(report(19.0, 72.8, Severity::Medium, HazardType::StormSurge))
            .await
            .unwrap();

        let spots = aggregator.run().await.unwrap();
        assert_eq!(spots.len(), 2);
    }

    #[tokio::test]
    async fn signals_contribute_without_driving_severity() {
        let (_, signals, _, aggregator) = make_aggregator().await;
        signals
            .insert_if_absent(signal(13.0, 80.2, 0.8, "tsunami"))
            .await
            .unwrap();
        signals
            .insert_if_absent(signal(13.001, 80.2, 0.7, "general_hazard"))
            .await
            .unwrap();
        // Below the probability floor; must not appear.
        signals
            .insert_if_absent(signal(13.0, 80.2, 0.3, "tsunami"))
            .await
            .unwrap();

        let spots = aggregator.run().await.unwrap();
        assert_eq!(spots.len(), 1);
        assert_eq!(spots[0].report_count, 2);
        assert_eq!(spots[0].severity, Severity::Medium);
        assert_eq!(
            spots[0].hazard_types,
            BTreeSet::from([HazardType::Tsunami])
        );
    }

    #[tokio::test]
    async fn single_point_gets_floor_radius() {
        let (reports, _, _, aggregator) = make_aggregator().await;
        reports
            .upsert(report(13.0, 80.2, Severity::High, HazardType::Tsunami))
            .await
            .unwrap();

        let spots = aggregator.run().await.unwrap();
        assert_eq!(spots.len(), 1);
        assert!((spots[0].radius_km - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn empty_window_emits_nothing_and_preserves_previous() {
        let (reports, _, hotspots, aggregator) = make_aggregator().await;
        reports
            .upsert(report(13.0, 80.2, Severity::High, HazardType::Tsunami))
            .await
            .unwrap();
        assert_eq!(aggregator.run().await.unwrap().len(), 1);

        // Second run over an empty store (simulated by a fresh aggregator
        // sharing the hotspot store): nothing emitted, old spot still live.
        let empty = HotspotAggregator::new(
            Arc::new(MemoryReportStore::new()),
            Arc::new(MemorySignalStore::new()),
            hotspots.clone(),
            5.0,
            Duration::hours(24),
            Duration::hours(6),
        );
        assert!(empty.run().await.unwrap().is_empty());
        assert_eq!(hotspots.active_hotspots(Utc::now()).await.unwrap().len(), 1);
    }

    #[test]
    fn centroid_is_member_mean() {
        let members = vec![
            Member {
                point: GeoPoint { lat: 10.0, lng: 80.0 },
                severity: None,
                hazard_types: BTreeSet::new(),
            },
            Member {
                point: GeoPoint { lat: 12.0, lng: 82.0 },
                severity: None,
                hazard_types: BTreeSet::new(),
            },
        ];
        let c = centroid(&[0, 1], &members);
        assert!((c.lat - 11.0).abs() < 1e-9);
        assert!((c.lng - 81.0).abs() < 1e-9);
    }
}
