use crate::pollution_index::{HIGH_THRESHOLD, MODERATE_THRESHOLD, VERY_HIGH_THRESHOLD};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use groundwatch_schemas::{
    alert::{Alert, AlertSeverity},
    calculation::CalculationRecord,
    project::Project,
    sample::WaterSample,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Samples above this index count as high-risk in regional analytics.
const REGIONAL_HIGH_RISK_THRESHOLD: f64 = 200.0;
/// Number of samples at each end of a project's history compared to detect a trend.
const TREND_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The `days` days up to and including `end`, reaching back no further than `NaiveDate::MIN`.
    pub fn last_days(end: NaiveDate, days: u32) -> Self {
        Self {
            start: days_before(end, i64::from(days)).unwrap_or(NaiveDate::MIN),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyzedSample<'a> {
    pub sample: &'a WaterSample,
    pub calculation: Option<&'a CalculationRecord>,
}

impl AnalyzedSample<'_> {
    pub fn hmpi(&self) -> Option<f64> {
        self.calculation.map(|c| c.hmpi_value)
    }
}

/// A project with its samples (oldest first) joined to their latest calculation.
#[derive(Debug, Clone)]
pub struct ProjectSamples<'a> {
    pub project: &'a Project,
    pub samples: Vec<AnalyzedSample<'a>>,
}

impl<'a> ProjectSamples<'a> {
    pub fn analyzed(&self) -> impl Iterator<Item = &AnalyzedSample<'a>> + '_ {
        self.samples.iter().filter(|s| s.calculation.is_some())
    }

    fn hmpi_values(&self) -> Vec<f64> {
        self.analyzed().filter_map(|s| s.hmpi()).collect()
    }
}

/// Joins projects, samples and latest calculations, keeping samples inside `window`.
///
/// Every project is returned, including those left without samples.
pub fn group_by_project<'a>(
    projects: &'a [Project],
    samples: &'a [WaterSample],
    latest: &'a HashMap<String, CalculationRecord>,
    window: Option<DateWindow>,
) -> Vec<ProjectSamples<'a>> {
    projects
        .iter()
        .map(|project| {
            let mut project_samples: Vec<AnalyzedSample<'a>> = samples
                .iter()
                .filter(|s| s.project_id == project.project_id)
                .filter(|s| window.map_or(true, |w| w.contains(s.collection_date)))
                .map(|sample| AnalyzedSample {
                    sample,
                    calculation: latest.get(&sample.sample_id),
                })
                .collect();
            project_samples.sort_by_key(|s| (s.sample.collection_date, s.sample.collection_time));
            ProjectSamples {
                project,
                samples: project_samples,
            }
        })
        .collect()
}

fn days_before(end: NaiveDate, days: i64) -> Option<NaiveDate> {
    end.checked_sub_signed(Duration::days(days))
}

/// Dates `days, days - step, ..., 0` days before `end`, oldest first, with
/// `step = ceil(days / points)`. Offsets reaching past `NaiveDate::MIN` are dropped.
fn stepped_dates(end: NaiveDate, days: u32, points: u32) -> Vec<NaiveDate> {
    let step = i64::from(days.div_ceil(points).max(1));
    let mut dates = Vec::new();
    let mut offset = i64::from(days);
    while offset >= 0 {
        if let Some(date) = days_before(end, offset) {
            dates.push(date);
        }
        offset -= step;
    }
    dates
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// --- Project reports ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContaminationTrend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub project_name: String,
    pub location: String,
    pub sample_count: usize,
    pub avg_hmpi: f64,
    pub max_hmpi: f64,
    pub min_hmpi: f64,
    pub contamination_trend: ContaminationTrend,
    pub last_updated: Option<DateTime<Utc>>,
    pub parameters_analyzed: Vec<String>,
}

/// Compares the mean of the newest samples against the mean of the oldest ones.
pub fn contamination_trend(values: &[f64]) -> ContaminationTrend {
    let older = &values[..values.len().min(TREND_WINDOW)];
    let recent = &values[values.len().saturating_sub(TREND_WINDOW)..];
    let (older_avg, recent_avg) = (mean(older), mean(recent));

    if recent_avg > older_avg * 1.1 {
        ContaminationTrend::Increasing
    } else if recent_avg < older_avg * 0.9 {
        ContaminationTrend::Decreasing
    } else {
        ContaminationTrend::Stable
    }
}

fn parameters_analyzed(samples: &[AnalyzedSample<'_>]) -> Vec<String> {
    let checks: [(&str, fn(&WaterSample) -> bool); 5] = [
        ("pH", |s| s.ph_level.is_some()),
        ("Turbidity", |s| s.turbidity.is_some()),
        ("Dissolved Oxygen", |s| s.dissolved_oxygen.is_some()),
        ("Temperature", |s| s.temperature_celsius.is_some()),
        ("Conductivity", |s| s.conductivity.is_some()),
    ];
    checks
        .iter()
        .filter(|(_, present)| samples.iter().any(|s| present(s.sample)))
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn summarize_project(group: &ProjectSamples<'_>) -> ProjectSummary {
    let values = group.hmpi_values();
    let last_updated = group
        .analyzed()
        .filter_map(|s| s.calculation.map(|c| c.calculated_at))
        .max();
    let (max_hmpi, min_hmpi) = if values.is_empty() {
        (0.0, 0.0)
    } else {
        (
            values.iter().copied().fold(f64::MIN, f64::max),
            values.iter().copied().fold(f64::MAX, f64::min),
        )
    };

    ProjectSummary {
        project_id: group.project.project_id.clone(),
        project_name: group.project.name.clone(),
        location: group.project.location.clone(),
        sample_count: values.len(),
        avg_hmpi: mean(&values),
        max_hmpi,
        min_hmpi,
        contamination_trend: contamination_trend(&values),
        last_updated,
        parameters_analyzed: parameters_analyzed(&group.samples),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub avg_hmpi: f64,
    pub samples: usize,
}

/// Average HMPI on evenly spaced days across the last `days` days.
///
/// Roughly ten points are sampled; days without analysed samples are left out.
pub fn daily_trend(groups: &[ProjectSamples<'_>], end: NaiveDate, days: u32) -> Vec<TrendPoint> {
    stepped_dates(end, days, 10)
        .into_iter()
        .filter_map(|date| {
            let values: Vec<f64> = groups
                .iter()
                .flat_map(|g| g.analyzed())
                .filter(|s| s.sample.collection_date == date)
                .filter_map(|s| s.hmpi())
                .collect();
            (!values.is_empty()).then(|| TrendPoint {
                date,
                avg_hmpi: mean(&values),
                samples: values.len(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_projects: usize,
    pub total_samples: usize,
    pub average_hmpi: f64,
    pub high_risk_projects: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterQualityReport {
    pub generated_at: DateTime<Utc>,
    pub timeframe: String,
    pub project_filter: String,
    pub summary: ReportSummary,
    pub detailed_analysis: Vec<ProjectSummary>,
    pub trend_data: Vec<TrendPoint>,
}

/// Builds the water quality report over projects that have samples in the window.
///
/// `groups` must already be restricted to the reporting window.
pub fn water_quality_report(
    groups: &[ProjectSamples<'_>],
    project_filter: Option<&str>,
    end: NaiveDate,
    days: u32,
    generated_at: DateTime<Utc>,
) -> WaterQualityReport {
    let selected: Vec<ProjectSamples<'_>> = groups
        .iter()
        .filter(|g| !g.samples.is_empty())
        .filter(|g| project_filter.map_or(true, |id| g.project.project_id == id))
        .cloned()
        .collect();

    let detailed_analysis: Vec<ProjectSummary> = selected.iter().map(summarize_project).collect();
    let averages: Vec<f64> = detailed_analysis.iter().map(|p| p.avg_hmpi).collect();

    let summary = ReportSummary {
        total_projects: detailed_analysis.len(),
        total_samples: detailed_analysis.iter().map(|p| p.sample_count).sum(),
        average_hmpi: mean(&averages),
        high_risk_projects: detailed_analysis
            .iter()
            .filter(|p| p.avg_hmpi > HIGH_THRESHOLD)
            .count(),
    };

    WaterQualityReport {
        generated_at,
        timeframe: format!("{} days", days),
        project_filter: project_filter.unwrap_or("all").to_string(),
        summary,
        detailed_analysis,
        trend_data: daily_trend(&selected, end, days),
    }
}

// --- Compliance ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCompliance {
    pub project_name: String,
    pub location: String,
    pub total_samples: usize,
    pub compliant_samples: usize,
    pub non_compliant_samples: usize,
    pub compliance_rate: f64,
    pub critical_violations: usize,
    pub last_assessment: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub generated_at: DateTime<Utc>,
    pub region: String,
    pub overall_compliance_rate: f64,
    pub total_projects: usize,
    pub total_samples: usize,
    pub compliant_samples: usize,
    pub non_compliant_samples: usize,
    pub critical_violations: usize,
    pub projects: Vec<ProjectCompliance>,
}

pub fn project_compliance(group: &ProjectSamples<'_>) -> ProjectCompliance {
    let values = group.hmpi_values();
    let compliant = values.iter().filter(|v| **v <= MODERATE_THRESHOLD).count();

    ProjectCompliance {
        project_name: group.project.name.clone(),
        location: group.project.location.clone(),
        total_samples: values.len(),
        compliant_samples: compliant,
        non_compliant_samples: values.len() - compliant,
        compliance_rate: percentage(compliant, values.len()),
        critical_violations: values.iter().filter(|v| **v > VERY_HIGH_THRESHOLD).count(),
        last_assessment: group
            .analyzed()
            .filter_map(|s| s.calculation.map(|c| c.calculated_at))
            .max(),
    }
}

/// Compliance of every project whose location contains `region` (case-insensitive).
pub fn compliance_report(
    groups: &[ProjectSamples<'_>],
    region: Option<&str>,
    generated_at: DateTime<Utc>,
) -> ComplianceReport {
    let needle = region.map(str::to_lowercase);
    let projects: Vec<ProjectCompliance> = groups
        .iter()
        .filter(|g| {
            needle
                .as_deref()
                .map_or(true, |n| g.project.location.to_lowercase().contains(n))
        })
        .map(project_compliance)
        .collect();

    let total_samples = projects.iter().map(|p| p.total_samples).sum();
    let compliant_samples = projects.iter().map(|p| p.compliant_samples).sum();

    ComplianceReport {
        generated_at,
        region: region.unwrap_or("all").to_string(),
        overall_compliance_rate: percentage(compliant_samples, total_samples),
        total_projects: projects.len(),
        total_samples,
        compliant_samples,
        non_compliant_samples: projects.iter().map(|p| p.non_compliant_samples).sum(),
        critical_violations: projects.iter().map(|p| p.critical_violations).sum(),
        projects,
    }
}

// --- Regional analytics ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalAnalytics {
    pub region: String,
    pub total_projects: usize,
    pub total_samples: usize,
    pub compliant_samples: usize,
    pub high_risk_samples: usize,
    pub compliance_rate: f64,
    pub risk_level: RiskLevel,
    pub trend: ComplianceTrend,
}

pub fn risk_level(compliance_rate: f64) -> RiskLevel {
    if compliance_rate >= 80.0 {
        RiskLevel::Low
    } else if compliance_rate >= 60.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

pub fn compliance_trend(compliance_rate: f64) -> ComplianceTrend {
    if compliance_rate >= 75.0 {
        ComplianceTrend::Improving
    } else if compliance_rate >= 50.0 {
        ComplianceTrend::Stable
    } else {
        ComplianceTrend::Declining
    }
}

/// Groups projects with samples by region, sorted by region name.
pub fn regional_analytics(groups: &[ProjectSamples<'_>]) -> Vec<RegionalAnalytics> {
    let mut by_region: BTreeMap<&str, Vec<&ProjectSamples<'_>>> = BTreeMap::new();
    for group in groups.iter().filter(|g| !g.samples.is_empty()) {
        by_region.entry(group.project.region()).or_default().push(group);
    }

    by_region
        .into_iter()
        .map(|(region, members)| {
            let values: Vec<f64> = members.iter().flat_map(|g| g.hmpi_values()).collect();
            let compliant = values.iter().filter(|v| **v <= MODERATE_THRESHOLD).count();
            let rate = percentage(compliant, values.len());
            RegionalAnalytics {
                region: region.to_string(),
                total_projects: members.len(),
                total_samples: values.len(),
                compliant_samples: compliant,
                high_risk_samples: values
                    .iter()
                    .filter(|v| **v > REGIONAL_HIGH_RISK_THRESHOLD)
                    .count(),
                compliance_rate: rate,
                risk_level: risk_level(rate),
                trend: compliance_trend(rate),
            }
        })
        .collect()
}

pub fn risk_distribution(regions: &[RegionalAnalytics]) -> BTreeMap<RiskLevel, usize> {
    let mut counts = BTreeMap::from([(RiskLevel::Low, 0), (RiskLevel::Medium, 0), (RiskLevel::High, 0)]);
    for region in regions {
        *counts.entry(region.risk_level).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompliancePoint {
    pub date: NaiveDate,
    pub compliance_rate: f64,
    pub projects: usize,
}

/// Average project compliance on evenly spaced days across the last `days` days.
///
/// About twelve points are sampled. A point covers the projects with a sample
/// collected that day, each contributing its compliance rate over the window.
pub fn compliance_over_time(
    groups: &[ProjectSamples<'_>],
    end: NaiveDate,
    days: u32,
) -> Vec<CompliancePoint> {
    stepped_dates(end, days, 12)
        .into_iter()
        .filter_map(|date| {
            let rates: Vec<f64> = groups
                .iter()
                .filter(|g| g.samples.iter().any(|s| s.sample.collection_date == date))
                .map(|g| project_compliance(g).compliance_rate)
                .collect();
            (!rates.is_empty()).then(|| CompliancePoint {
                date,
                compliance_rate: mean(&rates),
                projects: rates.len(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBand {
    pub name: String,
    pub count: usize,
}

/// Buckets index values into the quality bands used on trend charts.
pub fn hmpi_distribution(values: &[f64]) -> Vec<DistributionBand> {
    let bands: [(&str, f64); 4] = [
        ("Excellent (0-50)", 50.0),
        ("Good (51-100)", 100.0),
        ("Moderate (101-200)", 200.0),
        ("Poor (201-300)", 300.0),
    ];
    let mut counts = vec![0usize; bands.len() + 1];
    for value in values {
        let slot = bands
            .iter()
            .position(|(_, upper)| *value <= *upper)
            .unwrap_or(bands.len());
        counts[slot] += 1;
    }

    bands
        .iter()
        .map(|(name, _)| *name)
        .chain(std::iter::once("Very Poor (>300)"))
        .zip(counts)
        .map(|(name, count)| DistributionBand {
            name: name.to_string(),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn of(date: NaiveDate) -> Self {
        match date.month() {
            1..=3 | 12 => Season::Winter,
            4..=6 => Season::Spring,
            7..=9 => Season::Summer,
            _ => Season::Autumn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalAverage {
    pub season: Season,
    pub avg_hmpi: f64,
    pub samples: usize,
}

pub fn seasonal_averages(groups: &[ProjectSamples<'_>]) -> Vec<SeasonalAverage> {
    let mut by_season: BTreeMap<Season, Vec<f64>> = BTreeMap::new();
    for sample in groups.iter().flat_map(|g| g.analyzed()) {
        if let Some(value) = sample.hmpi() {
            by_season
                .entry(Season::of(sample.sample.collection_date))
                .or_default()
                .push(value);
        }
    }
    by_season
        .into_iter()
        .map(|(season, values)| SeasonalAverage {
            season,
            avg_hmpi: mean(&values),
            samples: values.len(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub timeframe: String,
    pub average_compliance: f64,
    pub regions: Vec<RegionalAnalytics>,
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub hmpi_distribution: Vec<DistributionBand>,
    pub seasonal: Vec<SeasonalAverage>,
    pub compliance_trend: Vec<CompliancePoint>,
}

/// Analytics over `groups`, which must already be restricted to the `days` days ending at `end`.
pub fn analytics_report(
    groups: &[ProjectSamples<'_>],
    end: NaiveDate,
    days: u32,
    generated_at: DateTime<Utc>,
) -> AnalyticsReport {
    let regions = regional_analytics(groups);
    let rates: Vec<f64> = regions.iter().map(|r| r.compliance_rate).collect();
    let values: Vec<f64> = groups.iter().flat_map(|g| g.hmpi_values()).collect();

    AnalyticsReport {
        generated_at,
        timeframe: format!("{} days", days),
        average_compliance: mean(&rates),
        risk_distribution: risk_distribution(&regions),
        regions,
        hmpi_distribution: hmpi_distribution(&values),
        seasonal: seasonal_averages(groups),
        compliance_trend: compliance_over_time(groups, end, days),
    }
}

// --- Dashboard ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub total_projects: usize,
    pub total_samples: usize,
    pub analyzed_samples: usize,
    pub high_risk_sites: usize,
    pub critical_alerts: usize,
    pub compliance_rate: f64,
    pub projects_by_region: BTreeMap<String, usize>,
}

/// Headline figures: high-risk sites are analysed samples above the alert threshold.
pub fn dashboard_overview(
    projects: &[Project],
    samples: &[WaterSample],
    latest: &HashMap<String, CalculationRecord>,
    alerts: &[Alert],
) -> DashboardOverview {
    let analyzed: Vec<f64> = samples
        .iter()
        .filter_map(|s| latest.get(&s.sample_id).map(|c| c.hmpi_value))
        .collect();
    let high_risk_sites = analyzed.iter().filter(|v| **v > HIGH_THRESHOLD).count();

    let mut projects_by_region = BTreeMap::new();
    for project in projects {
        *projects_by_region
            .entry(project.region().to_string())
            .or_insert(0) += 1;
    }

    DashboardOverview {
        total_projects: projects.len(),
        total_samples: samples.len(),
        analyzed_samples: analyzed.len(),
        high_risk_sites,
        critical_alerts: alerts
            .iter()
            .filter(|a| !a.resolved && a.severity == AlertSeverity::Critical)
            .count(),
        compliance_rate: percentage(analyzed.len() - high_risk_sites, analyzed.len()),
        projects_by_region,
    }
}
