//! This module renders PNG charts from calculated samples.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use groundwatch_core::{
    analysis::ProjectSamples,
    pollution_index::{self, HIGH_THRESHOLD, MODERATE_THRESHOLD, VERY_HIGH_THRESHOLD},
};
use groundwatch_schemas::{sample::WaterSample, standard::StandardsTable};
use plotters::prelude::*;
use std::{fs, path::Path};
use tracing::{info, warn};

/// Draws a contribution chart for every calculated sample and an HMPI timeline
/// for every project with calculated samples. Returns the number of charts written.
pub fn generate_all_plots(
    output_dir: &Path,
    groups: &[ProjectSamples<'_>],
    standards: &StandardsTable,
) -> Result<usize> {
    println!("[Plotting] Generating charts...");
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create plot directory: {:?}", output_dir))?;

    let mut written = 0;
    for group in groups {
        let points: Vec<(NaiveDate, f64)> = group
            .analyzed()
            .filter_map(|s| s.hmpi().map(|v| (s.sample.collection_date, v)))
            .collect();
        if points.is_empty() {
            continue;
        }

        for analyzed in group.analyzed() {
            if plot_metal_contributions(output_dir, analyzed.sample, standards)? {
                written += 1;
            }
        }
        plot_hmpi_timeline(output_dir, &group.project.name, &group.project.project_id, &points)?;
        written += 1;
    }

    if written == 0 {
        println!("[Plotting] Warning: No calculated samples to plot.");
    } else {
        println!("[Plotting] {} charts saved to '{}'.", written, output_dir.display());
    }
    info!(charts = written, "plots generated");
    Ok(written)
}

/// Keeps identifiers usable as file names.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Upper bound of the value axis: always shows the 100% line with some headroom.
fn axis_max(values: impl Iterator<Item = f64>, floor: f64) -> f64 {
    values.fold(floor, f64::max) * 1.1
}

/// Bar chart of each metal's concentration as a percentage of its limit.
///
/// Bars above 100% are drawn red. Returns `false` when no metal had a known limit.
fn plot_metal_contributions(
    output_dir: &Path,
    sample: &WaterSample,
    standards: &StandardsTable,
) -> Result<bool> {
    let result =
        pollution_index::calculate_hmpi(&pollution_index::readings_from_sample(sample), standards);
    if result.contributions.is_empty() {
        warn!(sample = %sample.sample_id, "no metals with known limits, skipping chart");
        return Ok(false);
    }

    let metals: Vec<&String> = result.contributions.keys().collect();
    let values: Vec<f64> = result.contributions.values().copied().collect();
    let y_max = axis_max(values.iter().copied(), 100.0);

    let path = output_dir.join(format!("contributions_{}.png", file_stem(&sample.sample_id)));
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let caption = format!(
        "{}: HMPI {:.2} ({})",
        sample.sample_name, result.index, result.level
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..metals.len()).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Metal")
        .y_desc("Concentration (% of limit)")
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => metals.get(*i).map_or_else(String::new, |m| m.to_string()),
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &value)| {
        let color = if value > 100.0 { RED } else { BLUE };
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), value),
            ],
            color.mix(0.8).filled(),
        );
        bar.set_margin(0, 0, 10, 10);
        bar
    }))?;

    chart
        .draw_series(DashedLineSeries::new(
            vec![
                (SegmentValue::Exact(0), 100.0),
                (SegmentValue::Exact(metals.len()), 100.0),
            ],
            5,
            5,
            (&BLACK).into(),
        ))?
        .label("Permissible limit (100%)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.filled()));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(true)
}

/// Line chart of a project's HMPI values by collection date, with the band thresholds.
fn plot_hmpi_timeline(
    output_dir: &Path,
    project_name: &str,
    project_id: &str,
    points: &[(NaiveDate, f64)],
) -> Result<()> {
    let Some(&(first, _)) = points.first() else {
        return Ok(());
    };
    let offsets: Vec<(i64, f64)> = points
        .iter()
        .map(|(date, value)| ((*date - first).num_days(), *value))
        .collect();
    let span = offsets.last().map_or(1, |(d, _)| (*d).max(1));
    let y_max = axis_max(offsets.iter().map(|(_, v)| *v), MODERATE_THRESHOLD);

    let path = output_dir.join(format!("hmpi_timeline_{}.png", file_stem(project_id)));
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("HMPI Over Time: {}", project_name),
            ("sans-serif", 40).into_font(),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0i64..span, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Collection date")
        .y_desc("HMPI")
        .x_label_formatter(&|d| (first + Duration::days(*d)).format("%Y-%m-%d").to_string())
        .draw()?;

    chart
        .draw_series(LineSeries::new(offsets.iter().copied(), BLUE.stroke_width(2)))?
        .label("HMPI")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.filled()));
    chart.draw_series(
        offsets
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
    )?;

    let thresholds = [
        (MODERATE_THRESHOLD, GREEN, "Moderate (100)"),
        (HIGH_THRESHOLD, MAGENTA, "High (150)"),
        (VERY_HIGH_THRESHOLD, RED, "Very high (300)"),
    ];
    for (threshold, color, label) in thresholds {
        if threshold >= y_max {
            continue;
        }
        chart
            .draw_series(DashedLineSeries::new(
                vec![(0, threshold), (span, threshold)],
                5,
                5,
                (&color).into(),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
