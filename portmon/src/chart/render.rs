use super::ViewRange;
use crate::data::Snapshot;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

/// Render the two series to a PNG at `path`.
///
/// Samples are plotted against their arrival index with the arrival
/// timestamps as x labels, temperature in blue and humidity in red. An
/// empty snapshot renders the degenerate point (0, 0) for both series
/// so the axes still come out.
pub fn save_chart(
    snapshot: &Snapshot,
    view: &ViewRange,
    size: (u32, u32),
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let n = snapshot.len();
    let x_max = if n > 1 { (n - 1) as f64 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption("Temperature and Humidity", ("sans-serif", 36).into_font())
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, view.y_min()..view.y_max())?;

    let stamps = &snapshot.timestamps;
    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Value")
        .axis_desc_style(("sans-serif", 24))
        .x_labels(n.clamp(2, 10))
        .x_label_formatter(&|x| {
            let i = x.round();
            if i < 0.0 {
                return String::new();
            }
            stamps.get(i as usize).cloned().unwrap_or_default()
        })
        .draw()?;

    if n == 0 {
        chart.draw_series(LineSeries::new([(0.0, 0.0)], &BLUE))?;
        chart.draw_series(LineSeries::new([(0.0, 0.0)], &RED))?;
    } else {
        chart
            .draw_series(LineSeries::new(
                snapshot
                    .temperatures
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| (i as f64, v)),
                &BLUE,
            ))?
            .label("Temperature (C)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
        chart
            .draw_series(LineSeries::new(
                snapshot
                    .humidities
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| (i as f64, v)),
                &RED,
            ))?
            .label("Humidity (%)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::artifact_name;

    // Rendering text needs a system font, which not every build host
    // has; run with --ignored where one is available.
    #[test]
    #[ignore = "needs a system font for the chart text"]
    fn renders_a_png_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(artifact_name(chrono::Local::now()));
        let snapshot = Snapshot {
            timestamps: vec!["10:00:00".to_string(), "10:00:01".to_string()],
            temperatures: vec![23.5, 24.0],
            humidities: vec![41.2, 40.8],
        };
        save_chart(&snapshot, &ViewRange::default(), (800, 400), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    #[ignore = "needs a system font for the chart text"]
    fn renders_axes_for_an_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        save_chart(&Snapshot::default(), &ViewRange::default(), (800, 400), &path).unwrap();
        assert!(path.exists());
    }
}
