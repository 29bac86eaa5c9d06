//! Training-curve rendering.
//!
//! Enable with the `plot` feature in Cargo.toml:
//!
//! ```toml
//! [dependencies]
//! avmatch = { version = "0.1", features = ["plot"] }
//! ```

use crate::train::History;
use plotters::prelude::*;
use std::path::Path;

/// Render the accuracy and loss curves of a training run to two PNG files.
///
/// Each chart shows the train and validation series over epochs.
///
/// # Errors
/// Returns `EmptyInput` on an empty history and `Plot` when the backend
/// fails to render or write a file.
pub fn plot_history<P: AsRef<Path>>(
    history: &History,
    accuracy_path: P,
    loss_path: P,
) -> crate::Result<()> {
    draw_curve(
        "model accuracy",
        "accuracy",
        &history.train_accuracy,
        &history.val_accuracy,
        accuracy_path.as_ref(),
    )?;
    draw_curve(
        "model loss",
        "loss",
        &history.train_loss,
        &history.val_loss,
        loss_path.as_ref(),
    )
}

fn draw_curve(
    title: &str,
    y_label: &str,
    train: &[f32],
    validation: &[f32],
    path: &Path,
) -> crate::Result<()> {
    if train.is_empty() || validation.is_empty() {
        return Err(crate::Error::EmptyInput("training history"));
    }
    let epochs = train.len().max(validation.len());
    let y_max = train
        .iter()
        .chain(validation.iter())
        .fold(0.0f32, |acc, &v| acc.max(v));
    let y_top = (y_max * 1.05).max(1e-3);

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(to_plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0..epochs, 0f32..y_top)
        .map_err(to_plot_error)?;

    chart
        .configure_mesh()
        .x_desc("epoch")
        .y_desc(y_label)
        .draw()
        .map_err(to_plot_error)?;

    chart
        .draw_series(LineSeries::new(
            train.iter().enumerate().map(|(i, &v)| (i, v)),
            &BLUE,
        ))
        .map_err(to_plot_error)?
        .label("train")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            validation.iter().enumerate().map(|(i, &v)| (i, v)),
            &RED,
        ))
        .map_err(to_plot_error)?
        .label("validation")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(to_plot_error)?;

    root.present().map_err(to_plot_error)?;
    Ok(())
}

fn to_plot_error<E: std::fmt::Display>(error: E) -> crate::Error {
    crate::Error::Plot(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_history() -> History {
        History {
            train_loss: vec![0.9, 0.5, 0.3],
            train_accuracy: vec![0.5, 0.7, 0.9],
            val_loss: vec![0.95, 0.6, 0.4],
            val_accuracy: vec![0.45, 0.65, 0.85],
            best_epoch: 2,
            best_val_loss: 0.4,
        }
    }

    #[test]
    fn writes_both_curve_files() {
        let dir = std::env::temp_dir();
        let acc = dir.join("avmatch-plot-accuracy.png");
        let loss = dir.join("avmatch-plot-loss.png");
        let _ = std::fs::remove_file(&acc);
        let _ = std::fs::remove_file(&loss);

        match plot_history(&toy_history(), &acc, &loss) {
            Ok(()) => {
                assert!(acc.exists());
                assert!(loss.exists());
            }
            // Headless environments without system fonts cannot rasterize
            // the captions; the error path is still the typed one.
            Err(crate::Error::Plot(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }

        let _ = std::fs::remove_file(&acc);
        let _ = std::fs::remove_file(&loss);
    }

    #[test]
    fn empty_history_is_rejected() {
        let history = History::default();
        let dir = std::env::temp_dir();
        let result = plot_history(
            &history,
            dir.join("avmatch-plot-a.png"),
            dir.join("avmatch-plot-b.png"),
        );
        assert!(matches!(result, Err(crate::Error::EmptyInput(_))));
    }
}
