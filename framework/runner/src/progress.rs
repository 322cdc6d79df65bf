use std::cmp::min;
use std::fmt::Write;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use loadcheck_core::prelude::DelegatedShutdownListener;

/// Display a progress bar while the run is going to show how long is left.
pub(crate) fn start_progress(planned_runtime: Duration, mut shutdown_listener: DelegatedShutdownListener) {
    let spawned = std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            let pb = ProgressBar::new(planned_runtime.as_secs());
            match ProgressStyle::with_template(
                "{spinner:.green} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {planned_runtime}]",
            ) {
                Ok(style) => pb.set_style(
                    style
                        .with_key("planned_runtime", {
                            let planned = format_hms(planned_runtime);
                            move |_state: &ProgressState, w: &mut dyn Write| {
                                let _ = w.write_str(&planned);
                            }
                        })
                        .progress_chars("#>-"),
                ),
                Err(e) => log::debug!("Using the default progress style: {e}"),
            }

            loop {
                if shutdown_listener.should_shutdown() {
                    log::trace!("Progress thread shutting down");
                    pb.finish_and_clear();
                    break;
                }

                let new = min(start_time.elapsed().as_secs(), planned_runtime.as_secs());
                pb.set_position(new);
                std::thread::sleep(Duration::from_millis(250));
            }
        });

    if let Err(e) = spawned {
        log::warn!("Failed to start progress display: {e:?}");
    }
}

fn format_hms(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_runtime_format() {
        assert_eq!("00:00:10", format_hms(Duration::from_secs(10)));
        assert_eq!("01:30:05", format_hms(Duration::from_secs(5405)));
    }
}
