use songgen_core::{AppViewModel, JobStatus, Notice};

use super::constants::PROGRESS_BAR_WIDTH;

pub const HELP: &[&str] = &[
    "Type a description of your song and press Enter to generate it.",
    "  :download  save the finished song",
    "  :reset     dismiss the current song (or stop generating)",
    "  :quit      leave",
];

/// Text lines describing the current view.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    match view.status {
        JobStatus::Idle => {
            lines.push("Describe your song! (:help for commands)".to_string());
        }
        JobStatus::Running => {
            lines.push(format!(
                "Creating your masterpiece... {} {:>3}%",
                progress_bar(view.progress_percent, PROGRESS_BAR_WIDTH),
                view.display_percent
            ));
        }
        JobStatus::Completed => {
            let handle = view.result_handle.as_deref().unwrap_or_default();
            lines.push(format!(
                "Your song is ready: {handle} (:download to save it)"
            ));
        }
        JobStatus::Failed => {
            let reason = view
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            lines.push(format!("Generation failed: {reason}"));
        }
    }

    if let Some(notice) = &view.notice {
        lines.push(match notice {
            Notice::NothingToDownload => "Nothing to download yet.".to_string(),
            Notice::Saved { path } => format!("Saved to {path}"),
            Notice::DownloadFailed { message } => format!("Download failed: {message}"),
        });
    }
    lines
}

/// `[#####-----]` with the filled share of `width` cells matching `percent`.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let ratio = if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0) / 100.0
    };
    let filled = ((ratio * width as f64).floor() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
